use std::sync::Arc;

use crate::config::Config;
use crate::translate::{TranslatorInterface, WorkersAiClient};

/// Shared, read-only application state; nothing in here changes per request
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub translator: Arc<dyn TranslatorInterface>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let translator = Arc::new(WorkersAiClient::new(&config.ai)?);
        Ok(Self::with_translator(config, translator))
    }

    pub fn with_translator(config: Config, translator: Arc<dyn TranslatorInterface>) -> Self {
        Self {
            config: Arc::new(config),
            translator,
        }
    }
}
