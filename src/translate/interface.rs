use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message the provider attaches to its throughput/quota rejection
pub const RATE_LIMITED_MESSAGE: &str = "2003: Rate limited";

/// Payload sent to the model for a single item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInput {
    pub text: String,
    pub source_lang: String,
    pub target_lang: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelOutput {
    pub translated_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Error reported by the model provider itself
    Ai,
    Http,
    Unknown,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Ai => "AiError",
            ErrorKind::Http => "HttpError",
            ErrorKind::Unknown => "UnknownError",
        }
    }
}

/// Failure of one translation call
#[derive(Debug, Clone, Error)]
pub enum TranslateError {
    #[error("{code}: {message}")]
    Ai { code: u32, message: String },

    #[error("{0}")]
    Http(String),

    #[error("Unknown error")]
    Unknown,
}

impl TranslateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TranslateError::Ai { .. } => ErrorKind::Ai,
            TranslateError::Http(_) => ErrorKind::Http,
            TranslateError::Unknown => ErrorKind::Unknown,
        }
    }

    /// Message reported to the client for this item; `None` when the failure carried none
    pub fn message(&self) -> Option<String> {
        match self {
            TranslateError::Unknown => None,
            TranslateError::Http(message) if message.is_empty() => None,
            other => Some(other.to_string()),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.kind() == ErrorKind::Ai && self.message().as_deref() == Some(RATE_LIMITED_MESSAGE)
    }
}

impl From<reqwest::Error> for TranslateError {
    fn from(err: reqwest::Error) -> Self {
        TranslateError::Http(err.to_string())
    }
}

/// A hosted translation capability
#[async_trait]
pub trait TranslatorInterface: Send + Sync {
    /// Translate one item
    async fn run(&self, input: &ModelInput) -> Result<ModelOutput, TranslateError>;

    /// Identifier of the model behind this translator
    fn model(&self) -> &str;

    /// Gateway id the calls are attributed to on the provider side
    fn gateway_id(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_requires_ai_kind_and_exact_message() {
        let limited = TranslateError::Ai {
            code: 2003,
            message: "Rate limited".to_string(),
        };
        assert!(limited.is_rate_limited());
        assert_eq!(limited.to_string(), RATE_LIMITED_MESSAGE);

        let other_code = TranslateError::Ai {
            code: 2004,
            message: "Rate limited".to_string(),
        };
        assert!(!other_code.is_rate_limited());

        let http = TranslateError::Http(RATE_LIMITED_MESSAGE.to_string());
        assert!(!http.is_rate_limited());
    }

    #[test]
    fn unknown_and_empty_failures_have_no_message() {
        assert_eq!(TranslateError::Unknown.message(), None);
        assert_eq!(TranslateError::Http(String::new()).message(), None);
        assert_eq!(
            TranslateError::Http("timeout".to_string()).message().as_deref(),
            Some("timeout")
        );
        assert_eq!(TranslateError::Unknown.kind().name(), "UnknownError");
    }
}
