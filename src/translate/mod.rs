pub mod interface;
pub mod validation;
pub mod workers_ai;

pub use interface::{ModelInput, ModelOutput, TranslateError, TranslatorInterface};
pub use validation::{RawTranslationRequest, TranslationRequest, ValidationError};
pub use workers_ai::WorkersAiClient;
