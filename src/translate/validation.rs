use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

static SOURCE_LANG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2}$").expect("source language pattern is valid"));
static TARGET_LANG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z]{2}(-[A-Z]{2,4})?$").expect("target language pattern is valid")
});

pub const DEFAULT_SOURCE_LANG: &str = "EN";

pub const TEXT_REQUIRED: &str = "Text is required";
pub const INVALID_SOURCE_LANG: &str = "Source language must be a valid language code or omitted";
pub const TARGET_LANG_REQUIRED: &str = "Target language code is required";
pub const INVALID_TARGET_LANG: &str = "Target language must be a valid language code";

/// Request body as received, before any rule is applied
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTranslationRequest {
    pub text: Option<Vec<String>>,
    /// Outer `None` is an absent key, `Some(None)` an explicit `null`
    #[serde(default, deserialize_with = "present")]
    pub source_lang: Option<Option<String>>,
    pub target_lang: Option<String>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// A request that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub text: Vec<String>,
    pub source_lang: String,
    pub target_lang: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub path: Vec<String>,
    pub message: String,
}

impl Issue {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            path: vec![field.to_string()],
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("request validation failed: {}", summary(.issues))]
pub struct ValidationError {
    pub issues: Vec<Issue>,
}

fn summary(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(|issue| issue.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Body returned to the client on a rejected request
    pub fn to_body(&self) -> serde_json::Value {
        serde_json::json!({
            "success": false,
            "error": {
                "name": "ValidationError",
                "issues": self.issues,
            }
        })
    }
}

impl RawTranslationRequest {
    /// Apply every rule and collect all failures, not just the first
    pub fn validate(self) -> Result<TranslationRequest, ValidationError> {
        let mut issues = Vec::new();

        let text = self.text.unwrap_or_default();
        if text.is_empty() {
            issues.push(Issue::new("text", TEXT_REQUIRED));
        }

        // An empty string is forwarded as-is; only an absent key takes the default
        let source_lang = match self.source_lang {
            None => DEFAULT_SOURCE_LANG.to_string(),
            Some(None) => {
                issues.push(Issue::new("source_lang", INVALID_SOURCE_LANG));
                String::new()
            }
            Some(Some(lang)) => {
                if !lang.is_empty() && !SOURCE_LANG.is_match(&lang) {
                    issues.push(Issue::new("source_lang", INVALID_SOURCE_LANG));
                }
                lang
            }
        };

        let target_lang = match self.target_lang {
            Some(lang) => {
                if lang.chars().count() < 2 {
                    issues.push(Issue::new("target_lang", TARGET_LANG_REQUIRED));
                }
                if !TARGET_LANG.is_match(&lang) {
                    issues.push(Issue::new("target_lang", INVALID_TARGET_LANG));
                }
                lang
            }
            None => {
                issues.push(Issue::new("target_lang", TARGET_LANG_REQUIRED));
                String::new()
            }
        };

        if !issues.is_empty() {
            return Err(ValidationError { issues });
        }

        Ok(TranslationRequest {
            text,
            source_lang,
            target_lang,
        })
    }
}
