use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Matches `${VAR_NAME}` placeholders in configuration files
static ENV_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{(\w+)\}").expect("placeholder pattern is valid"));

pub const ACCOUNT_ID_ENV: &str = "CF_ACCOUNT_ID";
pub const API_TOKEN_ENV: &str = "CF_API_TOKEN";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ai: AiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Settings for the hosted translation model and the gateway in front of it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub api_token: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_gateway_id")]
    pub gateway_id: String,
    /// Unset leaves the HTTP client's own timeout behaviour in place
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_base_url() -> String {
    "https://gateway.ai.cloudflare.com/v1".to_string()
}

fn default_model() -> String {
    "@cf/meta/m2m100-1.2b".to_string()
}

fn default_gateway_id() -> String {
    "translation-app".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            api_token: String::new(),
            base_url: default_base_url(),
            model: default_model(),
            gateway_id: default_gateway_id(),
            request_timeout_secs: None,
        }
    }
}

impl Config {
    /// Load a YAML or JSON configuration file, substituting `${VAR}` placeholders
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            anyhow::bail!("Configuration file not found: {}", path);
        }

        let content = load_text_file(path)?;
        let content = substitute_env_vars(&content);

        let mut config = Self::parse(&content, path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load the first existing file in `paths`; a file that exists but fails to load is an error.
    /// With no file present, fall back to defaults plus environment credentials.
    pub fn load_first(paths: &[String]) -> Result<Self> {
        for path in paths {
            if !Path::new(path).exists() {
                tracing::debug!("No config file at {}", path);
                continue;
            }
            let config = Self::load(path)
                .with_context(|| format!("Failed to load config from {}", path))?;
            tracing::info!("Loaded configuration from: {}", path);
            return Ok(config);
        }

        tracing::warn!(
            "No configuration file found (tried {:?}), using defaults and environment",
            paths
        );
        Ok(Self::from_env())
    }

    /// Defaults plus credentials from the environment
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn parse(content: &str, path: &str) -> Result<Self> {
        let path_lower = path.to_lowercase();
        if path_lower.ends_with(".json") {
            Ok(serde_json::from_str(content)?)
        } else {
            Ok(serde_yaml::from_str(content)?)
        }
    }

    fn apply_env_overrides(&mut self) {
        if self.ai.account_id.is_empty() {
            if let Ok(account_id) = std::env::var(ACCOUNT_ID_ENV) {
                self.ai.account_id = account_id;
            }
        }
        if self.ai.api_token.is_empty() {
            if let Ok(api_token) = std::env::var(API_TOKEN_ENV) {
                self.ai.api_token = api_token;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.ai.account_id.trim().is_empty() {
            anyhow::bail!("ai.account_id is required (or set {})", ACCOUNT_ID_ENV);
        }
        if self.ai.api_token.trim().is_empty() {
            anyhow::bail!("ai.api_token is required (or set {})", API_TOKEN_ENV);
        }
        if self.ai.gateway_id.trim().is_empty() {
            anyhow::bail!("ai.gateway_id must not be empty");
        }
        Ok(())
    }
}

/// Replace `${VAR_NAME}` with the variable's value, leaving unknown ones intact
pub fn substitute_env_vars(content: &str) -> String {
    ENV_PLACEHOLDER
        .replace_all(content, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

/// Read a UTF-8 text file, dropping a leading BOM if present
fn load_text_file(path: &str) -> Result<String> {
    let bytes = fs::read(path)?;
    let (content, _, had_errors) = encoding_rs::UTF_8.decode(&bytes);
    if had_errors {
        tracing::warn!("Configuration file {} contains invalid UTF-8", path);
    }
    Ok(content.into_owned())
}
