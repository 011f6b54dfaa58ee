use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::interface::{ModelInput, ModelOutput, TranslateError, TranslatorInterface};
use crate::config::AiConfig;

/// Response envelope returned by Workers AI
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    result: Option<ModelOutput>,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: u32,
    message: String,
}

/// Translator backed by a Workers AI model reached through an AI Gateway
#[derive(Debug, Clone)]
pub struct WorkersAiClient {
    client: Client,
    endpoint: String,
    api_token: String,
    model: String,
    gateway_id: String,
}

impl WorkersAiClient {
    pub fn new(config: &AiConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let endpoint = format!(
            "{}/{}/{}/workers-ai/{}",
            config.base_url.trim_end_matches('/'),
            config.account_id,
            config.gateway_id,
            config.model
        );

        info!(
            "Initialized WorkersAiClient: model={}, gateway={}",
            config.model, config.gateway_id
        );

        Ok(Self {
            client: builder.build()?,
            endpoint,
            api_token: config.api_token.clone(),
            model: config.model.clone(),
            gateway_id: config.gateway_id.clone(),
        })
    }
}

#[async_trait]
impl TranslatorInterface for WorkersAiClient {
    async fn run(&self, input: &ModelInput) -> Result<ModelOutput, TranslateError> {
        debug!(
            "Sending translation request: {} -> {}, {} chars",
            input.source_lang,
            input.target_lang,
            input.text.chars().count()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_token)
            .json(input)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        let envelope: Envelope = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(err) if status.is_success() => {
                return Err(TranslateError::Http(format!(
                    "Invalid response from translation service: {}",
                    err
                )));
            }
            Err(_) => {
                return Err(TranslateError::Http(format!(
                    "Translation service returned {}",
                    status
                )));
            }
        };

        // Provider errors take precedence over the HTTP status
        if let Some(error) = envelope.errors.into_iter().next() {
            return Err(TranslateError::Ai {
                code: error.code,
                message: error.message,
            });
        }

        match envelope.result {
            Some(output) if envelope.success => Ok(output),
            _ => Err(TranslateError::Unknown),
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn gateway_id(&self) -> &str {
        &self.gateway_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    const PATH: &str = "/acc/translation-app/workers-ai/@cf/meta/m2m100-1.2b";

    fn client_for(server: &Server) -> WorkersAiClient {
        let config = AiConfig {
            account_id: "acc".to_string(),
            api_token: "tok".to_string(),
            base_url: server.url(),
            ..AiConfig::default()
        };
        WorkersAiClient::new(&config).unwrap()
    }

    fn input(text: &str) -> ModelInput {
        ModelInput {
            text: text.to_string(),
            source_lang: "en".to_string(),
            target_lang: "pt-br".to_string(),
        }
    }

    #[test]
    fn endpoint_routes_through_the_gateway() {
        let config = AiConfig {
            account_id: "acc".to_string(),
            api_token: "tok".to_string(),
            base_url: "https://gateway.example/v1/".to_string(),
            ..AiConfig::default()
        };
        let client = WorkersAiClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint,
            "https://gateway.example/v1/acc/translation-app/workers-ai/@cf/meta/m2m100-1.2b"
        );
        assert_eq!(client.gateway_id(), "translation-app");
        assert_eq!(client.model(), "@cf/meta/m2m100-1.2b");
    }

    #[tokio::test]
    async fn returns_translated_text_on_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", PATH)
            .match_header("authorization", "Bearer tok")
            .match_body(Matcher::Json(json!({
                "text": "hello",
                "source_lang": "en",
                "target_lang": "pt-br"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success":true,"result":{"translated_text":"olá"},"errors":[],"messages":[]}"#)
            .create_async()
            .await;

        let output = client_for(&server).run(&input("hello")).await.unwrap();
        assert_eq!(output.translated_text, "olá");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn provider_rate_limit_becomes_ai_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", PATH)
            .with_status(429)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success":false,"result":null,"errors":[{"code":2003,"message":"Rate limited"}]}"#)
            .create_async()
            .await;

        let err = client_for(&server).run(&input("hello")).await.unwrap_err();
        assert!(err.is_rate_limited());
        assert_eq!(err.to_string(), "2003: Rate limited");
    }

    #[tokio::test]
    async fn other_provider_errors_keep_their_message() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", PATH)
            .with_status(400)
            .with_body(r#"{"success":false,"errors":[{"code":5006,"message":"Invalid input"}]}"#)
            .create_async()
            .await;

        let err = client_for(&server).run(&input("hello")).await.unwrap_err();
        assert!(!err.is_rate_limited());
        assert_eq!(err.message().as_deref(), Some("5006: Invalid input"));
    }

    #[tokio::test]
    async fn non_json_error_body_is_an_http_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", PATH)
            .with_status(502)
            .with_body("Bad Gateway")
            .create_async()
            .await;

        let err = client_for(&server).run(&input("hello")).await.unwrap_err();
        assert!(matches!(err, TranslateError::Http(_)));
        assert!(err.to_string().contains("502"));
    }

    #[tokio::test]
    async fn unsuccessful_envelope_without_errors_is_unknown() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", PATH)
            .with_status(200)
            .with_body(r#"{"success":false,"result":null,"errors":[]}"#)
            .create_async()
            .await;

        let err = client_for(&server).run(&input("hello")).await.unwrap_err();
        assert!(matches!(err, TranslateError::Unknown));
        assert_eq!(err.message(), None);
    }
}
