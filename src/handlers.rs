use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures::future::join_all;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::state::AppState;
use crate::translate::validation::Issue;
use crate::translate::{
    ModelInput, RawTranslationRequest, TranslationRequest, TranslatorInterface, ValidationError,
};

const UNKNOWN_ERROR: &str = "Unknown error";
const RATE_LIMITED_BODY: &str = "Rate limited";

/// Outcome for one item, positionally matching the input text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TranslationResult {
    Text { text: String },
    Error { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub translations: Vec<TranslationResult>,
    pub is_rate_limited: bool,
}

impl IntoResponse for BatchOutcome {
    fn into_response(self) -> Response {
        // A single rate-limited item discards the whole batch
        if self.is_rate_limited {
            return (StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED_BODY).into_response();
        }
        Json(json!({ "translations": self.translations })).into_response()
    }
}

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(self.to_body())).into_response()
    }
}

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model": state.translator.model(),
        "gateway": state.translator.gateway_id(),
    }))
}

pub async fn translate(
    State(state): State<AppState>,
    payload: Result<Json<RawTranslationRequest>, JsonRejection>,
) -> Response {
    let raw = match payload {
        Ok(Json(raw)) => raw,
        Err(rejection) => {
            debug!("Rejected translation body: {}", rejection.body_text());
            let error = ValidationError {
                issues: vec![Issue::new("body", rejection.body_text())],
            };
            return (rejection.status(), Json(error.to_body())).into_response();
        }
    };

    let request = match raw.validate() {
        Ok(request) => request,
        Err(err) => {
            debug!("{}", err);
            return err.into_response();
        }
    };

    let span = info_span!(
        "translate",
        request_id = %Uuid::new_v4(),
        items = request.text.len(),
        source = %request.source_lang,
        target = %request.target_lang,
    );

    translate_batch(state.translator.as_ref(), &request)
        .instrument(span)
        .await
        .into_response()
}

/// Run one model call per item concurrently and gather the results in input order
pub async fn translate_batch(
    translator: &dyn TranslatorInterface,
    request: &TranslationRequest,
) -> BatchOutcome {
    let source_lang = request.source_lang.to_lowercase();
    let target_lang = request.target_lang.to_lowercase();

    let calls = request.text.iter().map(|text| {
        let input = ModelInput {
            text: text.clone(),
            source_lang: source_lang.clone(),
            target_lang: target_lang.clone(),
        };
        async move { translator.run(&input).await }
    });

    let mut is_rate_limited = false;
    let translations = join_all(calls)
        .await
        .into_iter()
        .enumerate()
        .map(|(index, result)| match result {
            Ok(output) => TranslationResult::Text {
                text: output.translated_text,
            },
            Err(err) => {
                if err.is_rate_limited() {
                    is_rate_limited = true;
                }
                warn!("Item {} failed ({}): {}", index, err.kind().name(), err);
                TranslationResult::Error {
                    error: err.message().unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
                }
            }
        })
        .collect::<Vec<_>>();

    if is_rate_limited {
        warn!("Batch hit the provider rate limit, discarding results");
    } else {
        info!("Translated batch of {}", translations.len());
    }

    BatchOutcome {
        translations,
        is_rate_limited,
    }
}
