//! POST /predict

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lipyx_model::ModelError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::task::JoinError;
use tracing::{info, warn};

use crate::error::PredictError;
use crate::pipeline;
use crate::state::SharedState;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /predict - predict lipophilicity for `{"smiles": "..."}`
///
/// The body is read as raw bytes so that a missing or wrong content type,
/// bad JSON, or a non-string `smiles` all end up as the same
/// missing-input payload.
pub async fn predict(State(state): State<SharedState>, body: Bytes) -> Response {
    let Some(smiles) = extract_smiles(&body) else {
        return failure(&PredictError::MissingSmiles, state.strict_status);
    };

    let worker = Arc::clone(&state);
    let input = smiles.clone();
    let scored = blocking(
        move || pipeline::score(&worker, &input),
        |e| PredictError::Inference(ModelError::Inference(format!("prediction task failed: {e}"))),
    )
    .await;
    let scored = match scored {
        Ok(scored) => scored,
        Err(e) => {
            warn!(%smiles, error = %e, cause = ?e.cause(), "prediction failed");
            return failure(&e, state.strict_status);
        }
    };

    let value = scored.value;
    let worker = Arc::clone(&state);
    let image = blocking(
        move || pipeline::depict(&worker, &scored.molecule),
        |e| PredictError::ImageTask(format!("depiction task failed: {e}")),
    )
    .await;

    let mut response = PredictResponse {
        prediction: Some(value),
        ..Default::default()
    };
    match image {
        Ok(path) => {
            info!(%smiles, prediction = value, image = %path.display(), "predicted");
            response.image_path = Some(path.display().to_string());
        }
        Err(e) => {
            warn!(%smiles, prediction = value, cause = ?e.cause(), "depiction failed");
            response.error = Some(e.to_string());
        }
    }
    (StatusCode::OK, Json(response)).into_response()
}

/// Run `work` on the blocking pool. A task that panics or is cancelled
/// becomes `on_abort(..)`.
async fn blocking<T, W, A>(work: W, on_abort: A) -> Result<T, PredictError>
where
    T: Send + 'static,
    W: FnOnce() -> Result<T, PredictError> + Send + 'static,
    A: FnOnce(JoinError) -> PredictError,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(outcome) => outcome,
        Err(e) => Err(on_abort(e)),
    }
}

fn failure(error: &PredictError, strict: bool) -> Response {
    let body = PredictResponse {
        error: Some(error.to_string()),
        ..Default::default()
    };
    (error.status(strict), Json(body)).into_response()
}

/// The non-empty `smiles` string of a JSON object body, if there is one.
fn extract_smiles(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    match value.get("smiles")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_only_non_empty_strings() {
        assert_eq!(extract_smiles(br#"{"smiles":"CCO"}"#).as_deref(), Some("CCO"));
        assert_eq!(extract_smiles(br#"{"smiles":""}"#), None);
        assert_eq!(extract_smiles(br#"{"smiles":42}"#), None);
        assert_eq!(extract_smiles(br#"{"smiles":null}"#), None);
        assert_eq!(extract_smiles(br#"{"molecule":"CCO"}"#), None);
        assert_eq!(extract_smiles(br#"["CCO"]"#), None);
        assert_eq!(extract_smiles(b"smiles=CCO"), None);
        assert_eq!(extract_smiles(b""), None);
    }

    #[tokio::test]
    async fn panicking_depiction_is_an_image_failure() {
        let outcome: Result<(), _> = blocking(
            || panic!("rasterizer blew up"),
            |e| PredictError::ImageTask(e.to_string()),
        )
        .await;
        let err = outcome.unwrap_err();
        assert!(matches!(err, PredictError::ImageTask(_)));
        assert_eq!(err.to_string(), "Failed to generate molecule image");
        assert_eq!(err.status(true), StatusCode::OK);
    }

    #[tokio::test]
    async fn blocking_passes_results_through() {
        let ok = blocking(|| Ok(7), |_| PredictError::MissingSmiles).await;
        assert_eq!(ok.unwrap(), 7);
        let err: Result<(), _> = blocking(
            || Err(PredictError::MissingSmiles),
            |e| PredictError::ImageTask(e.to_string()),
        )
        .await;
        assert!(matches!(err, Err(PredictError::MissingSmiles)));
    }

    #[test]
    fn response_omits_absent_fields() {
        let body = PredictResponse {
            error: Some("Invalid SMILES string".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"error":"Invalid SMILES string"}"#
        );
    }
}
