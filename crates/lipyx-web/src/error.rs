//! Failures of a prediction request.
//!
//! `Display` is the exact `error` text returned to clients; the wrapped
//! cause is only logged (inference errors excepted, whose message is part
//! of the payload).

use axum::http::StatusCode;
use lipyx_model::ModelError;
use lipyx_molecules::{FingerprintError, RenderError, SmilesError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("No SMILES string provided")]
    MissingSmiles,

    #[error("Invalid SMILES string")]
    InvalidSmiles(SmilesError),

    #[error("Could not generate fingerprint")]
    Fingerprint(FingerprintError),

    #[error("Model inference failed: {0}")]
    Inference(ModelError),

    /// Non-fatal: reported next to a valid prediction.
    #[error("Failed to generate molecule image")]
    Image(RenderError),

    /// The depiction task died before returning. Also non-fatal.
    #[error("Failed to generate molecule image")]
    ImageTask(String),
}

impl PredictError {
    /// HTTP status for this failure. Without `strict` every payload is 200.
    pub fn status(&self, strict: bool) -> StatusCode {
        if !strict {
            return StatusCode::OK;
        }
        match self {
            PredictError::MissingSmiles | PredictError::InvalidSmiles(_) => StatusCode::BAD_REQUEST,
            PredictError::Fingerprint(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PredictError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PredictError::Image(_) | PredictError::ImageTask(_) => StatusCode::OK,
        }
    }

    /// Underlying cause, for logs.
    pub fn cause(&self) -> Option<String> {
        match self {
            PredictError::MissingSmiles => None,
            PredictError::InvalidSmiles(e) => Some(e.to_string()),
            PredictError::Fingerprint(e) => Some(e.to_string()),
            PredictError::Inference(e) => Some(e.to_string()),
            PredictError::Image(e) => Some(e.to_string()),
            PredictError::ImageTask(e) => Some(e.clone()),
        }
    }
}
