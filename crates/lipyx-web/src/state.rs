//! Shared application state for the web server.

use std::sync::Arc;

use anyhow::Context;
use lipyx_model::{LipophilicityModel, Predictor};
use lipyx_molecules::{DepictOptions, FingerprintParams};
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::images::ImageStore;

/// Shared state injected into every Axum handler.
pub struct AppState {
    pub predictor: Arc<dyn Predictor>,
    pub images: ImageStore,
    pub fingerprint: FingerprintParams,
    pub render: DepictOptions,
    pub strict_status: bool,
}

impl AppState {
    pub fn new(predictor: Arc<dyn Predictor>, images: ImageStore, config: &ServerConfig) -> Self {
        if predictor.input_width() != config.fingerprint.nbits {
            warn!(
                "Model expects {} features but fingerprints have {} bits; every prediction will fail",
                predictor.input_width(),
                config.fingerprint.nbits
            );
        }
        Self {
            predictor,
            images,
            fingerprint: config.fingerprint,
            render: config.render,
            strict_status: config.strict_status,
        }
    }

    /// Load the model and prepare the image directory. Any failure here
    /// should stop the server from starting.
    pub fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let model = LipophilicityModel::load(&config.model_path)
            .with_context(|| format!("Failed to load model {}", config.model_path.display()))?;
        let images = ImageStore::open(&config.images_dir).with_context(|| {
            format!("Failed to prepare image directory {}", config.images_dir.display())
        })?;
        info!("Writing depictions to {}", images.dir().display());
        Ok(Self::new(Arc::new(model), images, config))
    }
}

pub type SharedState = Arc<AppState>;
