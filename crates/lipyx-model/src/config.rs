//! Model manifest read from the sidecar `.json` next to the weights.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Activation, Result};

/// Describes how to run the weights in a safetensors file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelManifest {
    /// Activation between hidden layers (default: relu)
    pub activation: Activation,

    /// Maps the raw network output back to target units
    pub scaler: Option<TargetScaler>,
}

/// Inverse of the standardisation applied to the training targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetScaler {
    pub mean: f32,
    pub std: f32,
}

impl TargetScaler {
    pub fn unscale(&self, value: f32) -> f32 {
        value * self.std + self.mean
    }
}

impl ModelManifest {
    /// `model.safetensors` -> `model.json`
    pub fn sidecar_path(model_path: &Path) -> PathBuf {
        model_path.with_extension("json")
    }

    /// Read the sidecar manifest for `model_path`, or the defaults if there is none.
    pub fn load_for(model_path: &Path) -> Result<Self> {
        let path = Self::sidecar_path(model_path);
        if !path.exists() {
            debug!("No manifest at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let bytes = std::fs::read(&path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
