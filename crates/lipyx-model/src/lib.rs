//! Lipyx Inference Engine
//!
//! Pure Rust lipophilicity regression using Candle (Hugging Face).
//! The model is a small dense network read from a safetensors file once at
//! startup and run on the CPU for every request.
//!
//! # Example
//! ```no_run
//! use lipyx_model::LipophilicityModel;
//!
//! fn main() -> lipyx_model::Result<()> {
//!     let model = LipophilicityModel::load("lipophilicity_model.safetensors")?;
//!     let features = vec![0.0f32; model.input_width()];
//!     println!("logD: {:.2}", model.predict(&features)?);
//!     Ok(())
//! }
//! ```

pub mod activation;
pub mod config;
pub mod error;
pub mod model;
pub mod predictor;

pub use activation::Activation;
pub use config::{ModelManifest, TargetScaler};
pub use error::{ModelError, Result};
pub use model::LipophilicityModel;
pub use predictor::Predictor;
