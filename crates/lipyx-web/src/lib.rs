//! lipyx-web - HTTP front end for lipophilicity prediction
//!   - POST /predict: SMILES in, prediction and depiction path out
//!   - GET /health: liveness
//!
//! Also ships `lipyx-client`, a small command-line caller.

pub mod config;
pub mod error;
pub mod handlers;
pub mod images;
pub mod pipeline;
pub mod router;
pub mod state;
