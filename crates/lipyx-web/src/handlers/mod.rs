//! HTTP handlers for all routes.

pub mod predict;
pub mod system;
