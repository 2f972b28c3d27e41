//! The seam between the web layer and the inference engine.

use crate::{LipophilicityModel, Result};

/// Anything that maps a fingerprint row to a lipophilicity value.
///
/// Implementations are shared across request threads behind an `Arc`.
pub trait Predictor: Send + Sync {
    fn predict(&self, features: &[f32]) -> Result<f64>;

    /// Feature count the predictor expects.
    fn input_width(&self) -> usize;
}

impl Predictor for LipophilicityModel {
    fn predict(&self, features: &[f32]) -> Result<f64> {
        LipophilicityModel::predict(self, features)
    }

    fn input_width(&self) -> usize {
        LipophilicityModel::input_width(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn assert_shareable<T: Send + Sync + ?Sized>() {}

    #[test]
    fn model_is_a_shareable_predictor() {
        assert_shareable::<LipophilicityModel>();
        assert_shareable::<Arc<dyn Predictor>>();
    }
}
