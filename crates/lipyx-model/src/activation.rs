//! Hidden-layer activations.

use candle_core::Tensor;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    #[default]
    Relu,

    /// Exact (erf) GELU
    Gelu,

    Tanh,

    Sigmoid,
}

impl Activation {
    pub fn apply(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        match self {
            Activation::Relu => xs.relu(),
            Activation::Gelu => xs.gelu_erf(),
            Activation::Tanh => xs.tanh(),
            Activation::Sigmoid => candle_nn::ops::sigmoid(xs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    fn run(act: Activation, values: &[f32]) -> Vec<f32> {
        let t = Tensor::new(values, &Device::Cpu).unwrap();
        act.apply(&t).unwrap().to_vec1::<f32>().unwrap()
    }

    #[test]
    fn relu_clamps_negatives() {
        assert_eq!(run(Activation::Relu, &[-1.0, 0.0, 2.5]), vec![0.0, 0.0, 2.5]);
    }

    #[test]
    fn sigmoid_and_tanh_at_zero() {
        assert!((run(Activation::Sigmoid, &[0.0])[0] - 0.5).abs() < 1e-6);
        assert!(run(Activation::Tanh, &[0.0])[0].abs() < 1e-6);
    }

    #[test]
    fn gelu_is_near_identity_for_large_inputs() {
        let out = run(Activation::Gelu, &[6.0, -6.0]);
        assert!((out[0] - 6.0).abs() < 1e-3);
        assert!(out[1].abs() < 1e-3);
    }
}
