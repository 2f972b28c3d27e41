//! Feed-forward lipophilicity regressor on Candle.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::time::Instant;

use candle_core::{DType, Device, Module, Tensor};
use candle_nn::Linear;
use tracing::{debug, info};

use crate::{Activation, ModelError, ModelManifest, Result, TargetScaler};

/// A stack of dense layers mapping a fingerprint row to one value.
///
/// Weights live in a safetensors file as `layers.<i>.weight` (`[out, in]`)
/// and `layers.<i>.bias` (`[out]`). The last layer must have width 1.
#[derive(Debug)]
pub struct LipophilicityModel {
    layers: Vec<Linear>,
    activation: Activation,
    scaler: Option<TargetScaler>,
    input_width: usize,
    device: Device,
}

impl LipophilicityModel {
    /// Load weights from `path` and the optional sidecar manifest, for CPU.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let start = Instant::now();
        info!("Loading lipophilicity model: {}", path.display());

        if !path.is_file() {
            return Err(ModelError::ModelLoad(format!("{} not found", path.display())));
        }
        let tensors = candle_core::safetensors::load(path, &Device::Cpu)
            .map_err(|e| ModelError::ModelLoad(format!("{}: {e}", path.display())))?;
        let manifest = ModelManifest::load_for(path)?;

        let model = Self::from_tensors(tensors, manifest)?;
        info!(
            "Model loaded in {:.2}s ({} layers, input width {})",
            start.elapsed().as_secs_f32(),
            model.depth(),
            model.input_width
        );
        Ok(model)
    }

    /// Build a model from named tensors, checking that the layers chain.
    pub fn from_tensors(tensors: HashMap<String, Tensor>, manifest: ModelManifest) -> Result<Self> {
        let mut indices = BTreeSet::new();
        for name in tensors.keys() {
            match parse_layer_key(name) {
                Some(i) => {
                    indices.insert(i);
                }
                None => debug!("Ignoring tensor {name}"),
            }
        }
        if indices.is_empty() {
            return Err(ModelError::ModelLoad("no layers.<i>.weight tensors".into()));
        }
        let count = indices.len();
        if indices.iter().next_back() != Some(&(count - 1)) {
            return Err(ModelError::ModelLoad(format!(
                "layer indices are not contiguous from 0: {indices:?}"
            )));
        }

        let mut layers = Vec::with_capacity(count);
        let mut input_width = 0;
        let mut width = 0;
        for i in 0..count {
            let weight = layer_tensor(&tensors, i, "weight")?;
            let bias = layer_tensor(&tensors, i, "bias")?;

            let (out_dim, in_dim) = weight
                .dims2()
                .map_err(|_| ModelError::ModelLoad(format!("layers.{i}.weight must be 2-D")))?;
            let bias_dim = bias
                .dims1()
                .map_err(|_| ModelError::ModelLoad(format!("layers.{i}.bias must be 1-D")))?;
            if bias_dim != out_dim {
                return Err(ModelError::ModelLoad(format!(
                    "layers.{i}: bias has {bias_dim} entries, weight has {out_dim} rows"
                )));
            }
            if i == 0 {
                input_width = in_dim;
            } else if in_dim != width {
                return Err(ModelError::ModelLoad(format!(
                    "layers.{i} expects {in_dim} inputs but layers.{} produces {width}",
                    i - 1
                )));
            }
            width = out_dim;
            layers.push(Linear::new(weight, Some(bias)));
        }
        if width != 1 {
            return Err(ModelError::ModelLoad(format!(
                "final layer must have width 1, found {width}"
            )));
        }

        Ok(Self {
            layers,
            activation: manifest.activation,
            scaler: manifest.scaler,
            input_width,
            device: Device::Cpu,
        })
    }

    /// Number of features the first layer expects.
    pub fn input_width(&self) -> usize {
        self.input_width
    }

    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// Run one feature row through the network.
    pub fn predict(&self, features: &[f32]) -> Result<f64> {
        if features.len() != self.input_width {
            return Err(ModelError::InvalidInput(format!(
                "expected {} features, got {}",
                self.input_width,
                features.len()
            )));
        }

        let mut xs = Tensor::from_slice(features, (1, features.len()), &self.device)?;
        let last = self.layers.len() - 1;
        for (i, layer) in self.layers.iter().enumerate() {
            xs = layer.forward(&xs)?;
            if i < last {
                xs = self.activation.apply(&xs)?;
            }
        }

        let raw = xs.flatten_all()?.to_vec1::<f32>()?;
        let value = match raw.as_slice() {
            [v] => *v,
            other => {
                return Err(ModelError::Inference(format!(
                    "expected a single output, got {}",
                    other.len()
                )))
            }
        };
        let value = self.scaler.map_or(value, |s| s.unscale(value));
        if !value.is_finite() {
            return Err(ModelError::Inference(format!("non-finite prediction {value}")));
        }
        Ok(value as f64)
    }
}

/// `layers.3.weight` -> `Some(3)`
fn parse_layer_key(name: &str) -> Option<usize> {
    let rest = name.strip_prefix("layers.")?;
    let (index, kind) = rest.split_once('.')?;
    match kind {
        "weight" | "bias" => index.parse().ok(),
        _ => None,
    }
}

fn layer_tensor(tensors: &HashMap<String, Tensor>, i: usize, kind: &str) -> Result<Tensor> {
    let name = format!("layers.{i}.{kind}");
    let tensor = tensors
        .get(&name)
        .ok_or_else(|| ModelError::ModelLoad(format!("missing tensor {name}")))?;
    tensor
        .to_dtype(DType::F32)
        .map_err(|e| ModelError::ModelLoad(format!("{name}: {e}")))
}
