//! Parse, fingerprint, predict, depict. CPU-bound, run off the executor.
//!
//! Scoring and depiction are separate steps so that a depiction failure of
//! any kind leaves the prediction intact.

use std::path::PathBuf;

use lipyx_molecules::{morgan_fingerprint, parse_smiles, render_png, Molecule};
use tracing::debug;

use crate::error::PredictError;
use crate::state::AppState;

/// A molecule and its predicted value, ready to be drawn.
#[derive(Debug)]
pub struct Scored {
    pub molecule: Molecule,
    pub value: f64,
}

/// Parse, fingerprint and predict, stopping at the first failure.
pub fn score(state: &AppState, smiles: &str) -> Result<Scored, PredictError> {
    let molecule = parse_smiles(smiles).map_err(PredictError::InvalidSmiles)?;
    debug!(atoms = molecule.atom_count(), bonds = molecule.bond_count(), "parsed molecule");

    let fp = morgan_fingerprint(&molecule, &state.fingerprint).map_err(PredictError::Fingerprint)?;
    let value = state
        .predictor
        .predict(&fp.to_f32_vec())
        .map_err(PredictError::Inference)?;

    Ok(Scored { molecule, value })
}

/// Draw the molecule under the next image name and return that path.
pub fn depict(state: &AppState, molecule: &Molecule) -> Result<PathBuf, PredictError> {
    let path = state.images.next_path();
    render_png(molecule, &state.render, &path).map_err(PredictError::Image)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::images::ImageStore;
    use lipyx_model::{ModelError, Predictor};
    use lipyx_molecules::MAX_DEPICT_ATOMS;
    use std::sync::Arc;

    /// Sums the features, so predictions are easy to reason about.
    struct BitCount {
        width: usize,
    }

    impl Predictor for BitCount {
        fn predict(&self, features: &[f32]) -> lipyx_model::Result<f64> {
            if features.len() != self.width {
                return Err(ModelError::InvalidInput("width".into()));
            }
            Ok(features.iter().sum::<f32>() as f64)
        }

        fn input_width(&self) -> usize {
            self.width
        }
    }

    fn state(dir: &std::path::Path) -> AppState {
        let config = ServerConfig::default();
        AppState::new(Arc::new(BitCount { width: 2048 }), ImageStore::open(dir).unwrap(), &config)
    }

    #[test]
    fn score_then_depict_writes_image() {
        let tmp = tempfile::tempdir().unwrap();
        let state = state(tmp.path());
        let scored = score(&state, "CCO").unwrap();
        assert!(scored.value > 0.0);
        let path = depict(&state, &scored.molecule).unwrap();
        assert!(path.ends_with("molecule_1.png"));
        assert!(path.is_file());
    }

    #[test]
    fn invalid_smiles_stops_before_rendering() {
        let tmp = tempfile::tempdir().unwrap();
        let state = state(tmp.path());
        assert!(matches!(score(&state, "C1CC"), Err(PredictError::InvalidSmiles(_))));
        assert!(matches!(score(&state, "."), Err(PredictError::Fingerprint(_))));
        assert_eq!(state.images.issued(), 0);
    }

    #[test]
    fn render_failure_keeps_prediction() {
        let tmp = tempfile::tempdir().unwrap();
        let mut state = state(tmp.path());
        state.render.width = 8;
        let scored = score(&state, "c1ccccc1").unwrap();
        assert!(scored.value > 0.0);
        assert!(matches!(depict(&state, &scored.molecule), Err(PredictError::Image(_))));
    }

    #[test]
    fn molecules_too_large_to_draw_are_still_scored() {
        let tmp = tempfile::tempdir().unwrap();
        let state = state(tmp.path());
        let scored = score(&state, &"C".repeat(MAX_DEPICT_ATOMS + 50)).unwrap();
        assert!(scored.value > 0.0);
        assert!(matches!(depict(&state, &scored.molecule), Err(PredictError::Image(_))));
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }
}
