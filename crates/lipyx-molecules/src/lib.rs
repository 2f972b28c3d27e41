//! Lipyx Molecules - the chemistry half of the lipophilicity service.
//!
//! 1. Parsing SMILES into a validated molecular graph
//! 2. Morgan (ECFP-style) bit fingerprints for model input
//! 3. 2D layout and PNG depiction

pub mod depict;
pub mod element;
pub mod error;
pub mod fingerprint;
pub mod layout;
pub mod molecule;
pub mod smiles;

mod ring;

pub use depict::{depict, render_png, DepictOptions, MAX_DEPICT_ATOMS};
pub use error::{FingerprintError, RenderError, SmilesError};
pub use fingerprint::{morgan_fingerprint, Fingerprint, FingerprintParams};
pub use molecule::{Atom, Bond, BondOrder, Molecule};
pub use smiles::{parse_smiles, MAX_ATOMS};
