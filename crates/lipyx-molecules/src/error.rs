//! Error types for parsing, fingerprinting and depiction.

use thiserror::Error;

/// Why a SMILES string was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SmilesError {
    #[error("empty SMILES string")]
    Empty,

    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unexpected end of input in bracket atom")]
    UnterminatedBracket,

    #[error("unknown element '{0}'")]
    UnknownElement(String),

    #[error("element '{0}' cannot be aromatic")]
    InvalidAromatic(String),

    #[error("unmatched '(' or ')' in SMILES")]
    UnbalancedBranch,

    #[error("bond or branch without a preceding atom at position {0}")]
    DanglingBond(usize),

    #[error("unmatched ring closure(s): {0:?}")]
    UnclosedRing(Vec<u16>),

    #[error("ring closure {0} bonds an atom to itself or duplicates a bond")]
    InvalidRingClosure(u16),

    #[error("explicit valence {valence} for atom {atom} is greater than permitted")]
    Valence { atom: usize, valence: u32 },

    #[error("non-ring atom {0} marked aromatic")]
    AromaticOutsideRing(usize),

    #[error("can't kekulize aromatic system containing atom {0}")]
    Kekulize(usize),

    #[error("molecule has more than {limit} atoms")]
    TooManyAtoms { limit: usize },
}

/// Why a fingerprint could not be produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FingerprintError {
    #[error("molecule has no atoms")]
    EmptyMolecule,

    #[error("fingerprint width must be positive")]
    ZeroWidth,
}

/// Why a depiction could not be produced.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("molecule has no atoms")]
    EmptyMolecule,

    #[error("canvas {width}x{height} is too small")]
    CanvasTooSmall { width: u32, height: u32 },

    #[error("{atoms} atoms is too many to lay out (limit {limit})")]
    TooManyAtoms { atoms: usize, limit: usize },

    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
