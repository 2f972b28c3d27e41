//! Periodic table lookups used by the SMILES parser and the depiction.

/// Element symbols indexed by atomic number. Index 0 is the `*` wildcard.
static SYMBOLS: [&str; 87] = [
    "*", "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S",
    "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge",
    "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd",
    "In", "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd",
    "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn",
];

/// Look up an atomic number by symbol (case-sensitive, e.g. "C", "Cl").
pub fn atomic_number(symbol: &str) -> Option<u8> {
    SYMBOLS.iter().position(|s| *s == symbol).map(|n| n as u8)
}

/// Allowed valences for elements whose valence is checked.
///
/// The first entry is the default valence. Elements outside this table
/// (metals, noble gases, the wildcard) are not valence-checked.
pub fn allowed_valences(atomic_number: u8) -> Option<&'static [u8]> {
    let v: &'static [u8] = match atomic_number {
        1 => &[1],
        5 => &[3],
        6 => &[4],
        7 => &[3],
        8 => &[2],
        9 => &[1],
        14 => &[4],
        15 => &[3, 5],
        16 => &[2, 4, 6],
        17 => &[1],
        33 => &[3, 5],
        34 => &[2, 4, 6],
        35 => &[1],
        53 => &[1, 3, 5],
        _ => return None,
    };
    Some(v)
}

/// Allowed valences once the formal charge is taken into account.
///
/// A charged atom takes the valences of its isoelectronic neighbour in the
/// table: N+ behaves like C, O- like F, C- like N.
pub fn charged_valences(atomic_number: u8, formal_charge: i8) -> Option<&'static [u8]> {
    allowed_valences(atomic_number)?;
    let shifted = atomic_number as i16 - formal_charge as i16;
    if !(1..=86).contains(&shifted) {
        return None;
    }
    allowed_valences(shifted as u8)
}

/// Elements that may carry aromatic (lowercase) notation.
pub fn can_be_aromatic(atomic_number: u8) -> bool {
    matches!(atomic_number, 0 | 5 | 6 | 7 | 8 | 15 | 16 | 33 | 34)
}
