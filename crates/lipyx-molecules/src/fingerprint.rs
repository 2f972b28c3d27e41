//! Morgan (ECFP) circular fingerprints.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::FingerprintError;
use crate::molecule::Molecule;

/// Morgan fingerprint parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintParams {
    /// Neighbourhood radius (2 = ECFP4).
    pub radius: usize,
    /// Fingerprint length in bits.
    pub nbits: usize,
}

impl Default for FingerprintParams {
    fn default() -> Self {
        Self { radius: 2, nbits: 2048 }
    }
}

/// A fixed-size bit vector fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    bits: Vec<u64>,
    nbits: usize,
}

impl Fingerprint {
    /// Create an all-zero fingerprint of `nbits` bits.
    pub fn new(nbits: usize) -> Self {
        Fingerprint { bits: vec![0u64; nbits.div_ceil(64)], nbits }
    }

    fn set_bit(&mut self, pos: usize) {
        self.bits[pos / 64] |= 1u64 << (pos % 64);
    }

    /// Get the bit at `pos`. Out-of-range positions read as unset.
    pub fn get_bit(&self, pos: usize) -> bool {
        pos < self.nbits && (self.bits[pos / 64] >> (pos % 64)) & 1 == 1
    }

    pub fn count_ones(&self) -> u32 {
        self.bits.iter().map(|w| w.count_ones()).sum()
    }

    pub fn nbits(&self) -> usize {
        self.nbits
    }

    /// Indices of set bits, ascending.
    pub fn on_bits(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.nbits).filter(|&i| self.get_bit(i))
    }

    /// Dense 0.0/1.0 feature row, the model's input layout.
    pub fn to_f32_vec(&self) -> Vec<f32> {
        (0..self.nbits)
            .map(|i| if self.get_bit(i) { 1.0 } else { 0.0 })
            .collect()
    }
}

/// Compute a Morgan fingerprint.
///
/// Atom identifiers start from the ECFP invariants and are refined `radius`
/// times with the sorted `(bond type, neighbour identifier)` pairs. An
/// environment covering the same bond set as one already emitted is dropped,
/// and its atom stops growing.
pub fn morgan_fingerprint(
    mol: &Molecule,
    params: &FingerprintParams,
) -> Result<Fingerprint, FingerprintError> {
    if params.nbits == 0 {
        return Err(FingerprintError::ZeroWidth);
    }
    if mol.is_empty() {
        return Err(FingerprintError::EmptyMolecule);
    }

    let n = mol.atom_count();
    let nbits = params.nbits;
    let mut fp = Fingerprint::new(nbits);

    let mut identifiers: Vec<u32> = (0..n).map(|i| atom_invariant(mol, i)).collect();
    for &id in &identifiers {
        fp.set_bit(id as usize % nbits);
    }

    // Each environment is the sorted list of bond indices it covers.
    let mut environments: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut seen: HashSet<Vec<usize>> = HashSet::new();
    let mut dead = vec![false; n];

    for layer in 0..params.radius {
        let mut round: Vec<(Vec<usize>, u32, usize)> = Vec::with_capacity(n);
        for atom in 0..n {
            if dead[atom] {
                continue;
            }
            if mol.degree(atom) == 0 {
                dead[atom] = true;
                continue;
            }

            let mut env = environments[atom].clone();
            let mut pairs: Vec<(u32, u32)> = Vec::with_capacity(mol.degree(atom));
            for &(neighbor, bond_idx) in &mol.adjacency[atom] {
                pairs.push((mol.bonds[bond_idx].order.type_code(), identifiers[neighbor]));
                env.push(bond_idx);
                env.extend_from_slice(&environments[neighbor]);
            }
            env.sort_unstable();
            env.dedup();
            pairs.sort_unstable();

            let mut id = hash_combine(0, layer as u32);
            id = hash_combine(id, identifiers[atom]);
            for (bond_type, neighbor_id) in pairs {
                id = hash_combine(id, hash_combine(hash_combine(0, bond_type), neighbor_id));
            }
            round.push((env, id, atom));
        }

        // Sorting makes the surviving duplicate independent of atom order.
        round.sort_unstable();
        let mut next = identifiers.clone();
        for (env, id, atom) in round {
            if seen.contains(&env) {
                dead[atom] = true;
            } else {
                fp.set_bit(id as usize % nbits);
                seen.insert(env.clone());
            }
            next[atom] = id;
            environments[atom] = env;
        }
        identifiers = next;
    }

    Ok(fp)
}

/// ECFP atom invariant: heavy degree, valence minus hydrogens, atomic
/// number, isotope, charge, hydrogen count, ring membership.
fn atom_invariant(mol: &Molecule, idx: usize) -> u32 {
    let atom = &mol.atoms[idx];
    let explicit_h = mol
        .neighbors(idx)
        .filter(|&n| mol.atoms[n].atomic_number == 1)
        .count() as u32;
    let total_h = atom.hydrogens as u32 + explicit_h;
    let total_valence = mol.explicit_valence(idx) + atom.hydrogens as u32;

    [
        mol.heavy_degree(idx) as u32,
        total_valence.saturating_sub(total_h),
        atom.atomic_number as u32,
        atom.isotope.unwrap_or(0) as u32,
        atom.formal_charge as i32 as u32,
        total_h,
        mol.is_ring_atom(idx) as u32,
    ]
    .into_iter()
    .fold(0, hash_combine)
}

/// 32-bit `hash_combine`, fixed so fingerprints match across processes.
fn hash_combine(seed: u32, value: u32) -> u32 {
    seed ^ value
        .wrapping_add(0x9e37_79b9)
        .wrapping_add(seed << 6)
        .wrapping_add(seed >> 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::parse_smiles;

    fn ecfp4(smiles: &str) -> Fingerprint {
        morgan_fingerprint(&parse_smiles(smiles).unwrap(), &FingerprintParams::default()).unwrap()
    }

    #[test]
    fn deterministic_fingerprint() {
        let a = ecfp4("CCO");
        let b = ecfp4("CCO");
        assert_eq!(a, b);
        assert_eq!(a.nbits(), 2048);
        assert!(a.count_ones() > 0);
    }

    #[test]
    fn atom_order_does_not_matter() {
        assert_eq!(ecfp4("CCO"), ecfp4("OCC"));
        assert_eq!(ecfp4("c1ccccc1O"), ecfp4("Oc1ccccc1"));
    }

    #[test]
    fn different_molecules_differ() {
        assert_ne!(ecfp4("CCO"), ecfp4("CCCO"));
        assert_ne!(ecfp4("c1ccccc1"), ecfp4("C1CCCCC1"));
    }

    #[test]
    fn ethanol_bit_count() {
        // 3 atom bits and 3 radius-1 bits. Every radius-2 environment is
        // the whole molecule, already emitted at radius 1.
        let fp = ecfp4("CCO");
        assert!(fp.count_ones() <= 7);
        assert!(fp.count_ones() >= 5);
    }

    #[test]
    fn radius_zero_sets_only_atom_bits() {
        let mol = parse_smiles("CCO").unwrap();
        let params = FingerprintParams { radius: 0, nbits: 1024 };
        let fp = morgan_fingerprint(&mol, &params).unwrap();
        assert!(fp.count_ones() <= 3);
        assert!(fp.on_bits().all(|b| b < 1024));
    }

    #[test]
    fn dense_row_matches_bits() {
        let fp = ecfp4("CC(=O)Oc1ccccc1C(=O)O");
        let row = fp.to_f32_vec();
        assert_eq!(row.len(), 2048);
        assert_eq!(row.iter().sum::<f32>() as u32, fp.count_ones());
        for bit in fp.on_bits() {
            assert_eq!(row[bit], 1.0);
        }
    }

    #[test]
    fn environments_stay_local_on_long_chains() {
        let mol = parse_smiles(&"C".repeat(crate::smiles::MAX_ATOMS)).unwrap();
        let fp = morgan_fingerprint(&mol, &FingerprintParams::default()).unwrap();
        // End and interior environments of a plain alkane: a handful of bits.
        assert!(fp.count_ones() >= 5);
        assert!(fp.count_ones() <= 12);
        assert_eq!(fp, ecfp4(&"C".repeat(crate::smiles::MAX_ATOMS)));
    }

    #[test]
    fn rejects_empty_molecule_and_zero_width() {
        let empty = parse_smiles(".").unwrap();
        assert_eq!(
            morgan_fingerprint(&empty, &FingerprintParams::default()),
            Err(FingerprintError::EmptyMolecule)
        );
        let mol = parse_smiles("C").unwrap();
        assert_eq!(
            morgan_fingerprint(&mol, &FingerprintParams { radius: 2, nbits: 0 }),
            Err(FingerprintError::ZeroWidth)
        );
    }
}
