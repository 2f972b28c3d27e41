//! Molecular graph representation.

use serde::{Deserialize, Serialize};

use crate::ring;

/// Bond order classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondOrder {
    /// Contribution to the sigma/pi valence when aromatic bonds count as one.
    pub fn localized(self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
        }
    }

    /// Bond type code used when hashing environments.
    pub fn type_code(self) -> u32 {
        match self {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Aromatic => 12,
        }
    }
}

/// An atom in a molecular graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Atom {
    /// 0 for the `*` wildcard.
    pub atomic_number: u8,
    pub formal_charge: i8,
    pub isotope: Option<u16>,
    pub is_aromatic: bool,
    /// Total hydrogens: implicit ones for organic-subset atoms, the `H` count
    /// for bracket atoms.
    pub hydrogens: u8,
    /// Written in `[...]` notation.
    pub bracket: bool,
}

/// A bond between two atoms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bond {
    pub atom1: usize,
    pub atom2: usize,
    pub order: BondOrder,
}

impl Bond {
    /// The atom at the other end of this bond.
    pub fn other(&self, atom: usize) -> usize {
        if self.atom1 == atom {
            self.atom2
        } else {
            self.atom1
        }
    }
}

/// A molecular graph with atoms, bonds, adjacency and ring membership.
#[derive(Debug, Clone)]
pub struct Molecule {
    pub atoms: Vec<Atom>,
    pub bonds: Vec<Bond>,
    /// adjacency[atom_idx] = Vec<(neighbor_atom_idx, bond_idx)>
    pub adjacency: Vec<Vec<(usize, usize)>>,
    ring_bonds: Vec<bool>,
    ring_atoms: Vec<bool>,
}

impl Molecule {
    /// Build a molecule, deriving adjacency and ring membership from the bonds.
    pub fn new(atoms: Vec<Atom>, bonds: Vec<Bond>) -> Self {
        let mut adjacency = vec![Vec::new(); atoms.len()];
        for (bi, bond) in bonds.iter().enumerate() {
            adjacency[bond.atom1].push((bond.atom2, bi));
            adjacency[bond.atom2].push((bond.atom1, bi));
        }
        let ring_bonds = ring::ring_bonds(atoms.len(), &bonds, &adjacency);
        let mut ring_atoms = vec![false; atoms.len()];
        for (bond, in_ring) in bonds.iter().zip(&ring_bonds) {
            if *in_ring {
                ring_atoms[bond.atom1] = true;
                ring_atoms[bond.atom2] = true;
            }
        }
        Molecule { atoms, bonds, adjacency, ring_bonds, ring_atoms }
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Neighbor atom indices for a given atom.
    pub fn neighbors(&self, atom_idx: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency[atom_idx].iter().map(|&(n, _)| n)
    }

    /// Graph degree of an atom (number of explicit bonds).
    pub fn degree(&self, atom_idx: usize) -> usize {
        self.adjacency[atom_idx].len()
    }

    /// Number of explicit neighbours that are not hydrogen.
    pub fn heavy_degree(&self, atom_idx: usize) -> usize {
        self.neighbors(atom_idx)
            .filter(|&n| self.atoms[n].atomic_number != 1)
            .count()
    }

    /// Find the bond between two atoms, if any.
    pub fn get_bond(&self, a1: usize, a2: usize) -> Option<&Bond> {
        self.adjacency[a1]
            .iter()
            .find(|&&(n, _)| n == a2)
            .map(|&(_, bi)| &self.bonds[bi])
    }

    /// Sum of bond orders with aromatic bonds counted as 1.5, rounded down.
    pub fn explicit_valence(&self, atom_idx: usize) -> u32 {
        let twice: u32 = self.adjacency[atom_idx]
            .iter()
            .map(|&(_, bi)| match self.bonds[bi].order {
                BondOrder::Aromatic => 3,
                other => 2 * other.localized() as u32,
            })
            .sum();
        twice / 2
    }

    pub fn is_ring_atom(&self, atom_idx: usize) -> bool {
        self.ring_atoms[atom_idx]
    }

    pub fn is_ring_bond(&self, bond_idx: usize) -> bool {
        self.ring_bonds[bond_idx]
    }

    /// Connected components as lists of atom indices, in order of first atom.
    pub fn components(&self) -> Vec<Vec<usize>> {
        let mut seen = vec![false; self.atoms.len()];
        let mut components = Vec::new();
        for start in 0..self.atoms.len() {
            if seen[start] {
                continue;
            }
            seen[start] = true;
            let mut component = vec![start];
            let mut cursor = 0;
            while cursor < component.len() {
                let atom = component[cursor];
                cursor += 1;
                for n in self.neighbors(atom) {
                    if !seen[n] {
                        seen[n] = true;
                        component.push(n);
                    }
                }
            }
            component.sort_unstable();
            components.push(component);
        }
        components
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carbon(hydrogens: u8) -> Atom {
        Atom {
            atomic_number: 6,
            formal_charge: 0,
            isotope: None,
            is_aromatic: false,
            hydrogens,
            bracket: false,
        }
    }

    fn single(atom1: usize, atom2: usize) -> Bond {
        Bond { atom1, atom2, order: BondOrder::Single }
    }

    #[test]
    fn adjacency_and_degree() {
        let mol = Molecule::new(vec![carbon(3), carbon(3)], vec![single(0, 1)]);
        assert_eq!(mol.atom_count(), 2);
        assert_eq!(mol.neighbors(0).collect::<Vec<_>>(), vec![1]);
        assert_eq!(mol.degree(1), 1);
        assert!(mol.get_bond(0, 1).is_some());
        assert!(!mol.is_ring_atom(0));
    }

    #[test]
    fn ring_membership() {
        // cyclopropane with a methyl tail
        let atoms = vec![carbon(1), carbon(2), carbon(2), carbon(3)];
        let bonds = vec![single(0, 1), single(1, 2), single(2, 0), single(0, 3)];
        let mol = Molecule::new(atoms, bonds);
        assert!(mol.is_ring_atom(0) && mol.is_ring_atom(1) && mol.is_ring_atom(2));
        assert!(!mol.is_ring_atom(3));
        assert!(mol.is_ring_bond(0));
        assert!(!mol.is_ring_bond(3));
    }

    #[test]
    fn components_split_disconnected_fragments() {
        let mol = Molecule::new(vec![carbon(3), carbon(3), carbon(4)], vec![single(0, 1)]);
        assert_eq!(mol.components(), vec![vec![0, 1], vec![2]]);
    }
}
