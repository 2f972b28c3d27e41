//! Ring perception: a bond is a ring bond iff it is not a bridge.

use crate::molecule::Bond;

/// Flag every bond that lies on a cycle.
///
/// Iterative Tarjan bridge search, so deep chains do not exhaust the stack.
pub(crate) fn ring_bonds(
    atom_count: usize,
    bonds: &[Bond],
    adjacency: &[Vec<(usize, usize)>],
) -> Vec<bool> {
    let mut in_ring = vec![true; bonds.len()];
    let mut disc = vec![usize::MAX; atom_count];
    let mut low = vec![0usize; atom_count];
    let mut timer = 0usize;

    for root in 0..atom_count {
        if disc[root] != usize::MAX {
            continue;
        }
        disc[root] = timer;
        low[root] = timer;
        timer += 1;

        // (atom, bond used to reach it, next adjacency slot to visit)
        let mut stack: Vec<(usize, Option<usize>, usize)> = vec![(root, None, 0)];
        while let Some(frame) = stack.last_mut() {
            let (atom, via, slot) = *frame;
            if slot < adjacency[atom].len() {
                frame.2 += 1;
                let (next, bond) = adjacency[atom][slot];
                if Some(bond) == via {
                    continue;
                }
                if disc[next] == usize::MAX {
                    disc[next] = timer;
                    low[next] = timer;
                    timer += 1;
                    stack.push((next, Some(bond), 0));
                } else {
                    low[atom] = low[atom].min(disc[next]);
                }
            } else {
                stack.pop();
                if let (Some(bond), Some(parent)) = (via, stack.last()) {
                    let parent = parent.0;
                    low[parent] = low[parent].min(low[atom]);
                    if low[atom] > disc[parent] {
                        in_ring[bond] = false;
                    }
                }
            }
        }
    }
    in_ring
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::molecule::BondOrder;

    fn build(n: usize, pairs: &[(usize, usize)]) -> Vec<bool> {
        let bonds: Vec<Bond> = pairs
            .iter()
            .map(|&(a, b)| Bond { atom1: a, atom2: b, order: BondOrder::Single })
            .collect();
        let mut adjacency = vec![Vec::new(); n];
        for (bi, b) in bonds.iter().enumerate() {
            adjacency[b.atom1].push((b.atom2, bi));
            adjacency[b.atom2].push((b.atom1, bi));
        }
        ring_bonds(n, &bonds, &adjacency)
    }

    #[test]
    fn chain_has_no_ring_bonds() {
        assert_eq!(build(3, &[(0, 1), (1, 2)]), vec![false, false]);
    }

    #[test]
    fn linker_between_rings_is_not_a_ring_bond() {
        // two triangles joined by bond 2-3
        let flags = build(6, &[(0, 1), (1, 2), (2, 0), (2, 3), (3, 4), (4, 5), (5, 3)]);
        assert_eq!(flags, vec![true, true, true, false, true, true, true]);
    }
}
