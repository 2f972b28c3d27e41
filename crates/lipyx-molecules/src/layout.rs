//! 2D coordinates for depiction.
//!
//! Each connected component is laid out by stress majorization and rotated
//! onto its principal axis. The target distance between two atoms is the
//! length of a 120 degree zigzag chain with the same number of bonds.
//! Components are placed left to right.

use std::collections::VecDeque;

use crate::molecule::Molecule;

/// Ideal drawn bond length in layout units.
pub const BOND_LENGTH: f64 = 1.0;

const MAX_ITERATIONS: usize = 400;
const TOLERANCE: f64 = 1e-5;
const COMPONENT_GAP: f64 = 1.5;
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// A point in layout space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Compute deterministic 2D coordinates, one per atom.
///
/// Memory and time are quadratic in the size of the largest component;
/// `depict` refuses molecules above `MAX_DEPICT_ATOMS` before calling this.
pub fn compute_coords(mol: &Molecule) -> Vec<Point> {
    let mut coords = vec![Point::default(); mol.atom_count()];
    let mut cursor = 0.0;

    for component in mol.components() {
        let mut local = layout_component(mol, &component);
        align_principal_axis(&mut local);

        let (min_x, max_x, min_y, max_y) = bounds(&local);
        let mid_y = (min_y + max_y) / 2.0;
        for (&atom, p) in component.iter().zip(&local) {
            coords[atom] = Point::new(p.x - min_x + cursor, p.y - mid_y);
        }
        cursor += (max_x - min_x) + COMPONENT_GAP;
    }
    coords
}

/// Bounding box as (min_x, max_x, min_y, max_y).
pub fn bounds(points: &[Point]) -> (f64, f64, f64, f64) {
    points.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
        |(x0, x1, y0, y1), p| (x0.min(p.x), x1.max(p.x), y0.min(p.y), y1.max(p.y)),
    )
}

fn layout_component(mol: &Molecule, component: &[usize]) -> Vec<Point> {
    let n = component.len();
    if n == 1 {
        return vec![Point::default()];
    }

    let mut slot = vec![usize::MAX; mol.atom_count()];
    for (i, &atom) in component.iter().enumerate() {
        slot[atom] = i;
    }

    let order = bfs_order(mol, component[0]);
    let distances: Vec<Vec<f64>> = component
        .iter()
        .map(|&atom| {
            let hops = hop_distances(mol, atom);
            component.iter().map(|&other| zigzag_distance(hops[other])).collect()
        })
        .collect();

    // Spiral seed in BFS order: neighbours start close, nothing coincides.
    let mut pos = vec![Point::default(); n];
    for (k, &atom) in order.iter().enumerate() {
        let r = (k as f64 + 1.0).sqrt() * 0.8;
        let theta = k as f64 * GOLDEN_ANGLE;
        pos[slot[atom]] = Point::new(r * theta.cos(), r * theta.sin());
    }

    for _ in 0..MAX_ITERATIONS {
        let mut max_move: f64 = 0.0;
        for i in 0..n {
            let (mut sx, mut sy, mut sw) = (0.0, 0.0, 0.0);
            for j in 0..n {
                if i == j {
                    continue;
                }
                let d = distances[i][j];
                let w = 1.0 / (d * d);
                let dist = pos[i].distance(&pos[j]);
                let (ux, uy) = if dist > 1e-9 {
                    ((pos[i].x - pos[j].x) / dist, (pos[i].y - pos[j].y) / dist)
                } else {
                    (0.0, 0.0)
                };
                sx += w * (pos[j].x + d * ux);
                sy += w * (pos[j].y + d * uy);
                sw += w;
            }
            let next = Point::new(sx / sw, sy / sw);
            max_move = max_move.max(next.distance(&pos[i]));
            pos[i] = next;
        }
        if max_move < TOLERANCE {
            break;
        }
    }
    pos
}

/// End-to-end length of an `hops`-bond chain drawn as a 120 degree zigzag.
fn zigzag_distance(hops: u32) -> f64 {
    let h = hops as f64;
    let along = h * 3f64.sqrt() / 2.0;
    let across = if hops % 2 == 1 { 0.5 } else { 0.0 };
    (along * along + across * across).sqrt() * BOND_LENGTH
}

fn bfs_order(mol: &Molecule, start: usize) -> Vec<usize> {
    let mut seen = vec![false; mol.atom_count()];
    let mut order = Vec::new();
    let mut queue = VecDeque::from([start]);
    seen[start] = true;
    while let Some(atom) = queue.pop_front() {
        order.push(atom);
        for n in mol.neighbors(atom) {
            if !seen[n] {
                seen[n] = true;
                queue.push_back(n);
            }
        }
    }
    order
}

fn hop_distances(mol: &Molecule, start: usize) -> Vec<u32> {
    let mut dist = vec![u32::MAX; mol.atom_count()];
    dist[start] = 0;
    let mut queue = VecDeque::from([start]);
    while let Some(atom) = queue.pop_front() {
        for n in mol.neighbors(atom) {
            if dist[n] == u32::MAX {
                dist[n] = dist[atom] + 1;
                queue.push_back(n);
            }
        }
    }
    dist
}

/// Rotate about the centroid so the longest extent runs along x.
fn align_principal_axis(points: &mut [Point]) {
    if points.len() < 2 {
        return;
    }
    let n = points.len() as f64;
    let cx = points.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = points.iter().map(|p| p.y).sum::<f64>() / n;
    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for p in points.iter() {
        let (dx, dy) = (p.x - cx, p.y - cy);
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    let angle = 0.5 * (2.0 * sxy).atan2(sxx - syy);
    let (sin, cos) = (-angle).sin_cos();
    for p in points.iter_mut() {
        let (dx, dy) = (p.x - cx, p.y - cy);
        *p = Point::new(dx * cos - dy * sin, dx * sin + dy * cos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::parse_smiles;

    #[test]
    fn one_point_per_atom() {
        let mol = parse_smiles("CC(=O)Oc1ccccc1C(=O)O").unwrap();
        let coords = compute_coords(&mol);
        assert_eq!(coords.len(), mol.atom_count());
        assert!(coords.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn bonded_atoms_sit_near_bond_length() {
        let mol = parse_smiles("c1ccccc1").unwrap();
        let coords = compute_coords(&mol);
        for bond in &mol.bonds {
            let d = coords[bond.atom1].distance(&coords[bond.atom2]);
            assert!((d - BOND_LENGTH).abs() < 0.35, "bond length {d}");
        }
    }

    #[test]
    fn layout_is_deterministic() {
        let mol = parse_smiles("CCN(CC)CC").unwrap();
        assert_eq!(compute_coords(&mol), compute_coords(&mol));
    }

    #[test]
    fn components_do_not_overlap() {
        let mol = parse_smiles("CCO.[Na+]").unwrap();
        let coords = compute_coords(&mol);
        let max_x = coords[..3].iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        assert!(coords[3].x >= max_x + COMPONENT_GAP - 1e-9);
    }

    #[test]
    fn zigzag_targets() {
        assert!((zigzag_distance(1) - 1.0).abs() < 1e-12);
        assert!((zigzag_distance(2) - 3f64.sqrt()).abs() < 1e-12);
        assert!((zigzag_distance(3) - 7f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn single_atom_at_origin() {
        let mol = parse_smiles("C").unwrap();
        assert_eq!(compute_coords(&mol), vec![Point::new(0.0, 0.0)]);
    }
}
