//! Raster depiction of a molecule.

use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut, draw_line_segment_mut};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RenderError;
use crate::layout::{self, Point};
use crate::molecule::{BondOrder, Molecule};

/// Largest molecule drawn. Layout time is quadratic in the atom count.
pub const MAX_DEPICT_ATOMS: usize = 250;

const MIN_CANVAS: u32 = 32;
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const BOND_COLOR: Rgb<u8> = Rgb([40, 40, 40]);
const OUTLINE_COLOR: Rgb<u8> = Rgb([90, 90, 90]);

/// Canvas size for depictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepictOptions {
    pub width: u32,
    pub height: u32,
}

impl Default for DepictOptions {
    fn default() -> Self {
        Self { width: 300, height: 300 }
    }
}

/// Draw the molecule onto a new RGB canvas.
pub fn depict(mol: &Molecule, options: &DepictOptions) -> Result<RgbImage, RenderError> {
    if mol.is_empty() {
        return Err(RenderError::EmptyMolecule);
    }
    let (width, height) = (options.width, options.height);
    if width < MIN_CANVAS || height < MIN_CANVAS {
        return Err(RenderError::CanvasTooSmall { width, height });
    }
    if mol.atom_count() > MAX_DEPICT_ATOMS {
        return Err(RenderError::TooManyAtoms { atoms: mol.atom_count(), limit: MAX_DEPICT_ATOMS });
    }

    let coords = layout::compute_coords(mol);
    let view = Viewport::fit(&coords, width, height);
    let px: Vec<(f32, f32)> = coords.iter().map(|p| view.project(p)).collect();
    let mut img = RgbImage::from_pixel(width, height, BACKGROUND);

    let stroke = (view.scale * 0.06).max(1.0) as f32;
    let gap = (view.scale * 0.16) as f32;

    for (bi, bond) in mol.bonds.iter().enumerate() {
        let (a, b) = (px[bond.atom1], px[bond.atom2]);
        match bond.order {
            BondOrder::Single => thick_line(&mut img, a, b, stroke),
            BondOrder::Triple => {
                thick_line(&mut img, a, b, stroke);
                thick_line(&mut img, offset(a, b, gap), offset(b, a, -gap), stroke);
                thick_line(&mut img, offset(a, b, -gap), offset(b, a, gap), stroke);
            }
            BondOrder::Double if !mol.is_ring_bond(bi) => {
                let half = gap / 2.0;
                thick_line(&mut img, offset(a, b, half), offset(b, a, -half), stroke);
                thick_line(&mut img, offset(a, b, -half), offset(b, a, half), stroke);
            }
            BondOrder::Double | BondOrder::Aromatic => {
                thick_line(&mut img, a, b, stroke);
                let side = inner_side(mol, &px, bond.atom1, bond.atom2);
                let (ia, ib) = shorten(offset(a, b, side * gap), offset(b, a, -side * gap), 0.15);
                if bond.order == BondOrder::Aromatic {
                    dashed_line(&mut img, ia, ib, stroke);
                } else {
                    thick_line(&mut img, ia, ib, stroke);
                }
            }
        }
    }

    let radius = (view.scale * 0.22).max(3.0) as i32;
    for (i, atom) in mol.atoms.iter().enumerate() {
        let isolated = mol.degree(i) == 0;
        if atom.atomic_number == 6 && !isolated {
            continue;
        }
        let center = (px[i].0.round() as i32, px[i].1.round() as i32);
        let r = if atom.atomic_number == 6 { (radius / 2).max(2) } else { radius };
        draw_filled_circle_mut(&mut img, center, r, cpk_color(atom.atomic_number));
        draw_hollow_circle_mut(&mut img, center, r, OUTLINE_COLOR);
    }

    Ok(img)
}

/// Draw the molecule and write it to `path` as PNG.
pub fn render_png(mol: &Molecule, options: &DepictOptions, path: &Path) -> Result<(), RenderError> {
    let img = depict(mol, options)?;
    img.save_with_format(path, ImageFormat::Png)?;
    debug!(path = %path.display(), "wrote depiction");
    Ok(())
}

/// Maps layout coordinates onto the canvas, y pointing down.
struct Viewport {
    scale: f64,
    mid_x: f64,
    mid_y: f64,
    cx: f64,
    cy: f64,
}

impl Viewport {
    fn fit(coords: &[Point], width: u32, height: u32) -> Self {
        let (w, h) = (width as f64, height as f64);
        let margin = 0.1 * w.min(h);
        let max_bond_px = 0.15 * w.min(h);
        let (min_x, max_x, min_y, max_y) = layout::bounds(coords);
        let (span_x, span_y) = (max_x - min_x, max_y - min_y);

        let mut scale = max_bond_px;
        if span_x > 1e-9 {
            scale = scale.min((w - 2.0 * margin) / span_x);
        }
        if span_y > 1e-9 {
            scale = scale.min((h - 2.0 * margin) / span_y);
        }

        Viewport {
            scale,
            mid_x: (min_x + max_x) / 2.0,
            mid_y: (min_y + max_y) / 2.0,
            cx: w / 2.0,
            cy: h / 2.0,
        }
    }

    fn project(&self, p: &Point) -> (f32, f32) {
        (
            (self.cx + (p.x - self.mid_x) * self.scale) as f32,
            (self.cy - (p.y - self.mid_y) * self.scale) as f32,
        )
    }
}

/// Shift `from` perpendicular to the `from -> to` direction by `amount` pixels.
fn offset(from: (f32, f32), to: (f32, f32), amount: f32) -> (f32, f32) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let len = (dx * dx + dy * dy).sqrt().max(1e-6);
    (from.0 - dy / len * amount, from.1 + dx / len * amount)
}

fn shorten(a: (f32, f32), b: (f32, f32), fraction: f32) -> ((f32, f32), (f32, f32)) {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    (
        (a.0 + dx * fraction, a.1 + dy * fraction),
        (b.0 - dx * fraction, b.1 - dy * fraction),
    )
}

/// +1 or -1: the side of bond a-b (in `offset` convention) where most of the
/// other neighbours of a and b lie. For ring bonds that is the ring interior.
fn inner_side(mol: &Molecule, px: &[(f32, f32)], a: usize, b: usize) -> f32 {
    let (pa, pb) = (px[a], px[b]);
    let (dx, dy) = (pb.0 - pa.0, pb.1 - pa.1);
    let mut balance = 0.0f32;
    for (end, other) in [(a, b), (b, a)] {
        for n in mol.neighbors(end).filter(|&n| n != other) {
            let (qx, qy) = (px[n].0 - pa.0, px[n].1 - pa.1);
            // offset() moves along (-dy, dx)
            balance += -dy * qx + dx * qy;
        }
    }
    if balance < 0.0 {
        -1.0
    } else {
        1.0
    }
}

fn thick_line(img: &mut RgbImage, a: (f32, f32), b: (f32, f32), stroke: f32) {
    let passes = stroke.round().max(1.0) as i32;
    for k in 0..passes {
        let shift = k as f32 - (passes - 1) as f32 / 2.0;
        draw_line_segment_mut(img, offset(a, b, shift), offset(b, a, -shift), BOND_COLOR);
    }
}

fn dashed_line(img: &mut RgbImage, a: (f32, f32), b: (f32, f32), stroke: f32) {
    const DASHES: usize = 5;
    for k in 0..DASHES {
        let t0 = k as f32 / DASHES as f32;
        let t1 = t0 + 0.6 / DASHES as f32;
        let p0 = (a.0 + (b.0 - a.0) * t0, a.1 + (b.1 - a.1) * t0);
        let p1 = (a.0 + (b.0 - a.0) * t1, a.1 + (b.1 - a.1) * t1);
        thick_line(img, p0, p1, stroke);
    }
}

/// CPK-style colours, darkened where the usual shade vanishes on white.
fn cpk_color(atomic_number: u8) -> Rgb<u8> {
    match atomic_number {
        0 => Rgb([150, 150, 150]),
        1 => Rgb([220, 220, 220]),
        5 => Rgb([255, 181, 181]),
        6 => Rgb([80, 80, 80]),
        7 => Rgb([48, 80, 248]),
        8 => Rgb([255, 13, 13]),
        9 | 17 => Rgb([31, 200, 31]),
        15 => Rgb([255, 128, 0]),
        16 => Rgb([204, 170, 0]),
        35 => Rgb([166, 41, 41]),
        53 => Rgb([148, 0, 148]),
        _ => Rgb([221, 119, 255]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::parse_smiles;

    fn has_color(img: &RgbImage, color: Rgb<u8>) -> bool {
        img.pixels().any(|p| *p == color)
    }

    #[test]
    fn depicts_ethanol_with_oxygen() {
        let mol = parse_smiles("CCO").unwrap();
        let img = depict(&mol, &DepictOptions::default()).unwrap();
        assert_eq!(img.dimensions(), (300, 300));
        assert!(has_color(&img, BOND_COLOR));
        assert!(has_color(&img, cpk_color(8)));
        assert!(!has_color(&img, cpk_color(7)));
    }

    #[test]
    fn depicts_aromatic_and_multiple_bonds() {
        for smiles in ["c1ccccc1", "C#N", "C=CC=O", "[Na+].[Cl-]", "C"] {
            let mol = parse_smiles(smiles).unwrap();
            let img = depict(&mol, &DepictOptions { width: 200, height: 120 }).unwrap();
            assert_eq!(img.dimensions(), (200, 120));
            assert!(img.pixels().any(|p| *p != BACKGROUND), "{smiles} drew nothing");
        }
    }

    #[test]
    fn rejects_empty_molecule_and_tiny_canvas() {
        let empty = parse_smiles(".").unwrap();
        assert!(matches!(depict(&empty, &DepictOptions::default()), Err(RenderError::EmptyMolecule)));
        let mol = parse_smiles("CC").unwrap();
        assert!(matches!(
            depict(&mol, &DepictOptions { width: 10, height: 300 }),
            Err(RenderError::CanvasTooSmall { .. })
        ));
    }

    #[test]
    fn refuses_to_lay_out_huge_molecules() {
        let big = parse_smiles(&"C".repeat(MAX_DEPICT_ATOMS + 1)).unwrap();
        assert!(matches!(
            depict(&big, &DepictOptions::default()),
            Err(RenderError::TooManyAtoms { atoms, limit: MAX_DEPICT_ATOMS }) if atoms == MAX_DEPICT_ATOMS + 1
        ));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.png");
        assert!(render_png(&big, &DepictOptions::default(), &path).is_err());
        assert!(!path.exists());

        let largest = parse_smiles(&"C".repeat(MAX_DEPICT_ATOMS)).unwrap();
        assert!(depict(&largest, &DepictOptions::default()).is_ok());
    }

    #[test]
    fn writes_png_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aspirin.png");
        let mol = parse_smiles("CC(=O)Oc1ccccc1C(=O)O").unwrap();
        render_png(&mol, &DepictOptions::default(), &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (300, 300));
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone").join("mol.png");
        let mol = parse_smiles("CC").unwrap();
        assert!(render_png(&mol, &DepictOptions::default(), &path).is_err());
    }
}
