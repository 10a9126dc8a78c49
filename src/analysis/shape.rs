//! Deviation of coordination polyhedra from ideal shapes.
//!
//! All metrics work on the ligand-ligand distances of a single polyhedron.
//! The distances are sorted ascending before the longest ones are rescaled
//! to the length of an ideal edge, so the result does not depend on the
//! input order.

use super::stats::Histogram;
use serde::{Deserialize, Serialize};
use std::f64::consts::SQRT_2;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    #[error("expected {expected} ligand-ligand distances, found {found}")]
    DistanceCount { expected: usize, found: usize },

    #[error("all ligand-ligand distances are zero")]
    ZeroSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolyhedronShape {
    Tetrahedron,
    SquarePyramid,
    TrigonalBipyramid,
    Octahedron,
}

impl std::fmt::Display for PolyhedronShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Tetrahedron => "tetrahedron",
            Self::SquarePyramid => "square_pyramid",
            Self::TrigonalBipyramid => "trigonal_bipyramid",
            Self::Octahedron => "octahedron",
        };
        write!(f, "{s}")
    }
}

fn sorted_checked(distances: &[f64], expected: usize) -> Result<Vec<f64>, ShapeError> {
    if distances.len() != expected {
        return Err(ShapeError::DistanceCount {
            expected,
            found: distances.len(),
        });
    }
    let mut d = distances.to_vec();
    d.sort_by(|a, b| a.total_cmp(b));
    Ok(d)
}

// Σ_{i<j}(di-dj)² / (norm·<d²>)
fn deviation(d: &[f64], norm: f64) -> Result<f64, ShapeError> {
    let mean2 = d.iter().map(|v| v * v).sum::<f64>() / d.len() as f64;
    if mean2 == 0.0 {
        return Err(ShapeError::ZeroSize);
    }
    let mut s = 0.0;
    for i in 0..d.len() {
        for j in i + 1..d.len() {
            s += (d[i] - d[j]).powi(2);
        }
    }
    Ok(s / (norm * mean2))
}

fn scale_longest(d: &mut [f64], n: usize, factor: f64) {
    let len = d.len();
    for v in &mut d[len - n..] {
        *v /= factor;
    }
}

/// Deviation of 4 ligands from the regular tetrahedron. Needs 6 distances.
pub fn tetrahedricity(distances: &[f64]) -> Result<f64, ShapeError> {
    let d = sorted_checked(distances, 6)?;
    deviation(&d, 15.0)
}

/// Deviations of a 5-ligand unit from both ideal pentahedra
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pentahedricity {
    pub square_pyramid: f64,
    pub trigonal_bipyramid: f64,
}

impl Pentahedricity {
    /// Closest ideal shape. Equal deviations resolve to the trigonal bipyramid.
    pub fn shape(&self) -> PolyhedronShape {
        if self.square_pyramid < self.trigonal_bipyramid {
            PolyhedronShape::SquarePyramid
        } else {
            PolyhedronShape::TrigonalBipyramid
        }
    }

    pub fn value(&self) -> f64 {
        self.square_pyramid.min(self.trigonal_bipyramid)
    }
}

/// Needs 10 distances.
///
/// For the square pyramid the two base diagonals are scaled by 1/√2,
/// for the trigonal bipyramid the apex-apex distance is scaled by 1/√(8/3).
pub fn pentahedricity(distances: &[f64]) -> Result<Pentahedricity, ShapeError> {
    let d = sorted_checked(distances, 10)?;

    let mut sqp = d.clone();
    scale_longest(&mut sqp, 2, SQRT_2);

    let mut tbp = d;
    scale_longest(&mut tbp, 1, (8.0f64 / 3.0).sqrt());

    Ok(Pentahedricity {
        square_pyramid: deviation(&sqp, 45.0)?,
        trigonal_bipyramid: deviation(&tbp, 45.0)?,
    })
}

/// Deviation of 6 ligands from the regular octahedron. Needs 15 distances.
pub fn octahedricity(distances: &[f64]) -> Result<f64, ShapeError> {
    let mut d = sorted_checked(distances, 15)?;
    scale_longest(&mut d, 3, SQRT_2);
    deviation(&d, 105.0)
}

/// Shape metric of a single polyhedron
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PolyhedronMetrics {
    Tetrahedron(f64),
    Pentahedron(Pentahedricity),
    Octahedron(f64),
}

impl PolyhedronMetrics {
    pub fn shape(&self) -> PolyhedronShape {
        match self {
            Self::Tetrahedron(_) => PolyhedronShape::Tetrahedron,
            Self::Pentahedron(p) => p.shape(),
            Self::Octahedron(_) => PolyhedronShape::Octahedron,
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            Self::Tetrahedron(v) | Self::Octahedron(v) => *v,
            Self::Pentahedron(p) => p.value(),
        }
    }
}

/// Evaluates the metric matching the number of ligands.
///
/// Units with other than 4, 5 or 6 ligands have no reference shape and give `None`.
pub fn classify_polyhedron(
    n_ligands: usize,
    distances: &[f64],
) -> Result<Option<PolyhedronMetrics>, ShapeError> {
    Ok(match n_ligands {
        4 => Some(PolyhedronMetrics::Tetrahedron(tetrahedricity(distances)?)),
        5 => Some(PolyhedronMetrics::Pentahedron(pentahedricity(distances)?)),
        6 => Some(PolyhedronMetrics::Octahedron(octahedricity(distances)?)),
        _ => None,
    })
}

//====================================================================

/// Distributions of shape metrics accumulated over many polyhedra
#[derive(Debug, Clone)]
pub struct ShapeHistograms {
    tetrahedra: Histogram,
    pentahedra: Histogram,
    square_pyramid_all: Histogram,
    square_pyramid: Histogram,
    trigonal_bipyramid_all: Histogram,
    trigonal_bipyramid: Histogram,
    octahedra: Histogram,
    n_tetrahedra: usize,
    n_pentahedra: usize,
    n_octahedra: usize,
    n_out_of_range: usize,
}

/// Normalized shape distributions, one value per bin center
#[derive(Debug, Clone)]
pub struct ShapeDistribution {
    pub bin_centers: Vec<f64>,
    pub tetrahedra: Vec<f64>,
    pub pentahedra: Vec<f64>,
    pub square_pyramid_all: Vec<f64>,
    pub square_pyramid: Vec<f64>,
    pub trigonal_bipyramid_all: Vec<f64>,
    pub trigonal_bipyramid: Vec<f64>,
    pub octahedra: Vec<f64>,
    /// Polyhedra with a metric beyond the histogram range. They are counted
    /// in the normalization, so the columns sum to less than one.
    pub out_of_range: usize,
}

impl ShapeHistograms {
    pub fn new(max: f64, n_bins: usize) -> Self {
        let h = Histogram::new(0.0, max, n_bins);
        Self {
            tetrahedra: h.clone(),
            pentahedra: h.clone(),
            square_pyramid_all: h.clone(),
            square_pyramid: h.clone(),
            trigonal_bipyramid_all: h.clone(),
            trigonal_bipyramid: h.clone(),
            octahedra: h,
            n_tetrahedra: 0,
            n_pentahedra: 0,
            n_octahedra: 0,
            n_out_of_range: 0,
        }
    }

    /// Adds one polyhedron. Returns false if its metric is beyond the histogram range.
    pub fn add(&mut self, m: &PolyhedronMetrics) -> bool {
        let in_range = match m {
            PolyhedronMetrics::Tetrahedron(v) => {
                self.n_tetrahedra += 1;
                self.tetrahedra.add(*v)
            }
            PolyhedronMetrics::Pentahedron(p) => {
                self.square_pyramid_all.add(p.square_pyramid);
                self.trigonal_bipyramid_all.add(p.trigonal_bipyramid);
                match p.shape() {
                    PolyhedronShape::SquarePyramid => self.square_pyramid.add(p.square_pyramid),
                    _ => self.trigonal_bipyramid.add(p.trigonal_bipyramid),
                };
                self.n_pentahedra += 1;
                self.pentahedra.add(p.value())
            }
            PolyhedronMetrics::Octahedron(v) => {
                self.n_octahedra += 1;
                self.octahedra.add(*v)
            }
        };
        if !in_range {
            self.n_out_of_range += 1;
        }
        in_range
    }

    pub fn merge(&mut self, other: &ShapeHistograms) {
        self.tetrahedra.merge(&other.tetrahedra);
        self.pentahedra.merge(&other.pentahedra);
        self.square_pyramid_all.merge(&other.square_pyramid_all);
        self.square_pyramid.merge(&other.square_pyramid);
        self.trigonal_bipyramid_all.merge(&other.trigonal_bipyramid_all);
        self.trigonal_bipyramid.merge(&other.trigonal_bipyramid);
        self.octahedra.merge(&other.octahedra);
        self.n_tetrahedra += other.n_tetrahedra;
        self.n_pentahedra += other.n_pentahedra;
        self.n_octahedra += other.n_octahedra;
        self.n_out_of_range += other.n_out_of_range;
    }

    pub fn counts(&self) -> (usize, usize, usize) {
        (self.n_tetrahedra, self.n_pentahedra, self.n_octahedra)
    }

    pub fn out_of_range(&self) -> usize {
        self.n_out_of_range
    }

    /// Fractions of polyhedra per bin. All pentahedra columns are normalized
    /// by the total number of pentahedra.
    pub fn finalize(&self) -> ShapeDistribution {
        fn norm(h: &Histogram, n: usize) -> Vec<f64> {
            if n == 0 {
                return vec![0.0; h.n_bins()];
            }
            h.counts().iter().map(|c| c / n as f64).collect()
        }

        ShapeDistribution {
            bin_centers: self.tetrahedra.bin_centers(),
            tetrahedra: norm(&self.tetrahedra, self.n_tetrahedra),
            pentahedra: norm(&self.pentahedra, self.n_pentahedra),
            square_pyramid_all: norm(&self.square_pyramid_all, self.n_pentahedra),
            square_pyramid: norm(&self.square_pyramid, self.n_pentahedra),
            trigonal_bipyramid_all: norm(&self.trigonal_bipyramid_all, self.n_pentahedra),
            trigonal_bipyramid: norm(&self.trigonal_bipyramid, self.n_pentahedra),
            octahedra: norm(&self.octahedra, self.n_octahedra),
            out_of_range: self.n_out_of_range,
        }
    }
}
