use crate::core::{Pos, Vector3f};
use thiserror::Error;

/// Axis-aligned periodic simulation box of a single configuration.
///
/// All periodic corrections in the crate go through
/// [minimum_image_delta](PeriodicBox::minimum_image_delta).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicBox {
    extents: Vector3f,
}

#[derive(Error, Debug, PartialEq)]
pub enum PeriodicBoxError {
    #[error("box length along axis {0} is not positive: {1}")]
    NonPositiveLength(usize, f32),

    #[error("box matrix is not orthogonal, element ({0},{1}) = {2}")]
    NonOrthogonal(usize, usize, f32),

    #[error("no box for configuration {frame}, only {n} boxes recorded")]
    FrameOutOfRange { frame: usize, n: usize },
}

impl PeriodicBox {
    pub fn new(lx: f32, ly: f32, lz: f32) -> Result<Self, PeriodicBoxError> {
        let extents = Vector3f::new(lx, ly, lz);
        for d in 0..3 {
            // Negated comparison also catches NaN
            if !(extents[d] > 0.0) || !extents[d].is_finite() {
                return Err(PeriodicBoxError::NonPositiveLength(d, extents[d]));
            }
        }
        Ok(Self { extents })
    }

    /// Box from a row-major 3x3 lattice matrix. Only diagonal matrices are accepted.
    pub fn from_matrix(m: [[f32; 3]; 3]) -> Result<Self, PeriodicBoxError> {
        for r in 0..3 {
            for c in 0..3 {
                if r != c && m[r][c] != 0.0 {
                    return Err(PeriodicBoxError::NonOrthogonal(r, c, m[r][c]));
                }
            }
        }
        Self::new(m[0][0], m[1][1], m[2][2])
    }

    #[inline(always)]
    pub fn extents(&self) -> Vector3f {
        self.extents
    }

    #[inline(always)]
    pub fn volume(&self) -> f32 {
        self.extents.x * self.extents.y * self.extents.z
    }

    /// Displacement `p1 - p2` reduced to the nearest periodic image.
    ///
    /// Each component is corrected as `d -= round(d/L)*L`, so its magnitude
    /// never exceeds `L/2` of the corresponding axis.
    #[inline(always)]
    pub fn minimum_image_delta(&self, p1: &Pos, p2: &Pos) -> Vector3f {
        let mut d = p1 - p2;
        for i in 0..3 {
            d[i] -= (d[i] / self.extents[i]).round() * self.extents[i];
        }
        d
    }

    #[inline(always)]
    pub fn distance_squared(&self, p1: &Pos, p2: &Pos) -> f32 {
        self.minimum_image_delta(p1, p2).norm_squared()
    }

    #[inline(always)]
    pub fn distance(&self, p1: &Pos, p2: &Pos) -> f32 {
        self.distance_squared(p1, p2).sqrt()
    }

    /// Fractional coordinates of the point
    #[inline(always)]
    pub fn to_box_coords(&self, p: &Pos) -> Vector3f {
        p.coords.component_div(&self.extents)
    }

    #[inline(always)]
    pub fn is_inside(&self, p: &Pos) -> bool {
        let v = self.to_box_coords(p);
        v[0] < 1.0 && v[1] < 1.0 && v[2] < 1.0 && v[0] >= 0.0 && v[1] >= 0.0 && v[2] >= 0.0
    }

    /// Brings the point into `[0, L)` along each axis
    #[inline(always)]
    pub fn wrap_point(&self, p: &Pos) -> Pos {
        let mut w = *p;
        for i in 0..3 {
            w[i] = w[i].rem_euclid(self.extents[i]);
            // rem_euclid may round up to L itself for tiny negative inputs
            if w[i] >= self.extents[i] {
                w[i] = 0.0;
            }
        }
        w
    }
}

/// Per-configuration boxes of a trajectory
#[derive(Debug, Default, Clone)]
pub struct BoxTrajectory {
    boxes: Vec<PeriodicBox>,
}

impl BoxTrajectory {
    pub fn new() -> Self {
        Default::default()
    }

    /// Appends the box of the next configuration and returns its index
    pub fn add_box(&mut self, lx: f32, ly: f32, lz: f32) -> Result<usize, PeriodicBoxError> {
        self.boxes.push(PeriodicBox::new(lx, ly, lz)?);
        Ok(self.boxes.len() - 1)
    }

    pub fn push(&mut self, pbox: PeriodicBox) -> usize {
        self.boxes.push(pbox);
        self.boxes.len() - 1
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn get(&self, frame: usize) -> Result<&PeriodicBox, PeriodicBoxError> {
        self.boxes.get(frame).ok_or(PeriodicBoxError::FrameOutOfRange {
            frame,
            n: self.boxes.len(),
        })
    }

    pub fn volume(&self, frame: usize) -> Result<f32, PeriodicBoxError> {
        Ok(self.get(frame)?.volume())
    }

    pub fn dimensions(&self, frame: usize) -> Result<[f32; 3], PeriodicBoxError> {
        let e = self.get(frame)?.extents();
        Ok([e.x, e.y, e.z])
    }

    pub fn minimum_image_delta(
        &self,
        p1: &Pos,
        p2: &Pos,
        frame: usize,
    ) -> Result<Vector3f, PeriodicBoxError> {
        Ok(self.get(frame)?.minimum_image_delta(p1, p2))
    }
}
