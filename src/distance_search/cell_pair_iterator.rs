use super::grid::{CellLoc, CellPair};
use nalgebra::Vector3;

// Half-shell search stencil
pub static STENCIL: [[Vector3<usize>; 2]; 14] = [
    // Center
    [Vector3::new(0, 0, 0), Vector3::new(0, 0, 0)],
    // Edges
    [Vector3::new(0, 0, 0), Vector3::new(1, 0, 0)], //X
    [Vector3::new(0, 0, 0), Vector3::new(0, 1, 0)], //Y
    [Vector3::new(0, 0, 0), Vector3::new(0, 0, 1)], //Z
    // Face angles
    [Vector3::new(0, 0, 0), Vector3::new(1, 1, 0)], //XY
    [Vector3::new(0, 0, 0), Vector3::new(1, 0, 1)], //XZ
    [Vector3::new(0, 0, 0), Vector3::new(0, 1, 1)], //YZ
    // Far angle
    [Vector3::new(0, 0, 0), Vector3::new(1, 1, 1)], //XYZ
    // Face-diagonals
    [Vector3::new(1, 0, 0), Vector3::new(0, 1, 0)], // XY
    [Vector3::new(1, 0, 0), Vector3::new(0, 0, 1)], // XZ
    [Vector3::new(0, 1, 0), Vector3::new(0, 0, 1)], // YZ
    // Cross-diagonals
    [Vector3::new(1, 1, 0), Vector3::new(0, 0, 1)], // XY-Z
    [Vector3::new(1, 0, 1), Vector3::new(0, 1, 0)], // XZ-Y
    [Vector3::new(0, 1, 1), Vector3::new(1, 0, 0)], // YZ-X
];

/// Iterator over pairs of neighbouring cells of a fully periodic grid.
///
/// Every unordered pair of adjacent cells is produced once for grids with
/// at least 3 cells along each axis. Axes with 1 or 2 cells are handled
/// separately, since wrapping would visit the same pair from both sides.
pub struct CellPairIter {
    grid_size: [usize; 3],
    // Current grid location
    grid_loc: CellLoc,
    // Iterator over buffer of pairs for current central cell
    buf_iter: std::vec::IntoIter<CellPair>,
}

impl CellPairIter {
    pub fn new(grid_size: &[usize; 3]) -> Self {
        let mut ret = Self {
            grid_size: *grid_size,
            buf_iter: Vec::new().into_iter(),
            grid_loc: CellLoc::zeros(),
        };
        ret.gen_buf_iter();
        ret
    }

    fn cell_pair_from_stencil(&self, mut c1: CellLoc, mut c2: CellLoc) -> Option<CellPair> {
        for d in 0..3 {
            let sz = self.grid_size[d];
            match sz {
                // Only 0:0 pair is valid
                1 => {
                    if c1[d] != 0 || c2[d] != 0 {
                        return None;
                    }
                }
                // Only pairs within limits, 0:1 covers both images
                2 => {
                    if c1[d] >= sz || c2[d] >= sz {
                        return None;
                    }
                }
                // Usual case, wrap over the right edge
                _ => {
                    c1[d] %= sz;
                    c2[d] %= sz;
                }
            };
        }
        Some(CellPair { c1, c2 })
    }

    fn gen_buf_iter(&mut self) {
        let mut buf = Vec::<CellPair>::with_capacity(STENCIL.len());
        for [o1, o2] in &STENCIL {
            let (c1, c2) = (self.grid_loc + o1, self.grid_loc + o2);
            if let Some(pair) = self.cell_pair_from_stencil(c1, c2) {
                buf.push(pair);
            }
        }
        self.buf_iter = buf.into_iter();
    }

    fn next_cell(&self) -> Option<CellLoc> {
        let mut loc = self.grid_loc;
        loc[2] += 1;
        if loc[2] == self.grid_size[2] {
            loc[2] = 0;
            loc[1] += 1;
            if loc[1] == self.grid_size[1] {
                loc[1] = 0;
                loc[0] += 1;
                if loc[0] == self.grid_size[0] {
                    return None;
                }
            }
        }
        Some(loc)
    }
}

impl Iterator for CellPairIter {
    type Item = CellPair;

    fn next(&mut self) -> Option<Self::Item> {
        let mut ret = self.buf_iter.next();
        while ret.is_none() {
            // End of buffer reached, go to the next cell
            match self.next_cell() {
                Some(c) => self.grid_loc = c,
                None => return None,
            }
            self.gen_buf_iter();
            ret = self.buf_iter.next();
        }
        ret
    }
}
