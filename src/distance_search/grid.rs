use num_traits::clamp_min;

use crate::core::{IdPosIterator, PeriodicBox, Pos, Vector3f};

//====================================================================
// Cell location in the grid
pub type CellLoc = nalgebra::Vector3<usize>;

//====================================================================
// Grid cell with points and indexes
#[derive(Debug, Clone, Default)]
pub struct GridCellData {
    pub ids: Vec<usize>,
    pub coords: Vec<Pos>,
}

impl GridCellData {
    pub fn add(&mut self, id: usize, coord: &Pos) {
        self.ids.push(id);
        self.coords.push(*coord);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

//======================================================================
// The pair of cells for searching
#[derive(Debug, Clone, PartialEq)]
pub struct CellPair {
    pub c1: CellLoc,
    pub c2: CellLoc,
}

//=============================================================

/// Regular grid covering the periodic box.
///
/// Each cell is at least `cutoff` wide along every axis, so all pairs within
/// the cutoff are found in the same or adjacent cells.
#[derive(Debug, Clone)]
pub struct Grid<T> {
    pub data: ndarray::Array3<T>,
    pub n_items: usize,
}

impl<T> Grid<T>
where
    T: Default,
{
    pub fn new(sz: [usize; 3]) -> Self {
        Self {
            data: ndarray::Array3::<T>::from_shape_simple_fn(sz, || T::default()),
            n_items: 0,
        }
    }

    pub fn from_cutoff_and_extents(cutoff: f32, extents: &Vector3f) -> Self {
        let mut sz = [0, 0, 0];
        // Cell size should be >= cutoff for all dimentions
        for d in 0..3 {
            sz[d] = clamp_min((extents[d] / cutoff).floor() as usize, 1);
        }
        Self::new(sz)
    }

    pub fn from_cutoff_and_box(cutoff: f32, pbox: &PeriodicBox) -> Self {
        Self::from_cutoff_and_extents(cutoff, &pbox.extents())
    }

    pub fn dim(&self) -> [usize; 3] {
        let d = self.data.dim();
        [d.0, d.1, d.2]
    }
}

impl Grid<GridCellData> {
    /// Distributes points over the cells. Points outside the box are put
    /// into the cell of their periodic image.
    pub fn populate_periodic<'a>(&mut self, id_pos: impl IdPosIterator<'a>, pbox: &PeriodicBox) {
        let dim = self.dim();
        for (id, pos) in id_pos {
            let rel = pbox.to_box_coords(pos);
            let mut ind = [0usize, 0, 0];
            for d in 0..3 {
                ind[d] = ((rel[d] * dim[d] as f32).floor().rem_euclid(dim[d] as f32) as usize)
                    // rel could be 1.00001 due to float point errors
                    .min(dim[d] - 1);
            }
            self.data[ind].add(id, pos);
            self.n_items += 1;
        }
    }
}

// Implement indexing by nalgebra Vector3 for generic Grid
impl<T> std::ops::Index<&CellLoc> for Grid<T> {
    type Output = T;

    fn index(&self, index: &CellLoc) -> &Self::Output {
        &self.data[(index.x, index.y, index.z)]
    }
}

impl<T> std::ops::IndexMut<&CellLoc> for Grid<T> {
    fn index_mut(&mut self, index: &CellLoc) -> &mut Self::Output {
        &mut self.data[(index.x, index.y, index.z)]
    }
}

//============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_size_from_cutoff() -> anyhow::Result<()> {
        let b = PeriodicBox::new(10.0, 7.0, 2.0)?;
        let gr = Grid::<GridCellData>::from_cutoff_and_box(3.0, &b);
        assert_eq!(gr.dim(), [3, 2, 1]);
        Ok(())
    }

    #[test]
    fn periodic_population() -> anyhow::Result<()> {
        let b = PeriodicBox::new(10.0, 10.0, 10.0)?;
        let pts = [
            Pos::new(0.5, 0.5, 0.5),
            Pos::new(9.99, 5.0, 5.0),
            Pos::new(-0.5, 5.0, 5.0),
            Pos::new(10.0, 0.0, 0.0),
        ];
        let mut gr = Grid::<GridCellData>::from_cutoff_and_box(2.5, &b);
        gr.populate_periodic(pts.iter().enumerate(), &b);
        assert_eq!(gr.n_items, 4);
        assert_eq!(gr.data[[0, 0, 0]].ids, vec![0, 3]);
        assert_eq!(gr.data[[3, 2, 2]].ids, vec![1, 2]);
        Ok(())
    }
}
