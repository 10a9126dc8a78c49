mod atom;
mod cutoff;
mod frame;
mod periodic_box;
mod periodic_table;

pub use {
    atom::*,
    cutoff::*,
    frame::*,
    periodic_box::*,
    periodic_table::*,
};

// Aliases for vector and points
pub type Vector3f = nalgebra::Vector3<f32>;
pub type Pos = nalgebra::Point3<f32>; // Atom position

// Alias trait for iterators over (index, position) pairs
pub trait IdPosIterator<'a>: Iterator<Item = (usize, &'a Pos)> {}
impl<'a, T> IdPosIterator<'a> for T where T: Iterator<Item = (usize, &'a Pos)> {}
