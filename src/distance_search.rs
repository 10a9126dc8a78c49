//! Periodic distance search on a cell grid.

mod cell_pair_iterator;
mod grid;
mod search;

pub use search::*;
