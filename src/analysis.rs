//! Structural analyses of configurations and trajectories.

mod bond_angles;
mod connectivity;
mod neighbors;
mod pair_distribution;
mod settings;
mod shape;
mod stats;
mod trajectory;

pub use {
    bond_angles::*,
    connectivity::*,
    neighbors::*,
    pair_distribution::*,
    settings::*,
    shape::*,
    stats::*,
    trajectory::*,
};
