//! Structural analysis of MD trajectories of glassy network materials.
//!
//! The crate finds periodic neighbor lists with element-pair specific cutoffs
//! and derives coordination numbers, Qⁿ speciation, corner/edge/face sharing of
//! coordination polyhedra, polyhedron shape metrics, pair distribution functions
//! and bond angle distributions.

pub mod core;
pub mod distance_search;
pub mod analysis;
pub mod io;

pub mod prelude {
    pub use crate::core::*;
    pub use crate::distance_search::*;
    pub use crate::analysis::*;
    pub use crate::io::*;
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn greeting(tool: &str) {
    use comfy_table::modifiers::UTF8_ROUND_CORNERS;
    use comfy_table::presets::UTF8_FULL;
    use comfy_table::{Attribute, Cell, Table};

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .add_row(vec![Cell::new("MolAR Glass - structure of network glasses")
            .add_attributes(vec![Attribute::Bold])])
        .add_row(vec![format!(
            "{}\n{}",
            env!("CARGO_PKG_HOMEPAGE"),
            env!("CARGO_PKG_AUTHORS")
        )])
        .add_row(vec![format!("molar_glass version: {VERSION}")])
        .add_row(vec![format!("Tool: {tool}")]);
    println!("{table}");
}
