use super::{atomic_number, element_mass, Pos};

/// Atom of a single configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Identifier, unique within the configuration.
    pub id: usize,
    /// Element symbol as written in the trajectory.
    pub element: String,
    /// Position. Wrapped into the box once the atom becomes part of a [Frame](super::Frame).
    pub pos: Pos,
}

impl Atom {
    pub fn new(id: usize, element: impl Into<String>, pos: Pos) -> Self {
        Self {
            id,
            element: element.into(),
            pos,
        }
    }

    /// Atomic number, or `None` if the element symbol is not in the periodic table
    pub fn atomic_number(&self) -> Option<usize> {
        atomic_number(&self.element)
    }

    /// Mass in atomic units. Unknown elements have zero mass.
    pub fn mass(&self) -> f32 {
        element_mass(&self.element).unwrap_or(0.0)
    }
}
