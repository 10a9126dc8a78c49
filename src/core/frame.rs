use super::{Atom, PeriodicBox, Pos};
use rustc_hash::FxHashMap;
use thiserror::Error;

const AMU_TO_G: f64 = 1.66053906660e-24;
const A3_TO_CM3: f64 = 1e-24;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    #[error("configuration {0} contains no atoms")]
    Empty(usize),

    #[error("configuration {frame}: atom {id} has unknown element '{element}'")]
    UnknownElement {
        frame: usize,
        id: usize,
        element: String,
    },

    #[error("configuration {frame}: duplicate atom id {id}")]
    DuplicateId { frame: usize, id: usize },
}

/// Single configuration of the trajectory: atoms and the box they live in.
///
/// Element symbols are interned per configuration, so analysis code works
/// with small integer species indices instead of strings.
#[derive(Debug, Clone)]
pub struct Frame {
    index: usize,
    atoms: Vec<Atom>,
    pbox: PeriodicBox,
    species: Vec<String>,
    species_of: Vec<usize>,
}

impl Frame {
    /// Creates a configuration and wraps all positions into the box.
    pub fn new(index: usize, mut atoms: Vec<Atom>, pbox: PeriodicBox) -> Result<Self, FrameError> {
        if atoms.is_empty() {
            return Err(FrameError::Empty(index));
        }

        let mut species = Vec::<String>::new();
        let mut species_of = Vec::with_capacity(atoms.len());
        let mut lookup = FxHashMap::<String, usize>::default();
        let mut ids = FxHashMap::<usize, ()>::default();

        for at in atoms.iter_mut() {
            if at.atomic_number().is_none() {
                return Err(FrameError::UnknownElement {
                    frame: index,
                    id: at.id,
                    element: at.element.clone(),
                });
            }
            if ids.insert(at.id, ()).is_some() {
                return Err(FrameError::DuplicateId {
                    frame: index,
                    id: at.id,
                });
            }

            let s = match lookup.get(&at.element) {
                Some(&s) => s,
                None => {
                    species.push(at.element.clone());
                    lookup.insert(at.element.clone(), species.len() - 1);
                    species.len() - 1
                }
            };
            species_of.push(s);

            at.pos = pbox.wrap_point(&at.pos);
        }

        Ok(Self {
            index,
            atoms,
            pbox,
            species,
            species_of,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom(&self, i: usize) -> &Atom {
        &self.atoms[i]
    }

    pub fn pbox(&self) -> &PeriodicBox {
        &self.pbox
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Wrapped positions in atom order
    pub fn positions(&self) -> Vec<Pos> {
        self.atoms.iter().map(|a| a.pos).collect()
    }

    /// Element symbols present in the configuration in order of first appearance
    pub fn species(&self) -> &[String] {
        &self.species
    }

    /// Species index of atom `i`
    #[inline(always)]
    pub fn species_of(&self, i: usize) -> usize {
        self.species_of[i]
    }

    pub fn species_index(&self, element: &str) -> Option<usize> {
        self.species.iter().position(|s| s == element)
    }

    pub fn count(&self, element: &str) -> usize {
        match self.species_index(element) {
            Some(s) => self.species_of.iter().filter(|&&v| v == s).count(),
            None => 0,
        }
    }

    pub fn indices_of(&self, element: &str) -> Vec<usize> {
        match self.species_index(element) {
            Some(s) => self
                .species_of
                .iter()
                .enumerate()
                .filter_map(|(i, &v)| (v == s).then_some(i))
                .collect(),
            None => vec![],
        }
    }

    /// Box volume in Å³
    pub fn volume(&self) -> f64 {
        self.pbox.volume() as f64
    }

    /// Mass density in g/cm³, assuming lengths in Å
    pub fn density(&self) -> f64 {
        let mass: f64 = self.atoms.iter().map(|a| a.mass() as f64).sum();
        mass * AMU_TO_G / (self.volume() * A3_TO_CM3)
    }
}
