use super::AnalysisError;
use crate::core::{CutoffTable, Frame};
use crate::distance_search::{search_pairs_brute_force, search_pairs_within};
use log::debug;
use serde::{Deserialize, Serialize};

/// How candidate pairs are generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SearchMethod {
    /// Periodic cell grid, O(N)
    #[default]
    Grid,
    /// All pairs, O(N²). Reference path for small systems.
    BruteForce,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f32,
}

/// Neighbor graph of a single configuration.
///
/// Only contains pairs within the cutoff of their element pair.
#[derive(Debug, Clone)]
pub struct NeighborList {
    frame: usize,
    neighbors: Vec<Vec<Neighbor>>,
    species_of: Vec<usize>,
}

impl NeighborList {
    /// Index of the configuration this graph was built for
    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// Neighbors of atom `i` sorted by distance, then by index
    pub fn neighbors(&self, i: usize) -> &[Neighbor] {
        &self.neighbors[i]
    }

    /// Number of neighbors of atom `i` of given species
    pub fn coordination(&self, i: usize, species: usize) -> usize {
        self.neighbors[i]
            .iter()
            .filter(|n| self.species_of[n.index] == species)
            .count()
    }

    /// Neighbors of atom `i` of given species
    pub fn neighbors_of_species(
        &self,
        i: usize,
        species: usize,
    ) -> impl Iterator<Item = &Neighbor> {
        self.neighbors[i]
            .iter()
            .filter(move |n| self.species_of[n.index] == species)
    }

    /// Each bonded pair once as `(i, j, distance)` with `i < j`
    pub fn iter_pairs(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        self.neighbors.iter().enumerate().flat_map(|(i, nl)| {
            nl.iter()
                .filter(move |n| n.index > i)
                .map(move |n| (i, n.index, n.distance))
        })
    }
}

/// Result of the neighbor search in one configuration
#[derive(Debug, Clone)]
pub struct NeighborSearch {
    pub graph: NeighborList,
    /// Pairs of coinciding atoms. They are never neighbors.
    pub degenerate: Vec<(usize, usize)>,
}

/// Builds neighbor graphs with element-pair specific cutoffs
#[derive(Debug, Clone)]
pub struct NeighborFinder<'a> {
    cutoffs: &'a CutoffTable,
    method: SearchMethod,
}

impl<'a> NeighborFinder<'a> {
    pub fn new(cutoffs: &'a CutoffTable) -> Self {
        Self {
            cutoffs,
            method: SearchMethod::Grid,
        }
    }

    pub fn with_method(mut self, method: SearchMethod) -> Self {
        self.method = method;
        self
    }

    pub fn find(&self, frame: &Frame) -> Result<NeighborSearch, AnalysisError> {
        let matrix = self
            .cutoffs
            .resolve(frame.species())
            .map_err(|source| AnalysisError::Cutoff {
                frame: frame.index(),
                source,
            })?;

        let pos = frame.positions();
        let radius = matrix.max();
        let pairs = match self.method {
            SearchMethod::Grid => search_pairs_within(radius, &pos, frame.pbox()),
            SearchMethod::BruteForce => search_pairs_brute_force(radius, &pos, frame.pbox()),
        };

        let mut neighbors = vec![Vec::<Neighbor>::new(); frame.len()];
        let mut degenerate = vec![];
        for p in &pairs {
            if p.d == 0.0 {
                degenerate.push((p.i, p.j));
                continue;
            }
            if p.d <= matrix.get(frame.species_of(p.i), frame.species_of(p.j)) {
                neighbors[p.i].push(Neighbor {
                    index: p.j,
                    distance: p.d,
                });
                neighbors[p.j].push(Neighbor {
                    index: p.i,
                    distance: p.d,
                });
            }
        }

        for nl in neighbors.iter_mut() {
            nl.sort_by(|a, b| {
                a.distance
                    .total_cmp(&b.distance)
                    .then(a.index.cmp(&b.index))
            });
        }

        debug!(
            "configuration {}: {} candidate pairs within {radius}, {} bonds",
            frame.index(),
            pairs.len(),
            neighbors.iter().map(|v| v.len()).sum::<usize>() / 2
        );

        Ok(NeighborSearch {
            graph: NeighborList {
                frame: frame.index(),
                neighbors,
                species_of: (0..frame.len()).map(|i| frame.species_of(i)).collect(),
            },
            degenerate,
        })
    }
}
