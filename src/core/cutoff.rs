use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Single entry of the cutoff table as it appears in the settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutoffEntry {
    pub element1: String,
    pub element2: String,
    pub value: f32,
}

impl CutoffEntry {
    pub fn new(element1: impl Into<String>, element2: impl Into<String>, value: f32) -> Self {
        Self {
            element1: element1.into(),
            element2: element2.into(),
            value,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CutoffError {
    #[error("missing cutoff for element pair {0}-{1}")]
    Missing(String, String),

    #[error("cutoff for {0}-{1} is not positive: {2}")]
    NonPositive(String, String, f32),

    #[error("conflicting cutoffs for {0}-{1}: {2} and {3}")]
    Conflict(String, String, f32, f32),

    #[error("cutoff table is empty")]
    Empty,
}

/// Symmetric mapping from unordered element pairs to cutoff radii.
#[derive(Debug, Clone)]
pub struct CutoffTable {
    values: FxHashMap<(String, String), f32>,
    max_cutoff: f32,
}

// Unordered pair is stored under lexicographically ordered key
fn pair_key(e1: &str, e2: &str) -> (String, String) {
    if e1 <= e2 {
        (e1.to_owned(), e2.to_owned())
    } else {
        (e2.to_owned(), e1.to_owned())
    }
}

impl CutoffTable {
    pub fn new(entries: impl IntoIterator<Item = CutoffEntry>) -> Result<Self, CutoffError> {
        let mut values = FxHashMap::default();
        let mut max_cutoff = 0.0f32;
        for e in entries {
            if !(e.value > 0.0) || !e.value.is_finite() {
                return Err(CutoffError::NonPositive(e.element1, e.element2, e.value));
            }
            let key = pair_key(&e.element1, &e.element2);
            if let Some(old) = values.insert(key, e.value) {
                if old != e.value {
                    return Err(CutoffError::Conflict(e.element1, e.element2, old, e.value));
                }
            }
            max_cutoff = max_cutoff.max(e.value);
        }

        if values.is_empty() {
            return Err(CutoffError::Empty);
        }

        Ok(Self { values, max_cutoff })
    }

    /// Cutoff for the pair of elements in any order
    pub fn lookup(&self, e1: &str, e2: &str) -> Result<f32, CutoffError> {
        self.values
            .get(&pair_key(e1, e2))
            .copied()
            .ok_or_else(|| CutoffError::Missing(e1.to_owned(), e2.to_owned()))
    }

    /// Largest configured cutoff. Used as a search radius of the spatial grid.
    pub fn max_cutoff(&self) -> f32 {
        self.max_cutoff
    }

    /// Sorted list of all elements mentioned in the table
    pub fn elements(&self) -> Vec<String> {
        let mut el: Vec<String> = self
            .values
            .keys()
            .flat_map(|(a, b)| [a.clone(), b.clone()])
            .collect();
        el.sort();
        el.dedup();
        el
    }

    /// Resolves the table for the species present in a configuration.
    ///
    /// Fails if any pair of present species has no cutoff.
    pub fn resolve(&self, species: &[String]) -> Result<CutoffMatrix, CutoffError> {
        let n = species.len();
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            for j in i..n {
                let c = self.lookup(&species[i], &species[j])?;
                data[i * n + j] = c;
                data[j * n + i] = c;
            }
        }
        Ok(CutoffMatrix { n, data })
    }
}

/// Dense species×species cutoff matrix for one configuration
#[derive(Debug, Clone)]
pub struct CutoffMatrix {
    n: usize,
    data: Vec<f32>,
}

impl CutoffMatrix {
    #[inline(always)]
    pub fn get(&self, s1: usize, s2: usize) -> f32 {
        self.data[s1 * self.n + s2]
    }

    pub fn max(&self) -> f32 {
        self.data.iter().cloned().fold(0.0, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sio2() -> CutoffTable {
        CutoffTable::new([
            CutoffEntry::new("O", "O", 3.05),
            CutoffEntry::new("Si", "O", 2.30),
            CutoffEntry::new("Si", "Si", 3.50),
        ])
        .unwrap()
    }

    #[test]
    fn order_independent() -> anyhow::Result<()> {
        let t = sio2();
        assert_eq!(t.lookup("Si", "O")?, 2.30);
        assert_eq!(t.lookup("O", "Si")?, 2.30);
        assert_eq!(t.max_cutoff(), 3.50);
        assert_eq!(t.elements(), vec!["O".to_owned(), "Si".to_owned()]);
        Ok(())
    }

    #[test]
    fn missing_pair() {
        let t = sio2();
        assert_eq!(
            t.lookup("Na", "O"),
            Err(CutoffError::Missing("Na".into(), "O".into()))
        );
        assert!(t.resolve(&["O".into(), "Na".into()]).is_err());
    }

    #[test]
    fn invalid_tables() {
        assert_eq!(CutoffTable::new([]).unwrap_err(), CutoffError::Empty);
        assert!(matches!(
            CutoffTable::new([CutoffEntry::new("O", "O", -1.0)]),
            Err(CutoffError::NonPositive(..))
        ));
        assert!(matches!(
            CutoffTable::new([
                CutoffEntry::new("Si", "O", 2.0),
                CutoffEntry::new("O", "Si", 2.3)
            ]),
            Err(CutoffError::Conflict(..))
        ));
    }

    #[test]
    fn resolved_matrix() -> anyhow::Result<()> {
        let m = sio2().resolve(&["Si".into(), "O".into()])?;
        assert_eq!(m.get(0, 1), 2.30);
        assert_eq!(m.get(1, 0), 2.30);
        assert_eq!(m.get(1, 1), 3.05);
        assert_eq!(m.max(), 3.50);
        Ok(())
    }
}
