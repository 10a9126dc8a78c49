use super::SearchMethod;
use crate::core::{CutoffEntry, CutoffError, CutoffTable};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error(transparent)]
    Cutoff(#[from] CutoffError),

    #[error("{what}: upper bound {max} is not above lower bound {min}")]
    InvalidRange { what: String, min: f64, max: f64 },

    #[error("{0}: number of bins is zero")]
    ZeroBins(String),

    #[error("{0}: empty element name")]
    EmptyElement(String),

    #[error("unknown preset '{0}', expected 'SiO2' or 'Na2SiO3'")]
    UnknownPreset(String),

    #[error("can't read settings file")]
    Io(#[from] std::io::Error),

    #[error("malformed settings")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementPair {
    pub element1: String,
    pub element2: String,
}

impl ElementPair {
    pub fn new(e1: &str, e2: &str) -> Self {
        Self {
            element1: e1.into(),
            element2: e2.into(),
        }
    }
}

impl std::fmt::Display for ElementPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.element1, self.element2)
    }
}

/// Triplet of elements, the second one is the vertex of the angle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementTriplet {
    pub element1: String,
    pub element2: String,
    pub element3: String,
}

impl ElementTriplet {
    pub fn new(e1: &str, e2: &str, e3: &str) -> Self {
        Self {
            element1: e1.into(),
            element2: e2.into(),
            element3: e3.into(),
        }
    }
}

impl std::fmt::Display for ElementTriplet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.element1, self.element2, self.element3)
    }
}

/// Which analyses are performed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Properties {
    pub structural_units: bool,
    pub pair_distribution: bool,
    pub bond_angles: bool,
}

impl Default for Properties {
    fn default() -> Self {
        Self {
            structural_units: true,
            pair_distribution: true,
            bond_angles: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PairDistributionSettings {
    pub r_min: f64,
    pub r_max: f64,
    pub n_bins: usize,
    pub pairs: Vec<ElementPair>,
}

impl Default for PairDistributionSettings {
    fn default() -> Self {
        Self {
            r_min: 0.0,
            r_max: 10.0,
            n_bins: 300,
            pairs: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BondAngleSettings {
    pub theta_min: f64,
    pub theta_max: f64,
    pub n_bins: usize,
    pub triplets: Vec<ElementTriplet>,
}

impl Default for BondAngleSettings {
    fn default() -> Self {
        Self {
            theta_min: 0.0,
            theta_max: 180.0,
            n_bins: 300,
            triplets: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuralUnitSettings {
    /// Network-forming element at the center of polyhedra
    pub central: String,
    /// Element at the vertices of polyhedra
    pub ligand: String,
    /// Upper bound of shape metric histograms
    pub shape_max: f64,
    pub shape_bins: usize,
}

impl Default for StructuralUnitSettings {
    fn default() -> Self {
        Self {
            central: "Si".into(),
            ligand: "O".into(),
            shape_max: 0.5,
            shape_bins: 1000,
        }
    }
}

/// Complete analysis settings. Missing fields are taken from the SiO2 preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub neighbor_search: SearchMethod,
    pub cutoffs: Vec<CutoffEntry>,
    pub properties: Properties,
    pub pair_distribution: PairDistributionSettings,
    pub bond_angles: BondAngleSettings,
    pub structural_units: StructuralUnitSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self::sio2()
    }
}

impl Settings {
    /// Pure silica
    pub fn sio2() -> Self {
        Self {
            cutoffs: vec![
                CutoffEntry::new("O", "O", 3.05),
                CutoffEntry::new("Si", "O", 2.30),
                CutoffEntry::new("Si", "Si", 3.50),
            ],
            properties: Default::default(),
            pair_distribution: PairDistributionSettings {
                pairs: vec![
                    ElementPair::new("Si", "Si"),
                    ElementPair::new("Si", "O"),
                    ElementPair::new("O", "O"),
                ],
                ..Default::default()
            },
            bond_angles: BondAngleSettings {
                triplets: vec![
                    ElementTriplet::new("Si", "O", "Si"),
                    ElementTriplet::new("O", "Si", "O"),
                    ElementTriplet::new("Si", "Si", "Si"),
                    ElementTriplet::new("O", "O", "O"),
                ],
                ..Default::default()
            },
            structural_units: Default::default(),
            neighbor_search: SearchMethod::Grid,
        }
    }

    /// Sodium metasilicate
    pub fn na2sio3() -> Self {
        Self {
            cutoffs: vec![
                CutoffEntry::new("O", "O", 2.80),
                CutoffEntry::new("Si", "O", 2.00),
                CutoffEntry::new("Si", "Si", 3.50),
                CutoffEntry::new("Na", "Na", 4.00),
                CutoffEntry::new("Na", "Si", 4.00),
                CutoffEntry::new("Na", "O", 3.00),
            ],
            properties: Default::default(),
            pair_distribution: PairDistributionSettings {
                pairs: vec![
                    ElementPair::new("Si", "Si"),
                    ElementPair::new("Si", "O"),
                    ElementPair::new("O", "O"),
                    ElementPair::new("Na", "Na"),
                    ElementPair::new("Na", "Si"),
                    ElementPair::new("Na", "O"),
                ],
                ..Default::default()
            },
            bond_angles: BondAngleSettings {
                triplets: vec![
                    ElementTriplet::new("Si", "O", "Si"),
                    ElementTriplet::new("O", "Si", "O"),
                    ElementTriplet::new("Si", "Si", "Si"),
                    ElementTriplet::new("O", "O", "O"),
                    ElementTriplet::new("Na", "Na", "Na"),
                    ElementTriplet::new("Na", "Si", "Na"),
                    ElementTriplet::new("Na", "O", "Na"),
                ],
                ..Default::default()
            },
            structural_units: Default::default(),
            neighbor_search: SearchMethod::Grid,
        }
    }

    pub fn preset(name: &str) -> Result<Self, SettingsError> {
        match name.to_lowercase().as_str() {
            "sio2" => Ok(Self::sio2()),
            "na2sio3" => Ok(Self::na2sio3()),
            _ => Err(SettingsError::UnknownPreset(name.to_owned())),
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    pub fn cutoff_table(&self) -> Result<CutoffTable, SettingsError> {
        Ok(CutoffTable::new(self.cutoffs.iter().cloned())?)
    }

    /// Checks consistency of all sections.
    ///
    /// Every requested pair and triplet must have cutoffs for its bonds.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let table = self.cutoff_table()?;

        fn check_range(what: &str, min: f64, max: f64, n_bins: usize) -> Result<(), SettingsError> {
            if !(max > min) {
                return Err(SettingsError::InvalidRange {
                    what: what.into(),
                    min,
                    max,
                });
            }
            if n_bins == 0 {
                return Err(SettingsError::ZeroBins(what.into()));
            }
            Ok(())
        }

        fn check_names<'a>(
            what: impl std::fmt::Display,
            names: impl IntoIterator<Item = &'a String>,
        ) -> Result<(), SettingsError> {
            if names.into_iter().any(|s| s.trim().is_empty()) {
                return Err(SettingsError::EmptyElement(what.to_string()));
            }
            Ok(())
        }

        for c in &self.cutoffs {
            check_names("cutoffs", [&c.element1, &c.element2])?;
        }

        let pd = &self.pair_distribution;
        check_range("pair_distribution", pd.r_min, pd.r_max, pd.n_bins)?;
        if pd.r_min < 0.0 {
            return Err(SettingsError::InvalidRange {
                what: "pair_distribution".into(),
                min: pd.r_min,
                max: pd.r_max,
            });
        }
        for p in &pd.pairs {
            check_names(p, [&p.element1, &p.element2])?;
            table.lookup(&p.element1, &p.element2)?;
        }

        let ba = &self.bond_angles;
        check_range("bond_angles", ba.theta_min, ba.theta_max, ba.n_bins)?;
        for t in &ba.triplets {
            check_names(t, [&t.element1, &t.element2, &t.element3])?;
            table.lookup(&t.element1, &t.element2)?;
            table.lookup(&t.element2, &t.element3)?;
        }

        let su = &self.structural_units;
        check_range("structural_units", 0.0, su.shape_max, su.shape_bins)?;
        check_names("structural_units", [&su.central, &su.ligand])?;

        Ok(())
    }
}
