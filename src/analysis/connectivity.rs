use super::shape::{classify_polyhedron, PolyhedronMetrics, PolyhedronShape};
use super::{AnalysisError, FrameWarning, NeighborList};
use crate::core::Frame;
use itertools::Itertools;
use log::warn;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Coordination classes of central atoms reported as separate columns
pub const CENTRAL_CLASSES: std::ops::RangeInclusive<usize> = 3..=7;
/// Ligand coordination classes: free, non-bridging, bridging, tri- and quadri-cluster.
/// Higher coordinations are reported together in one more column.
pub const LIGAND_CLASSES: std::ops::RangeInclusive<usize> = 0..=4;
/// Coordination classes of central atoms with separate sharing statistics
pub const SHARING_CLASSES: std::ops::RangeInclusive<usize> = 4..=6;

/// Role of an element in the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Network former at the center of a coordination polyhedron
    Central,
    /// Atom at the vertices of polyhedra
    Ligand,
    /// Any other element, e.g. a network modifier
    Inert,
}

/// Number of polyhedra sharing one, two or three ligands with a given one
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Sharing {
    pub corner: usize,
    pub edge: usize,
    pub face: usize,
}

impl Sharing {
    fn add(&mut self, other: &Sharing) {
        self.corner += other.corner;
        self.edge += other.edge;
        self.face += other.face;
    }
}

// Ratio with an empty class giving zero
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Structural units of one configuration
#[derive(Debug, Clone)]
pub struct StructuralUnits {
    frame: usize,
    central: String,
    ligand: String,
    n_central: usize,
    n_ligand: usize,
    /// Per atom coordination. Central and inert atoms are counted
    /// against the ligand, ligands against the central element.
    coordination: Vec<usize>,
    central_classes: BTreeMap<usize, usize>,
    ligand_classes: BTreeMap<usize, usize>,
    q_species: [usize; 5],
    n_q: usize,
    sharing: Vec<Sharing>,
    total_sharing: Sharing,
    class_sharing: BTreeMap<usize, Sharing>,
    shapes: Vec<(usize, PolyhedronMetrics)>,
    inert_coordination: Vec<(String, f64)>,
    warnings: Vec<FrameWarning>,
}

impl StructuralUnits {
    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn n_central(&self) -> usize {
        self.n_central
    }

    pub fn n_ligand(&self) -> usize {
        self.n_ligand
    }

    pub fn coordination(&self, i: usize) -> usize {
        self.coordination[i]
    }

    /// Corner/edge/face counts of central atom `i`. Zero for other atoms.
    pub fn sharing(&self, i: usize) -> Sharing {
        self.sharing[i]
    }

    /// Number of central atoms with `z` ligands
    pub fn central_count(&self, z: usize) -> usize {
        self.central_classes.get(&z).copied().unwrap_or(0)
    }

    /// Number of ligands bound to `z` central atoms
    pub fn ligand_count(&self, z: usize) -> usize {
        self.ligand_classes.get(&z).copied().unwrap_or(0)
    }

    pub fn central_proportion(&self, z: usize) -> f64 {
        ratio(self.central_count(z), self.n_central)
    }

    pub fn ligand_proportion(&self, z: usize) -> f64 {
        ratio(self.ligand_count(z), self.n_ligand)
    }

    /// Fraction of ligands bound to `z` or more central atoms
    pub fn ligand_proportion_from(&self, z: usize) -> f64 {
        let n: usize = self.ligand_classes.range(z..).map(|(_, n)| n).sum();
        ratio(n, self.n_ligand)
    }

    pub fn average_central_coordination(&self) -> f64 {
        let s: usize = self.central_classes.iter().map(|(z, n)| z * n).sum();
        ratio(s, self.n_central)
    }

    pub fn average_ligand_coordination(&self) -> f64 {
        let s: usize = self.ligand_classes.iter().map(|(z, n)| z * n).sum();
        ratio(s, self.n_ligand)
    }

    /// Number of 4-coordinated central atoms with `n` bridging ligands
    pub fn q_count(&self, n: usize) -> usize {
        self.q_species.get(n).copied().unwrap_or(0)
    }

    /// Fraction of Qⁿ among 4-coordinated central atoms
    pub fn q_proportion(&self, n: usize) -> f64 {
        ratio(self.q_count(n), self.n_q)
    }

    /// Sharing events summed over all central atoms
    pub fn total_sharing(&self) -> Sharing {
        self.total_sharing
    }

    /// Sharing events summed over central atoms with `z` ligands
    pub fn class_sharing(&self, z: usize) -> Sharing {
        self.class_sharing.get(&z).copied().unwrap_or_default()
    }

    /// Average corner, edge and face sharing per central atom
    pub fn sharing_per_central(&self) -> [f64; 3] {
        let s = &self.total_sharing;
        [
            ratio(s.corner, self.n_central),
            ratio(s.edge, self.n_central),
            ratio(s.face, self.n_central),
        ]
    }

    /// Average corner, edge and face sharing per central atom with `z` ligands
    pub fn sharing_per_class(&self, z: usize) -> [f64; 3] {
        let s = self.class_sharing(z);
        let n = self.central_count(z);
        [ratio(s.corner, n), ratio(s.edge, n), ratio(s.face, n)]
    }

    /// Shape metrics of all 4-, 5- and 6-coordinated central atoms
    pub fn shapes(&self) -> &[(usize, PolyhedronMetrics)] {
        &self.shapes
    }

    pub fn shape_count(&self, shape: PolyhedronShape) -> usize {
        self.shapes.iter().filter(|(_, m)| m.shape() == shape).count()
    }

    /// Fraction of central atoms with given polyhedron shape
    pub fn shape_proportion(&self, shape: PolyhedronShape) -> f64 {
        ratio(self.shape_count(shape), self.n_central)
    }

    pub fn pentahedra_proportion(&self) -> f64 {
        ratio(
            self.shape_count(PolyhedronShape::SquarePyramid)
                + self.shape_count(PolyhedronShape::TrigonalBipyramid),
            self.n_central,
        )
    }

    /// Average coordination to the ligand of each inert element present
    pub fn inert_coordination(&self) -> &[(String, f64)] {
        &self.inert_coordination
    }

    pub fn warnings(&self) -> &[FrameWarning] {
        &self.warnings
    }

    /// Named scalar values of the configuration.
    ///
    /// The set of names only depends on the central and ligand elements,
    /// so values of different configurations line up.
    pub fn values(&self) -> Vec<(String, f64)> {
        let (c, l) = (&self.central, &self.ligand);
        let mut v = vec![];
        v.push((format!("cn_{c}"), self.average_central_coordination()));
        for z in CENTRAL_CLASSES {
            v.push((format!("{c}{l}{z}"), self.central_proportion(z)));
        }
        v.push((format!("cn_{l}"), self.average_ligand_coordination()));
        for z in LIGAND_CLASSES {
            v.push((format!("{l}{c}{z}"), self.ligand_proportion(z)));
        }
        let z = LIGAND_CLASSES.end() + 1;
        v.push((format!("{l}{c}{z}+"), self.ligand_proportion_from(z)));
        for n in 0..=4 {
            v.push((format!("Q{n}"), self.q_proportion(n)));
        }
        let [cs, es, fs] = self.sharing_per_central();
        v.push(("corner".into(), cs));
        v.push(("edge".into(), es));
        v.push(("face".into(), fs));
        for z in SHARING_CLASSES {
            let [cs, es, fs] = self.sharing_per_class(z);
            v.push((format!("corner_{c}{l}{z}"), cs));
            v.push((format!("edge_{c}{l}{z}"), es));
            v.push((format!("face_{c}{l}{z}"), fs));
        }
        v.push((
            "tetrahedra".into(),
            self.shape_proportion(PolyhedronShape::Tetrahedron),
        ));
        v.push(("pentahedra".into(), self.pentahedra_proportion()));
        v.push((
            "square_pyramids".into(),
            self.shape_proportion(PolyhedronShape::SquarePyramid),
        ));
        v.push((
            "trigonal_bipyramids".into(),
            self.shape_proportion(PolyhedronShape::TrigonalBipyramid),
        ));
        v.push((
            "octahedra".into(),
            self.shape_proportion(PolyhedronShape::Octahedron),
        ));
        v
    }
}

//==================================================================

/// Derives structural units from the neighbor graph
#[derive(Debug, Clone)]
pub struct ConnectivityClassifier {
    central: String,
    ligand: String,
}

impl ConnectivityClassifier {
    pub fn new(central: impl Into<String>, ligand: impl Into<String>) -> Self {
        Self {
            central: central.into(),
            ligand: ligand.into(),
        }
    }

    pub fn role(&self, element: &str) -> Role {
        if element == self.central {
            Role::Central
        } else if element == self.ligand {
            Role::Ligand
        } else {
            Role::Inert
        }
    }

    pub fn classify(
        &self,
        frame: &Frame,
        graph: &NeighborList,
    ) -> Result<StructuralUnits, AnalysisError> {
        if graph.frame() != frame.index() || graph.len() != frame.len() {
            return Err(AnalysisError::FrameMismatch {
                expected: frame.index(),
                found: graph.frame(),
            });
        }

        // Roles are resolved once per species
        let roles: Vec<Role> = frame.species().iter().map(|s| self.role(s)).collect();
        let role_of = |i: usize| roles[frame.species_of(i)];
        let central_sp = frame.species_index(&self.central);
        let ligand_sp = frame.species_index(&self.ligand);

        if central_sp.is_none() {
            warn!(
                "configuration {}: no '{}' atoms",
                frame.index(),
                self.central
            );
        }
        if ligand_sp.is_none() {
            warn!("configuration {}: no '{}' atoms", frame.index(), self.ligand);
        }

        let n = frame.len();
        let count_of = |i: usize, sp: Option<usize>| sp.map_or(0, |s| graph.coordination(i, s));

        let mut coordination = vec![0; n];
        let mut central_classes = BTreeMap::new();
        let mut ligand_classes = BTreeMap::new();
        let mut inert_cn = FxHashMap::<usize, (usize, usize)>::default();
        let mut n_central = 0;
        let mut n_ligand = 0;

        for i in 0..n {
            match role_of(i) {
                Role::Central => {
                    coordination[i] = count_of(i, ligand_sp);
                    *central_classes.entry(coordination[i]).or_insert(0) += 1;
                    n_central += 1;
                }
                Role::Ligand => {
                    coordination[i] = count_of(i, central_sp);
                    *ligand_classes.entry(coordination[i]).or_insert(0) += 1;
                    n_ligand += 1;
                }
                Role::Inert => {
                    coordination[i] = count_of(i, ligand_sp);
                    let e = inert_cn.entry(frame.species_of(i)).or_default();
                    e.0 += coordination[i];
                    e.1 += 1;
                }
            }
        }

        let mut inert_coordination: Vec<(String, f64)> = inert_cn
            .into_iter()
            .map(|(sp, (s, cnt))| (frame.species()[sp].clone(), ratio(s, cnt)))
            .collect();
        inert_coordination.sort_by(|a, b| a.0.cmp(&b.0));

        let mut q_species = [0; 5];
        let mut n_q = 0;
        let mut sharing = vec![Sharing::default(); n];
        let mut total_sharing = Sharing::default();
        let mut class_sharing = BTreeMap::<usize, Sharing>::new();
        let mut shapes = vec![];
        let mut warnings = vec![];
        let pbox = frame.pbox();

        if let (Some(csp), Some(lsp)) = (central_sp, ligand_sp) {
            for a in (0..n).filter(|&i| role_of(i) == Role::Central) {
                let ligands: Vec<usize> = graph
                    .neighbors_of_species(a, lsp)
                    .map(|nb| nb.index)
                    .collect();

                // Qⁿ
                if ligands.len() == 4 {
                    let bridging = ligands.iter().filter(|&&l| coordination[l] >= 2).count();
                    q_species[bridging] += 1;
                    n_q += 1;
                }

                // Number of ligands shared with every other central atom
                let mut shared = FxHashMap::<usize, usize>::default();
                for &l in &ligands {
                    for b in graph.neighbors_of_species(l, csp) {
                        if b.index != a {
                            *shared.entry(b.index).or_insert(0) += 1;
                        }
                    }
                }
                let s = &mut sharing[a];
                for &m in shared.values() {
                    match m {
                        1 => s.corner += 1,
                        2 => s.edge += 1,
                        3 => s.face += 1,
                        _ => {}
                    }
                }
                total_sharing.add(s);
                class_sharing.entry(ligands.len()).or_default().add(s);

                // Polyhedron shape
                let dist: Vec<f64> = ligands
                    .iter()
                    .tuple_combinations()
                    .map(|(&l1, &l2)| {
                        pbox.distance(&frame.atom(l1).pos, &frame.atom(l2).pos) as f64
                    })
                    .collect();
                match classify_polyhedron(ligands.len(), &dist) {
                    Ok(Some(m)) => shapes.push((a, m)),
                    Ok(None) => {}
                    Err(source) => warnings.push(FrameWarning::GeometryMismatch {
                        frame: frame.index(),
                        atom: frame.atom(a).id,
                        source,
                    }),
                }
            }
        }

        Ok(StructuralUnits {
            frame: frame.index(),
            central: self.central.clone(),
            ligand: self.ligand.clone(),
            n_central,
            n_ligand,
            coordination,
            central_classes,
            ligand_classes,
            q_species,
            n_q,
            sharing,
            total_sharing,
            class_sharing,
            shapes,
            inert_coordination,
            warnings,
        })
    }
}
