use super::settings::{BondAngleSettings, ElementTriplet};
use super::stats::{Histogram, MeanStd};
use super::NeighborList;
use crate::core::{Frame, Vector3f};
use itertools::{iproduct, Itertools};

/// Bond angle distribution of one element triplet
#[derive(Debug, Clone)]
pub struct AngleCurve {
    pub triplet: ElementTriplet,
    /// Bin centers in degrees
    pub theta: Vec<f64>,
    /// Probability density per degree
    pub density: Vec<f64>,
    /// Mean and standard deviation of the angle
    pub angle: (f64, f64),
    pub n_angles: usize,
}

/// Angle between two vectors in degrees.
///
/// The cosine is clamped to [-1, 1], so exactly (anti)parallel
/// vectors give 0 or 180 instead of NaN.
pub fn angle_degrees(v1: &Vector3f, v2: &Vector3f) -> f64 {
    let a = v1.cast::<f64>();
    let b = v2.cast::<f64>();
    let cos = a.dot(&b) / (a.norm() * b.norm());
    cos.clamp(-1.0, 1.0).acos().to_degrees()
}

/// Accumulates bond angle distributions.
///
/// Bonds are taken from the neighbor graph, so the arms of the angle
/// e1-e2-e3 obey the cutoffs of e1-e2 and e2-e3 respectively.
#[derive(Debug, Clone)]
pub struct AngleCorrelator {
    triplets: Vec<ElementTriplet>,
    hists: Vec<Histogram>,
    stats: Vec<MeanStd>,
}

impl AngleCorrelator {
    pub fn new(settings: &BondAngleSettings) -> Self {
        let h = Histogram::new(settings.theta_min, settings.theta_max, settings.n_bins);
        Self {
            triplets: settings.triplets.clone(),
            hists: vec![h; settings.triplets.len()],
            stats: vec![MeanStd::default(); settings.triplets.len()],
        }
    }

    pub fn add_frame(&mut self, frame: &Frame, graph: &NeighborList) {
        let pbox = frame.pbox();
        for (k, t) in self.triplets.iter().enumerate() {
            let (Some(s1), Some(s2), Some(s3)) = (
                frame.species_index(&t.element1),
                frame.species_index(&t.element2),
                frame.species_index(&t.element3),
            ) else {
                continue;
            };

            for v in (0..frame.len()).filter(|&i| frame.species_of(i) == s2) {
                let pv = &frame.atom(v).pos;
                let arms1: Vec<Vector3f> = graph
                    .neighbors_of_species(v, s1)
                    .map(|n| pbox.minimum_image_delta(&frame.atom(n.index).pos, pv))
                    .collect();

                let mut add = |a: &Vector3f, b: &Vector3f| {
                    let theta = angle_degrees(a, b);
                    self.hists[k].add_closed(theta);
                    self.stats[k].add(theta);
                };

                if s1 == s3 {
                    // Unordered pairs without repetition
                    for (a, b) in arms1.iter().tuple_combinations() {
                        add(a, b);
                    }
                } else {
                    let arms3: Vec<Vector3f> = graph
                        .neighbors_of_species(v, s3)
                        .map(|n| pbox.minimum_image_delta(&frame.atom(n.index).pos, pv))
                        .collect();
                    for (a, b) in iproduct!(&arms1, &arms3) {
                        add(a, b);
                    }
                }
            }
        }
    }

    pub fn merge(&mut self, other: &AngleCorrelator) {
        for (a, b) in self.hists.iter_mut().zip(other.hists.iter()) {
            a.merge(b);
        }
        for (a, b) in self.stats.iter_mut().zip(other.stats.iter()) {
            a.merge(b);
        }
    }

    pub fn finalize(&self) -> Vec<AngleCurve> {
        self.triplets
            .iter()
            .zip(self.hists.iter().zip(self.stats.iter()))
            .map(|(t, (h, s))| {
                let total = h.total();
                let dtheta = h.bin_width();
                AngleCurve {
                    triplet: t.clone(),
                    theta: h.bin_centers(),
                    density: h
                        .counts()
                        .iter()
                        .map(|c| if total > 0.0 { c / (total * dtheta) } else { 0.0 })
                        .collect(),
                    angle: s.compute_or_zero(),
                    n_angles: s.len(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::NeighborFinder;
    use crate::core::{Atom, CutoffEntry, CutoffTable, PeriodicBox, Pos};

    fn settings(triplets: Vec<ElementTriplet>) -> BondAngleSettings {
        BondAngleSettings {
            theta_min: 0.0,
            theta_max: 180.0,
            n_bins: 180,
            triplets,
        }
    }

    fn table() -> CutoffTable {
        CutoffTable::new([
            CutoffEntry::new("Si", "O", 2.0),
            CutoffEntry::new("O", "O", 1.0),
            CutoffEntry::new("Si", "Si", 1.0),
        ])
        .unwrap()
    }

    #[test]
    fn straight_and_right_angles() {
        let x = Vector3f::new(1.0, 0.0, 0.0);
        assert_eq!(angle_degrees(&x, &(-x)), 180.0);
        assert_eq!(angle_degrees(&x, &x), 0.0);
        let a = angle_degrees(&x, &Vector3f::new(0.0, 3.0, 0.0));
        assert!((a - 90.0).abs() < 1e-9);
        // Nearly parallel vectors may give |cos| slightly above 1
        let v = Vector3f::new(0.1, 0.1, 0.1);
        assert!(!angle_degrees(&v, &(v * 3.0)).is_nan());
    }

    #[test]
    fn linear_bridge_across_boundary() -> anyhow::Result<()> {
        // Si-O-Si with the bridging O at the box edge
        let fr = Frame::new(
            0,
            vec![
                Atom::new(0, "Si", Pos::new(8.4, 5.0, 5.0)),
                Atom::new(1, "O", Pos::new(0.0, 5.0, 5.0)),
                Atom::new(2, "Si", Pos::new(1.6, 5.0, 5.0)),
            ],
            PeriodicBox::new(10.0, 10.0, 10.0)?,
        )?;
        let t = table();
        let g = NeighborFinder::new(&t).find(&fr)?.graph;

        let mut ac = AngleCorrelator::new(&settings(vec![
            ElementTriplet::new("Si", "O", "Si"),
            ElementTriplet::new("O", "Si", "O"),
        ]));
        ac.add_frame(&fr, &g);
        let c = ac.finalize();
        assert_eq!(c[0].n_angles, 1);
        assert!((c[0].angle.0 - 180.0).abs() < 1e-3);
        // 180 goes into the last bin
        assert!(c[0].density[179] > 0.0);
        let integral: f64 = c[0].density.iter().sum::<f64>() * 1.0;
        assert!((integral - 1.0).abs() < 1e-12);
        // Each Si has a single O, no O-Si-O angles
        assert_eq!(c[1].n_angles, 0);
        assert!(c[1].density.iter().all(|&v| v == 0.0));
        Ok(())
    }

    #[test]
    fn combinations_of_different_elements() -> anyhow::Result<()> {
        // Si vertex with two O and two Na around it
        let t = CutoffTable::new([
            CutoffEntry::new("Si", "O", 2.0),
            CutoffEntry::new("Na", "Si", 2.5),
            CutoffEntry::new("O", "O", 1.0),
            CutoffEntry::new("Na", "O", 1.0),
            CutoffEntry::new("Na", "Na", 1.0),
            CutoffEntry::new("Si", "Si", 1.0),
        ])?;
        let fr = Frame::new(
            0,
            vec![
                Atom::new(0, "Si", Pos::new(5.0, 5.0, 5.0)),
                Atom::new(1, "O", Pos::new(6.6, 5.0, 5.0)),
                Atom::new(2, "O", Pos::new(3.4, 5.0, 5.0)),
                Atom::new(3, "Na", Pos::new(5.0, 7.2, 5.0)),
                Atom::new(4, "Na", Pos::new(5.0, 5.0, 7.2)),
            ],
            PeriodicBox::new(20.0, 20.0, 20.0)?,
        )?;
        let g = NeighborFinder::new(&t).find(&fr)?.graph;
        let mut ac = AngleCorrelator::new(&settings(vec![
            ElementTriplet::new("O", "Si", "Na"),
            ElementTriplet::new("O", "Si", "O"),
            ElementTriplet::new("Na", "Si", "Na"),
        ]));
        ac.add_frame(&fr, &g);
        let c = ac.finalize();
        // 2x2 combinations, all right angles
        assert_eq!(c[0].n_angles, 4);
        assert!((c[0].angle.0 - 90.0).abs() < 1e-3);
        assert!(c[0].angle.1 < 1e-3);
        // One unordered O-O pair, straight
        assert_eq!(c[1].n_angles, 1);
        assert!((c[1].angle.0 - 180.0).abs() < 1e-3);
        assert_eq!(c[2].n_angles, 1);
        assert!((c[2].angle.0 - 90.0).abs() < 1e-3);
        Ok(())
    }
}
