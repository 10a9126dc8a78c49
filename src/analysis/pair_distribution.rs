use super::settings::{ElementPair, PairDistributionSettings};
use super::stats::{Histogram, MeanStd};
use crate::core::{CutoffError, CutoffTable, Frame};
use crate::distance_search::search_pairs_within;
use std::f64::consts::PI;

/// Pair distribution function of one element pair averaged over configurations
#[derive(Debug, Clone)]
pub struct PairCurve {
    pub pair: ElementPair,
    /// Bin centers
    pub r: Vec<f64>,
    pub g: Vec<f64>,
    /// Mean and standard deviation of distances within the pair cutoff
    pub bond_length: (f64, f64),
    pub n_bonds: usize,
    pub n_frames: usize,
}

#[derive(Debug, Clone)]
struct PairAccumulator {
    pair: ElementPair,
    cutoff: f32,
    g_sum: Vec<f64>,
    bond: MeanStd,
    n_frames: usize,
}

/// Accumulates g(r) for a set of element pairs.
///
/// g(r) of each configuration is normalized by the ideal gas pair count in
/// the spherical shell at the bin center, then averaged over configurations.
#[derive(Debug, Clone)]
pub struct PairCorrelator {
    r_min: f64,
    r_max: f64,
    n_bins: usize,
    pairs: Vec<PairAccumulator>,
}

impl PairCorrelator {
    pub fn new(
        settings: &PairDistributionSettings,
        cutoffs: &CutoffTable,
    ) -> Result<Self, CutoffError> {
        let pairs = settings
            .pairs
            .iter()
            .map(|p| {
                Ok(PairAccumulator {
                    pair: p.clone(),
                    cutoff: cutoffs.lookup(&p.element1, &p.element2)?,
                    g_sum: vec![0.0; settings.n_bins],
                    bond: MeanStd::default(),
                    n_frames: 0,
                })
            })
            .collect::<Result<Vec<_>, CutoffError>>()?;

        Ok(Self {
            r_min: settings.r_min,
            r_max: settings.r_max,
            n_bins: settings.n_bins,
            pairs,
        })
    }

    fn histogram(&self) -> Histogram {
        Histogram::new(self.r_min, self.r_max, self.n_bins)
    }

    pub fn add_frame(&mut self, frame: &Frame) {
        // Species of both elements for each pair, skip pairs absent in this frame
        let species: Vec<Option<(usize, usize)>> = self
            .pairs
            .iter()
            .map(|p| {
                Some((
                    frame.species_index(&p.pair.element1)?,
                    frame.species_index(&p.pair.element2)?,
                ))
            })
            .collect();

        if species.iter().all(|s| s.is_none()) {
            return;
        }

        let radius = self
            .pairs
            .iter()
            .map(|p| p.cutoff)
            .fold(self.r_max as f32, f32::max);
        let found = search_pairs_within(radius, &frame.positions(), frame.pbox());

        let mut hists = vec![self.histogram(); self.pairs.len()];
        for p in &found {
            if p.d == 0.0 {
                continue;
            }
            let si = frame.species_of(p.i);
            let sj = frame.species_of(p.j);
            for (k, acc) in self.pairs.iter_mut().enumerate() {
                let Some((s1, s2)) = species[k] else {
                    continue;
                };
                if !((si == s1 && sj == s2) || (si == s2 && sj == s1)) {
                    continue;
                }
                // Ordered pairs for the same element
                let w = if s1 == s2 { 2.0 } else { 1.0 };
                hists[k].add_weighted(p.d as f64, w);
                if p.d <= acc.cutoff {
                    acc.bond.add(p.d as f64);
                }
            }
        }

        let volume = frame.volume();
        for (k, acc) in self.pairs.iter_mut().enumerate() {
            let Some((s1, s2)) = species[k] else {
                continue;
            };
            let n1 = frame.count(&frame.species()[s1]) as f64;
            let n2 = frame.count(&frame.species()[s2]) as f64;
            let n_pairs = if s1 == s2 { n1 * (n1 - 1.0) } else { n1 * n2 };
            if n_pairs == 0.0 {
                continue;
            }

            let h = &hists[k];
            let dr = h.bin_width();
            for (i, c) in h.counts().iter().enumerate() {
                let r = h.bin_center(i);
                acc.g_sum[i] += c * volume / (4.0 * PI * r * r * dr * n_pairs);
            }
            acc.n_frames += 1;
        }
    }

    pub fn merge(&mut self, other: &PairCorrelator) {
        for (a, b) in self.pairs.iter_mut().zip(other.pairs.iter()) {
            for (x, y) in a.g_sum.iter_mut().zip(b.g_sum.iter()) {
                *x += y;
            }
            a.bond.merge(&b.bond);
            a.n_frames += b.n_frames;
        }
    }

    pub fn finalize(&self) -> Vec<PairCurve> {
        let r = self.histogram().bin_centers();
        self.pairs
            .iter()
            .map(|acc| PairCurve {
                pair: acc.pair.clone(),
                r: r.clone(),
                g: if acc.n_frames > 0 {
                    acc.g_sum.iter().map(|v| v / acc.n_frames as f64).collect()
                } else {
                    vec![0.0; r.len()]
                },
                bond_length: acc.bond.compute_or_zero(),
                n_bonds: acc.bond.len(),
                n_frames: acc.n_frames,
            })
            .collect()
    }
}
