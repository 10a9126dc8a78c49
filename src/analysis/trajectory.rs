use super::bond_angles::{AngleCorrelator, AngleCurve};
use super::connectivity::{ConnectivityClassifier, StructuralUnits};
use super::pair_distribution::{PairCorrelator, PairCurve};
use super::settings::{Settings, SettingsError};
use super::shape::{ShapeDistribution, ShapeError, ShapeHistograms};
use super::stats::MeanStd;
use super::NeighborFinder;
use crate::core::{CutoffError, CutoffTable, Frame, FrameError, PeriodicBoxError};
use crate::io::XyzHandlerError;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("configuration {frame}: {source}")]
    Cutoff { frame: usize, source: CutoffError },

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Box(#[from] PeriodicBoxError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Reader(#[from] XyzHandlerError),

    #[error("neighbor graph of configuration {found} is used for configuration {expected}")]
    FrameMismatch { expected: usize, found: usize },

    #[error("no configurations analyzed")]
    NoFramesConsumed,
}

/// Non-fatal problems found in a configuration
#[derive(Debug, Clone, PartialEq)]
pub enum FrameWarning {
    /// Two atoms at the same position. They are excluded from each other's neighbors.
    DegenerateNeighbor { frame: usize, atoms: (usize, usize) },
    /// Polyhedron excluded from shape statistics
    GeometryMismatch {
        frame: usize,
        atom: usize,
        source: ShapeError,
    },
}

impl std::fmt::Display for FrameWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DegenerateNeighbor { frame, atoms } => write!(
                f,
                "configuration {frame}: atoms {} and {} coincide",
                atoms.0, atoms.1
            ),
            Self::GeometryMismatch {
                frame,
                atom,
                source,
            } => write!(f, "configuration {frame}: polyhedron of atom {atom}: {source}"),
        }
    }
}

/// Everything computed for a single configuration
#[derive(Debug, Clone)]
pub struct FrameResult {
    pub index: usize,
    pub density: f64,
    pub volume: f64,
    pub units: Option<StructuralUnits>,
    pub pairs: Option<PairCorrelator>,
    pub angles: Option<AngleCorrelator>,
    pub shapes: Option<ShapeHistograms>,
    pub warnings: Vec<FrameWarning>,
}

/// Per-configuration row of scalar results
#[derive(Debug, Clone)]
pub struct FrameSummary {
    pub index: usize,
    pub density: f64,
    pub volume: f64,
    pub values: Vec<(String, f64)>,
    pub n_warnings: usize,
}

/// Results of the whole trajectory
#[derive(Debug, Clone, Default)]
pub struct TrajectoryResults {
    pub frames: Vec<FrameSummary>,
    /// Mean and standard deviation over configurations of each structural value
    pub averages: Vec<(String, MeanStd)>,
    pub pair_curves: Vec<PairCurve>,
    pub angle_curves: Vec<AngleCurve>,
    pub shapes: Option<ShapeDistribution>,
    pub warnings: Vec<FrameWarning>,
    /// True if the analysis was stopped before the end of the trajectory
    pub stopped: bool,
}

impl TrajectoryResults {
    pub fn n_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn average(&self, name: &str) -> Option<(f64, f64)> {
        self.averages
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, ms)| ms.compute())
    }
}

// Running merge of per-configuration results in configuration order
struct Accumulator {
    frames: Vec<FrameSummary>,
    averages: Vec<(String, MeanStd)>,
    pairs: Option<PairCorrelator>,
    angles: Option<AngleCorrelator>,
    shapes: Option<ShapeHistograms>,
    warnings: Vec<FrameWarning>,
}

impl Accumulator {
    fn add_value(&mut self, name: &str, val: f64) {
        match self.averages.iter_mut().find(|(n, _)| n == name) {
            Some((_, ms)) => ms.add(val),
            None => {
                let mut ms = MeanStd::default();
                ms.add(val);
                self.averages.push((name.to_owned(), ms));
            }
        }
    }

    fn merge(&mut self, res: FrameResult) {
        for w in &res.warnings {
            warn!("{w}");
        }

        let mut values = vec![];
        if let Some(u) = &res.units {
            values = u.values();
            for (n, v) in &values {
                self.add_value(n, *v);
            }
            for (el, cn) in u.inert_coordination() {
                self.add_value(&format!("cn_{el}"), *cn);
            }
        }
        self.add_value("density", res.density);
        self.add_value("volume", res.volume);

        if let (Some(acc), Some(p)) = (self.pairs.as_mut(), res.pairs.as_ref()) {
            acc.merge(p);
        }
        if let (Some(acc), Some(a)) = (self.angles.as_mut(), res.angles.as_ref()) {
            acc.merge(a);
        }
        if let (Some(acc), Some(s)) = (self.shapes.as_mut(), res.shapes.as_ref()) {
            acc.merge(s);
        }

        self.frames.push(FrameSummary {
            index: res.index,
            density: res.density,
            volume: res.volume,
            values,
            n_warnings: res.warnings.len(),
        });
        self.warnings.extend(res.warnings);
    }

    fn finish(self, stopped: bool) -> TrajectoryResults {
        if let Some(n) = self.shapes.as_ref().map(|s| s.out_of_range()).filter(|&n| n > 0) {
            warn!("{n} polyhedra beyond the shape histogram range, increase shape_max");
        }
        TrajectoryResults {
            frames: self.frames,
            averages: self.averages,
            pair_curves: self.pairs.map(|p| p.finalize()).unwrap_or_default(),
            angle_curves: self.angles.map(|a| a.finalize()).unwrap_or_default(),
            shapes: self.shapes.map(|s| s.finalize()),
            warnings: self.warnings,
            stopped,
        }
    }
}

//===========================================================================

/// Runs all requested analyses over a sequence of configurations.
///
/// Configurations of a batch are analyzed in parallel, each with its own
/// neighbor graph and accumulators. Results are merged sequentially in
/// configuration order.
pub struct TrajectoryAnalyzer {
    settings: Settings,
    cutoffs: CutoffTable,
    classifier: ConnectivityClassifier,
    pair_template: PairCorrelator,
    angle_template: AngleCorrelator,
    shape_template: ShapeHistograms,
    stop: Arc<AtomicBool>,
    log_every: usize,
}

impl TrajectoryAnalyzer {
    pub fn new(settings: Settings) -> Result<Self, AnalysisError> {
        settings.validate()?;
        let cutoffs = settings.cutoff_table()?;
        let su = &settings.structural_units;
        Ok(Self {
            classifier: ConnectivityClassifier::new(&su.central, &su.ligand),
            pair_template: PairCorrelator::new(&settings.pair_distribution, &cutoffs)
                .map_err(SettingsError::from)?,
            angle_template: AngleCorrelator::new(&settings.bond_angles),
            shape_template: ShapeHistograms::new(su.shape_max, su.shape_bins),
            cutoffs,
            settings,
            stop: Arc::new(AtomicBool::new(false)),
            log_every: 100,
        })
    }

    /// Logging frequency in configurations, 0 disables progress messages
    pub fn with_log_every(mut self, n: usize) -> Self {
        self.log_every = n;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Flag which stops the analysis before the next configuration when raised
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Analyzes a single configuration
    pub fn analyze_frame(&self, frame: &Frame) -> Result<FrameResult, AnalysisError> {
        let t = std::time::Instant::now();
        let props = &self.settings.properties;

        let search = NeighborFinder::new(&self.cutoffs)
            .with_method(self.settings.neighbor_search)
            .find(frame)?;

        let mut warnings: Vec<FrameWarning> = search
            .degenerate
            .iter()
            .map(|&(i, j)| FrameWarning::DegenerateNeighbor {
                frame: frame.index(),
                atoms: (frame.atom(i).id, frame.atom(j).id),
            })
            .collect();

        let (units, shapes) = if props.structural_units {
            let units = self.classifier.classify(frame, &search.graph)?;
            let mut shapes = self.shape_template.clone();
            for (_, m) in units.shapes() {
                shapes.add(m);
            }
            warnings.extend(units.warnings().iter().cloned());
            (Some(units), Some(shapes))
        } else {
            (None, None)
        };

        let pairs = props.pair_distribution.then(|| {
            let mut pc = self.pair_template.clone();
            pc.add_frame(frame);
            pc
        });

        let angles = props.bond_angles.then(|| {
            let mut ac = self.angle_template.clone();
            ac.add_frame(frame, &search.graph);
            ac
        });

        debug!(
            "configuration {} analyzed in {:.3} s",
            frame.index(),
            t.elapsed().as_secs_f32()
        );

        Ok(FrameResult {
            index: frame.index(),
            density: frame.density(),
            volume: frame.volume(),
            units,
            pairs,
            angles,
            shapes,
            warnings,
        })
    }

    fn accumulator(&self) -> Accumulator {
        let props = &self.settings.properties;
        Accumulator {
            frames: vec![],
            averages: vec![],
            pairs: props.pair_distribution.then(|| self.pair_template.clone()),
            angles: props.bond_angles.then(|| self.angle_template.clone()),
            shapes: props.structural_units.then(|| self.shape_template.clone()),
            warnings: vec![],
        }
    }

    /// Analyzes all configurations.
    ///
    /// Configurations are read sequentially in batches of `batch_size`, each
    /// batch is processed in parallel. The first configuration error aborts
    /// the analysis.
    pub fn run<I, E>(
        &self,
        frames: I,
        batch_size: usize,
    ) -> Result<TrajectoryResults, AnalysisError>
    where
        I: IntoIterator<Item = Result<Frame, E>>,
        E: Into<AnalysisError>,
    {
        let batch_size = batch_size.max(1);
        let mut acc = self.accumulator();
        let mut iter = frames.into_iter();
        let mut stopped = false;
        let mut n_read = 0;

        'outer: loop {
            // Read the batch
            let mut batch = Vec::with_capacity(batch_size);
            while batch.len() < batch_size {
                if self.stopped() {
                    stopped = true;
                    break;
                }
                match iter.next() {
                    Some(fr) => batch.push(fr.map_err(|e| -> AnalysisError { e.into() })?),
                    None => break,
                }
            }
            if batch.is_empty() {
                break;
            }
            n_read += batch.len();

            let results: Vec<Option<Result<FrameResult, AnalysisError>>> = batch
                .par_iter()
                .map(|fr| (!self.stopped()).then(|| self.analyze_frame(fr)))
                .collect();

            for res in results {
                match res {
                    Some(res) => {
                        acc.merge(res?);
                        let n = acc.frames.len();
                        if self.log_every > 0 && n % self.log_every == 0 {
                            info!("Processed {n} configurations");
                        }
                    }
                    // Skipped after stop, later configurations are dropped too
                    None => {
                        stopped = true;
                        break 'outer;
                    }
                }
            }

            if stopped {
                break;
            }
        }

        if acc.frames.is_empty() && !stopped {
            return Err(AnalysisError::NoFramesConsumed);
        }

        info!(
            "Analyzed {} of {n_read} configurations read{}",
            acc.frames.len(),
            if stopped { ", stopped early" } else { "" }
        );
        Ok(acc.finish(stopped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Atom, PeriodicBox, Pos};

    fn tetra_frame(index: usize, shift: f32) -> Frame {
        let a = 1.6 / 3.0f32.sqrt();
        let c = Pos::new(5.0 + shift, 5.0, 5.0);
        let mut atoms = vec![Atom::new(0, "Si", c)];
        for (k, s) in [[1.0, 1.0, 1.0], [1.0, -1.0, -1.0], [-1.0, 1.0, -1.0], [-1.0, -1.0, 1.0]]
            .iter()
            .enumerate()
        {
            atoms.push(Atom::new(
                k + 1,
                "O",
                c + nalgebra::Vector3::new(s[0], s[1], s[2]) * a,
            ));
        }
        Frame::new(index, atoms, PeriodicBox::new(12.0, 12.0, 12.0).unwrap()).unwrap()
    }

    #[test]
    fn batches_merge_in_order() -> anyhow::Result<()> {
        let an = TrajectoryAnalyzer::new(Settings::sio2())?.with_log_every(0);
        let frames: Vec<Result<Frame, AnalysisError>> =
            (0..7).map(|i| Ok(tetra_frame(i, i as f32 * 0.1))).collect();
        let res = an.run(frames, 3)?;
        assert_eq!(res.n_frames(), 7);
        let idx: Vec<usize> = res.frames.iter().map(|f| f.index).collect();
        assert_eq!(idx, (0..7).collect::<Vec<_>>());
        assert!(!res.stopped);
        assert_eq!(res.average("SiO4"), Some((1.0, 0.0)));
        assert_eq!(res.average("Q0"), Some((1.0, 0.0)));
        assert_eq!(res.pair_curves.len(), 3);
        assert_eq!(res.angle_curves.len(), 4);
        assert_eq!(res.angle_curves[1].n_angles, 6 * 7);
        let shapes = res.shapes.unwrap();
        assert_eq!(shapes.tetrahedra.iter().sum::<f64>(), 1.0);
        Ok(())
    }

    #[test]
    fn batch_size_does_not_change_results() -> anyhow::Result<()> {
        let an = TrajectoryAnalyzer::new(Settings::sio2())?;
        let make = || -> Vec<Result<Frame, AnalysisError>> {
            (0..5).map(|i| Ok(tetra_frame(i, i as f32 * 0.37))).collect()
        };
        let a = an.run(make(), 1)?;
        let b = an.run(make(), 4)?;
        assert_eq!(a.averages, b.averages);
        for (ca, cb) in a.pair_curves.iter().zip(b.pair_curves.iter()) {
            assert_eq!(ca.g, cb.g);
        }
        for (ca, cb) in a.angle_curves.iter().zip(b.angle_curves.iter()) {
            assert_eq!(ca.density, cb.density);
        }
        Ok(())
    }

    #[test]
    fn stop_before_start() -> anyhow::Result<()> {
        let an = TrajectoryAnalyzer::new(Settings::sio2())?;
        an.stop_handle().store(true, Ordering::Relaxed);
        let frames: Vec<Result<Frame, AnalysisError>> = vec![Ok(tetra_frame(0, 0.0))];
        let res = an.run(frames, 2)?;
        assert!(res.stopped);
        assert_eq!(res.n_frames(), 0);
        Ok(())
    }

    #[test]
    fn degenerate_atoms_reported() -> anyhow::Result<()> {
        let an = TrajectoryAnalyzer::new(Settings::sio2())?;
        let fr = Frame::new(
            4,
            vec![
                Atom::new(10, "Si", Pos::new(1.0, 1.0, 1.0)),
                Atom::new(11, "O", Pos::new(1.0, 1.0, 1.0)),
            ],
            PeriodicBox::new(10.0, 10.0, 10.0)?,
        )?;
        let res = an.analyze_frame(&fr)?;
        assert_eq!(
            res.warnings,
            vec![FrameWarning::DegenerateNeighbor {
                frame: 4,
                atoms: (10, 11)
            }]
        );
        Ok(())
    }

    #[test]
    fn configuration_error_aborts() -> anyhow::Result<()> {
        let an = TrajectoryAnalyzer::new(Settings::sio2())?;
        let bad = Frame::new(
            1,
            vec![Atom::new(0, "Na", Pos::new(1.0, 1.0, 1.0))],
            PeriodicBox::new(10.0, 10.0, 10.0)?,
        )?;
        let frames: Vec<Result<Frame, AnalysisError>> = vec![Ok(tetra_frame(0, 0.0)), Ok(bad)];
        let err = an.run(frames, 2).unwrap_err();
        assert!(matches!(err, AnalysisError::Cutoff { frame: 1, .. }));
        Ok(())
    }
}
