use crate::analysis::TrajectoryResults;
use anyhow::Context;
use log::info;
use std::fmt::Write as FmtWrite;
use std::path::{Path, PathBuf};

/// Writes trajectory results as tab-separated `.dat` files with `#` headers
pub struct ResultsWriter {
    dir: PathBuf,
}

impl ResultsWriter {
    /// Creates the output directory if needed
    pub fn new(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("can't create output directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    fn save(&self, fname: &str, s: &str) -> anyhow::Result<PathBuf> {
        let path = self.dir.join(fname);
        std::fs::write(&path, s).with_context(|| format!("can't write '{}'", path.display()))?;
        info!("\tWritten {}", path.display());
        Ok(path)
    }

    /// Writes every available result, returns the written files
    pub fn write_all(&self, res: &TrajectoryResults) -> anyhow::Result<Vec<PathBuf>> {
        let mut files = vec![];
        files.extend(self.write_pair_distributions(res)?);
        files.extend(self.write_bond_angles(res)?);
        files.extend(self.write_structural_units(res)?);
        if let Some(f) = self.write_polyhedricity(res)? {
            files.push(f);
        }
        Ok(files)
    }

    pub fn write_pair_distributions(
        &self,
        res: &TrajectoryResults,
    ) -> anyhow::Result<Vec<PathBuf>> {
        if res.pair_curves.is_empty() {
            return Ok(vec![]);
        }
        let mut files = vec![];
        let mut bonds = "# pair\tmean\tstd\tn_bonds\tn_frames\n".to_string();
        for c in &res.pair_curves {
            let mut s = format!("# r\tg({})\n", c.pair);
            for (r, g) in c.r.iter().zip(c.g.iter()) {
                writeln!(s, "{r:>10.5}\t{g:>12.6}")?;
            }
            files.push(self.save(&format!("pair_distribution-{}.dat", c.pair), &s)?);

            let (mean, std) = c.bond_length;
            writeln!(
                bonds,
                "{}\t{mean:>10.5}\t{std:>10.5}\t{}\t{}",
                c.pair, c.n_bonds, c.n_frames
            )?;
        }
        files.push(self.save("average_bond_length.dat", &bonds)?);
        Ok(files)
    }

    pub fn write_bond_angles(&self, res: &TrajectoryResults) -> anyhow::Result<Vec<PathBuf>> {
        if res.angle_curves.is_empty() {
            return Ok(vec![]);
        }
        let mut files = vec![];
        let mut angles = "# triplet\tmean\tstd\tn_angles\n".to_string();
        for c in &res.angle_curves {
            let mut s = format!("# theta\tdensity({})\n", c.triplet);
            for (t, d) in c.theta.iter().zip(c.density.iter()) {
                writeln!(s, "{t:>10.5}\t{d:>12.6}")?;
            }
            files.push(self.save(&format!("bond_angles-{}.dat", c.triplet), &s)?);

            let (mean, std) = c.angle;
            writeln!(
                angles,
                "{}\t{mean:>10.5}\t{std:>10.5}\t{}",
                c.triplet, c.n_angles
            )?;
        }
        files.push(self.save("average_bond_angle.dat", &angles)?);
        Ok(files)
    }

    /// Per-configuration rows and their averages over the trajectory
    pub fn write_structural_units(&self, res: &TrajectoryResults) -> anyhow::Result<Vec<PathBuf>> {
        if res.frames.is_empty() {
            return Ok(vec![]);
        }

        // Every configuration has the same value names, or none
        let names: Vec<&str> = res
            .frames
            .iter()
            .find(|f| !f.values.is_empty())
            .map(|f| f.values.iter().map(|(n, _)| n.as_str()).collect())
            .unwrap_or_default();

        let mut s = "# frame\tdensity\tvolume".to_string();
        for n in &names {
            write!(s, "\t{n}")?;
        }
        s.push('\n');
        for f in &res.frames {
            write!(s, "{}\t{:.5}\t{:.3}", f.index, f.density, f.volume)?;
            for (_, v) in &f.values {
                write!(s, "\t{v:.6}")?;
            }
            s.push('\n');
        }
        let mut files = vec![self.save("structural_units.dat", &s)?];

        let mut s = "# value\tmean\tstd\n".to_string();
        for (n, ms) in &res.averages {
            let (mean, std) = ms.compute_or_zero();
            writeln!(s, "{n}\t{mean:.6}\t{std:.6}")?;
        }
        files.push(self.save("structural_units_average.dat", &s)?);
        Ok(files)
    }

    pub fn write_polyhedricity(&self, res: &TrajectoryResults) -> anyhow::Result<Option<PathBuf>> {
        let Some(d) = &res.shapes else {
            return Ok(None);
        };
        let mut s = "# value\ttetrahedra\tpentahedra\tsquare_pyramid_all\tsquare_pyramid\t\
                     trigonal_bipyramid_all\ttrigonal_bipyramid\toctahedra\n"
            .to_string();
        for i in 0..d.bin_centers.len() {
            write!(s, "{:>10.6}", d.bin_centers[i])?;
            for col in [
                &d.tetrahedra,
                &d.pentahedra,
                &d.square_pyramid_all,
                &d.square_pyramid,
                &d.trigonal_bipyramid_all,
                &d.trigonal_bipyramid,
                &d.octahedra,
            ] {
                write!(s, "\t{:>10.6}", col[i])?;
            }
            s.push('\n');
        }
        Ok(Some(self.save("polyhedricity.dat", &s)?))
    }
}
