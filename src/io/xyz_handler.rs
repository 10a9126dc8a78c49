use crate::core::{Atom, Frame, FrameError, PeriodicBox, PeriodicBoxError, Pos};
use regex::Regex;
use std::{
    fs::File,
    io::{BufRead, BufReader},
};
use thiserror::Error;

/// Reader of extended XYZ trajectories.
///
/// Each configuration is the number of atoms, a comment line carrying
/// `Lattice="lx 0 0 0 ly 0 0 0 lz"` and one `El x y z` line per atom.
/// Extra columns after the coordinates are ignored.
pub struct XyzFileHandler {
    reader: BufReader<File>,
    file_name: String,
    line: String,
    // Index of the next configuration in the file
    cur: usize,
    lattice_re: Regex,
}

#[derive(Debug, Error)]
pub enum XyzHandlerError {
    #[error("can't open xyz file '{0}' for reading")]
    OpenRead(String, #[source] std::io::Error),

    #[error("unexpected io error")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Regex(#[from] regex::Error),

    #[error("configuration {frame}: invalid number of atoms '{text}'")]
    NumAtoms { frame: usize, text: String },

    #[error("configuration {frame}: no Lattice=\"...\" in the comment line")]
    NoLattice { frame: usize },

    #[error("configuration {frame}: invalid lattice '{lattice}'")]
    InvalidLattice { frame: usize, lattice: String },

    #[error("configuration {frame}: only orthogonal lattices are supported")]
    NonOrthogonal { frame: usize },

    #[error("configuration {frame}: unexpected end of file after {found} of {expected} atoms")]
    Truncated {
        frame: usize,
        expected: usize,
        found: usize,
    },

    #[error("configuration {frame}: invalid atom record '{text}'")]
    AtomRecord { frame: usize, text: String },

    #[error("configuration {frame}: {source}")]
    Box {
        frame: usize,
        source: PeriodicBoxError,
    },

    #[error(transparent)]
    Frame(#[from] FrameError),
}

impl XyzFileHandler {
    pub fn open(fname: &str) -> Result<Self, XyzHandlerError> {
        Ok(Self {
            reader: BufReader::new(
                File::open(fname).map_err(|e| XyzHandlerError::OpenRead(fname.to_owned(), e))?,
            ),
            file_name: fname.to_owned(),
            line: String::new(),
            cur: 0,
            lattice_re: Regex::new(r#"Lattice\s*=\s*"([^"]*)""#)?,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Index of the configuration returned by the next [read](Self::read)
    pub fn position(&self) -> usize {
        self.cur
    }

    // Reads the next line into the buffer. Returns false at the end of file.
    fn next_line(&mut self) -> Result<bool, XyzHandlerError> {
        self.line.clear();
        Ok(self.reader.read_line(&mut self.line)? > 0)
    }

    // Number of atoms of the next configuration or None at the end of file.
    // Blank lines between configurations are allowed.
    fn read_natoms(&mut self) -> Result<Option<usize>, XyzHandlerError> {
        loop {
            if !self.next_line()? {
                return Ok(None);
            }
            let s = self.line.trim();
            if s.is_empty() {
                continue;
            }
            return s
                .parse::<usize>()
                .map(Some)
                .map_err(|_| XyzHandlerError::NumAtoms {
                    frame: self.cur,
                    text: s.to_owned(),
                });
        }
    }

    fn parse_lattice(&self) -> Result<PeriodicBox, XyzHandlerError> {
        let frame = self.cur;
        let lattice = self
            .lattice_re
            .captures(&self.line)
            .and_then(|c| c.get(1))
            .ok_or(XyzHandlerError::NoLattice { frame })?
            .as_str();

        let invalid = || XyzHandlerError::InvalidLattice {
            frame,
            lattice: lattice.to_owned(),
        };
        let v = lattice
            .split_whitespace()
            .map(|s| s.parse::<f32>())
            .collect::<Result<Vec<f32>, _>>()
            .map_err(|_| invalid())?;
        if v.len() != 9 {
            return Err(invalid());
        }

        let m = [[v[0], v[1], v[2]], [v[3], v[4], v[5]], [v[6], v[7], v[8]]];
        PeriodicBox::from_matrix(m).map_err(|source| match source {
            PeriodicBoxError::NonOrthogonal(..) => XyzHandlerError::NonOrthogonal { frame },
            _ => XyzHandlerError::Box { frame, source },
        })
    }

    /// Reads the next configuration, `None` at the end of file
    pub fn read(&mut self) -> Result<Option<Frame>, XyzHandlerError> {
        let Some(natoms) = self.read_natoms()? else {
            return Ok(None);
        };
        let frame = self.cur;

        if !self.next_line()? {
            return Err(XyzHandlerError::Truncated {
                frame,
                expected: natoms,
                found: 0,
            });
        }
        let pbox = self.parse_lattice()?;

        // The count is untrusted until the records are read
        let mut atoms = Vec::with_capacity(natoms.min(1 << 20));
        for id in 0..natoms {
            if !self.next_line()? {
                return Err(XyzHandlerError::Truncated {
                    frame,
                    expected: natoms,
                    found: id,
                });
            }
            let mut it = self.line.split_whitespace();
            let el = it.next();
            let mut coord = || it.next().and_then(|s| s.parse::<f32>().ok());
            match (el, coord(), coord(), coord()) {
                (Some(el), Some(x), Some(y), Some(z)) => {
                    atoms.push(Atom::new(id, el, Pos::new(x, y, z)))
                }
                _ => {
                    return Err(XyzHandlerError::AtomRecord {
                        frame,
                        text: self.line.trim().to_owned(),
                    })
                }
            }
        }

        self.cur += 1;
        Ok(Some(Frame::new(frame, atoms, pbox)?))
    }

    /// Skips up to `n` configurations without parsing coordinates.
    /// Returns the number of configurations actually skipped.
    pub fn skip_frames(&mut self, n: usize) -> Result<usize, XyzHandlerError> {
        for k in 0..n {
            let Some(natoms) = self.read_natoms()? else {
                return Ok(k);
            };
            // Comment line and atoms
            let n_lines = natoms.checked_add(1).ok_or(XyzHandlerError::NumAtoms {
                frame: self.cur,
                text: natoms.to_string(),
            })?;
            for found in 0..n_lines {
                if !self.next_line()? {
                    return Err(XyzHandlerError::Truncated {
                        frame: self.cur,
                        expected: natoms,
                        found: found.saturating_sub(1),
                    });
                }
            }
            self.cur += 1;
        }
        Ok(n)
    }

    /// Number of configurations in the file
    pub fn count(fname: &str) -> Result<usize, XyzHandlerError> {
        let mut h = Self::open(fname)?;
        h.skip_frames(usize::MAX)
    }

    /// Iterator over configurations `begin..end` taking every `stride`-th one.
    /// Skipped configurations are not parsed.
    pub fn into_window(self, begin: usize, end: Option<usize>, stride: usize) -> FrameWindow {
        FrameWindow {
            handler: self,
            begin,
            end,
            stride: stride.max(1),
            started: false,
            failed: false,
        }
    }
}

impl Iterator for XyzFileHandler {
    type Item = Result<Frame, XyzHandlerError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read().transpose()
    }
}

/// Strided window over the configurations of a trajectory
pub struct FrameWindow {
    handler: XyzFileHandler,
    begin: usize,
    end: Option<usize>,
    stride: usize,
    started: bool,
    failed: bool,
}

impl Iterator for FrameWindow {
    type Item = Result<Frame, XyzHandlerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let to_skip = if self.started {
            self.stride - 1
        } else {
            self.started = true;
            self.begin.saturating_sub(self.handler.position())
        };
        if let Err(e) = self.handler.skip_frames(to_skip) {
            self.failed = true;
            return Some(Err(e));
        }

        if self.end.is_some_and(|end| self.handler.position() >= end) {
            return None;
        }

        let res = self.handler.read().transpose();
        if matches!(res, Some(Err(_))) {
            self.failed = true;
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_traj(n_frames: usize) -> anyhow::Result<NamedTempFile> {
        let mut f = NamedTempFile::new()?;
        for i in 0..n_frames {
            writeln!(f, "3")?;
            writeln!(
                f,
                "Lattice=\"10.0 0.0 0.0 0.0 11.0 0.0 0.0 0.0 12.0\" Properties=species:S:1:pos:R:3"
            )?;
            writeln!(f, "Si {}.0 1.0 1.0", i)?;
            writeln!(f, "O 2.6 1.0 1.0 0.5")?;
            writeln!(f, "O -0.6 1.0 1.0")?;
        }
        Ok(f)
    }

    fn path(f: &NamedTempFile) -> String {
        f.path().to_string_lossy().into_owned()
    }

    #[test]
    fn read_frames() -> anyhow::Result<()> {
        let f = write_traj(3)?;
        let mut h = XyzFileHandler::open(&path(&f))?;
        let fr = h.read()?.unwrap();
        assert_eq!(fr.index(), 0);
        assert_eq!(fr.len(), 3);
        assert_eq!(fr.pbox().extents(), crate::core::Vector3f::new(10.0, 11.0, 12.0));
        assert_eq!(fr.count("O"), 2);
        // Wrapped into the box
        assert!((fr.atom(2).pos.x - 9.4).abs() < 1e-5);
        let rest: Vec<Frame> = h.collect::<Result<_, _>>()?;
        assert_eq!(rest.len(), 2);
        assert_eq!(rest[1].index(), 2);
        assert_eq!(rest[1].atom(0).pos.x, 2.0);
        Ok(())
    }

    #[test]
    fn count_and_skip() -> anyhow::Result<()> {
        let f = write_traj(5)?;
        assert_eq!(XyzFileHandler::count(&path(&f))?, 5);
        let mut h = XyzFileHandler::open(&path(&f))?;
        assert_eq!(h.skip_frames(3)?, 3);
        assert_eq!(h.read()?.unwrap().index(), 3);
        assert_eq!(h.skip_frames(10)?, 1);
        assert!(h.read()?.is_none());
        Ok(())
    }

    #[test]
    fn strided_window() -> anyhow::Result<()> {
        let f = write_traj(10)?;
        let idx = |begin, end, stride| -> anyhow::Result<Vec<usize>> {
            Ok(XyzFileHandler::open(&path(&f))?
                .into_window(begin, end, stride)
                .map(|fr| fr.map(|fr| fr.index()))
                .collect::<Result<_, _>>()?)
        };
        assert_eq!(idx(0, None, 1)?, (0..10).collect::<Vec<_>>());
        assert_eq!(idx(2, Some(9), 3)?, vec![2, 5, 8]);
        assert_eq!(idx(4, Some(5), 2)?, vec![4]);
        assert!(idx(12, None, 1)?.is_empty());
        Ok(())
    }

    #[test]
    fn malformed_input() -> anyhow::Result<()> {
        let mut f = NamedTempFile::new()?;
        write!(f, "2\nLattice=\"10 1 0 0 10 0 0 0 10\"\nSi 1 1 1\nO 2 2 2\n")?;
        let err = XyzFileHandler::open(&path(&f))?.read().unwrap_err();
        assert!(matches!(err, XyzHandlerError::NonOrthogonal { frame: 0 }));

        let mut f = NamedTempFile::new()?;
        write!(f, "2\ncomment without box\nSi 1 1 1\nO 2 2 2\n")?;
        let err = XyzFileHandler::open(&path(&f))?.read().unwrap_err();
        assert!(matches!(err, XyzHandlerError::NoLattice { frame: 0 }));

        let mut f = NamedTempFile::new()?;
        write!(f, "3\nLattice=\"10 0 0 0 10 0 0 0 10\"\nSi 1 1 1\nO 2 2 2\n")?;
        let err = XyzFileHandler::open(&path(&f))?.read().unwrap_err();
        assert!(matches!(
            err,
            XyzHandlerError::Truncated {
                expected: 3,
                found: 2,
                ..
            }
        ));

        let mut f = NamedTempFile::new()?;
        write!(f, "1\nLattice=\"10 0 0 0 10 0 0 0 10\"\nSi 1 x 1\n")?;
        let err = XyzFileHandler::open(&path(&f))?.read().unwrap_err();
        assert!(matches!(err, XyzHandlerError::AtomRecord { .. }));

        let mut f = NamedTempFile::new()?;
        write!(f, "1\nLattice=\"10 0 0 0 10 0 0 0 10\"\nXx 1 1 1\n")?;
        let err = XyzFileHandler::open(&path(&f))?.read().unwrap_err();
        assert!(matches!(err, XyzHandlerError::Frame(FrameError::UnknownElement { .. })));
        Ok(())
    }

    #[test]
    fn huge_atom_count() -> anyhow::Result<()> {
        let mut f = NamedTempFile::new()?;
        write!(f, "1000000000000000000\nLattice=\"10 0 0 0 10 0 0 0 10\"\nSi 1 1 1\n")?;
        let err = XyzFileHandler::open(&path(&f))?.read().unwrap_err();
        assert!(matches!(
            err,
            XyzHandlerError::Truncated {
                frame: 0,
                found: 1,
                ..
            }
        ));

        let mut f = NamedTempFile::new()?;
        write!(f, "{}\nLattice=\"10 0 0 0 10 0 0 0 10\"\nSi 1 1 1\n", usize::MAX)?;
        let err = XyzFileHandler::count(&path(&f)).unwrap_err();
        assert!(matches!(err, XyzHandlerError::NumAtoms { frame: 0, .. }));
        Ok(())
    }
}
