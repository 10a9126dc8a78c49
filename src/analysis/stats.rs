/// Running mean and standard deviation
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct MeanStd {
    x: f64,
    x2: f64,
    n: usize,
}

impl MeanStd {
    pub fn add(&mut self, val: f64) {
        self.x += val;
        self.x2 += val * val;
        self.n += 1;
    }

    pub fn merge(&mut self, other: &MeanStd) {
        self.x += other.x;
        self.x2 += other.x2;
        self.n += other.n;
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Mean and population standard deviation, `None` if nothing was accumulated
    pub fn compute(&self) -> Option<(f64, f64)> {
        if self.n == 0 {
            return None;
        }
        let n = self.n as f64;
        let mean = self.x / n;
        // Clamp tiny negative variance from rounding
        let stddev = ((self.x2 / n) - (mean * mean)).max(0.0).sqrt();
        Some((mean, stddev))
    }

    /// Same as [compute](Self::compute) but zeros for an empty accumulator
    pub fn compute_or_zero(&self) -> (f64, f64) {
        self.compute().unwrap_or((0.0, 0.0))
    }
}

/// Fixed-width histogram over `[min, max)`
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    min: f64,
    max: f64,
    counts: Vec<f64>,
}

impl Histogram {
    pub fn new(min: f64, max: f64, n_bins: usize) -> Self {
        Self {
            min,
            max,
            counts: vec![0.0; n_bins],
        }
    }

    pub fn n_bins(&self) -> usize {
        self.counts.len()
    }

    pub fn bin_width(&self) -> f64 {
        (self.max - self.min) / self.counts.len() as f64
    }

    pub fn bin_center(&self, i: usize) -> f64 {
        self.min + (i as f64 + 0.5) * self.bin_width()
    }

    pub fn bin_centers(&self) -> Vec<f64> {
        (0..self.n_bins()).map(|i| self.bin_center(i)).collect()
    }

    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    pub fn total(&self) -> f64 {
        self.counts.iter().sum()
    }

    fn bin_of(&self, val: f64) -> Option<usize> {
        if !(val >= self.min && val < self.max) {
            return None;
        }
        // Clamp for rounding at the upper edge
        Some((((val - self.min) / self.bin_width()) as usize).min(self.n_bins() - 1))
    }

    /// Adds a weighted value. Returns false if it falls outside of the range.
    pub fn add_weighted(&mut self, val: f64, weight: f64) -> bool {
        match self.bin_of(val) {
            Some(i) => {
                self.counts[i] += weight;
                true
            }
            None => false,
        }
    }

    pub fn add(&mut self, val: f64) -> bool {
        self.add_weighted(val, 1.0)
    }

    /// Like [add](Self::add), but a value exactly equal to `max` goes to the last bin
    pub fn add_closed(&mut self, val: f64) -> bool {
        if val == self.max {
            let last = self.n_bins() - 1;
            self.counts[last] += 1.0;
            true
        } else {
            self.add(val)
        }
    }

    pub fn merge(&mut self, other: &Histogram) {
        for (c, o) in self.counts.iter_mut().zip(other.counts.iter()) {
            *c += o;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_std() {
        let mut s = MeanStd::default();
        assert_eq!(s.compute(), None);
        for v in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            s.add(v);
        }
        let (m, sd) = s.compute().unwrap();
        assert!((m - 5.0).abs() < 1e-12);
        assert!((sd - 2.0).abs() < 1e-12);

        let mut a = MeanStd::default();
        let mut b = MeanStd::default();
        a.add(1.0);
        b.add(3.0);
        a.merge(&b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.compute_or_zero(), (2.0, 1.0));
    }

    #[test]
    fn histogram_binning() {
        let mut h = Histogram::new(0.0, 10.0, 5);
        assert_eq!(h.bin_width(), 2.0);
        assert_eq!(h.bin_center(0), 1.0);
        assert!(h.add(0.0));
        assert!(h.add(3.9));
        assert!(!h.add(10.0));
        assert!(!h.add(-0.1));
        assert!(h.add_closed(10.0));
        assert_eq!(h.counts(), &[1.0, 1.0, 0.0, 0.0, 1.0]);
        assert_eq!(h.total(), 3.0);
    }
}
