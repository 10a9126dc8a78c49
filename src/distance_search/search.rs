use super::cell_pair_iterator::CellPairIter;
use super::grid::*;
use crate::core::{IdPosIterator, PeriodicBox, Pos};
use log::debug;

/// Pre-allocated size of buffer for found pairs
const INIT_BUF_SIZE: usize = 1000;

/// Pair of points within the cutoff. Always `i < j`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoundPair {
    pub i: usize,
    pub j: usize,
    pub d: f32,
}

// Distance is always computed from the lower index to the higher one,
// so any search path gives bit-identical values for the same pair.
#[inline(always)]
fn accept_pair(
    pbox: &PeriodicBox,
    cutoff2: f32,
    (i, pi): (usize, &Pos),
    (j, pj): (usize, &Pos),
) -> Option<FoundPair> {
    let ((i, pi), (j, pj)) = if i < j {
        ((i, pi), (j, pj))
    } else {
        ((j, pj), (i, pi))
    };
    let d2 = pbox.distance_squared(pi, pj);
    (d2 <= cutoff2).then(|| FoundPair { i, j, d: d2.sqrt() })
}

fn sort_pairs(found: &mut [FoundPair]) {
    found.sort_unstable_by(|a, b| (a.i, a.j).cmp(&(b.i, b.j)));
}

//========================================================
/// Periodic cell-list searcher for all pairs within a single cutoff
pub struct DistanceSearcher {
    grid: Grid<GridCellData>,
    pbox: PeriodicBox,
    cutoff: f32,
}

impl DistanceSearcher {
    pub fn new<'a>(cutoff: f32, id_pos: impl IdPosIterator<'a>, pbox: &PeriodicBox) -> Self {
        let mut grid = Grid::from_cutoff_and_box(cutoff, pbox);
        grid.populate_periodic(id_pos, pbox);
        Self {
            grid,
            pbox: *pbox,
            cutoff,
        }
    }

    pub fn grid_size(&self) -> [usize; 3] {
        self.grid.dim()
    }

    /// All pairs within the cutoff sorted by `(i, j)`
    pub fn search(&self) -> Vec<FoundPair> {
        let cutoff2 = self.cutoff.powi(2);
        let mut found = Vec::with_capacity(INIT_BUF_SIZE);
        for pair in CellPairIter::new(&self.grid.dim()) {
            self.search_cell_pair(pair, cutoff2, &mut found);
        }
        sort_pairs(&mut found);
        found
    }

    fn search_cell_pair(&self, pair: CellPair, cutoff2: f32, found: &mut Vec<FoundPair>) {
        let cell1 = &self.grid[&pair.c1];
        let cell2 = &self.grid[&pair.c2];
        let n1 = cell1.len();
        let n2 = cell2.len();

        // Nothing to do if cell is empty
        if n1 * n2 == 0 {
            return;
        }

        if pair.c1 == pair.c2 {
            // Same cell
            for i in 0..n1 - 1 {
                for j in i + 1..n1 {
                    if let Some(p) = accept_pair(
                        &self.pbox,
                        cutoff2,
                        (cell1.ids[i], &cell1.coords[i]),
                        (cell1.ids[j], &cell1.coords[j]),
                    ) {
                        found.push(p);
                    }
                }
            }
        } else {
            // Different cells
            for i in 0..n1 {
                for j in 0..n2 {
                    if let Some(p) = accept_pair(
                        &self.pbox,
                        cutoff2,
                        (cell1.ids[i], &cell1.coords[i]),
                        (cell2.ids[j], &cell2.coords[j]),
                    ) {
                        found.push(p);
                    }
                }
            }
        }
    }
}

/// Finds all pairs of points within `cutoff` using the periodic cell grid.
///
/// Points are identified by their index in `positions`.
pub fn search_pairs_within(cutoff: f32, positions: &[Pos], pbox: &PeriodicBox) -> Vec<FoundPair> {
    let searcher = DistanceSearcher::new(cutoff, positions.iter().enumerate(), pbox);
    debug!("search grid {:?} for cutoff {cutoff}", searcher.grid_size());
    searcher.search()
}

/// Reference all-pairs search. Gives exactly the same result as
/// [search_pairs_within] in O(N²).
pub fn search_pairs_brute_force(
    cutoff: f32,
    positions: &[Pos],
    pbox: &PeriodicBox,
) -> Vec<FoundPair> {
    let cutoff2 = cutoff.powi(2);
    let mut found = Vec::with_capacity(INIT_BUF_SIZE);
    for i in 0..positions.len() {
        for j in i + 1..positions.len() {
            if let Some(p) = accept_pair(pbox, cutoff2, (i, &positions[i]), (j, &positions[j])) {
                found.push(p);
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn random_points(n: usize, pbox: &PeriodicBox, seed: u64) -> Vec<Pos> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let e = pbox.extents();
        (0..n)
            .map(|_| {
                Pos::new(
                    rng.gen_range(0.0..e.x),
                    rng.gen_range(0.0..e.y),
                    rng.gen_range(0.0..e.z),
                )
            })
            .collect()
    }

    #[test]
    fn grid_matches_brute_force() -> anyhow::Result<()> {
        for (seed, (lx, ly, lz), cutoff) in [
            (1, (20.0, 20.0, 20.0), 3.5),
            (2, (15.0, 9.0, 30.0), 3.0),
            (3, (7.0, 7.0, 7.0), 3.4),
            (4, (5.0, 12.0, 8.0), 2.4),
            (5, (4.0, 4.0, 4.0), 3.0),
        ] {
            let b = PeriodicBox::new(lx, ly, lz)?;
            let pts = random_points(300, &b, seed);
            let grid = search_pairs_within(cutoff, &pts, &b);
            let brute = search_pairs_brute_force(cutoff, &pts, &b);
            assert!(!brute.is_empty());
            assert_eq!(grid, brute, "seed {seed}");
        }
        Ok(())
    }

    #[test]
    fn pairs_across_boundary() -> anyhow::Result<()> {
        let b = PeriodicBox::new(10.0, 10.0, 10.0)?;
        let pts = [Pos::new(0.1, 0.0, 0.0), Pos::new(9.9, 0.0, 0.0)];
        let found = search_pairs_within(1.0, &pts, &b);
        assert_eq!(found.len(), 1);
        assert_eq!((found[0].i, found[0].j), (0, 1));
        assert!((found[0].d - 0.2).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn cutoff_is_inclusive() -> anyhow::Result<()> {
        let b = PeriodicBox::new(10.0, 10.0, 10.0)?;
        let pts = [Pos::new(1.0, 1.0, 1.0), Pos::new(3.0, 1.0, 1.0)];
        assert_eq!(search_pairs_within(2.0, &pts, &b).len(), 1);
        assert_eq!(search_pairs_within(1.99, &pts, &b).len(), 0);
        Ok(())
    }
}
