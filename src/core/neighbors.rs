use crate::core::grid::{Grid, FORWARD_STENCIL};
use rayon::prelude::{IntoParallelIterator, ParallelIterator};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// How two particles sharing a cell are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameCellRule {
    /// Cell members are neighbors of each other without a distance test.
    #[default]
    Always,
    /// Cell members go through the same cutoff test as cross-cell pairs.
    DistanceTest,
}

/// Particle id → ids of the particles found within the cutoff of it.
///
/// Only particles with at least one neighbor have an entry. Each unordered pair
/// appears exactly once in each of the two lists, in the order pairs were found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeighborMap {
    entries: BTreeMap<u32, Vec<u32>>,
}

impl NeighborMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from unordered pairs, keeping the first occurrence of each.
    /// Self-pairs are dropped.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        let mut seen: HashSet<(u32, u32)> = HashSet::new();
        let mut map = Self::new();
        for (a, b) in pairs {
            if a == b || !seen.insert((a.min(b), a.max(b))) {
                continue;
            }
            map.entries.entry(a).or_default().push(b);
            map.entries.entry(b).or_default().push(a);
        }
        map
    }

    /// Neighbors of `id`; empty when it has none.
    pub fn get(&self, id: u32) -> &[u32] {
        self.entries.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `id` has an entry (at least one neighbor).
    pub fn contains(&self, id: u32) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn are_neighbors(&self, a: u32, b: u32) -> bool {
        self.get(a).contains(&b)
    }

    /// Number of particles with at least one neighbor.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[u32])> {
        self.entries.iter().map(|(&id, list)| (id, list.as_slice()))
    }

    /// Every neighbor relation as `(low id, high id)`.
    pub fn pairs(&self) -> BTreeSet<(u32, u32)> {
        self.entries
            .iter()
            .flat_map(|(&a, list)| list.iter().map(move |&b| (a.min(b), a.max(b))))
            .collect()
    }

    /// Number of unordered neighbor pairs.
    pub fn pair_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum::<usize>() / 2
    }
}

/// Scan every base cell of `grid`: intra-cell pairs, then the forward stencil.
///
/// Stencil targets with no allocated cell are skipped; in periodic mode the
/// ghost ring supplies the wrapped cells. With `parallel`, cells are scanned on
/// the rayon pool and merged in cell order, giving the same map as a serial scan.
pub fn enumerate(grid: &Grid, cutoff: f64, same_cell: SameCellRule, parallel: bool) -> NeighborMap {
    let cells = grid.base_cells().len();
    let per_cell: Vec<Vec<(u32, u32)>> = if parallel {
        (0..cells)
            .into_par_iter()
            .map(|index| cell_pairs(grid, index, cutoff, same_cell))
            .collect()
    } else {
        (0..cells)
            .map(|index| cell_pairs(grid, index, cutoff, same_cell))
            .collect()
    };

    let found: usize = per_cell.iter().map(Vec::len).sum();
    let map = NeighborMap::from_pairs(per_cell.into_iter().flatten());
    log::debug!(
        "scanned {cells} cells: {found} pair hits, {} distinct pairs",
        map.pair_count()
    );
    map
}

/// Pairs discovered from base cell `index`, as `(id in this cell, id in other cell)`.
fn cell_pairs(grid: &Grid, index: usize, cutoff: f64, same_cell: SameCellRule) -> Vec<(u32, u32)> {
    let mut out = Vec::new();
    let Some((row, col)) = grid.coordinates_of(index) else {
        return out;
    };
    let members = grid.cells()[index].members();

    for (k, &a) in members.iter().enumerate() {
        let p = grid.particle(a);
        for &b in &members[k + 1..] {
            let q = grid.particle(b);
            if p.id() == q.id() {
                continue;
            }
            if same_cell == SameCellRule::Always || p.within(q, cutoff) {
                out.push((p.id(), q.id()));
            }
        }
    }

    for (dr, dc) in FORWARD_STENCIL {
        let Some(target) = grid.cell_at(row + dr, col + dc) else {
            continue;
        };
        for &a in members {
            let p = grid.particle(a);
            for &b in target.members() {
                let q = grid.particle(b);
                // a ghost of p itself
                if p.id() == q.id() {
                    continue;
                }
                if p.within(q, cutoff) {
                    out.push((p.id(), q.id()));
                }
            }
        }
    }
    out
}
