use crate::core::grid::Grid;
use crate::core::neighbors::{enumerate, NeighborMap, SameCellRule};
use crate::core::particle::{max_radius, Particle};
use crate::core::resolution::{select_resolution, Resolution};
use crate::error::{Error, Result};
use std::collections::HashSet;

/// Parameters of one neighbor search.
///
/// Fields:
/// - `domain`: side `L` of the square domain `[0, L) × [0, L)`
/// - `cutoff`: maximum surface-to-surface gap `rc` for two particles to be neighbors
/// - `periodic`: wrap both axes
/// - `same_cell`: treatment of particles sharing a cell
/// - `parallel`: scan cells on the rayon thread pool
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchConfig {
    pub domain: f64,
    pub cutoff: f64,
    pub periodic: bool,
    pub same_cell: SameCellRule,
    pub parallel: bool,
}

impl SearchConfig {
    /// Periodic, serial search where cell members are always neighbors.
    ///
    /// Errors:
    /// - `Error::InvalidParam` if `domain` is not finite and > 0, or `cutoff` is not finite and >= 0.
    pub fn new(domain: f64, cutoff: f64) -> Result<Self> {
        if !domain.is_finite() || domain <= 0.0 {
            return Err(Error::InvalidParam(format!(
                "domain size must be finite and > 0, got {domain}"
            )));
        }
        if !cutoff.is_finite() || cutoff < 0.0 {
            return Err(Error::InvalidParam(format!(
                "cutoff must be finite and >= 0, got {cutoff}"
            )));
        }
        Ok(Self {
            domain,
            cutoff,
            periodic: true,
            same_cell: SameCellRule::Always,
            parallel: false,
        })
    }

    pub fn periodic(mut self, periodic: bool) -> Self {
        self.periodic = periodic;
        self
    }

    /// `true` keeps the unconditional same-cell rule, `false` distance-tests cell members too.
    pub fn same_cell_always_neighbors(mut self, always: bool) -> Self {
        self.same_cell = if always {
            SameCellRule::Always
        } else {
            SameCellRule::DistanceTest
        };
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Cell-index neighbor search over one snapshot.
///
/// Building it selects the resolution, partitions the particles and (in periodic
/// mode) materializes the ghost ring; [`CellIndex::neighbors`] then only reads the grid.
#[derive(Debug, Clone)]
pub struct CellIndex {
    config: SearchConfig,
    grid: Grid,
}

impl CellIndex {
    /// Errors:
    /// - `Error::Data` if two particles share an id or a particle lies outside the domain.
    /// - `Error::Configuration` if no safe grid exists for the domain, cutoff and largest radius.
    pub fn new(config: SearchConfig, particles: &[Particle]) -> Result<Self> {
        validate_snapshot(&config, particles)?;
        let resolution = select_resolution(config.domain, config.cutoff, max_radius(particles))?;
        let grid = Grid::build(config.domain, resolution, particles, config.periodic)?;
        Ok(Self { config, grid })
    }

    #[inline]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    #[inline]
    pub fn resolution(&self) -> Resolution {
        self.grid.resolution()
    }

    /// The built grid, base and extension cells, for inspection or rendering.
    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn neighbors(&self) -> NeighborMap {
        enumerate(
            &self.grid,
            self.config.cutoff,
            self.config.same_cell,
            self.config.parallel,
        )
    }
}

/// Build a [`CellIndex`] and enumerate its neighbors in one call.
pub fn find_neighbors(config: &SearchConfig, particles: &[Particle]) -> Result<NeighborMap> {
    Ok(CellIndex::new(*config, particles)?.neighbors())
}

/// All-pairs O(n²) search with the same cutoff test.
///
/// In periodic mode a pair qualifies if any of the nine images of the second
/// particle is within the cutoff. There is no same-cell rule here, so this is
/// the reference the grid search is checked against. Input is not validated;
/// run [`validate_snapshot`] first.
pub fn brute_force_neighbors(config: &SearchConfig, particles: &[Particle]) -> NeighborMap {
    let shifts: &[f64] = if config.periodic {
        &[-1.0, 0.0, 1.0]
    } else {
        &[0.0]
    };
    let l = config.domain;
    let mut pairs = Vec::new();
    for (i, p) in particles.iter().enumerate() {
        for q in &particles[i + 1..] {
            let hit = shifts.iter().any(|&sx| {
                shifts
                    .iter()
                    .any(|&sy| p.within(&q.translated(sx * l, sy * l), config.cutoff))
            });
            if hit {
                pairs.push((p.id(), q.id()));
            }
        }
    }
    NeighborMap::from_pairs(pairs)
}

/// Check a snapshot before either search runs.
///
/// Errors:
/// - `Error::Data` if two particles share an id or a particle lies outside `[0, L)` on either axis.
pub fn validate_snapshot(config: &SearchConfig, particles: &[Particle]) -> Result<()> {
    let mut seen = HashSet::with_capacity(particles.len());
    let inside = 0.0..config.domain;
    for p in particles {
        if !seen.insert(p.id()) {
            return Err(Error::Data(format!("duplicate particle id {}", p.id())));
        }
        if !inside.contains(&p.x()) || !inside.contains(&p.y()) {
            return Err(Error::Data(format!(
                "particle {} at ({}, {}) lies outside the domain [0, {})",
                p.id(),
                p.x(),
                p.y(),
                config.domain
            )));
        }
    }
    Ok(())
}
