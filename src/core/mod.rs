//! Cell-index neighbor search for one snapshot of circular particles.
//!
//! Pipeline: [`resolution::select_resolution`] → [`grid::Grid::build`]
//! (partition, then the optional periodic ghost ring) → [`neighbors::enumerate`].
//! [`search::CellIndex`] runs the whole pipeline from a [`search::SearchConfig`].

pub mod grid;
pub mod neighbors;
pub mod particle;
pub mod resolution;
pub mod search;

pub use grid::{Cell, Grid};
pub use neighbors::{NeighborMap, SameCellRule};
pub use particle::Particle;
pub use resolution::Resolution;
pub use search::{
    brute_force_neighbors, find_neighbors, validate_snapshot, CellIndex, SearchConfig,
};
