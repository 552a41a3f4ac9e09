//! Cell-index (linked-cell) neighbor search for circular particles in a square domain.
//!
//! ```
//! use cellindex::core::{find_neighbors, Particle, SearchConfig};
//!
//! # fn main() -> cellindex::error::Result<()> {
//! let particles = [
//!     Particle::new(0, 0.1, 0.1, 0.0)?,
//!     Particle::new(1, 9.9, 9.9, 0.0)?,
//! ];
//! let config = SearchConfig::new(10.0, 1.0)?;
//! let neighbors = find_neighbors(&config, &particles)?;
//! assert!(neighbors.are_neighbors(0, 1));
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod error;
pub mod io;

#[cfg(feature = "python")]
mod python;
