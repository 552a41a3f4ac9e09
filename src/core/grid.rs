//! Spatial partitioning of one snapshot into square cells, with an optional
//! ring of ghost cells that materializes the periodic boundary.
//!
//! Base cells cover `[0, L) × [0, L)` and live at `index = row * M + col`.
//! In periodic mode a ring of extension cells is appended after them:
//!
//! ```text
//! row -1 : cols 0..=M   -> indices M*M           .. M*M + M
//! col  M : rows 0..M    -> indices M*M + M+1     .. M*M + 2M
//! row  M : cols 0..=M   -> indices M*M + 2M + 1  .. M*M + 3M + 1
//! ```
//!
//! Every ring cell reached by a base cell's [`FORWARD_STENCIL`] holds copies of
//! the base cell `(row mod M, col mod M)`, shifted by whole domain lengths so
//! that they sit where the periodic image would be. The remaining ring cells
//! are empty fillers.

use crate::core::particle::Particle;
use crate::core::resolution::{Resolution, DIVISIBILITY_TOLERANCE};
use crate::error::{Error, Result};

/// Half stencil scanned from every cell as `(d_row, d_col)`: up, up-right, right, down-right.
pub const FORWARD_STENCIL: [(isize, isize); 4] = [(-1, 0), (-1, 1), (0, 1), (1, 1)];

/// One grid bucket: indices into the grid's particle store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    members: Vec<usize>,
}

impl Cell {
    /// Indices of the particles (real or ghost) in this cell.
    #[inline]
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Immutable cell grid for one snapshot, built once and then only read.
#[derive(Debug, Clone)]
pub struct Grid {
    domain: f64,
    resolution: Resolution,
    periodic: bool,
    /// Real particles first, ghosts appended after `real_count`.
    particles: Vec<Particle>,
    real_count: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Partition `particles` into the base cells and, if `periodic`, build the ghost ring.
    ///
    /// A resolution with `m == 0` yields a grid with no cells.
    ///
    /// Errors:
    /// - `Error::Configuration` if the resolution does not tile the domain.
    /// - `Error::Data` if a particle lies outside `[0, L)` on either axis.
    pub fn build(
        domain: f64,
        resolution: Resolution,
        particles: &[Particle],
        periodic: bool,
    ) -> Result<Self> {
        if resolution.m == 0 {
            log::warn!("degenerate grid resolution (M = 0); no cells built");
            return Ok(Self {
                domain,
                resolution,
                periodic,
                particles: Vec::new(),
                real_count: 0,
                cells: Vec::new(),
            });
        }
        let tiled = resolution.m as f64 * resolution.cell_width;
        if !(resolution.cell_width > 0.0) || (tiled - domain).abs() > DIVISIBILITY_TOLERANCE {
            return Err(Error::Configuration(format!(
                "{} cells of width {} do not tile a domain of size {domain}",
                resolution.m, resolution.cell_width
            )));
        }

        let mut grid = Self {
            domain,
            resolution,
            periodic,
            particles: particles.to_vec(),
            real_count: particles.len(),
            cells: vec![Cell::default(); resolution.cell_count()],
        };
        grid.partition()?;
        if periodic {
            grid.build_ghost_layer();
        }
        log::debug!(
            "grid built: M={}, {} base cells, {} extension cells, {} ghosts",
            resolution.m,
            resolution.cell_count(),
            grid.cells.len() - resolution.cell_count(),
            grid.ghost_particles().len()
        );
        Ok(grid)
    }

    #[inline]
    pub fn domain(&self) -> f64 {
        self.domain
    }

    #[inline]
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    #[inline]
    pub fn is_periodic(&self) -> bool {
        self.periodic
    }

    /// All cells: base cells followed by extension cells.
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[inline]
    pub fn base_cells(&self) -> &[Cell] {
        &self.cells[..self.cells.len().min(self.resolution.cell_count())]
    }

    #[inline]
    pub fn extension_cells(&self) -> &[Cell] {
        &self.cells[self.base_cells().len()..]
    }

    /// Particle store: real particles then ghosts. Cells index into this.
    #[inline]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[inline]
    pub fn particle(&self, index: usize) -> &Particle {
        &self.particles[index]
    }

    #[inline]
    pub fn real_particles(&self) -> &[Particle] {
        &self.particles[..self.real_count]
    }

    #[inline]
    pub fn ghost_particles(&self) -> &[Particle] {
        &self.particles[self.real_count..]
    }

    /// Cell index for grid coordinates, `None` if no cell is allocated there.
    ///
    /// Base coordinates are `0 <= row, col < M`; ring coordinates exist only in periodic mode.
    pub fn index_of(&self, row: isize, col: isize) -> Option<usize> {
        let m = self.resolution.m as isize;
        if m == 0 {
            return None;
        }
        if (0..m).contains(&row) && (0..m).contains(&col) {
            return Some((row * m + col) as usize);
        }
        if !self.periodic {
            return None;
        }
        let base = m * m;
        let index = match (row, col) {
            (-1, c) if (0..=m).contains(&c) => base + c,
            (r, c) if c == m && (0..m).contains(&r) => base + (m + 1) + r,
            (r, c) if r == m && (0..=m).contains(&c) => base + (m + 1) + m + c,
            _ => return None,
        };
        Some(index as usize)
    }

    /// Grid coordinates `(row, col)` of a cell index; inverse of [`Grid::index_of`].
    pub fn coordinates_of(&self, index: usize) -> Option<(isize, isize)> {
        if index >= self.cells.len() {
            return None;
        }
        let m = self.resolution.m;
        if index < m * m {
            return Some(((index / m) as isize, (index % m) as isize));
        }
        extension_positions(m).nth(index - m * m)
    }

    /// Cell at grid coordinates, `None` outside the allocated cells.
    #[inline]
    pub fn cell_at(&self, row: isize, col: isize) -> Option<&Cell> {
        self.index_of(row, col).map(|i| &self.cells[i])
    }

    /// Assign each real particle to its base cell by floor division of its coordinates.
    fn partition(&mut self) -> Result<()> {
        let Resolution { m, cell_width } = self.resolution;
        for (index, p) in self.particles.iter().enumerate() {
            let (Some(col), Some(row)) = (
                axis_cell(p.x(), self.domain, cell_width, m),
                axis_cell(p.y(), self.domain, cell_width, m),
            ) else {
                return Err(Error::Data(format!(
                    "particle {} at ({}, {}) lies outside the domain [0, {})",
                    p.id(),
                    p.x(),
                    p.y(),
                    self.domain
                )));
            };
            self.cells[row * m + col].members.push(index);
        }
        Ok(())
    }

    /// Append the periodic ring. Reads only base cells, so ghosts never spawn ghosts.
    fn build_ghost_layer(&mut self) {
        let m = self.resolution.m;
        let mi = m as isize;
        let base_count = m * m;

        for (k, (row, col)) in extension_positions(m).enumerate() {
            let mut cell = Cell::default();
            if is_stencil_target(mi, row, col) {
                let source = (row.rem_euclid(mi) * mi + col.rem_euclid(mi)) as usize;
                let dx = self.domain * col.div_euclid(mi) as f64;
                let dy = self.domain * row.div_euclid(mi) as f64;
                let ghosts: Vec<Particle> = self.cells[source]
                    .members
                    .iter()
                    .map(|&i| self.particles[i].translated(dx, dy))
                    .collect();
                for ghost in ghosts {
                    cell.members.push(self.particles.len());
                    self.particles.push(ghost);
                }
            }
            debug_assert_eq!(self.cells.len(), base_count + k);
            self.cells.push(cell);
        }
    }
}

/// Cell coordinate on one axis, `None` outside `[0, L)`.
fn axis_cell(value: f64, domain: f64, cell_width: f64, m: usize) -> Option<usize> {
    if !(0.0..domain).contains(&value) {
        return None;
    }
    // a value just below L may round up to M
    Some(((value / cell_width).floor() as usize).min(m - 1))
}

/// Ring coordinates in append order: row -1, then column M, then row M.
fn extension_positions(m: usize) -> impl Iterator<Item = (isize, isize)> {
    let m = m as isize;
    let top = (0..=m).map(|c| (-1, c));
    let right = (0..m).map(move |r| (r, m));
    let bottom = (0..=m).map(move |c| (m, c));
    top.chain(right).chain(bottom)
}

/// Whether some base cell reaches `(row, col)` through the forward stencil.
fn is_stencil_target(m: isize, row: isize, col: isize) -> bool {
    FORWARD_STENCIL.iter().any(|&(dr, dc)| {
        let (r, c) = (row - dr, col - dc);
        (0..m).contains(&r) && (0..m).contains(&c)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resolution::select_resolution;

    fn p(id: u32, x: f64, y: f64) -> Particle {
        Particle::new(id, x, y, 0.0).unwrap()
    }

    fn res(m: usize, w: f64) -> Resolution {
        Resolution { m, cell_width: w }
    }

    #[test]
    fn partition_uses_row_major_index() -> Result<()> {
        let ps = [p(0, 0.5, 0.5), p(1, 3.1, 0.2), p(2, 0.2, 9.9), p(3, 9.99, 5.0)];
        let grid = Grid::build(10.0, res(5, 2.0), &ps, false)?;
        assert_eq!(grid.cells().len(), 25);
        assert_eq!(grid.cells()[0].members(), &[0]);
        assert_eq!(grid.cells()[1].members(), &[1]);
        assert_eq!(grid.cells()[4 * 5].members(), &[2]);
        assert_eq!(grid.cells()[2 * 5 + 4].members(), &[3]);
        assert!(grid.extension_cells().is_empty());
        assert!(grid.ghost_particles().is_empty());
        Ok(())
    }

    #[test]
    fn every_particle_lands_in_exactly_one_base_cell() -> Result<()> {
        let ps: Vec<Particle> = (0..50)
            .map(|i| p(i, f64::from(i) * 0.19, 9.5 - f64::from(i) * 0.17))
            .collect();
        let grid = Grid::build(10.0, select_resolution(10.0, 1.0, 0.0)?, &ps, false)?;
        let total: usize = grid.base_cells().iter().map(Cell::len).sum();
        assert_eq!(total, ps.len());
        Ok(())
    }

    #[test]
    fn particles_outside_domain_are_rejected() {
        for (x, y) in [(-0.1, 1.0), (1.0, 10.0), (10.0, 1.0), (1.0, -1e-9)] {
            let err = Grid::build(10.0, res(5, 2.0), &[p(4, x, y)], false).unwrap_err();
            assert!(matches!(err, Error::Data(_)), "({x}, {y}) accepted");
            assert!(err.to_string().contains("particle 4"));
        }
    }

    #[test]
    fn coordinate_just_below_domain_stays_in_last_cell() -> Result<()> {
        let x = f64::from_bits(10.0_f64.to_bits() - 1);
        let grid = Grid::build(10.0, res(5, 2.0), &[p(0, x, x)], false)?;
        assert_eq!(grid.cells()[24].members(), &[0]);
        Ok(())
    }

    #[test]
    fn inconsistent_resolution_is_rejected() {
        let err = Grid::build(10.0, res(4, 2.0), &[], false).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn zero_resolution_builds_empty_grid() -> Result<()> {
        let grid = Grid::build(10.0, res(0, 2.0), &[p(0, 1.0, 1.0)], true)?;
        assert!(grid.cells().is_empty());
        assert!(grid.particles().is_empty());
        assert_eq!(grid.index_of(0, 0), None);
        Ok(())
    }

    #[test]
    fn ring_indices_round_trip() -> Result<()> {
        let grid = Grid::build(10.0, res(5, 2.0), &[], true)?;
        assert_eq!(grid.cells().len(), 25 + 3 * 5 + 2);
        for index in 0..grid.cells().len() {
            let (row, col) = grid.coordinates_of(index).unwrap();
            assert_eq!(grid.index_of(row, col), Some(index));
        }
        assert_eq!(grid.index_of(-1, 0), Some(25));
        assert_eq!(grid.index_of(-1, 5), Some(30));
        assert_eq!(grid.index_of(0, 5), Some(31));
        assert_eq!(grid.index_of(5, 0), Some(36));
        assert_eq!(grid.index_of(5, 5), Some(41));
        assert_eq!(grid.index_of(-1, -1), None);
        assert_eq!(grid.index_of(2, -1), None);
        assert_eq!(grid.index_of(6, 2), None);
        assert_eq!(grid.coordinates_of(42), None);
        Ok(())
    }

    #[test]
    fn open_grid_has_no_ring() -> Result<()> {
        let grid = Grid::build(10.0, res(5, 2.0), &[], false)?;
        assert_eq!(grid.index_of(-1, 0), None);
        assert_eq!(grid.index_of(0, 5), None);
        assert_eq!(grid.index_of(5, 5), None);
        Ok(())
    }

    #[test]
    fn ghosts_are_translated_images() -> Result<()> {
        let l = 10.0;
        // one particle in each corner cell and one mid-edge
        let ps = [
            p(0, 0.5, 0.5),  // (0, 0)
            p(1, 9.5, 0.5),  // (0, 4)
            p(2, 0.5, 9.5),  // (4, 0)
            p(3, 9.5, 9.5),  // (4, 4)
            p(4, 4.5, 9.5),  // (4, 2)
            p(5, 5.0, 5.0),  // interior, never copied
        ];
        let grid = Grid::build(l, res(5, 2.0), &ps, true)?;

        let ghosts_at = |row: isize, col: isize| -> Vec<(u32, [f64; 2])> {
            grid.cell_at(row, col)
                .unwrap()
                .members()
                .iter()
                .map(|&i| (grid.particle(i).id(), grid.particle(i).position()))
                .collect()
        };

        // row -1 mirrors the last row shifted by -L
        assert_eq!(ghosts_at(-1, 0), vec![(2, [0.5, -0.5])]);
        assert_eq!(ghosts_at(-1, 2), vec![(4, [4.5, -0.5])]);
        assert_eq!(ghosts_at(-1, 4), vec![(3, [9.5, -0.5])]);
        // corner beyond the first row's right end: (M-1, 0) shifted (+L, -L)
        assert_eq!(ghosts_at(-1, 5), vec![(2, [10.5, -0.5])]);
        // column M mirrors column 0 shifted by +L
        assert_eq!(ghosts_at(0, 5), vec![(0, [10.5, 0.5])]);
        assert_eq!(ghosts_at(4, 5), vec![(2, [10.5, 9.5])]);
        // row M mirrors row 0 shifted by +L
        assert_eq!(ghosts_at(5, 4), vec![(1, [9.5, 10.5])]);
        // bottom-right corner: (0, 0) shifted (+L, +L)
        assert_eq!(ghosts_at(5, 5), vec![(0, [10.5, 10.5])]);
        // (M, 0) is not reached by any forward stencil
        assert!(ghosts_at(5, 0).is_empty());

        // interior particle never copied; ghost ids always refer to real particles
        assert!(grid.ghost_particles().iter().all(|g| g.id() != 5));
        assert!(grid.ghost_particles().iter().all(|g| g.id() < 5));
        assert_eq!(grid.real_particles(), &ps);
        Ok(())
    }

    #[test]
    fn ghost_layer_does_not_compound() -> Result<()> {
        // a single corner particle in (M-1, M-1) feeds row -1 col M-1 only;
        // reading ghost cells would copy it again into the corners
        let grid = Grid::build(10.0, res(5, 2.0), &[p(0, 9.0, 9.0)], true)?;
        assert_eq!(grid.ghost_particles().len(), 1);
        assert_eq!(grid.ghost_particles()[0].position(), [9.0, -1.0]);

        // (0, 0) feeds (0, M) and (M, M); (M, 0) is a filler
        let grid = Grid::build(10.0, res(5, 2.0), &[p(0, 1.0, 1.0)], true)?;
        let mut shifted: Vec<[f64; 2]> =
            grid.ghost_particles().iter().map(Particle::position).collect();
        shifted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(shifted, vec![[11.0, 1.0], [11.0, 11.0]]);
        Ok(())
    }

    #[test]
    fn single_cell_grid_surrounds_itself() -> Result<()> {
        let grid = Grid::build(4.0, res(1, 4.0), &[p(0, 1.0, 1.0)], true)?;
        // reached: (-1, 0) up, (-1, 1) up-right, (0, 1) right, (1, 1) down-right
        let mut shifted: Vec<[f64; 2]> =
            grid.ghost_particles().iter().map(Particle::position).collect();
        shifted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(
            shifted,
            vec![[1.0, -3.0], [5.0, -3.0], [5.0, 1.0], [5.0, 5.0]]
        );
        Ok(())
    }
}
