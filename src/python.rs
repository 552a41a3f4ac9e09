use numpy::PyReadonlyArray1;
use numpy::PyReadonlyArray2;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::core::resolution::select_resolution;
use crate::core::{CellIndex, Particle, SearchConfig};

fn py_err<E: ToString>(e: E) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Python-facing wrapper around the cell-index neighbor search.
///
/// API:
/// - __new__(domain, cutoff, periodic=True, same_cell_always=True, parallel=False)
/// - neighbors(positions, radii) -> dict[int, list[int]]
/// - resolution(max_radius=0.0) -> (M, cell_width)
#[pyclass]
pub struct CellIndexSearch {
    config: SearchConfig,
}

impl CellIndexSearch {
    fn build<'py>(
        &self,
        positions: &PyReadonlyArray2<'py, f64>,
        radii: &PyReadonlyArray1<'py, f64>,
    ) -> PyResult<CellIndex> {
        let pos = positions.as_array();
        let rad = radii.as_array();
        if pos.ndim() != 2 || pos.shape()[1] != 2 {
            return Err(py_err(format!(
                "positions must have shape (N, 2), got {:?}",
                pos.shape()
            )));
        }
        if rad.len() != pos.shape()[0] {
            return Err(py_err(format!(
                "radii must have length {}, got {}",
                pos.shape()[0],
                rad.len()
            )));
        }
        let particles = (0..rad.len())
            .map(|i| Particle::new(i as u32, pos[[i, 0]], pos[[i, 1]], rad[i]))
            .collect::<crate::error::Result<Vec<_>>>()
            .map_err(py_err)?;
        CellIndex::new(self.config, &particles).map_err(py_err)
    }
}

#[pymethods]
impl CellIndexSearch {
    /// Configure a search over the square domain [0, domain) x [0, domain).
    ///
    /// Errors: raises ValueError on invalid parameters.
    #[new]
    #[pyo3(signature = (domain, cutoff, periodic=true, same_cell_always=true, parallel=false))]
    fn new(
        domain: f64,
        cutoff: f64,
        periodic: bool,
        same_cell_always: bool,
        parallel: bool,
    ) -> PyResult<Self> {
        let config = SearchConfig::new(domain, cutoff)
            .map_err(py_err)?
            .periodic(periodic)
            .same_cell_always_neighbors(same_cell_always)
            .parallel(parallel);
        Ok(Self { config })
    }

    /// Neighbor lists keyed by particle index, for positions of shape (N, 2) and N radii.
    /// Releases the GIL during the search.
    fn neighbors<'py>(
        &self,
        py: Python<'py>,
        positions: PyReadonlyArray2<'py, f64>,
        radii: PyReadonlyArray1<'py, f64>,
    ) -> PyResult<Py<PyDict>> {
        let index = self.build(&positions, &radii)?;
        let map = py.detach(|| index.neighbors());
        let out = PyDict::new(py);
        for (id, list) in map.iter() {
            out.set_item(id, list.to_vec())?;
        }
        Ok(out.into())
    }

    /// Grid resolution (M, cell_width) chosen for this configuration and the largest radius.
    #[pyo3(signature = (max_radius=0.0))]
    fn resolution(&self, max_radius: f64) -> PyResult<(usize, f64)> {
        let res = select_resolution(self.config.domain, self.config.cutoff, max_radius)
            .map_err(py_err)?;
        Ok((res.m, res.cell_width))
    }
}

/// The cellindex Python module entry point.
#[pymodule]
fn cellindex(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<CellIndexSearch>()?;
    Ok(())
}
