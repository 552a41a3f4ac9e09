use crate::error::{Error, Result};

/// Tolerance for "cell width evenly divides the domain".
pub const DIVISIBILITY_TOLERANCE: f64 = 1e-6;

/// Smallest candidate cell width tried by [`select_resolution`].
const MIN_CELL_WIDTH: u64 = 2;

/// Largest domain side whose integer widths are all exact in `f64`.
const MAX_DOMAIN: f64 = 9_007_199_254_740_992.0;

/// Grid resolution: `m × m` cells of side `cell_width`, with `m * cell_width == L`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    /// Cells per side.
    pub m: usize,
    /// Side of one cell.
    pub cell_width: f64,
}

impl Resolution {
    /// Total number of base cells.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.m * self.m
    }
}

/// Largest centre-to-centre distance at which two particles can still be neighbors.
#[inline]
pub fn interaction_reach(cutoff: f64, max_radius: f64) -> f64 {
    cutoff + 2.0 * max_radius
}

/// Choose the finest grid whose cells are wider than the interaction reach.
///
/// Candidate widths `w = 2, 3, …, L` are scanned in increasing order and the
/// first one that divides `L` (within [`DIVISIBILITY_TOLERANCE`]) with
/// `M = floor(L / w) < L / reach` is accepted. Since `M` only decreases as `w`
/// grows, that is the grid with the most cells that is still safe.
///
/// When no width beats the reach but `rc + max_radius < L`, the whole domain
/// becomes one cell. A single periodic cell sees every pair through its eight
/// images, so it needs no stencil reach.
///
/// Errors:
/// - `Error::Configuration` if any input is out of range, if `L` is not an
///   integer of at least 2, or if `rc + max_radius >= L`.
pub fn select_resolution(domain: f64, cutoff: f64, max_radius: f64) -> Result<Resolution> {
    if !domain.is_finite() || domain <= 0.0 {
        return Err(Error::Configuration(format!(
            "domain size must be finite and > 0, got {domain}"
        )));
    }
    if !cutoff.is_finite() || cutoff < 0.0 {
        return Err(Error::Configuration(format!(
            "cutoff must be finite and >= 0, got {cutoff}"
        )));
    }
    if !max_radius.is_finite() || max_radius < 0.0 {
        return Err(Error::Configuration(format!(
            "max radius must be finite and >= 0, got {max_radius}"
        )));
    }
    if domain > MAX_DOMAIN {
        return Err(Error::Configuration(format!(
            "domain size {domain} exceeds the largest supported size {MAX_DOMAIN}"
        )));
    }
    let last = domain.round();
    if (domain - last).abs() >= DIVISIBILITY_TOLERANCE || last < MIN_CELL_WIDTH as f64 {
        return Err(Error::Configuration(format!(
            "no integer cell width in [{MIN_CELL_WIDTH}, {}] divides L = {domain}",
            domain.floor()
        )));
    }
    if cutoff + max_radius >= domain {
        return Err(Error::Configuration(format!(
            "rc + max_radius = {} must be smaller than L = {domain}",
            cutoff + max_radius
        )));
    }

    let reach = interaction_reach(cutoff, max_radius);
    // widths below floor(reach) can never qualify
    let first = MIN_CELL_WIDTH.max(reach.floor() as u64);
    for w in first..=last as u64 {
        let width = w as f64;
        let m = (domain / width).floor();
        if domain % width < DIVISIBILITY_TOLERANCE && m < domain / reach {
            log::debug!("grid resolution for L={domain}, reach={reach}: M={m}, cell width={width}");
            return Ok(Resolution {
                m: m as usize,
                cell_width: width,
            });
        }
    }

    log::debug!("reach {reach} spans L={domain}; using the whole domain as one cell");
    Ok(Resolution {
        m: 1,
        cell_width: domain,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_finest_safe_grid() -> Result<()> {
        // w = 2 > 1 divides 10
        let res = select_resolution(10.0, 1.0, 0.0)?;
        assert_eq!(res.m, 5);
        assert_eq!(res.cell_width, 2.0);
        assert_eq!(res.cell_count(), 25);
        Ok(())
    }

    #[test]
    fn skips_widths_that_do_not_divide() -> Result<()> {
        // reach = 2.5: w = 3 and 4 are wide enough but do not divide 10, w = 5 does
        let res = select_resolution(10.0, 2.5, 0.0)?;
        assert_eq!(res.m, 2);
        assert_eq!(res.cell_width, 5.0);
        Ok(())
    }

    #[test]
    fn reach_counts_both_radii() -> Result<()> {
        // rc + r = 1.5 would allow w = 2, but two radii give reach 2.5
        let res = select_resolution(12.0, 0.5, 1.0)?;
        assert_eq!(res.cell_width, 3.0);
        assert_eq!(res.m, 4);
        Ok(())
    }

    #[test]
    fn width_equal_to_reach_is_rejected() -> Result<()> {
        // w must strictly exceed the reach, so w = 2 is skipped
        let res = select_resolution(12.0, 2.0, 0.0)?;
        assert_eq!(res.cell_width, 3.0);
        Ok(())
    }

    #[test]
    fn whole_domain_as_one_cell() -> Result<()> {
        let res = select_resolution(7.0, 4.0, 0.0)?;
        assert_eq!(res.m, 1);
        assert_eq!(res.cell_width, 7.0);
        Ok(())
    }

    #[test]
    fn boundary_rejection_does_not_hang() {
        // L = 5, rc = 3, max radius = 3
        let err = select_resolution(5.0, 3.0, 3.0).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn reach_beyond_domain_falls_back_to_one_cell() -> Result<()> {
        // rc + 2r = 10.2 >= L, but rc + r = 5.6 < L
        let res = select_resolution(10.0, 1.0, 4.6)?;
        assert_eq!(res.m, 1);
        assert_eq!(res.cell_width, 10.0);
        Ok(())
    }

    #[test]
    fn margin_equal_to_domain_is_rejected() {
        let err = select_resolution(10.0, 4.0, 6.0).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn huge_domains_error_without_scanning() {
        // non-integer, far beyond u32
        let err = select_resolution(1.0e9 + 0.5, 1.0, 0.0).unwrap_err();
        assert!(err.to_string().contains("no integer cell width"));
        let err = select_resolution(1.0e17, 1.0, 0.0).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn domain_past_u32_range_is_scanned_with_wide_counter() -> Result<()> {
        // 2^33: even, so w = 2 is accepted straight away
        let domain = 8_589_934_592.0;
        let res = select_resolution(domain, 1.0, 0.0)?;
        assert_eq!(res.cell_width, 2.0);
        assert_eq!(res.m, 4_294_967_296);
        Ok(())
    }

    #[test]
    fn domain_without_integer_divisor_is_rejected() {
        let err = select_resolution(10.5, 1.0, 0.0).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("no integer cell width"));
    }

    #[test]
    fn tiny_domain_is_rejected() {
        let err = select_resolution(1.5, 0.1, 0.0).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        assert!(select_resolution(0.0, 1.0, 0.0).is_err());
        assert!(select_resolution(f64::NAN, 1.0, 0.0).is_err());
        assert!(select_resolution(10.0, -1.0, 0.0).is_err());
        assert!(select_resolution(10.0, 1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn safety_invariant_holds_over_sweep() {
        for l in 2..=60 {
            let domain = f64::from(l);
            for rc10 in 0..40 {
                let cutoff = f64::from(rc10) * 0.25;
                for r10 in 0..6 {
                    let max_radius = f64::from(r10) * 0.2;
                    let Ok(res) = select_resolution(domain, cutoff, max_radius) else {
                        continue;
                    };
                    assert!(res.m >= 1);
                    assert!(
                        res.cell_width > cutoff + max_radius,
                        "L={domain} rc={cutoff} r={max_radius}: width {} too small",
                        res.cell_width
                    );
                    if res.m > 1 {
                        assert!(res.cell_width > interaction_reach(cutoff, max_radius));
                    }
                    assert!((res.m as f64 * res.cell_width - domain).abs() < DIVISIBILITY_TOLERANCE);
                }
            }
        }
    }
}
