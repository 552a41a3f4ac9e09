use crate::error::{Error, Result};

/// Fixed spatial dimension (2D).
pub const DIM: usize = 2;

/// A circular particle in one timestep snapshot.
///
/// Fields:
/// - `id`: stable identifier, unique within a timestep (ghost copies share their source id)
/// - `r`: centre position [x, y]
/// - `radius`: disc radius (>= 0)
///
/// Records are immutable once built; ghost copies are new records made with
/// [`Particle::translated`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    id: u32,
    r: [f64; DIM],
    radius: f64,
}

impl Particle {
    /// Create a new particle after validating invariants.
    ///
    /// Errors:
    /// - `Error::InvalidParam` if `radius` is negative or any value is NaN/inf.
    pub fn new(id: u32, x: f64, y: f64, radius: f64) -> Result<Self> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(Error::InvalidParam(format!(
                "radius of particle {id} must be finite and >= 0, got {radius}"
            )));
        }
        if !x.is_finite() || !y.is_finite() {
            return Err(Error::InvalidParam(format!(
                "position of particle {id} must be finite, got ({x}, {y})"
            )));
        }
        Ok(Self {
            id,
            r: [x, y],
            radius,
        })
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.r[0]
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.r[1]
    }

    /// Centre position (x, y).
    #[inline]
    pub fn position(&self) -> [f64; DIM] {
        self.r
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// A copy of this particle moved by `(dx, dy)`, keeping id and radius.
    #[inline]
    pub(crate) fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            id: self.id,
            r: [self.r[0] + dx, self.r[1] + dy],
            radius: self.radius,
        }
    }

    /// Euclidean distance between the two centres.
    #[inline]
    pub fn center_distance(&self, other: &Particle) -> f64 {
        let dx = self.r[0] - other.r[0];
        let dy = self.r[1] - other.r[1];
        dx.hypot(dy)
    }

    /// Surface-to-surface gap: centre distance minus both radii.
    /// Negative when the discs overlap.
    #[inline]
    pub fn surface_gap(&self, other: &Particle) -> f64 {
        self.center_distance(other) - (self.radius + other.radius)
    }

    /// Whether the two surfaces are within `cutoff` of each other.
    #[inline]
    pub fn within(&self, other: &Particle, cutoff: f64) -> bool {
        self.surface_gap(other) <= cutoff
    }
}

/// Largest radius in `particles`, 0 for an empty slice.
pub fn max_radius(particles: &[Particle]) -> f64 {
    particles.iter().map(|p| p.radius).fold(0.0, f64::max)
}
