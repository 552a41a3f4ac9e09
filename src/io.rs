//! Readers for the two plain-text input files.
//!
//! Static file, one value per line:
//!
//! ```text
//! N
//! L
//! rc
//! r_0
//! …
//! r_{N-1}
//! ```
//!
//! Dynamic file, one block per timestep: a time line followed by `N` lines of
//! `x y`. Extra columns after `x y` are ignored. Blank lines are skipped in both
//! files. A truncated block is a parse error; no partial frame is ever returned.

use crate::core::particle::Particle;
use crate::error::{Error, Result};
use ordered_float::NotNan;
use std::path::Path;

/// Contents of the static file.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticConfig {
    /// Side `L` of the square domain.
    pub domain: f64,
    /// Cutoff `rc`.
    pub cutoff: f64,
    /// One radius per particle; its length is the particle count `N`.
    pub radii: Vec<f64>,
}

impl StaticConfig {
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = Lines::new(text);
        let count: usize = lines.value("particle count")?;
        let domain: f64 = lines.value("domain size")?;
        let cutoff: f64 = lines.value("cutoff")?;
        let mut radii = Vec::with_capacity(count);
        for i in 0..count {
            radii.push(lines.value(&format!("radius of particle {i}"))?);
        }
        if let Some((line, _)) = lines.next() {
            log::warn!("static file: ignoring content after {count} radii (line {line})");
        }
        Ok(Self {
            domain,
            cutoff,
            radii,
        })
    }

    /// Particle count `N`.
    #[inline]
    pub fn count(&self) -> usize {
        self.radii.len()
    }
}

/// Positions of all particles at one timestep.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub time: NotNan<f64>,
    pub positions: Vec<[f64; 2]>,
}

impl Frame {
    /// Particles `{id = index, position, radius = radii[index]}`.
    ///
    /// Errors:
    /// - `Error::Data` if the frame and the static file disagree on the particle count.
    /// - `Error::InvalidParam` for a negative radius.
    pub fn particles(&self, config: &StaticConfig) -> Result<Vec<Particle>> {
        if self.positions.len() != config.count() {
            return Err(Error::Data(format!(
                "frame at t={} has {} particles, static file declares {}",
                self.time,
                self.positions.len(),
                config.count()
            )));
        }
        self.positions
            .iter()
            .zip(&config.radii)
            .enumerate()
            .map(|(id, (&[x, y], &radius))| Particle::new(id as u32, x, y, radius))
            .collect()
    }
}

/// Parse every timestep block of a dynamic file holding `count` particles.
pub fn parse_frames(text: &str, count: usize) -> Result<Vec<Frame>> {
    let mut lines = Lines::new(text);
    let mut frames = Vec::new();
    while let Some((line, raw)) = lines.next() {
        let time: f64 = parse_field(line, raw, "time")?;
        let time = NotNan::new(time).map_err(|_| Error::Parse {
            line,
            message: "time cannot be NaN".into(),
        })?;
        let mut positions = Vec::with_capacity(count);
        for i in 0..count {
            let Some((line, raw)) = lines.next() else {
                return Err(Error::Parse {
                    line: lines.last_line,
                    message: format!(
                        "frame at t={time} ends after {i} of {count} positions"
                    ),
                });
            };
            positions.push(parse_position(line, raw)?);
        }
        frames.push(Frame { time, positions });
    }
    Ok(frames)
}

pub fn read_static(path: impl AsRef<Path>) -> Result<StaticConfig> {
    StaticConfig::parse(&std::fs::read_to_string(path)?)
}

pub fn read_dynamic(path: impl AsRef<Path>, count: usize) -> Result<Vec<Frame>> {
    parse_frames(&std::fs::read_to_string(path)?, count)
}

/// The latest frame whose time is `<= time`, if any.
pub fn frame_at(frames: &[Frame], time: f64) -> Option<&Frame> {
    let time = NotNan::new(time).ok()?;
    frames
        .iter()
        .filter(|f| f.time <= time)
        .max_by_key(|f| f.time)
}

/// Non-blank lines with their 1-based line numbers.
struct Lines<'a> {
    inner: std::iter::Enumerate<std::str::Lines<'a>>,
    last_line: usize,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.lines().enumerate(),
            last_line: 0,
        }
    }

    fn next(&mut self) -> Option<(usize, &'a str)> {
        for (i, raw) in self.inner.by_ref() {
            self.last_line = i + 1;
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some((i + 1, trimmed));
            }
        }
        None
    }

    fn value<T: std::str::FromStr>(&mut self, what: &str) -> Result<T> {
        match self.next() {
            Some((line, raw)) => parse_field(line, raw, what),
            None => Err(Error::Parse {
                line: self.last_line + 1,
                message: format!("missing {what}"),
            }),
        }
    }
}

fn parse_field<T: std::str::FromStr>(line: usize, raw: &str, what: &str) -> Result<T> {
    raw.parse().map_err(|_| Error::Parse {
        line,
        message: format!("invalid {what}: {raw:?}"),
    })
}

fn parse_position(line: usize, raw: &str) -> Result<[f64; 2]> {
    let mut fields = raw.split_whitespace();
    let (Some(x), Some(y)) = (fields.next(), fields.next()) else {
        return Err(Error::Parse {
            line,
            message: format!("expected \"x y\", got {raw:?}"),
        });
    };
    Ok([parse_field(line, x, "x")?, parse_field(line, y, "y")?])
}
