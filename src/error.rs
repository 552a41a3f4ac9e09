use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type shared by the neighbor search core and the input readers.
///
/// A failed snapshot is reported with one of these and never downgraded to an
/// empty neighbor map. Callers processing several timesteps may skip the bad
/// one and continue.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid user or API parameter.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// The domain, cutoff and radii admit no safe grid resolution.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Input data inconsistent with the configuration (count mismatch, particle outside the domain).
    #[error("data error: {0}")]
    Data(String),

    /// Malformed line in a static or dynamic input file (1-based line number).
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Propagated I/O errors from the readers.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
