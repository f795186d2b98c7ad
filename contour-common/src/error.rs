//! Error types for the contour-seam toolkit
//!
//! One enum covers the whole workspace so that container, codec and joiner errors can be
//! propagated with `?` across crate boundaries. Variants follow the failure classes of the
//! system: malformed input, range and capacity limits, API misuse, inconsistent geometry and
//! cooperative cancellation. None of them is retried internally.

use thiserror::Error;

/// Errors produced by contour containers, codecs and the joiner
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed serialized contours or contour files
    #[error("format error at position {position}: {message}")]
    Format { position: usize, message: String },

    /// Point coordinates outside the legal coordinate range
    #[error("{0}")]
    OutOfRange(String),

    /// Too many contours or points, or a working matrix that cannot be addressed
    #[error("capacity exceeded: {0}")]
    Capacity(String),

    /// Operation not allowed in the current state (e.g. a contour is open)
    #[error("invalid state: {0}")]
    State(String),

    /// Invalid caller-supplied argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Contour (or point) index outside the valid range
    #[error("index {index} is out of range 0..{len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// The input is not a set of simple closed curves
    #[error("inconsistent geometry: {0}")]
    Geometry(String),

    /// Cooperative cancellation was requested
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// File access failure
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn format(position: usize, message: impl Into<String>) -> Self {
        Error::Format {
            position,
            message: message.into(),
        }
    }

    pub fn capacity(message: impl Into<String>) -> Self {
        Error::Capacity(message.into())
    }

    pub fn state(message: impl Into<String>) -> Self {
        Error::State(message.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    pub fn geometry(message: impl Into<String>) -> Self {
        Error::Geometry(message.into())
    }

    /// Whether this error is a cancellation rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled(_))
    }
}

/// Result alias used by all library crates
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_error_message() {
        let err = Error::IndexOutOfBounds { index: 5, len: 3 };
        assert_eq!(err.to_string(), "index 5 is out of range 0..3");
    }

    #[test]
    fn test_cancelled_is_distinguished() {
        assert!(Error::Cancelled("stop".into()).is_cancelled());
        assert!(!Error::geometry("loop").is_cancelled());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
