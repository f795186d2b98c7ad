//! Common types for the contour-seam toolkit

pub mod error;

pub use error::{Error, Result};

#[cfg(test)]
mod tests {
    use crate::Error;

    #[test]
    fn format_error_reports_position() {
        let err = Error::format(17, "bad magic");
        assert_eq!(err.to_string(), "format error at position 17: bad magic");
    }
}
