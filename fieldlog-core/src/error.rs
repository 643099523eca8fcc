//! Typed error handling for fieldlog.
//!
//! Provides structured errors that library consumers can match on.
//! Field-encoding failures never surface here: a value that cannot be
//! serialized is written into the record as a descriptive error string
//! and the rest of the record is still produced.

use thiserror::Error;

/// Main error type for fieldlog operations.
///
/// This provides typed errors that library consumers can match on,
/// unlike opaque `anyhow::Error` types.
#[derive(Error, Debug)]
pub enum FieldlogError {
    /// The sink rejected the finished record.
    #[error("sink write failed: {source}")]
    Sink {
        #[from]
        source: std::io::Error,
    },

    /// The sink accepted fewer bytes than the record contains.
    #[error("short write to sink: wrote {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    /// A record buffer handed to the dedup engine was not well-formed.
    ///
    /// Only possible if some other producer wrote into a context/event
    /// buffer; the engine reports the byte offset where scanning failed.
    #[error("malformed record buffer at byte {offset}: {message}")]
    MalformedBuffer { offset: usize, message: String },

    /// A level string did not name a known severity.
    #[error("unknown level: {value:?}")]
    UnknownLevel { value: String },
}

impl FieldlogError {
    /// Create a malformed-buffer error with the failing byte offset.
    pub fn malformed(offset: usize, message: impl Into<String>) -> Self {
        Self::MalformedBuffer {
            offset,
            message: message.into(),
        }
    }

    /// Create a short-write error.
    pub fn short_write(written: usize, expected: usize) -> Self {
        Self::ShortWrite { written, expected }
    }

    /// Create an unknown-level error.
    pub fn unknown_level(value: impl Into<String>) -> Self {
        Self::UnknownLevel {
            value: value.into(),
        }
    }

    /// Get the buffer offset associated with this error, if any.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::MalformedBuffer { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

/// Convenience type alias for fieldlog results.
pub type FieldlogResult<T> = Result<T, FieldlogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_carries_offset() {
        let err = FieldlogError::malformed(17, "unterminated string");
        assert_eq!(err.offset(), Some(17));
        assert!(err.to_string().contains("byte 17"));
    }

    #[test]
    fn test_sink_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err = FieldlogError::from(io);
        assert!(matches!(err, FieldlogError::Sink { .. }));
        assert_eq!(err.offset(), None);
    }

    #[test]
    fn test_short_write_display() {
        let err = FieldlogError::short_write(3, 10);
        assert_eq!(err.to_string(), "short write to sink: wrote 3 of 10 bytes");
    }
}
