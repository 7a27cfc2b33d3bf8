//! Error types for the kitchenpi crate.

use thiserror::Error;

/// Errors that can occur while laying out, scheduling, or fetching content.
#[derive(Debug, Error)]
pub enum Error {
    /// A line was given more text segments than the layout engine supports.
    ///
    /// This is a programmer error: the engine deliberately does not
    /// generalize past [`crate::layout::MAX_SEGMENTS`] segments per line.
    #[error("a line supports at most 3 segments, got {0}")]
    TooManySegments(usize),

    /// No compass bucket matched a wind direction.
    ///
    /// Unreachable for well-formed directions; values landing exactly on a
    /// 45° arc boundary (e.g. 22.5) match no bucket.
    #[error("no compass bucket matches wind direction {0} degrees")]
    DirectionBucket(f64),

    /// The display device rejected a write (transient hardware/I/O fault)
    #[error("display render failed: {0}")]
    Render(String),

    /// A rotation was targeted at a display index the scheduler doesn't own
    #[error("unknown display index {0}")]
    UnknownDisplay(usize),

    /// A rotation must always contain at least one frame
    #[error("rotation must contain at least one frame")]
    EmptyRotation,

    /// HTTP request failed (network error, timeout, etc.)
    #[error("weather request failed: {0}")]
    Request(String),

    /// The weather API returned an error status code
    #[error("weather API returned status {status}: {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// The weather API returned a body we could not decode
    #[error("malformed weather payload: {0}")]
    Payload(String),
}

#[cfg(feature = "open-meteo")]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Request(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::TooManySegments(4);
        assert!(err.to_string().contains("at most 3"));
        assert!(err.to_string().contains('4'));

        let err = Error::DirectionBucket(22.5);
        assert!(err.to_string().contains("22.5"));

        let err = Error::Api {
            status: 429,
            body: "slow down".to_string(),
        };
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("slow down"));
    }
}
