use std::fmt;

/// Result type for tutorkit-engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the engine layer
#[derive(Debug)]
pub enum Error {
    /// Knowledge index lookup failed
    Search(String),

    /// Empathy framing failed
    Framing(String),

    /// Rejected task operation (unknown id, bad status)
    Validation(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Search(msg) => write!(f, "Search error: {}", msg),
            Error::Framing(msg) => write!(f, "Framing error: {}", msg),
            Error::Validation(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
