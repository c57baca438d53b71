use std::fmt;

/// Result type for tutorkit-types operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the types layer
#[derive(Debug)]
pub enum Error {
    /// Session context constructed with missing required attributes
    InvalidContext(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidContext(msg) => write!(f, "Invalid session context: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
