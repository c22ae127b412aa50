use std::fmt;

/// Unified error type for the compendium crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompendiumError {
    /// The requested document does not exist.
    NotFound(String),
    /// The server answered with a non-success status.
    Http { status: u16, path: String },
    /// The request could not be completed.
    Fetch(String),
    /// The response body was not the expected document.
    Parse(String),
    /// Invalid input provided by the caller.
    InvalidInput(String),
    /// Internal error.
    Internal(String),
}

impl fmt::Display for CompendiumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompendiumError::NotFound(path) => write!(f, "not found: {path}"),
            CompendiumError::Http { status, path } => write!(f, "http {status} for {path}"),
            CompendiumError::Fetch(msg) => write!(f, "fetch failed: {msg}"),
            CompendiumError::Parse(msg) => write!(f, "parse error: {msg}"),
            CompendiumError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            CompendiumError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for CompendiumError {}

/// Result type alias using [`CompendiumError`].
pub type CompendiumResult<T> = Result<T, CompendiumError>;
