//! Error types for the sitesearch host.

/// Top-level error type for configuration loading and app wiring.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration could not be parsed, serialized, or failed validation.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error raised by the search engine.
    #[error(transparent)]
    Search(#[from] sitesearch_core::SearchError),
}

impl From<sitesearch_core::TransportError> for AppError {
    fn from(e: sitesearch_core::TransportError) -> Self {
        Self::Config(e.to_string())
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AppError>;
