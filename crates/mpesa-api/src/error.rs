//! Error types for domain operations

/// Errors from domain operations.
///
/// Gateway, transport and authentication failures all arrive as one
/// `transport::Error`; validation failures are raised before any request
/// is made.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] transport::Error),

    #[error("invalid request: {0}")]
    Validation(String),
}

impl Error {
    /// Taxonomy code for gateway failures; `None` for validation errors.
    pub fn code(&self) -> Option<&transport::ErrorCode> {
        match self {
            Error::Api(e) => Some(&e.code),
            Error::Validation(_) => None,
        }
    }
}

/// Result alias for domain operations.
pub type Result<T> = std::result::Result<T, Error>;
