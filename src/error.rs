//! Error kinds shared by the loading, classification and delivery pipeline.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, QcError>;

#[derive(Error, Debug)]
pub enum QcError {
    /// No workflows or collections matched the request.
    #[error("not found: {0}")]
    NotFound(String),

    /// Required operator input is missing before a delivery.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Storage or HTTP failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// A document could not be decoded.
    #[error("failed to decode {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid storage uri '{0}'")]
    InvalidUri(String),

    #[error("IO error {0}")]
    Io(#[from] std::io::Error),
}

impl QcError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        QcError::Transport(err.to_string())
    }

    pub fn decode(what: impl Into<String>, source: serde_json::Error) -> Self {
        QcError::Decode {
            what: what.into(),
            source,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Customer Id is required")]
    MissingCustomerId,

    #[error("Aoi Name is required")]
    MissingAoiName,

    #[error("no image selected for delivery to the client")]
    EmptySelection,
}
