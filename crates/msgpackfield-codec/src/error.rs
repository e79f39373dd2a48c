use std::fmt;

/// Result type for msgpackfield-codec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types raised by the strict (encoding and rendering) side of the codec.
///
/// Decoding never produces these; it reports through [`crate::Diagnostics`]
/// and yields an absent value instead.
#[derive(Debug)]
pub enum Error {
    /// Value could not be packed as MessagePack
    Encode(String),

    /// Value has no JSON text form
    Json(msgpackfield_types::Error),

    /// JSON text could not be written
    Render(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Encode(msg) => write!(f, "Encode error: {}", msg),
            Error::Json(err) => write!(f, "JSON error: {}", err),
            Error::Render(err) => write!(f, "Render error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Encode(_) => None,
            Error::Json(err) => Some(err),
            Error::Render(err) => Some(err),
        }
    }
}

impl From<msgpackfield_types::Error> for Error {
    fn from(err: msgpackfield_types::Error) -> Self {
        Error::Json(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Render(err)
    }
}

impl From<rmp_serde::encode::Error> for Error {
    fn from(err: rmp_serde::encode::Error) -> Self {
        Error::Encode(err.to_string())
    }
}
