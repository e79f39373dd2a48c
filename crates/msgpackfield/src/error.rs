use std::fmt;

use crate::form::FormError;

/// Result type for msgpackfield operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the field layer
#[derive(Debug)]
pub enum Error {
    /// Encoding or rendering failed
    Codec(msgpackfield_codec::Error),

    /// Submitted form data was rejected
    Form(FormError),

    /// IO operation failed
    Io(std::io::Error),

    /// Configuration error
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Codec(err) => write!(f, "Codec error: {}", err),
            Error::Form(err) => write!(f, "Form error: {}", err),
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Codec(err) => Some(err),
            Error::Form(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Config(_) => None,
        }
    }
}

impl From<msgpackfield_codec::Error> for Error {
    fn from(err: msgpackfield_codec::Error) -> Self {
        Error::Codec(err)
    }
}

impl From<FormError> for Error {
    fn from(err: FormError) -> Self {
        Error::Form(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}
