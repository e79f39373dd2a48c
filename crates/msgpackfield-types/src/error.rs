use std::fmt;

/// Result type for msgpackfield-types operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the value model
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Value has no JSON form (bytes, ext, non-finite float, compound map key)
    NotJsonRepresentable(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotJsonRepresentable(what) => {
                write!(f, "Value is not JSON representable: {}", what)
            }
        }
    }
}

impl std::error::Error for Error {}
