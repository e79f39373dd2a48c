use std::fmt;

/// Raw representation handed to the decoder.
///
/// Storage always produces `Binary`; form submissions and fixtures produce
/// `Text`. The variant decides which decode strategies are attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawInput {
    /// JSON text.
    Text(String),
    /// MessagePack bytes.
    Binary(Vec<u8>),
}

impl RawInput {
    pub fn kind(&self) -> InputKind {
        match self {
            RawInput::Text(_) => InputKind::Text,
            RawInput::Binary(_) => InputKind::Binary,
        }
    }

    /// Length in bytes of the raw payload.
    pub fn len(&self) -> usize {
        match self {
            RawInput::Text(s) => s.len(),
            RawInput::Binary(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for RawInput {
    fn from(s: String) -> Self {
        RawInput::Text(s)
    }
}

impl From<&str> for RawInput {
    fn from(s: &str) -> Self {
        RawInput::Text(s.to_string())
    }
}

impl From<Vec<u8>> for RawInput {
    fn from(b: Vec<u8>) -> Self {
        RawInput::Binary(b)
    }
}

impl From<&[u8]> for RawInput {
    fn from(b: &[u8]) -> Self {
        RawInput::Binary(b.to_vec())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    Text,
    Binary,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputKind::Text => write!(f, "text"),
            InputKind::Binary => write!(f, "binary"),
        }
    }
}
