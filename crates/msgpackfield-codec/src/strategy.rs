use msgpackfield_types::{RawInput, Value};
use std::fmt;

use crate::msgpack;
use crate::options::BinaryMode;

/// One way of turning raw input into a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeStrategy {
    Json,
    MsgPack(BinaryMode),
    /// Typed MessagePack decoding into an application type.
    Typed,
}

impl DecodeStrategy {
    /// Attempt this strategy. Strategies that do not apply to the input kind
    /// reject it.
    pub fn attempt(&self, input: &RawInput, max_depth: usize) -> Result<Value, String> {
        match (self, input) {
            (DecodeStrategy::Json, RawInput::Text(text)) => {
                serde_json::from_str(text).map_err(|e| e.to_string())
            }
            (DecodeStrategy::MsgPack(mode), RawInput::Binary(bytes)) => {
                msgpack::unpack(bytes, *mode, max_depth).map_err(|e| e.to_string())
            }
            (strategy, input) => Err(format!(
                "{} strategy does not accept {} input",
                strategy,
                input.kind()
            )),
        }
    }
}

impl fmt::Display for DecodeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeStrategy::Json => write!(f, "json"),
            DecodeStrategy::MsgPack(mode) => write!(f, "msgpack-{}", mode),
            DecodeStrategy::Typed => write!(f, "typed"),
        }
    }
}
