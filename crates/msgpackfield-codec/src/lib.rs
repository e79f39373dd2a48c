//! Lenient MessagePack/JSON codec for packed database columns.
//!
//! Binary input (from storage) is unpacked as MessagePack, first validating
//! strings as UTF-8 and then falling back to raw bytes. Text input (from forms
//! and fixtures) is parsed as JSON. Decoding never fails loudly: failures are
//! reported through a [`Diagnostics`] sink and yield `None`. Encoding is
//! strict and returns errors.
//!
//! ```
//! use msgpackfield_codec::Codec;
//! use msgpackfield_types::{RawInput, Value};
//!
//! let codec = Codec::default();
//! let value = Value::from(serde_json::json!({"x": [1, 2, "y"]}));
//! let packed = codec.pack(&value).unwrap();
//! assert_eq!(codec.decode(&RawInput::Binary(packed)), Some(value));
//! ```

mod codec;
pub mod diagnostics;
pub mod error;
pub mod json_text;
pub mod msgpack;
pub mod options;
pub mod strategy;

pub use codec::Codec;
pub use diagnostics::{DecodeFailure, Diagnostics, StrategyError, TracingDiagnostics};
pub use error::{Error, Result};
pub use options::{BinaryMode, CodecOptions, DisplayOptions};
pub use strategy::DecodeStrategy;
