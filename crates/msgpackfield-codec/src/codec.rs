use msgpackfield_types::{InputKind, RawInput, Value};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;

use crate::diagnostics::{DecodeFailure, Diagnostics, StrategyError, TracingDiagnostics};
use crate::msgpack;
use crate::options::CodecOptions;
use crate::strategy::DecodeStrategy;
use crate::Result;

/// MessagePack/JSON value codec.
///
/// Two policies live side by side:
/// - decoding is total: every failure is reported to the [`Diagnostics`] sink
///   and yields `None`;
/// - encoding is strict: anything that cannot be packed is returned as an
///   error to the caller.
///
/// The codec holds no mutable state and can be cloned and shared freely.
#[derive(Clone)]
pub struct Codec {
    options: CodecOptions,
    diagnostics: Arc<dyn Diagnostics>,
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(CodecOptions::default())
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Codec {
    pub fn new(options: CodecOptions) -> Self {
        Self {
            options,
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    /// Replace the warning sink (defaults to [`TracingDiagnostics`]).
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    /// Ordered strategies attempted for one kind of input.
    pub fn strategies_for(&self, kind: InputKind) -> Vec<DecodeStrategy> {
        match kind {
            InputKind::Text => vec![DecodeStrategy::Json],
            InputKind::Binary => self
                .options
                .binary_modes
                .iter()
                .copied()
                .map(DecodeStrategy::MsgPack)
                .collect(),
        }
    }

    /// Decode without reporting; the first successful strategy wins.
    pub fn try_decode(&self, input: &RawInput) -> std::result::Result<Value, DecodeFailure> {
        let mut attempts = Vec::new();
        for strategy in self.strategies_for(input.kind()) {
            match strategy.attempt(input, self.options.max_depth) {
                Ok(value) => return Ok(value),
                Err(message) => attempts.push(StrategyError { strategy, message }),
            }
        }
        Err(DecodeFailure {
            input: input.kind(),
            len: input.len(),
            attempts,
        })
    }

    /// Decode `input`, reporting a warning and returning `None` on failure.
    pub fn decode(&self, input: &RawInput) -> Option<Value> {
        match self.try_decode(input) {
            Ok(value) => Some(value),
            Err(failure) => {
                self.diagnostics.decode_failed(&failure);
                None
            }
        }
    }

    /// Pack a value. An absent value stays absent (SQL NULL).
    pub fn encode(&self, value: Option<&Value>) -> Result<Option<Vec<u8>>> {
        value.map(|v| self.pack(v)).transpose()
    }

    pub fn pack(&self, value: &Value) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        msgpack::pack(value, &mut out, self.options.use_bin_type)?;
        Ok(out)
    }

    /// Pack any serializable application type. Structs are written as maps
    /// so they decode back into `Value::Map`.
    pub fn encode_serializable<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(value)?)
    }

    /// Decode packed bytes straight into an application type, with the same
    /// warn-and-`None` policy as [`Codec::decode`].
    pub fn decode_into<T: DeserializeOwned>(&self, bytes: &[u8]) -> Option<T> {
        match rmp_serde::from_slice(bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                self.diagnostics.decode_failed(&DecodeFailure {
                    input: InputKind::Binary,
                    len: bytes.len(),
                    attempts: vec![StrategyError {
                        strategy: DecodeStrategy::Typed,
                        message: err.to_string(),
                    }],
                });
                None
            }
        }
    }
}
