use msgpackfield_types::InputKind;

use crate::strategy::DecodeStrategy;

/// Why one strategy rejected the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyError {
    pub strategy: DecodeStrategy,
    pub message: String,
}

/// Every strategy attempted for one input failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeFailure {
    pub input: InputKind,
    /// Payload length in bytes.
    pub len: usize,
    /// Attempts in the order they were made. Empty when no strategy is
    /// configured for the input kind.
    pub attempts: Vec<StrategyError>,
}

impl DecodeFailure {
    pub fn summary(&self) -> &'static str {
        match self.input {
            InputKind::Text => "Failed to decode data as JSON.",
            InputKind::Binary => "Failed to decode data as MsgPack.",
        }
    }

    /// `strategy: message` pairs joined with `; `.
    pub fn details(&self) -> String {
        self.attempts
            .iter()
            .map(|a| format!("{}: {}", a.strategy, a.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Sink for decode warnings.
///
/// Decoding never fails loudly, so this is the only place a corrupt record or
/// bad form submission becomes visible.
pub trait Diagnostics: Send + Sync {
    fn decode_failed(&self, failure: &DecodeFailure);
}

/// Emits decode warnings as `tracing` events under the `msgpackfield` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn decode_failed(&self, failure: &DecodeFailure) {
        tracing::warn!(
            target: "msgpackfield",
            input = %failure.input,
            len = failure.len,
            errors = %failure.details(),
            "{}",
            failure.summary()
        );
    }
}
