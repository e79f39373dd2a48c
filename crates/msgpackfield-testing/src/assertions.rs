//! Assertions shared by integration tests.

use anyhow::{Context, Result};
use msgpackfield_codec::Codec;
use msgpackfield_types::{InputKind, RawInput, Value};

use crate::RecordingDiagnostics;

/// Assert that `value` survives pack followed by decode unchanged.
pub fn assert_round_trip(codec: &Codec, value: &Value) -> Result<()> {
    let packed = codec
        .pack(value)
        .with_context(|| format!("Failed to pack {}", value))?;
    let decoded = codec
        .decode(&RawInput::Binary(packed))
        .with_context(|| format!("Packed {} did not decode", value))?;

    if &decoded != value {
        anyhow::bail!("Round trip changed {} into {}", value, decoded);
    }

    Ok(())
}

/// Assert that exactly `expected` warnings were recorded, all for `kind`.
pub fn assert_warnings(
    recorder: &RecordingDiagnostics,
    kind: InputKind,
    expected: usize,
) -> Result<()> {
    let failures = recorder.failures();

    if failures.len() != expected {
        anyhow::bail!("Expected {} warnings, got {:?}", expected, failures);
    }

    for (i, failure) in failures.iter().enumerate() {
        if failure.input != kind {
            anyhow::bail!(
                "Warning {} was for {} input but expected {}",
                i,
                failure.input,
                kind
            );
        }
    }

    Ok(())
}
