//! Decode-warning capture.

use msgpackfield_codec::{Codec, CodecOptions, DecodeFailure, Diagnostics};
use std::sync::{Arc, Mutex};

/// Diagnostics sink that keeps every reported failure in memory.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    failures: Mutex<Vec<DecodeFailure>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Build a codec wired to a fresh recorder.
    pub fn codec(options: CodecOptions) -> (Codec, Arc<Self>) {
        let recorder = Self::new();
        let codec = Codec::new(options).with_diagnostics(recorder.clone());
        (codec, recorder)
    }

    pub fn failures(&self) -> Vec<DecodeFailure> {
        self.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<DecodeFailure>> {
        // A panicking test must not hide the warnings of the others.
        self.failures.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn decode_failed(&self, failure: &DecodeFailure) {
        self.lock().push(failure.clone());
    }
}
