//! Testing infrastructure for msgpackfield integration tests.
//!
//! - `diagnostics`: a [`RecordingDiagnostics`] sink that captures decode warnings
//! - `samples`: shared native values and hand-packed MessagePack inputs
//! - `assertions`: checks for round trips and captured warnings

pub mod assertions;
pub mod diagnostics;
pub mod samples;

pub use diagnostics::RecordingDiagnostics;
