//! Orchestrates the three meeting verifiers over parsed election artifacts.

mod error;
/// Per-meeting verifier entry points.
pub mod meetings;
/// Accumulated, non-fatal verification outcomes.
pub mod report;

pub use error::SdkError;
