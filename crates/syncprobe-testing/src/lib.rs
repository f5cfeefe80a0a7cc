//! syncprobe testing framework
//!
//! Hardware-in-the-loop checks for VGA-style video devices.
//!
//! This crate provides:
//! - The signal observer harness: startup sequence, sync liveness, color sampling
//! - An idle-output check for a disabled device
//! - A named-test runner with a text report

pub mod error;
pub mod harness;
pub mod observation;
pub mod runner;

pub use error::{HarnessError, HarnessResult, SyncSignal};
pub use harness::{HarnessConfig, SignalObserver};
pub use observation::{ObservationReport, ObservationState};
pub use runner::{RunSummary, TestOutcome, TestRunner};
