//! Harness failure kinds

use std::fmt;
use syncprobe_sim::SimulationError;
use thiserror::Error;

/// Sync status bits tracked by the observer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncSignal {
    RowSync,
    FrameSync,
}

impl fmt::Display for SyncSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SyncSignal::RowSync => "row-sync",
            SyncSignal::FrameSync => "frame-sync",
        })
    }
}

#[derive(Debug, Error)]
pub enum HarnessError {
    /// A sync bit never went high inside the observation window
    #[error("{signal} not observed within {window} cycles")]
    LivenessViolation { signal: SyncSignal, window: u64 },

    #[error("color field mismatch at sample {sample}: expected {expected:#010b}, got {actual:#010b}")]
    ColorMismatch { sample: u64, expected: u8, actual: u8 },

    #[error("output not idle at cycle {cycle}: expected {expected:#04x}, got {actual:#04x}")]
    IdleViolation { cycle: u64, expected: u8, actual: u8 },

    #[error("invalid harness configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

impl HarnessError {
    /// True for the failures that indicate a device defect rather than a
    /// harness or simulation fault
    pub fn is_assertion(&self) -> bool {
        matches!(
            self,
            HarnessError::LivenessViolation { .. }
                | HarnessError::ColorMismatch { .. }
                | HarnessError::IdleViolation { .. }
        )
    }
}

pub type HarnessResult<T> = Result<T, HarnessError>;
