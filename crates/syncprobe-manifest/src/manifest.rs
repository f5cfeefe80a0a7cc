//! Configuration structure definitions

use crate::error::{ManifestError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use syncprobe_sim::COLOR_MASK;

pub use syncprobe_sim::TimeUnit;

/// Complete harness configuration
///
/// Every section is optional; missing sections and keys fall back to the
/// reference run (25 MHz clock, 10 reset cycles, 100 settle cycles, 5000
/// observed edges, 100 color samples).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessManifest {
    pub clock: ClockConfig,
    pub sequence: SequenceConfig,
    pub observe: ObserveConfig,
    pub model: ModelConfig,
    pub idle: IdleConfig,
    pub waveform: WaveformConfig,
}

/// Clock driven onto `clk`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    pub period: u64,
    pub units: TimeUnit,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            period: 40,
            units: TimeUnit::Ns,
        }
    }
}

impl ClockConfig {
    pub fn period_ps(&self) -> Result<u64> {
        self.units.to_ps(self.period).ok_or_else(|| {
            ManifestError::InvalidValue(
                "clock.period".to_string(),
                format!("{} {} does not fit in picoseconds", self.period, self.units),
            )
        })
    }
}

/// Startup sequence lengths in clock cycles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    pub reset_cycles: u64,
    pub settle_cycles: u64,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            reset_cycles: 10,
            settle_cycles: 100,
        }
    }
}

/// Observation window and color sampling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserveConfig {
    /// Upper bound on sampled edges while waiting for both sync signals
    pub max_cycles: u64,
    /// Color samples logged after the sync signals were seen
    pub color_samples: u64,
    /// Exact color field value every sample must carry. Unset means the
    /// samples are only logged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_color: Option<u8>,
}

impl Default for ObserveConfig {
    fn default() -> Self {
        Self {
            max_cycles: 5000,
            color_samples: 100,
            expected_color: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    #[default]
    Low,
    High,
}

/// Settings for the built-in timing model backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub polarity: Polarity,
    /// Level driven on `ena` during the sync run
    pub enable: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            polarity: Polarity::Low,
            enable: true,
        }
    }
}

/// Idle-output check with `ena` held low
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdleConfig {
    pub cycles: u64,
    pub pattern: u8,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            cycles: 100,
            pattern: 0x00,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveformConfig {
    /// VCD output file; no trace is recorded when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl HarnessManifest {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let period_ps = self.clock.period_ps()?;
        if period_ps == 0 {
            return Err(ManifestError::InvalidValue(
                "clock.period".to_string(),
                "must be non-zero".to_string(),
            ));
        }
        if period_ps % 2 != 0 {
            return Err(ManifestError::InvalidValue(
                "clock.period".to_string(),
                format!("{} ps has no equal half-periods", period_ps),
            ));
        }

        if self.sequence.reset_cycles == 0 {
            return Err(ManifestError::InvalidValue(
                "sequence.reset_cycles".to_string(),
                "reset must be held for at least one cycle".to_string(),
            ));
        }

        if self.observe.max_cycles == 0 {
            return Err(ManifestError::InvalidValue(
                "observe.max_cycles".to_string(),
                "observation window must be non-zero".to_string(),
            ));
        }

        if let Some(color) = self.observe.expected_color {
            if color & !COLOR_MASK != 0 {
                return Err(ManifestError::InvalidValue(
                    "observe.expected_color".to_string(),
                    format!(
                        "{:#010b} has bits outside the color field {:#010b}",
                        color, COLOR_MASK
                    ),
                ));
            }
        }

        if self.idle.cycles == 0 {
            return Err(ManifestError::InvalidValue(
                "idle.cycles".to_string(),
                "idle check must sample at least one cycle".to_string(),
            ));
        }

        Ok(())
    }
}
