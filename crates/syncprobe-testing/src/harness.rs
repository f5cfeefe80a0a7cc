//! Signal observer harness
//!
//! Drives the startup sequence into a device, then samples the output bus
//! until both sync bits have been seen or the observation window runs out.
//!
//! # Example
//! ```rust,no_run
//! use syncprobe_sim::{Dut, VgaTimingModel};
//! use syncprobe_testing::{HarnessConfig, SignalObserver};
//!
//! #[tokio::main]
//! async fn main() {
//!     let dut = Dut::new(Box::new(VgaTimingModel::default()));
//!     let observer = SignalObserver::new(HarnessConfig::default()).unwrap();
//!     let report = observer.run(&dut).await.unwrap();
//!     println!("row-sync after {} cycles", report.row_sync_at);
//! }
//! ```

use crate::error::{HarnessError, HarnessResult};
use crate::observation::{ObservationReport, ObservationState};
use syncprobe_sim::{Clock, Dut, Pin, TimeUnit, COLOR_MASK, IDLE_PATTERN};
use tracing::{debug, info};

/// Timing and window sizes of a harness run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    pub clock_period_ps: u64,
    /// Cycles `rst_n` is held low
    pub reset_cycles: u64,
    /// Cycles between reset release and the diagnostic snapshot
    pub settle_cycles: u64,
    /// Hard bound on the observation loop
    pub max_cycles: u64,
    /// Color samples taken after both sync bits were seen
    pub color_samples: u64,
    /// When set, every color sample must equal this value
    pub expected_color: Option<u8>,
    /// Level driven on `ena` during the sync run
    pub enable: bool,
    /// Cycles sampled by the idle-output check
    pub idle_cycles: u64,
    /// Output bus value expected while `ena` is low
    pub idle_pattern: u8,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            clock_period_ps: 40_000,
            reset_cycles: 10,
            settle_cycles: 100,
            max_cycles: 5000,
            color_samples: 100,
            expected_color: None,
            enable: true,
            idle_cycles: 100,
            idle_pattern: IDLE_PATTERN,
        }
    }
}

impl HarnessConfig {
    pub fn validate(&self) -> HarnessResult<()> {
        if self.clock_period_ps == 0 || self.clock_period_ps % 2 != 0 {
            return Err(HarnessError::InvalidConfig(format!(
                "clock period of {} ps must be non-zero and even",
                self.clock_period_ps
            )));
        }
        if self.reset_cycles == 0 {
            return Err(HarnessError::InvalidConfig(
                "reset must be held for at least one cycle".to_string(),
            ));
        }
        if self.max_cycles == 0 {
            return Err(HarnessError::InvalidConfig(
                "observation window must be non-zero".to_string(),
            ));
        }
        if self.idle_cycles == 0 {
            return Err(HarnessError::InvalidConfig(
                "idle check must sample at least one cycle".to_string(),
            ));
        }
        if let Some(color) = self.expected_color {
            if color & !COLOR_MASK != 0 {
                return Err(HarnessError::InvalidConfig(format!(
                    "expected color {:#010b} has bits outside the color field {:#010b}",
                    color, COLOR_MASK
                )));
            }
        }
        Ok(())
    }
}

/// Runs the sync liveness procedure against a device handle
#[derive(Debug, Clone)]
pub struct SignalObserver {
    config: HarnessConfig,
}

impl SignalObserver {
    pub fn new(config: HarnessConfig) -> HarnessResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Start the clock and hold the device in reset with `ena` at `enable`
    async fn start_and_reset(&self, dut: &Dut, enable: bool) -> HarnessResult<()> {
        Clock::new(self.config.clock_period_ps, TimeUnit::Ps)?
            .start(dut)
            .await?;

        info!("Applying reset");
        dut.set(Pin::RstN, 0).await?;
        dut.set(Pin::Ena, u8::from(enable)).await?;
        dut.set(Pin::UiIn, 0).await?;
        dut.set(Pin::UioIn, 0).await?;
        dut.clock_cycles(self.config.reset_cycles).await?;
        dut.set(Pin::RstN, 1).await?;
        info!("Reset released");
        Ok(())
    }

    /// Run the sync liveness procedure.
    ///
    /// Fails with [`HarnessError::LivenessViolation`] when row-sync or
    /// frame-sync never goes high within `max_cycles` sampled edges.
    pub async fn run(&self, dut: &Dut) -> HarnessResult<ObservationReport> {
        let config = &self.config;
        info!("Starting VGA sync observation on {}", dut.name());

        self.start_and_reset(dut, config.enable).await?;

        dut.clock_cycles(config.settle_cycles).await?;
        let settle_sample = dut.sample().await?;
        info!("HSYNC: {}", settle_sample.row_sync());
        info!("VSYNC: {}", settle_sample.frame_sync());

        let mut state = ObservationState::new();
        let mut observed_cycles = 0;
        for cycle in 1..=config.max_cycles {
            dut.rising_edge().await?;
            state.observe(dut.sample().await?, cycle);
            observed_cycles = cycle;
            if state.complete() {
                break;
            }
        }

        let (row_sync_at, frame_sync_at) = state.verify(config.max_cycles)?;
        info!(
            "HSYNC and VSYNC observed (row-sync at cycle {}, frame-sync at cycle {})",
            row_sync_at, frame_sync_at
        );

        let mut color_samples = Vec::new();
        for sample_index in 1..=config.color_samples {
            dut.rising_edge().await?;
            let color = dut.sample().await?.color();
            info!("Pixel color output: {:#010b}", color);
            if let Some(expected) = config.expected_color {
                if color != expected {
                    return Err(HarnessError::ColorMismatch {
                        sample: sample_index,
                        expected,
                        actual: color,
                    });
                }
            }
            color_samples.push(color);
        }

        let end_time_ps = dut.time_ps().await;
        info!("VGA sync test completed at {} ps", end_time_ps);

        Ok(ObservationReport {
            device: dut.name().to_string(),
            settle_sample,
            row_sync_at,
            frame_sync_at,
            observed_cycles,
            color_samples,
            end_time_ps,
        })
    }

    /// Hold `ena` low through reset and check the output bus stays at the
    /// idle pattern for `idle_cycles` edges. Returns the cycles checked.
    pub async fn check_idle(&self, dut: &Dut) -> HarnessResult<u64> {
        let config = &self.config;
        info!("Starting idle-output check on {}", dut.name());

        self.start_and_reset(dut, false).await?;

        for cycle in 1..=config.idle_cycles {
            dut.rising_edge().await?;
            let actual = dut.get(Pin::UoOut).await?;
            if actual != config.idle_pattern {
                return Err(HarnessError::IdleViolation {
                    cycle,
                    expected: config.idle_pattern,
                    actual,
                });
            }
        }

        debug!("Output held at {:#04x}", config.idle_pattern);
        info!("Idle-output check passed over {} cycles", config.idle_cycles);
        Ok(config.idle_cycles)
    }
}
