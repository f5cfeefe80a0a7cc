use crate::dut::{Dut, SimCore};
use crate::event::{ClockCommand, EdgeEvent};
use crate::pins::Pin;
use crate::simulator::{SimulationError, SimulationResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEdge {
    None = 0,
    Rising = 1,
    Falling = 2,
}

/// Time units accepted for clock periods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Ps,
    Ns,
    Us,
}

impl TimeUnit {
    /// Convert `value` in these units to picoseconds; `None` on overflow
    pub fn to_ps(self, value: u64) -> Option<u64> {
        match self {
            TimeUnit::Ps => Some(value),
            TimeUnit::Ns => value.checked_mul(1_000),
            TimeUnit::Us => value.checked_mul(1_000_000),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeUnit::Ps => "ps",
            TimeUnit::Ns => "ns",
            TimeUnit::Us => "us",
        })
    }
}

impl FromStr for TimeUnit {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ps" => Ok(TimeUnit::Ps),
            "ns" => Ok(TimeUnit::Ns),
            "us" => Ok(TimeUnit::Us),
            other => Err(SimulationError::InvalidPeriod(format!(
                "unknown time unit '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClockInfo {
    pub pin: Pin,
    pub current_value: bool,
    pub previous_value: bool,
    pub period_ps: u64,
}

impl ClockInfo {
    pub fn new(pin: Pin, period_ps: u64) -> Self {
        ClockInfo {
            pin,
            current_value: false,
            previous_value: false,
            period_ps,
        }
    }

    pub fn half_period_ps(&self) -> u64 {
        self.period_ps / 2
    }

    pub fn detect_edge(&self) -> ClockEdge {
        match (self.previous_value, self.current_value) {
            (false, true) => ClockEdge::Rising,
            (true, false) => ClockEdge::Falling,
            _ => ClockEdge::None,
        }
    }

    pub fn update(&mut self, new_value: bool) {
        self.previous_value = self.current_value;
        self.current_value = new_value;
    }

    pub fn toggle(&mut self) -> ClockEdge {
        self.update(!self.current_value);
        self.detect_edge()
    }
}

/// Free-running periodic clock on the device `clk` pin
#[derive(Debug, Clone)]
pub struct Clock {
    info: ClockInfo,
}

impl Clock {
    /// Create a clock with the given period.
    ///
    /// The period must be a non-zero even number of picoseconds so both
    /// half-periods are equal.
    pub fn new(period: u64, units: TimeUnit) -> SimulationResult<Self> {
        let period_ps = units.to_ps(period).ok_or_else(|| {
            SimulationError::InvalidPeriod(format!("{} {} overflows picoseconds", period, units))
        })?;
        if period_ps == 0 {
            return Err(SimulationError::InvalidPeriod(
                "clock period must be non-zero".to_string(),
            ));
        }
        if period_ps % 2 != 0 {
            return Err(SimulationError::InvalidPeriod(format!(
                "{} ps cannot be split into equal half-periods",
                period_ps
            )));
        }

        Ok(Self {
            info: ClockInfo::new(Pin::Clk, period_ps),
        })
    }

    pub fn period_ps(&self) -> u64 {
        self.info.period_ps
    }

    pub fn frequency_hz(&self) -> f64 {
        1e12 / self.info.period_ps as f64
    }

    /// Spawn the clock task for `dut`.
    ///
    /// The task runs until every handle to the device is dropped. It is never
    /// stopped explicitly.
    pub async fn start(self, dut: &Dut) -> SimulationResult<JoinHandle<()>> {
        let mut slot = dut.clock.lock().await;
        if slot.is_some() {
            return Err(SimulationError::ClockAlreadyRunning);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        *slot = Some(tx);

        info!(
            "Starting clock on {} ({} ps period, {:.3} MHz)",
            self.info.pin,
            self.info.period_ps,
            self.frequency_hz() / 1e6
        );

        let core = Arc::clone(&dut.core);
        Ok(tokio::spawn(self.run(core, rx)))
    }

    async fn run(
        mut self,
        core: Arc<Mutex<SimCore>>,
        mut commands: mpsc::UnboundedReceiver<ClockCommand>,
    ) {
        while let Some(command) = commands.recv().await {
            match command {
                ClockCommand::Advance { edges, reply } => {
                    let result = self.advance(&core, edges).await;
                    // The waiter may have gone away; nothing to report to.
                    let _ = reply.send(result);
                }
            }
        }
        debug!("Clock on {} released", self.info.pin);
    }

    /// Apply `edges` full periods: falling edge at +T/2, rising edge at +T
    async fn advance(
        &mut self,
        core: &Mutex<SimCore>,
        edges: u64,
    ) -> SimulationResult<EdgeEvent> {
        let mut core = core.lock().await;
        let half = self.info.half_period_ps();

        for _ in 0..edges {
            if self.info.current_value {
                let edge = self.info.toggle();
                core.drive_clock(edge, false, half).await?;
            } else {
                // First edge after start: the clock idles low
                core.advance_time(half);
            }
            let edge = self.info.toggle();
            core.drive_clock(edge, true, half).await?;
        }

        Ok(core.last_edge())
    }
}
