//! Device handle shared by the harness and the clock task
//!
//! A [`Dut`] wraps a [`DeviceUnderTest`] backend together with the simulated
//! time, the rising-edge counter and an optional waveform trace. Every clone
//! refers to the same device.

use crate::clock_manager::ClockEdge;
use crate::event::{ClockCommand, EdgeEvent};
use crate::pins::{OutputSample, Pin};
use crate::simulator::{DeviceUnderTest, SimulationError, SimulationResult};
use crate::waveform::Waveform;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::trace;

/// Pin state and time owned by the simulation
pub(crate) struct SimCore {
    device: Box<dyn DeviceUnderTest>,
    time_ps: u64,
    cycle: u64,
    last_rising_ps: u64,
    waveform: Option<Waveform>,
}

impl SimCore {
    fn new(device: Box<dyn DeviceUnderTest>, traced: bool) -> Self {
        let waveform = traced.then(|| Waveform::new(device.name()));
        Self {
            device,
            time_ps: 0,
            cycle: 0,
            last_rising_ps: 0,
            waveform,
        }
    }

    pub(crate) fn advance_time(&mut self, delta_ps: u64) {
        self.time_ps += delta_ps;
    }

    /// Move time forward by `delta_ps` and apply a clock edge
    pub(crate) async fn drive_clock(
        &mut self,
        edge: ClockEdge,
        level: bool,
        delta_ps: u64,
    ) -> SimulationResult<()> {
        self.advance_time(delta_ps);
        self.device.set_input(Pin::Clk, u8::from(level)).await?;
        self.device.clock_edge(edge).await?;

        if edge == ClockEdge::Rising {
            self.cycle += 1;
            self.last_rising_ps = self.time_ps;
        }

        self.record(Pin::Clk, u8::from(level));
        self.record_outputs().await
    }

    pub(crate) fn last_edge(&self) -> EdgeEvent {
        EdgeEvent {
            cycle: self.cycle,
            time_ps: self.last_rising_ps,
        }
    }

    fn record(&mut self, pin: Pin, value: u8) {
        if let Some(waveform) = self.waveform.as_mut() {
            waveform.record(self.time_ps, pin, value);
        }
    }

    async fn record_outputs(&mut self) -> SimulationResult<()> {
        if self.waveform.is_some() {
            let value = self.device.get_output(Pin::UoOut).await?;
            self.record(Pin::UoOut, value);
        }
        Ok(())
    }
}

/// Handle onto a device under test
#[derive(Clone)]
pub struct Dut {
    name: Arc<str>,
    pub(crate) core: Arc<Mutex<SimCore>>,
    pub(crate) clock: Arc<Mutex<Option<mpsc::UnboundedSender<ClockCommand>>>>,
}

impl std::fmt::Debug for Dut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dut").field("name", &self.name).finish()
    }
}

impl Dut {
    pub fn new(device: Box<dyn DeviceUnderTest>) -> Self {
        Self::build(device, false)
    }

    /// Like [`Dut::new`], recording every pin change for waveform export
    pub fn with_trace(device: Box<dyn DeviceUnderTest>) -> Self {
        Self::build(device, true)
    }

    fn build(device: Box<dyn DeviceUnderTest>, traced: bool) -> Self {
        let name: Arc<str> = Arc::from(device.name());
        Self {
            name,
            core: Arc::new(Mutex::new(SimCore::new(device, traced))),
            clock: Arc::new(Mutex::new(None)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Drive an input pin. The clock pin belongs to the clock task.
    pub async fn set(&self, pin: Pin, value: u8) -> SimulationResult<()> {
        if !pin.is_input() || pin == Pin::Clk {
            return Err(SimulationError::InvalidPin {
                pin: pin.name(),
                action: "driven",
            });
        }
        pin.check_value(value)?;

        let mut core = self.core.lock().await;
        trace!("{} <= {:#x} @ {} ps", pin, value, core.time_ps);
        core.device.set_input(pin, value).await?;
        core.record(pin, value);
        core.record_outputs().await
    }

    /// Read an output pin. Inputs are never read back.
    pub async fn get(&self, pin: Pin) -> SimulationResult<u8> {
        if pin.is_input() {
            return Err(SimulationError::InvalidPin {
                pin: pin.name(),
                action: "read",
            });
        }
        self.core.lock().await.device.get_output(pin).await
    }

    /// Read and decode the output bus
    pub async fn sample(&self) -> SimulationResult<OutputSample> {
        self.get(Pin::UoOut).await.map(OutputSample::new)
    }

    /// Wait for the next rising clock edge
    pub async fn rising_edge(&self) -> SimulationResult<EdgeEvent> {
        self.clock_cycles(1).await
    }

    /// Wait for `cycles` rising clock edges
    pub async fn clock_cycles(&self, cycles: u64) -> SimulationResult<EdgeEvent> {
        let sender = self
            .clock
            .lock()
            .await
            .clone()
            .ok_or(SimulationError::NoClock)?;

        let (reply, response) = oneshot::channel();
        sender
            .send(ClockCommand::Advance {
                edges: cycles,
                reply,
            })
            .map_err(|_| SimulationError::ClockStopped)?;

        response.await.map_err(|_| SimulationError::ClockStopped)?
    }

    /// Current simulation time in picoseconds
    pub async fn time_ps(&self) -> u64 {
        self.core.lock().await.time_ps
    }

    /// Rising edges applied so far
    pub async fn cycle(&self) -> u64 {
        self.core.lock().await.cycle
    }

    /// Snapshot of the recorded waveform, if tracing is enabled
    pub async fn waveform(&self) -> Option<Waveform> {
        self.core.lock().await.waveform.clone()
    }

    /// Write the recorded waveform as VCD. Returns `false` when tracing is off.
    pub async fn export_vcd(&self, path: &Path) -> io::Result<bool> {
        match self.waveform().await {
            Some(waveform) => {
                waveform.export_vcd(path)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
