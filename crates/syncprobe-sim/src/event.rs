//! Messages exchanged between the harness and the clock task
//!
//! The clock task only advances simulated time when asked to, so the harness
//! and the clock stay in lockstep without sharing anything but these messages
//! and the pin state.

use crate::simulator::SimulationResult;
use tokio::sync::oneshot;

/// A rising clock edge that has been applied to the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeEvent {
    /// Number of rising edges since the clock started
    pub cycle: u64,
    /// Simulation time of the edge in picoseconds
    pub time_ps: u64,
}

/// Command sent to the clock task
#[derive(Debug)]
pub enum ClockCommand {
    /// Apply `edges` full clock periods, then report the last rising edge
    Advance {
        edges: u64,
        reply: oneshot::Sender<SimulationResult<EdgeEvent>>,
    },
}
