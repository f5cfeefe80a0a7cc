//! Simulation runtime types
//!
//! This module defines the error type and the capability trait every device
//! backend implements. The harness talks to a backend only through
//! [`DeviceUnderTest`], so a behavioral model and a real hardware bridge are
//! interchangeable.

use crate::clock_manager::ClockEdge;
use crate::pins::Pin;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during simulation
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("unknown pin '{0}'")]
    UnknownPin(String),
    #[error("pin '{pin}' cannot be {action} here")]
    InvalidPin {
        pin: &'static str,
        action: &'static str,
    },
    #[error("value {value:#x} does not fit {width}-bit pin '{pin}'")]
    InvalidValue {
        pin: &'static str,
        value: u8,
        width: u32,
    },
    #[error("no clock is driving the device")]
    NoClock,
    #[error("a clock is already driving the device")]
    ClockAlreadyRunning,
    #[error("invalid clock period: {0}")]
    InvalidPeriod(String),
    #[error("clock task stopped")]
    ClockStopped,
    #[error("device error: {0}")]
    Device(String),
}

/// Result type for simulation operations
pub type SimulationResult<T> = Result<T, SimulationError>;

/// Capability handle onto a device under test
///
/// Implemented by the behavioral models in [`crate::models`]; a bridge to
/// physical hardware implements the same three operations.
#[async_trait]
pub trait DeviceUnderTest: Send + Sync {
    /// Short name used in logs and waveform scopes
    fn name(&self) -> &str;

    /// Drive an input pin
    async fn set_input(&mut self, pin: Pin, value: u8) -> SimulationResult<()>;

    /// Read an output pin
    async fn get_output(&self, pin: Pin) -> SimulationResult<u8>;

    /// Apply one clock edge
    async fn clock_edge(&mut self, edge: ClockEdge) -> SimulationResult<()>;
}
