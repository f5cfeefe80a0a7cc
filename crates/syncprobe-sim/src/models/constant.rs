//! Device whose output bus never changes
//!
//! Stands in for a dead or stuck design: useful to check that the harness
//! reports failures instead of waiting forever.

use crate::clock_manager::ClockEdge;
use crate::pins::Pin;
use crate::simulator::{DeviceUnderTest, SimulationError, SimulationResult};
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct ConstantOutput {
    value: u8,
    edges: u64,
}

impl ConstantOutput {
    pub fn new(value: u8) -> Self {
        Self { value, edges: 0 }
    }

    /// Rising edges seen so far
    pub fn edges(&self) -> u64 {
        self.edges
    }
}

#[async_trait]
impl DeviceUnderTest for ConstantOutput {
    fn name(&self) -> &str {
        "constant_output"
    }

    async fn set_input(&mut self, pin: Pin, _value: u8) -> SimulationResult<()> {
        if !pin.is_input() {
            return Err(SimulationError::InvalidPin {
                pin: pin.name(),
                action: "driven",
            });
        }
        Ok(())
    }

    async fn get_output(&self, pin: Pin) -> SimulationResult<u8> {
        if pin.is_input() {
            return Err(SimulationError::InvalidPin {
                pin: pin.name(),
                action: "read",
            });
        }
        Ok(self.value)
    }

    async fn clock_edge(&mut self, edge: ClockEdge) -> SimulationResult<()> {
        if edge == ClockEdge::Rising {
            self.edges += 1;
        }
        Ok(())
    }
}
