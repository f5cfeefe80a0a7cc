//! syncprobe simulation layer
//!
//! Pin contract, device capability trait and the cooperative simulation
//! kernel used by the harness.
//!
//! - [`Dut`] is the handle the harness drives and samples
//! - [`Clock`] runs as its own task and advances time edge by edge
//! - [`models`] holds behavioral device backends
//! - [`Waveform`] records pin activity for VCD export

pub mod clock_manager;
pub mod dut;
pub mod event;
pub mod models;
pub mod pins;
pub mod simulator;
pub mod waveform;

pub use clock_manager::{Clock, ClockEdge, ClockInfo, TimeUnit};
pub use dut::Dut;
pub use event::EdgeEvent;
pub use models::{AxisTiming, ConstantOutput, SyncPolarity, VgaTiming, VgaTimingModel};
pub use pins::{
    scatter_color, OutputSample, Pin, PinDirection, COLOR_MASK, FRAME_SYNC_MASK, IDLE_PATTERN,
    ROW_SYNC_MASK,
};
pub use simulator::{DeviceUnderTest, SimulationError, SimulationResult};
pub use waveform::{Signal as WaveformSignal, Waveform};
