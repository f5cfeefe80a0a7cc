//! Device backends implementing [`crate::DeviceUnderTest`]

pub mod constant;
pub mod vga;

pub use constant::ConstantOutput;
pub use vga::{AxisTiming, SyncPolarity, VgaTiming, VgaTimingModel};
