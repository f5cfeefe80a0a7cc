//! Pin contract of the device under test
//!
//! The device exposes one clock, an active-low reset, an enable, two 8-bit
//! input buses and one 8-bit output bus. The output bus carries the sync
//! status bits and the color field at fixed bit positions.

use crate::simulator::{SimulationError, SimulationResult};
use std::fmt;
use std::str::FromStr;

/// Row-sync (horizontal sync) bit of `uo_out`
pub const ROW_SYNC_MASK: u8 = 0b1000_0000;

/// Frame-sync (vertical sync) bit of `uo_out`
pub const FRAME_SYNC_MASK: u8 = 0b0001_0000;

/// Color field bits {5,3,2,1,0} of `uo_out`
pub const COLOR_MASK: u8 = 0b0010_1111;

/// Value the output bus holds while the device is disabled
pub const IDLE_PATTERN: u8 = 0x00;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinDirection {
    Input,
    Output,
}

/// A pin of the device interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pin {
    Clk,
    RstN,
    Ena,
    UiIn,
    UioIn,
    UoOut,
}

impl Pin {
    pub const ALL: [Pin; 6] = [
        Pin::Clk,
        Pin::RstN,
        Pin::Ena,
        Pin::UiIn,
        Pin::UioIn,
        Pin::UoOut,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Pin::Clk => "clk",
            Pin::RstN => "rst_n",
            Pin::Ena => "ena",
            Pin::UiIn => "ui_in",
            Pin::UioIn => "uio_in",
            Pin::UoOut => "uo_out",
        }
    }

    pub fn direction(self) -> PinDirection {
        match self {
            Pin::UoOut => PinDirection::Output,
            _ => PinDirection::Input,
        }
    }

    /// Width in bits
    pub fn width(self) -> u32 {
        match self {
            Pin::Clk | Pin::RstN | Pin::Ena => 1,
            Pin::UiIn | Pin::UioIn | Pin::UoOut => 8,
        }
    }

    pub fn is_input(self) -> bool {
        self.direction() == PinDirection::Input
    }

    /// Largest value the pin can carry
    pub fn max_value(self) -> u8 {
        match self.width() {
            8 => u8::MAX,
            w => (1u8 << w) - 1,
        }
    }

    /// Check that `value` fits in the pin
    pub fn check_value(self, value: u8) -> SimulationResult<()> {
        if value > self.max_value() {
            return Err(SimulationError::InvalidValue {
                pin: self.name(),
                value,
                width: self.width(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Pin {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pin::ALL
            .iter()
            .copied()
            .find(|pin| pin.name() == s)
            .ok_or_else(|| SimulationError::UnknownPin(s.to_string()))
    }
}

/// Decoded view of one `uo_out` sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSample {
    pub raw: u8,
}

impl OutputSample {
    pub fn new(raw: u8) -> Self {
        Self { raw }
    }

    pub fn row_sync(self) -> bool {
        self.raw & ROW_SYNC_MASK != 0
    }

    pub fn frame_sync(self) -> bool {
        self.raw & FRAME_SYNC_MASK != 0
    }

    /// Color field, still at its bus bit positions
    pub fn color(self) -> u8 {
        self.raw & COLOR_MASK
    }
}

/// Place a 5-bit color value onto the color field bit positions.
///
/// Bits 0..=3 map straight through, bit 4 lands on bus bit 5.
pub fn scatter_color(color: u8) -> u8 {
    (color & 0x0f) | ((color & 0x10) << 1)
}
