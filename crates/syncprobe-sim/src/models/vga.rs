//! Behavioral raster timing model
//!
//! Counts pixels and lines like a VGA timing generator and drives the sync
//! bits and a deterministic color test pattern onto `uo_out`. Reset is
//! synchronous on the rising edge while `rst_n` is low. Counters only move
//! while `ena` is high, and the output bus is held at [`IDLE_PATTERN`] while
//! `ena` is low.

use crate::clock_manager::ClockEdge;
use crate::pins::{scatter_color, Pin, FRAME_SYNC_MASK, IDLE_PATTERN, ROW_SYNC_MASK};
use crate::simulator::{DeviceUnderTest, SimulationError, SimulationResult};
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

/// Timing of one scan axis, in pixels (horizontal) or lines (vertical)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisTiming {
    pub visible: u32,
    pub front_porch: u32,
    pub sync: u32,
    pub back_porch: u32,
}

impl AxisTiming {
    pub const fn total(&self) -> u32 {
        self.visible + self.front_porch + self.sync + self.back_porch
    }

    pub fn is_visible(&self, pos: u32) -> bool {
        pos < self.visible
    }

    pub fn in_sync(&self, pos: u32) -> bool {
        let start = self.visible + self.front_porch;
        pos >= start && pos < start + self.sync
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VgaTiming {
    pub horizontal: AxisTiming,
    pub vertical: AxisTiming,
}

impl VgaTiming {
    /// 640x480 at 60 Hz with a 25 MHz pixel clock
    pub const VGA_640X480: VgaTiming = VgaTiming {
        horizontal: AxisTiming {
            visible: 640,
            front_porch: 16,
            sync: 96,
            back_porch: 48,
        },
        vertical: AxisTiming {
            visible: 480,
            front_porch: 10,
            sync: 2,
            back_porch: 33,
        },
    };

    /// Clock cycles per line
    pub fn line_period(&self) -> u64 {
        u64::from(self.horizontal.total())
    }

    /// Clock cycles per frame
    pub fn frame_period(&self) -> u64 {
        self.line_period() * u64::from(self.vertical.total())
    }
}

impl Default for VgaTiming {
    fn default() -> Self {
        Self::VGA_640X480
    }
}

/// Electrical level of the sync pulses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPolarity {
    /// Pulse drives the line low, idle high
    #[default]
    ActiveLow,
    /// Pulse drives the line high, idle low
    ActiveHigh,
}

impl SyncPolarity {
    fn level(self, in_pulse: bool) -> bool {
        match self {
            SyncPolarity::ActiveLow => !in_pulse,
            SyncPolarity::ActiveHigh => in_pulse,
        }
    }
}

impl fmt::Display for SyncPolarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SyncPolarity::ActiveLow => "low",
            SyncPolarity::ActiveHigh => "high",
        })
    }
}

impl FromStr for SyncPolarity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" | "active-low" | "negative" => Ok(SyncPolarity::ActiveLow),
            "high" | "active-high" | "positive" => Ok(SyncPolarity::ActiveHigh),
            other => Err(format!("unknown sync polarity '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VgaTimingModel {
    timing: VgaTiming,
    polarity: SyncPolarity,
    clk: bool,
    rst_n: bool,
    ena: bool,
    ui_in: u8,
    uio_in: u8,
    x: u32,
    y: u32,
    frames: u64,
}

impl Default for VgaTimingModel {
    fn default() -> Self {
        Self::new(VgaTiming::default(), SyncPolarity::default())
    }
}

impl VgaTimingModel {
    pub fn new(timing: VgaTiming, polarity: SyncPolarity) -> Self {
        Self {
            timing,
            polarity,
            clk: false,
            rst_n: false,
            ena: false,
            ui_in: 0,
            uio_in: 0,
            x: 0,
            y: 0,
            frames: 0,
        }
    }

    pub fn timing(&self) -> &VgaTiming {
        &self.timing
    }

    /// Current beam position `(x, y)`
    pub fn position(&self) -> (u32, u32) {
        (self.x, self.y)
    }

    /// Frames completed since the last reset
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Last driven `(clk, ui_in, uio_in)`; the model does not use the buses
    pub fn inputs(&self) -> (bool, u8, u8) {
        (self.clk, self.ui_in, self.uio_in)
    }

    fn step_counters(&mut self) {
        self.x += 1;
        if self.x == self.timing.horizontal.total() {
            self.x = 0;
            self.y += 1;
            if self.y == self.timing.vertical.total() {
                self.y = 0;
                self.frames += 1;
            }
        }
    }

    /// 5-bit bar/checker test pattern, black during blanking
    fn pattern(&self) -> u8 {
        let h = &self.timing.horizontal;
        let v = &self.timing.vertical;
        if !h.is_visible(self.x) || !v.is_visible(self.y) {
            return 0;
        }
        let bar = (self.x * 8 / h.visible) as u8;
        let band = (self.y * 4 / v.visible) as u8;
        (bar | (band << 3)) & 0x1f
    }

    pub fn output(&self) -> u8 {
        if !self.ena {
            return IDLE_PATTERN;
        }

        let mut out = scatter_color(self.pattern());
        if self.polarity.level(self.timing.horizontal.in_sync(self.x)) {
            out |= ROW_SYNC_MASK;
        }
        if self.polarity.level(self.timing.vertical.in_sync(self.y)) {
            out |= FRAME_SYNC_MASK;
        }
        out
    }
}

#[async_trait]
impl DeviceUnderTest for VgaTimingModel {
    fn name(&self) -> &str {
        "vga_timing_model"
    }

    async fn set_input(&mut self, pin: Pin, value: u8) -> SimulationResult<()> {
        match pin {
            Pin::Clk => self.clk = value != 0,
            Pin::RstN => self.rst_n = value != 0,
            Pin::Ena => self.ena = value != 0,
            Pin::UiIn => self.ui_in = value,
            Pin::UioIn => self.uio_in = value,
            Pin::UoOut => {
                return Err(SimulationError::InvalidPin {
                    pin: pin.name(),
                    action: "driven",
                })
            }
        }
        Ok(())
    }

    async fn get_output(&self, pin: Pin) -> SimulationResult<u8> {
        match pin {
            Pin::UoOut => Ok(self.output()),
            _ => Err(SimulationError::InvalidPin {
                pin: pin.name(),
                action: "read",
            }),
        }
    }

    async fn clock_edge(&mut self, edge: ClockEdge) -> SimulationResult<()> {
        if edge != ClockEdge::Rising {
            return Ok(());
        }
        if !self.rst_n {
            self.x = 0;
            self.y = 0;
            self.frames = 0;
        } else if self.ena {
            self.step_counters();
        }
        Ok(())
    }
}
