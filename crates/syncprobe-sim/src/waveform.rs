//! Pin-level waveform capture with VCD export

use crate::pins::Pin;
use indexmap::IndexMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Value history of one pin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    pub pin: Pin,
    pub width: u32,
    /// `(time_ps, value)` pairs in time order, one per change
    pub changes: Vec<(u64, u8)>,
}

impl Signal {
    fn new(pin: Pin) -> Self {
        Self {
            pin,
            width: pin.width(),
            changes: Vec::new(),
        }
    }

    pub fn last_value(&self) -> Option<u8> {
        self.changes.last().map(|&(_, value)| value)
    }
}

#[derive(Debug, Clone)]
pub struct Waveform {
    scope: String,
    signals: IndexMap<Pin, Signal>,
}

impl Waveform {
    pub fn new(scope: &str) -> Self {
        let signals = Pin::ALL.iter().map(|&pin| (pin, Signal::new(pin))).collect();
        Self {
            scope: scope.to_string(),
            signals,
        }
    }

    /// Record `value` on `pin` at `time_ps`. Repeated values are dropped.
    pub fn record(&mut self, time_ps: u64, pin: Pin, value: u8) {
        let Some(signal) = self.signals.get_mut(&pin) else {
            return;
        };
        if signal.last_value() == Some(value) {
            return;
        }
        match signal.changes.last_mut() {
            // Several updates in the same timestep collapse to the final one
            Some(last) if last.0 == time_ps => last.1 = value,
            _ => signal.changes.push((time_ps, value)),
        }
    }

    pub fn signal(&self, pin: Pin) -> Option<&Signal> {
        self.signals.get(&pin)
    }

    /// Value of `pin` at `time_ps`, if it had been driven by then
    pub fn value_at(&self, pin: Pin, time_ps: u64) -> Option<u8> {
        let signal = self.signals.get(&pin)?;
        signal
            .changes
            .iter()
            .take_while(|&&(t, _)| t <= time_ps)
            .last()
            .map(|&(_, value)| value)
    }

    /// Count rising transitions of a 1-bit pin
    pub fn rising_transitions(&self, pin: Pin) -> usize {
        self.signals
            .get(&pin)
            .map(|signal| {
                signal
                    .changes
                    .windows(2)
                    .filter(|pair| pair[0].1 == 0 && pair[1].1 != 0)
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn write_vcd<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "$version syncprobe {} $end", env!("CARGO_PKG_VERSION"))?;
        writeln!(out, "$timescale 1ps $end")?;
        writeln!(out, "$scope module {} $end", self.scope)?;
        for (index, signal) in self.signals.values().enumerate() {
            let code = id_code(index);
            if signal.width == 1 {
                writeln!(out, "$var wire 1 {} {} $end", code, signal.pin)?;
            } else {
                writeln!(
                    out,
                    "$var wire {} {} {} [{}:0] $end",
                    signal.width,
                    code,
                    signal.pin,
                    signal.width - 1
                )?;
            }
        }
        writeln!(out, "$upscope $end")?;
        writeln!(out, "$enddefinitions $end")?;

        let mut events: Vec<(u64, usize, u8)> = self
            .signals
            .values()
            .enumerate()
            .flat_map(|(index, signal)| {
                signal
                    .changes
                    .iter()
                    .map(move |&(time, value)| (time, index, value))
            })
            .collect();
        // Stable sort keeps declaration order within a timestep
        events.sort_by_key(|&(time, _, _)| time);

        let mut current_time = None;
        for (time, index, value) in events {
            if current_time != Some(time) {
                writeln!(out, "#{}", time)?;
                current_time = Some(time);
            }
            let signal = &self.signals[index];
            let code = id_code(index);
            if signal.width == 1 {
                writeln!(out, "{}{}", value & 1, code)?;
            } else {
                writeln!(
                    out,
                    "b{:0width$b} {}",
                    value,
                    code,
                    width = signal.width as usize
                )?;
            }
        }

        Ok(())
    }

    pub fn export_vcd(&self, path: &Path) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_vcd(&mut writer)?;
        writer.flush()
    }
}

/// VCD identifier codes are printable ASCII starting at '!'
fn id_code(index: usize) -> char {
    char::from(b'!' + index as u8)
}
