use crate::error::{HarnessError, HarnessResult, SyncSignal};
use syncprobe_sim::OutputSample;

/// Which sync bits have been seen so far, and when
///
/// Flags only ever go from unseen to seen; a fresh state is needed for a new
/// run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObservationState {
    row_sync_at: Option<u64>,
    frame_sync_at: Option<u64>,
}

impl ObservationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one output sample taken at observation cycle `cycle` (1-based)
    pub fn observe(&mut self, sample: OutputSample, cycle: u64) {
        if sample.row_sync() && self.row_sync_at.is_none() {
            self.row_sync_at = Some(cycle);
        }
        if sample.frame_sync() && self.frame_sync_at.is_none() {
            self.frame_sync_at = Some(cycle);
        }
    }

    pub fn row_sync_seen(&self) -> bool {
        self.row_sync_at.is_some()
    }

    pub fn frame_sync_seen(&self) -> bool {
        self.frame_sync_at.is_some()
    }

    pub fn row_sync_at(&self) -> Option<u64> {
        self.row_sync_at
    }

    pub fn frame_sync_at(&self) -> Option<u64> {
        self.frame_sync_at
    }

    pub fn complete(&self) -> bool {
        self.row_sync_seen() && self.frame_sync_seen()
    }

    /// Row-sync is checked before frame-sync
    pub fn verify(&self, window: u64) -> HarnessResult<(u64, u64)> {
        let row = self.row_sync_at.ok_or(HarnessError::LivenessViolation {
            signal: SyncSignal::RowSync,
            window,
        })?;
        let frame = self.frame_sync_at.ok_or(HarnessError::LivenessViolation {
            signal: SyncSignal::FrameSync,
            window,
        })?;
        Ok((row, frame))
    }
}

/// Outcome of a successful observation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationReport {
    pub device: String,
    /// Output bus after the settle window, logged but not checked
    pub settle_sample: OutputSample,
    /// Observation cycle at which row-sync was first high
    pub row_sync_at: u64,
    /// Observation cycle at which frame-sync was first high
    pub frame_sync_at: u64,
    /// Edges consumed by the observation loop
    pub observed_cycles: u64,
    /// Color field of each post-observation sample
    pub color_samples: Vec<u8>,
    pub end_time_ps: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use syncprobe_sim::{FRAME_SYNC_MASK, ROW_SYNC_MASK};

    #[test]
    fn test_flags_latch_first_cycle() {
        let mut state = ObservationState::new();
        state.observe(OutputSample::new(0), 1);
        assert!(!state.row_sync_seen());

        state.observe(OutputSample::new(ROW_SYNC_MASK), 2);
        state.observe(OutputSample::new(0), 3);
        state.observe(OutputSample::new(ROW_SYNC_MASK), 4);
        assert_eq!(state.row_sync_at(), Some(2));
        assert!(!state.complete());

        state.observe(OutputSample::new(FRAME_SYNC_MASK), 5);
        assert_eq!(state.frame_sync_at(), Some(5));
        assert!(state.complete());
        assert_eq!(state.verify(10).unwrap(), (2, 5));
    }

    #[test]
    fn test_verify_reports_row_sync_first() {
        let state = ObservationState::new();
        match state.verify(42) {
            Err(HarnessError::LivenessViolation { signal, window }) => {
                assert_eq!(signal, SyncSignal::RowSync);
                assert_eq!(window, 42);
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let mut state = ObservationState::new();
        state.observe(OutputSample::new(ROW_SYNC_MASK), 1);
        let err = state.verify(42).unwrap_err();
        assert_eq!(err.to_string(), "frame-sync not observed within 42 cycles");
    }
}
