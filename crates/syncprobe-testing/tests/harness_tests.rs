//! Sync liveness harness against the behavioral backends

use syncprobe_sim::{
    AxisTiming, ConstantOutput, Dut, Pin, SimulationError, SyncPolarity, VgaTiming,
    VgaTimingModel, FRAME_SYNC_MASK, ROW_SYNC_MASK,
};
use syncprobe_testing::{HarnessConfig, HarnessError, SignalObserver, SyncSignal};

const PERIOD_PS: u64 = 40_000;

fn model_dut(timing: VgaTiming, polarity: SyncPolarity) -> Dut {
    Dut::new(Box::new(VgaTimingModel::new(timing, polarity)))
}

fn observer(config: HarnessConfig) -> SignalObserver {
    SignalObserver::new(config).expect("valid config")
}

/// Standard line timing with a five-line frame, so frame-sync comes early
fn short_frame() -> VgaTiming {
    VgaTiming {
        horizontal: VgaTiming::VGA_640X480.horizontal,
        vertical: AxisTiming {
            visible: 2,
            front_porch: 1,
            sync: 1,
            back_porch: 1,
        },
    }
}

#[tokio::test]
async fn test_reference_run_observes_both_syncs() {
    let dut = model_dut(VgaTiming::VGA_640X480, SyncPolarity::ActiveLow);
    let report = observer(HarnessConfig::default()).run(&dut).await.unwrap();

    // Active-low sync lines idle high, so both bits are set straight away
    assert!(report.settle_sample.row_sync());
    assert!(report.settle_sample.frame_sync());
    assert_eq!(report.row_sync_at, 1);
    assert_eq!(report.frame_sync_at, 1);
    assert_eq!(report.observed_cycles, 1);
    assert_eq!(report.device, "vga_timing_model");

    // reset + settle + observation + color samples
    assert_eq!(report.end_time_ps, (10 + 100 + 1 + 100) * PERIOD_PS);
}

#[tokio::test]
async fn test_color_samples_follow_test_pattern() {
    let dut = model_dut(VgaTiming::VGA_640X480, SyncPolarity::ActiveLow);
    let report = observer(HarnessConfig::default()).run(&dut).await.unwrap();

    // Samples cover x = 102..=201 on line 0: bar 1 up to x = 159, then bar 2
    assert_eq!(report.color_samples.len(), 100);
    assert_eq!(report.color_samples.iter().filter(|&&c| c == 1).count(), 58);
    assert_eq!(report.color_samples.iter().filter(|&&c| c == 2).count(), 42);
    assert_eq!(report.color_samples.first(), Some(&1));
    assert_eq!(report.color_samples.last(), Some(&2));
}

#[tokio::test]
async fn test_active_high_pulses_are_found_inside_window() {
    let dut = model_dut(short_frame(), SyncPolarity::ActiveHigh);
    let report = observer(HarnessConfig::default()).run(&dut).await.unwrap();

    // After reset and settle the beam sits at x = 100; the pulse starts at 656
    assert_eq!(report.row_sync_at, 556);
    // Line 3 starts 2400 pixels into the frame
    assert_eq!(report.frame_sync_at, 2300);
    assert_eq!(report.observed_cycles, 2300);
    assert!(!report.settle_sample.row_sync());
}

#[tokio::test]
async fn test_frame_sync_beyond_window_is_reported() {
    let dut = model_dut(VgaTiming::VGA_640X480, SyncPolarity::ActiveHigh);
    let err = observer(HarnessConfig::default())
        .run(&dut)
        .await
        .unwrap_err();

    match err {
        HarnessError::LivenessViolation { signal, window } => {
            assert_eq!(signal, SyncSignal::FrameSync);
            assert_eq!(window, 5000);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(dut.cycle().await, 10 + 100 + 5000);
}

#[tokio::test]
async fn test_window_shorter_than_line_fails_without_hanging() {
    let dut = model_dut(VgaTiming::VGA_640X480, SyncPolarity::ActiveHigh);
    let config = HarnessConfig {
        max_cycles: 100,
        ..HarnessConfig::default()
    };
    let err = observer(config).run(&dut).await.unwrap_err();

    assert_eq!(err.to_string(), "row-sync not observed within 100 cycles");
    assert!(err.is_assertion());
    assert_eq!(dut.time_ps().await, (10 + 100 + 100) * PERIOD_PS);
}

#[tokio::test]
async fn test_stuck_outputs() {
    let low = Dut::new(Box::new(ConstantOutput::new(0)));
    let err = observer(HarnessConfig::default())
        .run(&low)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        HarnessError::LivenessViolation {
            signal: SyncSignal::RowSync,
            ..
        }
    ));

    let row_only = Dut::new(Box::new(ConstantOutput::new(ROW_SYNC_MASK)));
    let err = observer(HarnessConfig::default())
        .run(&row_only)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        HarnessError::LivenessViolation {
            signal: SyncSignal::FrameSync,
            ..
        }
    ));

    let both = Dut::new(Box::new(ConstantOutput::new(ROW_SYNC_MASK | FRAME_SYNC_MASK)));
    let report = observer(HarnessConfig::default()).run(&both).await.unwrap();
    assert_eq!((report.row_sync_at, report.frame_sync_at), (1, 1));
    assert!(report.color_samples.iter().all(|&c| c == 0));
}

#[tokio::test]
async fn test_disabled_device_fails_sync_run() {
    let dut = model_dut(VgaTiming::VGA_640X480, SyncPolarity::ActiveLow);
    let config = HarnessConfig {
        enable: false,
        ..HarnessConfig::default()
    };
    let err = observer(config).run(&dut).await.unwrap_err();
    assert_eq!(err.to_string(), "row-sync not observed within 5000 cycles");
}

#[tokio::test]
async fn test_idle_check() {
    let dut = model_dut(VgaTiming::VGA_640X480, SyncPolarity::ActiveLow);
    let checked = observer(HarnessConfig::default())
        .check_idle(&dut)
        .await
        .unwrap();
    assert_eq!(checked, 100);

    let busy = Dut::new(Box::new(ConstantOutput::new(0x80)));
    let err = observer(HarnessConfig::default())
        .check_idle(&busy)
        .await
        .unwrap_err();
    match err {
        HarnessError::IdleViolation {
            cycle,
            expected,
            actual,
        } => {
            assert_eq!(cycle, 1);
            assert_eq!(expected, 0x00);
            assert_eq!(actual, 0x80);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_rerun_on_fresh_device_is_deterministic() {
    let harness = observer(HarnessConfig::default());

    let first = harness
        .run(&model_dut(short_frame(), SyncPolarity::ActiveHigh))
        .await
        .unwrap();
    let second = harness
        .run(&model_dut(short_frame(), SyncPolarity::ActiveHigh))
        .await
        .unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_expected_color() {
    let raw = ROW_SYNC_MASK | FRAME_SYNC_MASK | 0b0000_0101;

    let matching = HarnessConfig {
        expected_color: Some(0b0000_0101),
        color_samples: 10,
        ..HarnessConfig::default()
    };
    let dut = Dut::new(Box::new(ConstantOutput::new(raw)));
    let report = observer(matching).run(&dut).await.unwrap();
    assert_eq!(report.color_samples, vec![0b0000_0101; 10]);

    let wrong = HarnessConfig {
        expected_color: Some(0b0000_0001),
        ..HarnessConfig::default()
    };
    let dut = Dut::new(Box::new(ConstantOutput::new(raw)));
    let err = observer(wrong).run(&dut).await.unwrap_err();
    assert!(matches!(
        err,
        HarnessError::ColorMismatch {
            sample: 1,
            expected: 0b0000_0001,
            actual: 0b0000_0101,
        }
    ));
}

#[test]
fn test_invalid_configs_are_rejected() {
    let outside_field = HarnessConfig {
        expected_color: Some(ROW_SYNC_MASK),
        ..HarnessConfig::default()
    };
    assert!(matches!(
        SignalObserver::new(outside_field),
        Err(HarnessError::InvalidConfig(_))
    ));

    let no_window = HarnessConfig {
        max_cycles: 0,
        ..HarnessConfig::default()
    };
    assert!(SignalObserver::new(no_window).is_err());

    let odd_period = HarnessConfig {
        clock_period_ps: 41,
        ..HarnessConfig::default()
    };
    assert!(SignalObserver::new(odd_period).is_err());

    let no_idle = HarnessConfig {
        idle_cycles: 0,
        ..HarnessConfig::default()
    };
    assert!(matches!(
        SignalObserver::new(no_idle),
        Err(HarnessError::InvalidConfig(_))
    ));
}

#[tokio::test]
async fn test_unbounded_color_samples_stop_at_first_mismatch() {
    let config = HarnessConfig {
        color_samples: u64::MAX,
        expected_color: Some(0b0000_0001),
        ..HarnessConfig::default()
    };
    let dut = Dut::new(Box::new(ConstantOutput::new(ROW_SYNC_MASK | FRAME_SYNC_MASK)));
    let err = observer(config).run(&dut).await.unwrap_err();

    assert!(matches!(
        err,
        HarnessError::ColorMismatch {
            sample: 1,
            expected: 0b0000_0001,
            actual: 0,
        }
    ));
}

#[tokio::test]
async fn test_second_run_on_same_device_is_a_simulation_error() {
    let dut = model_dut(VgaTiming::VGA_640X480, SyncPolarity::ActiveLow);
    let harness = observer(HarnessConfig::default());
    harness.run(&dut).await.unwrap();

    let err = harness.run(&dut).await.unwrap_err();
    assert!(matches!(
        err,
        HarnessError::Simulation(SimulationError::ClockAlreadyRunning)
    ));
    assert!(!err.is_assertion());
}

#[tokio::test]
async fn test_traced_run_records_reset_release() {
    let dut = Dut::with_trace(Box::new(VgaTimingModel::default()));
    observer(HarnessConfig::default()).run(&dut).await.unwrap();

    let wave = dut.waveform().await.unwrap();
    assert_eq!(wave.value_at(Pin::RstN, 10 * PERIOD_PS - 1), Some(0));
    assert_eq!(wave.value_at(Pin::RstN, 10 * PERIOD_PS), Some(1));
    assert_eq!(wave.value_at(Pin::Ena, 0), Some(1));
    assert_eq!(wave.rising_transitions(Pin::Clk), 210);
}
