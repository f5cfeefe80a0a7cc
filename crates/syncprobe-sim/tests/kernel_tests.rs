//! Kernel behavior: clock lockstep, pin access rules, waveform capture

use syncprobe_sim::*;

fn vga_dut() -> Dut {
    Dut::new(Box::new(VgaTimingModel::default()))
}

#[tokio::test]
async fn test_edges_advance_time_by_whole_periods() {
    let dut = vga_dut();
    Clock::new(40, TimeUnit::Ns).unwrap().start(&dut).await.unwrap();

    let first = dut.rising_edge().await.unwrap();
    assert_eq!(first.cycle, 1);
    assert_eq!(first.time_ps, 40_000);

    let later = dut.clock_cycles(10).await.unwrap();
    assert_eq!(later.cycle, 11);
    assert_eq!(later.time_ps, 11 * 40_000);
    assert_eq!(dut.cycle().await, 11);
    assert_eq!(dut.time_ps().await, 11 * 40_000);
}

#[tokio::test]
async fn test_zero_cycle_wait_returns_immediately() {
    let dut = vga_dut();
    Clock::new(40, TimeUnit::Ns).unwrap().start(&dut).await.unwrap();
    dut.clock_cycles(3).await.unwrap();

    let event = dut.clock_cycles(0).await.unwrap();
    assert_eq!(event.cycle, 3);
    assert_eq!(dut.time_ps().await, 3 * 40_000);
}

#[tokio::test]
async fn test_waiting_without_clock_fails_instead_of_hanging() {
    let dut = vga_dut();
    let err = dut.rising_edge().await.unwrap_err();
    assert!(matches!(err, SimulationError::NoClock));
}

#[tokio::test]
async fn test_second_clock_is_rejected() {
    let dut = vga_dut();
    Clock::new(40, TimeUnit::Ns).unwrap().start(&dut).await.unwrap();
    let err = Clock::new(20, TimeUnit::Ns)
        .unwrap()
        .start(&dut)
        .await
        .unwrap_err();
    assert!(matches!(err, SimulationError::ClockAlreadyRunning));
}

#[tokio::test]
async fn test_pin_direction_is_enforced() {
    let dut = vga_dut();

    assert!(matches!(
        dut.set(Pin::UoOut, 1).await,
        Err(SimulationError::InvalidPin { .. })
    ));
    assert!(matches!(
        dut.set(Pin::Clk, 1).await,
        Err(SimulationError::InvalidPin { .. })
    ));
    assert!(matches!(
        dut.get(Pin::RstN).await,
        Err(SimulationError::InvalidPin { .. })
    ));
    assert!(matches!(
        dut.set(Pin::Ena, 2).await,
        Err(SimulationError::InvalidValue { .. })
    ));

    dut.set(Pin::UiIn, 0xa5).await.unwrap();
}

#[tokio::test]
async fn test_inputs_take_effect_on_next_edge() {
    let dut = vga_dut();
    Clock::new(40, TimeUnit::Ns).unwrap().start(&dut).await.unwrap();

    dut.set(Pin::Ena, 1).await.unwrap();
    dut.set(Pin::RstN, 0).await.unwrap();
    dut.clock_cycles(5).await.unwrap();

    // Active-low sync idles high while held in reset
    let sample = dut.sample().await.unwrap();
    assert!(sample.row_sync());
    assert!(sample.frame_sync());

    dut.set(Pin::RstN, 1).await.unwrap();
    // Pixel 656 starts the horizontal sync pulse
    dut.clock_cycles(655).await.unwrap();
    assert!(dut.sample().await.unwrap().row_sync());
    dut.rising_edge().await.unwrap();
    assert!(!dut.sample().await.unwrap().row_sync());
}

#[tokio::test]
async fn test_disabled_device_holds_idle_pattern() {
    let dut = vga_dut();
    Clock::new(40, TimeUnit::Ns).unwrap().start(&dut).await.unwrap();

    dut.set(Pin::Ena, 0).await.unwrap();
    dut.set(Pin::RstN, 1).await.unwrap();
    for _ in 0..50 {
        dut.rising_edge().await.unwrap();
        assert_eq!(dut.get(Pin::UoOut).await.unwrap(), IDLE_PATTERN);
    }
}

#[tokio::test]
async fn test_constant_device_counts_edges() {
    let dut = Dut::new(Box::new(ConstantOutput::new(0x42)));
    Clock::new(10, TimeUnit::Ns).unwrap().start(&dut).await.unwrap();
    dut.clock_cycles(7).await.unwrap();
    assert_eq!(dut.get(Pin::UoOut).await.unwrap(), 0x42);
    assert_eq!(dut.time_ps().await, 70_000);
}

#[tokio::test]
async fn test_waveform_captures_clock_and_inputs() {
    let dut = Dut::with_trace(Box::new(VgaTimingModel::default()));
    Clock::new(40, TimeUnit::Ns).unwrap().start(&dut).await.unwrap();

    dut.set(Pin::Ena, 1).await.unwrap();
    dut.set(Pin::RstN, 0).await.unwrap();
    dut.clock_cycles(2).await.unwrap();
    dut.set(Pin::RstN, 1).await.unwrap();
    dut.clock_cycles(3).await.unwrap();

    let wave = dut.waveform().await.expect("tracing enabled");
    assert_eq!(wave.rising_transitions(Pin::Clk), 4);
    assert_eq!(wave.value_at(Pin::RstN, 0), Some(0));
    assert_eq!(wave.value_at(Pin::RstN, 80_000), Some(1));
    assert_eq!(wave.value_at(Pin::Clk, 40_000), Some(1));
    assert_eq!(wave.value_at(Pin::Clk, 60_000), Some(0));

    let mut vcd = Vec::new();
    wave.write_vcd(&mut vcd).unwrap();
    let text = String::from_utf8(vcd).unwrap();
    assert!(text.contains("$scope module vga_timing_model $end"));
    assert!(text.contains("#200000"));
}

#[tokio::test]
async fn test_untraced_dut_has_no_waveform() {
    let dut = vga_dut();
    assert!(dut.waveform().await.is_none());
    let path = std::env::temp_dir().join("syncprobe_untraced.vcd");
    assert!(!dut.export_vcd(&path).await.unwrap());
}
