use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use syncprobe_manifest::{HarnessManifest, Polarity, DEFAULT_FILE_NAME};
use syncprobe_sim::{DeviceUnderTest, Dut, SyncPolarity, VgaTiming, VgaTimingModel};
use syncprobe_testing::{HarnessConfig, HarnessError, SignalObserver, TestRunner};
use tokio::runtime::Runtime;
use tracing::{info, warn};

const SYNC_TEST: &str = "test_vga_sync";
const IDLE_TEST: &str = "test_idle_output";

/// syncprobe - sync liveness checks for VGA-style video devices
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the sync harness against the built-in timing model
    Run {
        /// Configuration file (defaults to ./syncprobe.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Observation window in clock cycles
        #[arg(long)]
        max_cycles: Option<u64>,

        /// Sync pulse polarity of the model (low or high)
        #[arg(long)]
        polarity: Option<SyncPolarity>,

        /// Hold `ena` low during the sync run
        #[arg(long)]
        disable_enable: bool,

        /// Write a VCD trace of the sync run
        #[arg(long)]
        vcd: Option<PathBuf>,

        /// Also run the idle-output check
        #[arg(long)]
        idle: bool,
    },

    /// Write a default configuration file
    Init {
        /// Output path
        #[arg(default_value = DEFAULT_FILE_NAME)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Parse and validate a configuration file
    Check {
        /// Configuration file
        path: PathBuf,
    },
}

/// Options that override the loaded configuration
struct RunOverrides {
    max_cycles: Option<u64>,
    polarity: Option<SyncPolarity>,
    disable_enable: bool,
    vcd: Option<PathBuf>,
    idle: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt().with_env_filter(log_level).init();

    match cli.command {
        Commands::Run {
            config,
            max_cycles,
            polarity,
            disable_enable,
            vcd,
            idle,
        } => {
            let overrides = RunOverrides {
                max_cycles,
                polarity,
                disable_enable,
                vcd,
                idle,
            };
            if !run_harness(config.as_deref(), overrides)? {
                std::process::exit(1);
            }
        }

        Commands::Init { path, force } => {
            init_config(&path, force)?;
        }

        Commands::Check { path } => {
            check_config(&path)?;
        }
    }

    Ok(())
}

fn load_manifest(path: Option<&Path>) -> Result<HarnessManifest> {
    let manifest = match path {
        Some(path) => syncprobe_manifest::from_path(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => syncprobe_manifest::load_or_default(DEFAULT_FILE_NAME)
            .with_context(|| format!("Failed to load {}", DEFAULT_FILE_NAME))?,
    };
    Ok(manifest)
}

fn harness_config(manifest: &HarnessManifest) -> Result<HarnessConfig> {
    Ok(HarnessConfig {
        clock_period_ps: manifest.clock.period_ps()?,
        reset_cycles: manifest.sequence.reset_cycles,
        settle_cycles: manifest.sequence.settle_cycles,
        max_cycles: manifest.observe.max_cycles,
        color_samples: manifest.observe.color_samples,
        expected_color: manifest.observe.expected_color,
        enable: manifest.model.enable,
        idle_cycles: manifest.idle.cycles,
        idle_pattern: manifest.idle.pattern,
    })
}

fn model_polarity(polarity: Polarity) -> SyncPolarity {
    match polarity {
        Polarity::Low => SyncPolarity::ActiveLow,
        Polarity::High => SyncPolarity::ActiveHigh,
    }
}

/// Run the registered tests; returns whether all of them passed
fn run_harness(config: Option<&Path>, overrides: RunOverrides) -> Result<bool> {
    let mut manifest = load_manifest(config)?;

    if let Some(max_cycles) = overrides.max_cycles {
        manifest.observe.max_cycles = max_cycles;
    }
    if overrides.disable_enable {
        manifest.model.enable = false;
    }
    manifest.validate().context("Invalid configuration")?;

    let polarity = overrides
        .polarity
        .unwrap_or_else(|| model_polarity(manifest.model.polarity));
    let vcd = overrides.vcd.or_else(|| manifest.waveform.path.clone());

    let observer = Arc::new(
        SignalObserver::new(harness_config(&manifest)?).context("Invalid harness configuration")?,
    );

    let mut runner = TestRunner::new();
    let sync = Arc::clone(&observer);
    runner.register(SYNC_TEST, move |dut| {
        let sync = Arc::clone(&sync);
        async move {
            let report = sync.run(&dut).await?;
            info!(
                "{}: row-sync at cycle {}, frame-sync at cycle {}",
                report.device, report.row_sync_at, report.frame_sync_at
            );
            Ok::<(), HarnessError>(())
        }
    });
    if overrides.idle {
        let idle = Arc::clone(&observer);
        runner.register(IDLE_TEST, move |dut| {
            let idle = Arc::clone(&idle);
            async move { idle.check_idle(&dut).await.map(|_| ()) }
        });
    }

    info!(
        "Running {} test(s) with {} sync polarity",
        runner.len(),
        polarity
    );

    // Create async runtime for simulation
    let runtime = Runtime::new()?;

    let traced_sync: RefCell<Option<Dut>> = RefCell::new(None);
    let summary = runtime.block_on(runner.run_all(|name| {
        let model: Box<dyn DeviceUnderTest> =
            Box::new(VgaTimingModel::new(VgaTiming::default(), polarity));
        if vcd.is_some() && name == SYNC_TEST {
            let dut = Dut::with_trace(model);
            *traced_sync.borrow_mut() = Some(dut.clone());
            dut
        } else {
            Dut::new(model)
        }
    }));

    if let (Some(path), Some(dut)) = (vcd.as_deref(), traced_sync.into_inner()) {
        let written = runtime
            .block_on(dut.export_vcd(path))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if written {
            println!("Waveform exported to {}", path.display());
        } else {
            warn!("No waveform recorded for {}", SYNC_TEST);
        }
    }

    println!("{}", summary.generate_report());
    Ok(summary.all_passed())
}

/// Write the default configuration
fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    let contents = syncprobe_manifest::to_string(&HarnessManifest::default())?;
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Created {}", path.display());
    Ok(())
}

/// Parse and validate a configuration file
fn check_config(path: &Path) -> Result<()> {
    let manifest = load_manifest(Some(path))?;
    manifest
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;

    let observer = SignalObserver::new(harness_config(&manifest)?)
        .with_context(|| format!("Invalid harness configuration in {}", path.display()))?;
    let config = observer.config();
    println!("{} is valid", path.display());
    println!(
        "  clock: {} ps, reset: {} cycles, settle: {} cycles",
        config.clock_period_ps, config.reset_cycles, config.settle_cycles
    );
    println!(
        "  observe: {} cycles, {} color samples",
        config.max_cycles, config.color_samples
    );
    Ok(())
}
