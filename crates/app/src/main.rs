use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand};
use sound_radar_core::{
    auto_assign, devices::DEVICE_POLL_INTERVAL, frame_interval, AppSettings, DeviceReconciler,
    FrameClock, OverlaySession, ReconcileOutcome, SimulatedEngine, Viewport,
};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> sound_radar_core::Result<()> {
    init_tracing();

    let Cli {
        settings: path,
        command,
    } = Cli::parse();
    let settings = AppSettings::load(&path)?;

    match command {
        Commands::Run { seconds, view } => run(&path, settings, seconds, view.into()).await,
        Commands::Devices => list_devices(&settings),
        Commands::Snapshot {
            output,
            frames,
            view,
        } => run_snapshot(&settings, &output, frames, view.into()),
    }
}

async fn run(
    settings_path: &PathBuf,
    mut settings: AppSettings,
    seconds: Option<u64>,
    viewport: Viewport,
) -> sound_radar_core::Result<()> {
    tracing::info!(pollrate = settings.poll_rate, ?seconds, "starting overlay");

    let mut session = OverlaySession::new(
        SimulatedEngine::demo(),
        settings.overlay_config(),
        settings.classifier_preset(),
        settings.saved_device_index(),
    )
    .with_viewport(viewport);
    session.start()?;

    let mut frames = time::interval(frame_interval(settings.poll_rate));
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let first_poll = Instant::now() + DEVICE_POLL_INTERVAL;
    let mut device_poll = time::interval_at(first_poll, DEVICE_POLL_INTERVAL);
    device_poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let deadline = time::sleep(seconds.map_or(Duration::MAX, Duration::from_secs));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(deadline, ctrl_c);

    let mut clock = FrameClock::new();
    loop {
        tokio::select! {
            _ = frames.tick() => {
                let dt = clock.tick();
                let primitives = session.on_frame(dt).len();
                tracing::trace!(dt, primitives, "frame");
            }
            _ = device_poll.tick() => {
                let outcome = session.poll_devices();
                if outcome != ReconcileOutcome::Unchanged {
                    tracing::info!(?outcome, "device poll");
                }
            }
            _ = &mut deadline => {
                tracing::info!("run time elapsed");
                break;
            }
            result = &mut ctrl_c => {
                if let Err(err) = result {
                    tracing::warn!(%err, "could not listen for ctrl-c");
                }
                break;
            }
        }
    }

    session.stop();
    let stats = session.stats();
    tracing::info!(
        frames = stats.frames,
        engine_faults = stats.engine_faults,
        device_changes = stats.device_changes,
        "overlay finished"
    );

    let selection = session.devices().selection();
    settings.output_device_idx = if selection.is_manual() {
        selection.index()
    } else {
        0
    };
    settings.save(settings_path)?;
    tracing::info!(path = ?settings_path, "settings saved");
    Ok(())
}

fn list_devices(settings: &AppSettings) -> sound_radar_core::Result<()> {
    let mut engine = SimulatedEngine::demo();
    let reconciler = DeviceReconciler::initialize(&mut engine, settings.saved_device_index());
    let automatic = auto_assign(reconciler.catalog().devices());
    let active = reconciler.selection().index();

    for (index, device) in reconciler.catalog().devices().iter().enumerate() {
        let marker = if index == active { '*' } else { ' ' };
        let auto = if index == automatic { " (auto)" } else { "" };
        println!("{marker} {index:>2}  {}{auto}", device.name);
    }
    Ok(())
}

fn run_snapshot(
    settings: &AppSettings,
    output: &PathBuf,
    frames: u32,
    viewport: Viewport,
) -> sound_radar_core::Result<()> {
    tracing::info!(?output, frames, "rendering snapshot");

    let mut session = OverlaySession::new(
        SimulatedEngine::demo(),
        settings.overlay_config(),
        settings.classifier_preset(),
        settings.saved_device_index(),
    )
    .with_viewport(viewport);
    session.start()?;

    let dt = frame_interval(settings.poll_rate).as_secs_f32();
    for _ in 0..frames {
        session.on_frame(dt);
    }

    let snapshot = serde_json::json!({
        "viewport": session.viewport(),
        "stats": session.stats(),
        "slots": session.tracker().slots(),
        "primitives": session.frame(),
    });
    let encoded = match serde_json::to_string_pretty(&snapshot) {
        Ok(encoded) => encoded,
        Err(err) => return Err(format!("could not encode snapshot: {err}").into()),
    };
    std::fs::write(output, encoded)?;
    session.stop();
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Sound radar overlay", long_about = None)]
struct Cli {
    /// Settings file, created on first exit if missing.
    #[arg(short, long, default_value = "settings.cfg", global = true)]
    settings: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the overlay loop until Ctrl-C or the optional deadline.
    Run {
        /// Stop after this many seconds.
        #[arg(long)]
        seconds: Option<u64>,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// List render devices and show which one would be used.
    Devices,
    /// Render a number of frames headless and write the last draw list as JSON.
    Snapshot {
        /// Path of the JSON file to write.
        output: PathBuf,
        #[arg(long, default_value_t = 120)]
        frames: u32,
        #[command(flatten)]
        view: ViewArgs,
    },
}

/// Size of the surface the overlay is laid out on.
#[derive(Args, Debug)]
struct ViewArgs {
    #[arg(long, default_value_t = 1920.0)]
    width: f32,
    #[arg(long, default_value_t = 1080.0)]
    height: f32,
}

impl From<ViewArgs> for Viewport {
    fn from(view: ViewArgs) -> Self {
        Self::new(view.width, view.height)
    }
}
