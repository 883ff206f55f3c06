use clap::Parser;
use gdmount_mount::{MountConfig, MountOrchestrator, MountOutcome};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "gdmount")]
#[command(about = "Attach a game-data image to the running VM")]
struct Cli {
    /// Stable identifier for the game data (typically a UUID)
    identifier: String,

    /// Path to the disk image to attach
    file: PathBuf,

    /// Mount parameter string from the launch configuration
    #[arg(long)]
    params: Option<String>,

    /// Talk only to the mount helper (docker-backed service)
    #[arg(long)]
    docker: bool,

    /// Control plane host
    #[arg(long, default_value = "127.0.0.1")]
    qmp_host: String,

    /// Primary control plane port
    #[arg(long, default_value_t = 4444)]
    qmp_port: u16,

    /// Watchdog control plane port
    #[arg(long, default_value_t = 4445)]
    watchdog_port: u16,

    /// Mount helper host
    #[arg(long, default_value = "127.0.0.1")]
    helper_host: String,

    /// Mount helper port
    #[arg(long, default_value_t = 22500)]
    helper_port: u16,

    /// Give up on the attach sequence after this many seconds
    #[arg(long)]
    deadline_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = MountConfig {
        qmp_host: cli.qmp_host,
        qmp_port: cli.qmp_port,
        watchdog_port: cli.watchdog_port,
        helper_host: cli.helper_host,
        helper_port: cli.helper_port,
        deadline: cli.deadline_secs.map(Duration::from_secs),
        ..MountConfig::default()
    };

    let orchestrator = MountOrchestrator::new(config)?;
    let outcome = orchestrator
        .run(&cli.identifier, &cli.file, cli.params.as_deref(), cli.docker)
        .await?;

    match outcome {
        MountOutcome::Mounted { payload } => {
            tracing::info!("mounted {}: {}", cli.file.display(), payload);
        }
        MountOutcome::AlreadyMounted => {
            tracing::info!("{} is already mounted", cli.identifier);
        }
        MountOutcome::Skipped => {
            tracing::info!("auto-mount suppressed by mount parameters");
        }
    }

    Ok(())
}
