// Publish one dashboard write to a running drive loop
//
// Usage:
//   cargo run --example tune -- number "Turn Filter" 2.0
//   cargo run --example tune -- mode arcade

use clap::{Parser, Subcommand, ValueEnum};
use diffdrive_zenoh_runtime::config::TOPIC_TUNING;
use diffdrive_zenoh_runtime::drive::DriveMode;
use diffdrive_zenoh_runtime::messages::TuningUpdate;
use tracing::info;

#[derive(Parser, Debug)]
#[command(about = "Send a tuning update to the drive runtime")]
struct Cli {
    #[command(subcommand)]
    update: Update,
}

#[derive(Subcommand, Debug)]
enum Update {
    /// Set a named number, e.g. "Throttle Filter"
    Number {
        key: String,
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },
    /// Select the drive mode
    Mode { mode: ModeArg },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Arcade,
    Tank,
    Curvature,
}

impl From<ModeArg> for DriveMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Arcade => DriveMode::Arcade,
            ModeArg::Tank => DriveMode::Tank,
            ModeArg::Curvature => DriveMode::Curvature,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let update = match Cli::parse().update {
        Update::Number { key, value } => TuningUpdate::Number { key, value },
        Update::Mode { mode } => TuningUpdate::Mode { mode: mode.into() },
    };

    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(TOPIC_TUNING).await?;
    publisher.put(serde_json::to_string(&update)?).await?;
    info!("Sent {:?} to {}", update, TOPIC_TUNING);

    session.close().await?;
    Ok(())
}
