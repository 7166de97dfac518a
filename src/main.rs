use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use diffdrive_zenoh_runtime::config::{
    DEFAULT_THROTTLE_CONSTANT, DEFAULT_THROTTLE_LIMIT, DEFAULT_TURN_CONSTANT, DEFAULT_TURN_LIMIT,
    EXERCISE_OUTPUT, LEFT_MOTOR_ID, LOOP_HZ, RIGHT_MOTOR_ID,
};
use diffdrive_zenoh_runtime::drive::{DriveOptions, GainSet, LimitSet};
use diffdrive_zenoh_runtime::runtime::{self, DriveConfig, ExerciseConfig};

#[derive(Parser, Debug)]
#[command(version, about = "Differential drive runtime")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drive from operator sticks (default)
    Drive(DriveArgs),
    /// Spin both sides at a fixed low output and stream encoder telemetry
    Exercise(ExerciseArgs),
}

#[derive(Args, Debug)]
struct DriveArgs {
    /// Use simulated motors instead of the hardware bridge
    #[arg(long)]
    sim: bool,

    #[arg(long, default_value_t = LOOP_HZ, value_parser = clap::value_parser!(u64).range(1..=1000))]
    loop_hz: u64,

    /// Sticks below this magnitude read as zero
    #[arg(long, default_value_t = 0.0, value_parser = finite)]
    deadband: f64,

    /// Square arcade/tank inputs for finer low-speed control
    #[arg(long)]
    square_inputs: bool,

    #[arg(long, default_value_t = DEFAULT_THROTTLE_CONSTANT, value_parser = finite, allow_negative_numbers = true)]
    throttle_constant: f64,

    #[arg(long, default_value_t = DEFAULT_TURN_CONSTANT, value_parser = finite, allow_negative_numbers = true)]
    turn_constant: f64,

    /// Throttle rate limit (units/s)
    #[arg(long, default_value_t = DEFAULT_THROTTLE_LIMIT, value_parser = positive)]
    throttle_filter: f64,

    /// Turn rate limit (units/s)
    #[arg(long, default_value_t = DEFAULT_TURN_LIMIT, value_parser = positive)]
    turn_filter: f64,
}

impl Default for DriveArgs {
    fn default() -> Self {
        Self {
            sim: false,
            loop_hz: LOOP_HZ,
            deadband: 0.0,
            square_inputs: false,
            throttle_constant: DEFAULT_THROTTLE_CONSTANT,
            turn_constant: DEFAULT_TURN_CONSTANT,
            throttle_filter: DEFAULT_THROTTLE_LIMIT,
            turn_filter: DEFAULT_TURN_LIMIT,
        }
    }
}

#[derive(Args, Debug)]
struct ExerciseArgs {
    /// Use simulated motors instead of the hardware bridge
    #[arg(long)]
    sim: bool,

    #[arg(long, default_value_t = LOOP_HZ, value_parser = clap::value_parser!(u64).range(1..=1000))]
    loop_hz: u64,

    #[arg(long, default_value_t = LEFT_MOTOR_ID)]
    left_id: u8,

    #[arg(long, default_value_t = RIGHT_MOTOR_ID)]
    right_id: u8,

    /// Normalized output applied to both sides
    #[arg(long, default_value_t = EXERCISE_OUTPUT, value_parser = finite, allow_negative_numbers = true)]
    output: f64,

    /// Stop after this many seconds instead of waiting for Ctrl+C
    #[arg(long)]
    duration_secs: Option<f64>,
}

fn finite(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{}", e))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("must be a finite number, got {}", value))
    }
}

fn positive(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{}", e))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("must be a positive number, got {}", value))
    }
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init(); // installs the subscriber globally

    let cli = Cli::parse();

    let result = match cli.command.unwrap_or(Command::Drive(DriveArgs::default())) {
        Command::Drive(args) => {
            let config = DriveConfig {
                loop_hz: args.loop_hz,
                sim: args.sim,
                gains: GainSet {
                    throttle: args.throttle_constant,
                    turn: args.turn_constant,
                },
                limits: LimitSet {
                    throttle: args.throttle_filter,
                    turn: args.turn_filter,
                },
                options: DriveOptions {
                    deadband: args.deadband.clamp(0.0, 0.99),
                    square_inputs: args.square_inputs,
                },
            };
            runtime::run_drive(config).await
        }
        Command::Exercise(args) => {
            let config = ExerciseConfig {
                loop_hz: args.loop_hz,
                sim: args.sim,
                left_id: args.left_id,
                right_id: args.right_id,
                output: args.output,
                duration: args
                    .duration_secs
                    .filter(|s| s.is_finite() && *s > 0.0)
                    .map(Duration::from_secs_f64),
            };
            runtime::run_exercise(config).await.map(|report| {
                if let Some(report) = report {
                    println!("{}", report);
                }
            })
        }
    };

    if let Err(e) = result {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_constants_must_be_finite() {
        for bad in ["NaN", "inf", "-inf"] {
            let parsed = Cli::try_parse_from(["diffdrive", "drive", "--throttle-constant", bad]);
            assert!(parsed.is_err(), "accepted throttle constant {}", bad);
            let parsed = Cli::try_parse_from(["diffdrive", "drive", "--turn-constant", bad]);
            assert!(parsed.is_err(), "accepted turn constant {}", bad);
        }
    }

    #[test]
    fn test_finite_gain_constants_accepted() {
        let cli = Cli::try_parse_from(["diffdrive", "drive", "--throttle-constant", "0.8", "--turn-constant", "-0.3"])
            .unwrap();
        match cli.command {
            Some(Command::Drive(args)) => {
                assert_eq!(args.throttle_constant, 0.8);
                assert_eq!(args.turn_constant, -0.3);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_finite_parser() {
        assert_eq!(finite("0.5"), Ok(0.5));
        assert!(finite("NaN").is_err());
        assert!(finite("inf").is_err());
        assert!(finite("abc").is_err());
    }
}
