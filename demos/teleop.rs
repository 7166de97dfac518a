// Keyboard teleop: W/S throttle, A/D turn, I/K right stick (tank), R/F speed, Q quit
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use diffdrive_zenoh_runtime::config::TOPIC_CMD_AXES;
use diffdrive_zenoh_runtime::messages::AxisInput;
use std::time::{Duration, Instant};
use tracing::info;

const STICK_LEVELS: [f64; 3] = [0.25, 0.5, 1.0]; // fraction of full deflection
const INPUT_TIMEOUT_MS: u64 = 100; // Center sticks after this much time with no input

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(TOPIC_CMD_AXES).await?;

    info!("Controls: W/S=throttle, A/D=turn, I/K=right stick (tank), R/F=speed, Q=quit");
    info!("Speed: LOW");

    enable_raw_mode()?;
    let result = run_teleop(&publisher).await;
    disable_raw_mode()?;

    result
}

async fn run_teleop(
    publisher: &zenoh::pubsub::Publisher<'_>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut level: usize = 0;

    // Persistent stick state
    let mut axes = AxisInput::default();
    let mut last_input = Instant::now();

    loop {
        // Poll for key with 20ms timeout (50Hz effective rate)
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;
                let deflection = STICK_LEVELS[level];

                match code {
                    // Left stick Y: throttle (and left side in tank)
                    KeyCode::Char('w') if pressed => {
                        axes.left_y = deflection;
                        last_input = Instant::now();
                    }
                    KeyCode::Char('s') if pressed => {
                        axes.left_y = -deflection;
                        last_input = Instant::now();
                    }

                    // Right stick X: turn
                    KeyCode::Char('d') if pressed => {
                        axes.right_x = deflection;
                        last_input = Instant::now();
                    }
                    KeyCode::Char('a') if pressed => {
                        axes.right_x = -deflection;
                        last_input = Instant::now();
                    }

                    // Right stick Y: right side in tank
                    KeyCode::Char('i') if pressed => {
                        axes.right_y = deflection;
                        last_input = Instant::now();
                    }
                    KeyCode::Char('k') if pressed => {
                        axes.right_y = -deflection;
                        last_input = Instant::now();
                    }

                    // Speed control
                    KeyCode::Char('r') if pressed => {
                        level = (level + 1).min(2);
                        print_level(level);
                    }
                    KeyCode::Char('f') if pressed => {
                        level = level.saturating_sub(1);
                        print_level(level);
                    }

                    // Quit
                    KeyCode::Char('q') | KeyCode::Esc if pressed => break,

                    _ => {}
                }
            }
        }

        // Center sticks if no input for INPUT_TIMEOUT_MS
        if last_input.elapsed() > Duration::from_millis(INPUT_TIMEOUT_MS) {
            axes = AxisInput::default();
        }

        // Always publish at ~50Hz
        publisher.put(serde_json::to_string(&axes)?).await?;
    }

    // Leave the sticks centered
    publisher.put(serde_json::to_string(&AxisInput::default())?).await?;
    Ok(())
}

fn print_level(idx: usize) {
    let label = ["LOW", "MED", "HIGH"][idx];
    info!("Speed: {}", label);
}
