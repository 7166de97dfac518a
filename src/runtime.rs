// Fixed-rate host loops for the drive core and the motor exerciser
// Note: the watchdog centers the sticks once axis input is older than CMD_TIMEOUT

use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time::interval;
use tracing::{info, warn};
use zenoh::handlers::FifoChannelHandler;
use zenoh::pubsub::{Publisher, Subscriber};
use zenoh::sample::Sample;

// local imports
use crate::config::{
    CMD_TIMEOUT, LEFT_INVERTED, RIGHT_INVERTED, TOPIC_CMD_AXES, TOPIC_FEEDBACK, TOPIC_HEALTH,
    TOPIC_RT_DRIVE, TOPIC_TELEMETRY, TOPIC_TUNING,
};
use crate::dashboard::{Dashboard, TuningSource};
use crate::diagnostic::{DiagnosticExerciser, DiagnosticReport};
use crate::drive::{ArbiterState, CycleInput, DriveOptions, GainSet, LimitSet};
use crate::error::{Result, RuntimeError};
use crate::messages::{
    AxisInput, DriveActuation, MotorFeedback, RuntimeHealth, TelemetryFrame, TuningUpdate,
};
use crate::motor::{Drivetrain, RemoteMotor, SideMotor, SimulatedMotor};
use crate::routine::RoutineRunner;

/// Settings for the drive loop
#[derive(Debug, Clone)]
pub struct DriveConfig {
    pub loop_hz: u64,
    pub sim: bool,
    pub gains: GainSet,
    pub limits: LimitSet,
    pub options: DriveOptions,
}

/// Settings for the motor exerciser loop
#[derive(Debug, Clone)]
pub struct ExerciseConfig {
    pub loop_hz: u64,
    pub sim: bool,
    pub left_id: u8,
    pub right_id: u8,
    pub output: f64,
    /// Cancel after this long; `None` runs until Ctrl+C
    pub duration: Option<Duration>,
}

/// Latest operator input plus the watchdog on its age
pub struct Runtime {
    latest_axes: Option<AxisInput>,
    axes_received_at: Instant,
    health: RuntimeHealth,
}

impl Runtime {
    pub fn new() -> Self {
        Self {
            latest_axes: None,
            axes_received_at: Instant::now(),
            health: RuntimeHealth::CmdStale, // Start stale until first input
        }
    }

    /// Process incoming stick values
    fn on_axes(&mut self, axes: AxisInput, now: Instant) {
        self.latest_axes = Some(axes.sanitized());
        self.axes_received_at = now;
    }

    /// Sticks to drive with this cycle, centered if input went stale
    fn current_axes(&mut self, now: Instant) -> AxisInput {
        let age = now.saturating_duration_since(self.axes_received_at);

        match self.latest_axes {
            Some(axes) if age <= CMD_TIMEOUT => {
                self.health = RuntimeHealth::Ok;
                axes
            }
            Some(_) => {
                // Watchdog triggered - center the sticks
                if self.health != RuntimeHealth::CmdStale {
                    warn!("Axis input stale ({:?} old), centering sticks", age);
                }
                self.health = RuntimeHealth::CmdStale;
                AxisInput::default()
            }
            None => {
                // No input ever received
                self.health = RuntimeHealth::CmdStale;
                AxisInput::default()
            }
        }
    }

    pub fn health(&self) -> RuntimeHealth {
        self.health
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

/// Measures the time between cycles. The first cycle, and any cycle after
/// a long stall, uses a bounded value so the filters never take one huge step.
struct CycleClock {
    nominal: f64,
    last: Option<Instant>,
}

impl CycleClock {
    const MAX_PERIODS: f64 = 5.0;

    fn new(loop_hz: u64) -> Self {
        Self {
            nominal: 1.0 / loop_hz.max(1) as f64,
            last: None,
        }
    }

    fn dt(&mut self, now: Instant) -> f64 {
        let dt = match self.last {
            Some(last) => now.saturating_duration_since(last).as_secs_f64(),
            None => self.nominal,
        };
        self.last = Some(now);
        dt.min(self.nominal * Self::MAX_PERIODS)
    }
}

/// Drain a subscriber without blocking, parsing every queued sample
fn drain<T: DeserializeOwned>(subscriber: &Subscriber<FifoChannelHandler<Sample>>, what: &str) -> Vec<T> {
    let mut messages = Vec::new();
    while let Ok(Some(sample)) = subscriber.try_recv() {
        let payload = sample.payload().to_bytes();
        match serde_json::from_slice::<T>(&payload) {
            Ok(message) => messages.push(message),
            Err(e) => warn!("Failed to parse {}: {}", what, e),
        }
    }
    messages
}

async fn publish<T: Serialize>(publisher: &Publisher<'_>, value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    publisher.put(json).await.map_err(RuntimeError::zenoh)
}

/// Where the runtime sends motor outputs
trait ActuationSink {
    async fn send(&self, actuation: &DriveActuation) -> Result<()>;
}

impl ActuationSink for Publisher<'_> {
    async fn send(&self, actuation: &DriveActuation) -> Result<()> {
        publish(self, actuation).await
    }
}

/// Publish the stopped outputs however the loop ended, then hand back the
/// loop's own outcome. A failed stop publish is logged, not raised over it.
async fn publish_stop<T, S: ActuationSink>(sink: &S, stopped: DriveActuation, outcome: Result<T>) -> Result<T> {
    if let Err(e) = sink.send(&stopped).await {
        warn!("Failed to publish stop actuation: {}", e);
        if outcome.is_ok() {
            return Err(e);
        }
    }
    outcome
}

fn tick_period(loop_hz: u64) -> Duration {
    Duration::from_millis(1000 / loop_hz.max(1))
}

/// Run the drive loop until Ctrl+C
pub async fn run_drive(config: DriveConfig) -> Result<()> {
    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default())
        .await
        .map_err(RuntimeError::zenoh)?;

    if config.sim {
        info!("Motor backend: simulated");
        let drivetrain = Drivetrain::new(SimulatedMotor::default(), SimulatedMotor::default())
            .with_inversion(LEFT_INVERTED, RIGHT_INVERTED);
        drive_loop(&session, drivetrain, &config).await
    } else {
        info!("Motor backend: remote ({})", TOPIC_FEEDBACK);
        let drivetrain = Drivetrain::new(RemoteMotor::new(), RemoteMotor::new())
            .with_inversion(LEFT_INVERTED, RIGHT_INVERTED);
        drive_loop(&session, drivetrain, &config).await
    }
}

async fn drive_loop<M: SideMotor>(
    session: &zenoh::Session,
    mut drivetrain: Drivetrain<M>,
    config: &DriveConfig,
) -> Result<()> {
    info!("Setting up publishers and subscribers...");
    let sub_axes = session.declare_subscriber(TOPIC_CMD_AXES).await.map_err(RuntimeError::zenoh)?;
    let sub_tuning = session.declare_subscriber(TOPIC_TUNING).await.map_err(RuntimeError::zenoh)?;
    let sub_feedback = session.declare_subscriber(TOPIC_FEEDBACK).await.map_err(RuntimeError::zenoh)?;
    let pub_actuation = session.declare_publisher(TOPIC_RT_DRIVE).await.map_err(RuntimeError::zenoh)?;
    let pub_health = session.declare_publisher(TOPIC_HEALTH).await.map_err(RuntimeError::zenoh)?;
    let pub_telemetry = session.declare_publisher(TOPIC_TELEMETRY).await.map_err(RuntimeError::zenoh)?;

    let mut arbiter = match ArbiterState::new(config.gains, config.limits, config.options) {
        Ok(state) => state,
        Err(e) => {
            warn!("{}; starting with default limits", e);
            ArbiterState::new(config.gains, LimitSet::default(), config.options)
                .unwrap_or_default()
        }
    };
    let mut dashboard = Dashboard::new();
    dashboard.publish_tuning(arbiter.gains(), arbiter.limits());

    let mut runtime = Runtime::new();
    let mut clock = CycleClock::new(config.loop_hz);
    let mut tick = interval(tick_period(config.loop_hz));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        "Drive loop started: {}Hz loop, {}ms watchdog timeout, mode {:?}",
        config.loop_hz,
        CMD_TIMEOUT.as_millis(),
        dashboard.selected_mode()
    );
    info!("Subscribed to: {}, {}, {}", TOPIC_CMD_AXES, TOPIC_TUNING, TOPIC_FEEDBACK);
    info!("Publishing to: {}, {}, {}", TOPIC_RT_DRIVE, TOPIC_HEALTH, TOPIC_TELEMETRY);

    let outcome = async {
        loop {
            tokio::select! {
                _ = tick.tick() => {}
                result = &mut shutdown => {
                    result?;
                    info!("Shutdown requested");
                    break;
                }
            }
            let now = Instant::now();
            let dt = clock.dt(now);

            // 1. Drain inputs (non-blocking), keep latest sticks and feedback
            if let Some(axes) = drain::<AxisInput>(&sub_axes, "axis input").pop() {
                runtime.on_axes(axes, now);
            }
            for update in drain::<TuningUpdate>(&sub_tuning, "tuning update") {
                dashboard.apply(update);
            }
            let feedback = drain::<MotorFeedback>(&sub_feedback, "motor feedback").pop();
            drivetrain.sync(feedback.as_ref(), dt);

            // 2. One arbiter step (includes watchdog on the sticks)
            let input = CycleInput {
                axes: runtime.current_axes(now),
                tuning: dashboard.snapshot(arbiter.gains(), arbiter.limits()),
                velocities: drivetrain.velocities(),
                dt,
            };
            let (pair, next) = arbiter.step(&input);
            arbiter = next;
            drivetrain.apply(pair);

            // 3. Publish actuation, health and dashboard
            publish(&pub_actuation, &drivetrain.actuation()).await?;
            publish(&pub_health, &runtime.health()).await?;
            let frame = TelemetryFrame {
                mode: arbiter.mode(),
                numbers: dashboard.numbers().clone(),
            };
            publish(&pub_telemetry, &frame).await?;
        }
        Ok::<(), RuntimeError>(())
    }
    .await;

    // Every exit path, errors included, leaves the bridge commanded to 0V
    drivetrain.stop();
    publish_stop(&pub_actuation, drivetrain.actuation(), outcome).await
}

/// Run the motor exerciser until Ctrl+C or the configured duration, then
/// return its final report
pub async fn run_exercise(config: ExerciseConfig) -> Result<Option<DiagnosticReport>> {
    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default())
        .await
        .map_err(RuntimeError::zenoh)?;

    if config.sim {
        info!("Motor backend: simulated");
        exercise_loop(&session, SimulatedMotor::default(), SimulatedMotor::default(), &config).await
    } else {
        info!("Motor backend: remote ({})", TOPIC_FEEDBACK);
        exercise_loop(&session, RemoteMotor::new(), RemoteMotor::new(), &config).await
    }
}

async fn exercise_loop<M: SideMotor>(
    session: &zenoh::Session,
    left: M,
    right: M,
    config: &ExerciseConfig,
) -> Result<Option<DiagnosticReport>> {
    let sub_feedback = session.declare_subscriber(TOPIC_FEEDBACK).await.map_err(RuntimeError::zenoh)?;
    let pub_actuation = session.declare_publisher(TOPIC_RT_DRIVE).await.map_err(RuntimeError::zenoh)?;
    let pub_telemetry = session.declare_publisher(TOPIC_TELEMETRY).await.map_err(RuntimeError::zenoh)?;

    let exerciser = DiagnosticExerciser::new(left, config.left_id, right, config.right_id, Dashboard::new())
        .with_output(config.output);
    let mut runner = RoutineRunner::new(exerciser);

    let started = Instant::now();
    let mut clock = CycleClock::new(config.loop_hz);
    let mut tick = interval(tick_period(config.loop_hz));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        "Exercise loop started: {}Hz loop, {}",
        config.loop_hz,
        match config.duration {
            Some(d) => format!("stopping after {:.1}s", d.as_secs_f64()),
            None => "stop with Ctrl+C".to_string(),
        }
    );

    let outcome = async {
        loop {
            tokio::select! {
                _ = tick.tick() => {}
                result = &mut shutdown => {
                    result?;
                    info!("Shutdown requested");
                    break;
                }
            }
            let now = Instant::now();
            if config.duration.is_some_and(|d| now.duration_since(started) >= d) {
                info!("Exercise duration elapsed");
                break;
            }
            let dt = clock.dt(now);

            let feedback = drain::<MotorFeedback>(&sub_feedback, "motor feedback").pop();
            let (left, right) = runner.routine_mut().motors_mut();
            left.sync(feedback.as_ref().map(|f| &f.left), dt);
            right.sync(feedback.as_ref().map(|f| &f.right), dt);

            if !runner.tick() {
                break;
            }

            let exerciser = runner.routine();
            publish(&pub_actuation, &exercise_actuation(exerciser)).await?;
            let frame = TelemetryFrame {
                mode: exerciser.telemetry().selected_mode(),
                numbers: exerciser.telemetry().numbers().clone(),
            };
            publish(&pub_telemetry, &frame).await?;
        }
        Ok::<(), RuntimeError>(())
    }
    .await;

    runner.cancel();
    let exerciser = runner.routine();
    let outcome = outcome.map(|()| exerciser.report().cloned());
    publish_stop(&pub_actuation, exercise_actuation(exerciser), outcome).await
}

fn exercise_actuation<M: SideMotor>(exerciser: &DiagnosticExerciser<M, Dashboard>) -> DriveActuation {
    DriveActuation {
        left: exerciser.left().output(),
        right: exerciser.right().output(),
    }
}
