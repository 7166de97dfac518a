// In-memory tuning and telemetry surface
//
// Holds named numbers (tunable constants written by the operator, and
// telemetry written by the robot) plus the drive mode chooser. The
// runtime feeds it from `TuningUpdate` messages and publishes its table.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::config::{KEY_THROTTLE_CONSTANT, KEY_THROTTLE_FILTER, KEY_TURN_CONSTANT, KEY_TURN_FILTER};
use crate::drive::{DriveMode, GainSet, LimitSet, TuningSnapshot};
use crate::messages::TuningUpdate;

/// Read side of the dashboard
pub trait TuningSource {
    /// Value stored under `key`, or `default` if nothing was ever put there
    fn get_number(&self, key: &str, default: f64) -> f64;

    /// The chooser's current selection, or its default option
    fn selected_mode(&self) -> DriveMode;
}

/// Write side of the dashboard (overwrite semantics)
pub trait TelemetrySink {
    fn put_number(&mut self, key: &str, value: f64);
}

/// Selectable option widget with a declared default
#[derive(Debug, Clone)]
pub struct ModeChooser {
    options: Vec<(String, DriveMode)>,
    default: DriveMode,
    selected: Option<DriveMode>,
}

impl ModeChooser {
    pub fn new(default_name: &str, default: DriveMode) -> Self {
        Self {
            options: vec![(default_name.to_string(), default)],
            default,
            selected: None,
        }
    }

    pub fn add_option(mut self, name: &str, mode: DriveMode) -> Self {
        self.options.push((name.to_string(), mode));
        self
    }

    /// Select an option by its display name (case-insensitive)
    pub fn select_name(&mut self, name: &str) -> bool {
        let found = self
            .options
            .iter()
            .find(|(option, _)| option.eq_ignore_ascii_case(name))
            .map(|&(_, mode)| mode);
        match found {
            Some(mode) => {
                self.selected = Some(mode);
                true
            }
            None => false,
        }
    }

    /// Select an option by value; fails if the mode is not offered
    pub fn select(&mut self, mode: DriveMode) -> bool {
        if self.options.iter().any(|&(_, option)| option == mode) {
            self.selected = Some(mode);
            true
        } else {
            false
        }
    }

    pub fn get_selected(&self) -> DriveMode {
        self.selected.unwrap_or(self.default)
    }

    pub fn option_names(&self) -> impl Iterator<Item = &str> {
        self.options.iter().map(|(name, _)| name.as_str())
    }
}

impl Default for ModeChooser {
    fn default() -> Self {
        ModeChooser::new("Curvature", DriveMode::Curvature)
            .add_option("Arcade", DriveMode::Arcade)
            .add_option("Tank", DriveMode::Tank)
    }
}

/// Named numbers plus the drive mode chooser
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    numbers: BTreeMap<String, f64>,
    chooser: ModeChooser,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chooser(&self) -> &ModeChooser {
        &self.chooser
    }

    pub fn chooser_mut(&mut self) -> &mut ModeChooser {
        &mut self.chooser
    }

    /// All numbers currently on the dashboard, sorted by key
    pub fn numbers(&self) -> &BTreeMap<String, f64> {
        &self.numbers
    }

    /// Put the values in effect at startup so operators can see and edit them
    pub fn publish_tuning(&mut self, gains: GainSet, limits: LimitSet) {
        self.put_number(KEY_THROTTLE_CONSTANT, gains.throttle);
        self.put_number(KEY_TURN_CONSTANT, gains.turn);
        self.put_number(KEY_THROTTLE_FILTER, limits.throttle);
        self.put_number(KEY_TURN_FILTER, limits.turn);
    }

    /// Read everything the arbiter needs for one cycle. Missing keys fall
    /// back to the values currently in effect.
    pub fn snapshot(&self, gains: GainSet, limits: LimitSet) -> TuningSnapshot {
        TuningSnapshot {
            mode: self.selected_mode(),
            gains: GainSet {
                throttle: self.get_number(KEY_THROTTLE_CONSTANT, gains.throttle),
                turn: self.get_number(KEY_TURN_CONSTANT, gains.turn),
            },
            limits: LimitSet {
                throttle: self.get_number(KEY_THROTTLE_FILTER, limits.throttle),
                turn: self.get_number(KEY_TURN_FILTER, limits.turn),
            },
        }
    }

    /// Apply an operator write. Returns false if it was ignored.
    pub fn apply(&mut self, update: TuningUpdate) -> bool {
        match update {
            TuningUpdate::Number { key, value } => {
                if !value.is_finite() {
                    warn!("Ignoring non-finite value {} for '{}'", value, key);
                    return false;
                }
                self.put_number(&key, value);
                true
            }
            TuningUpdate::Mode { mode } => {
                if self.chooser.select(mode) {
                    info!("Drive mode selected: {:?}", mode);
                    true
                } else {
                    warn!("Drive mode {:?} is not offered by the chooser", mode);
                    false
                }
            }
        }
    }
}

impl TuningSource for Dashboard {
    fn get_number(&self, key: &str, default: f64) -> f64 {
        self.numbers.get(key).copied().unwrap_or(default)
    }

    fn selected_mode(&self) -> DriveMode {
        self.chooser.get_selected()
    }
}

impl TelemetrySink for Dashboard {
    fn put_number(&mut self, key: &str, value: f64) {
        self.numbers.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_number_defaults() {
        let mut dash = Dashboard::new();
        assert_eq!(dash.get_number("Missing", 4.2), 4.2);
        dash.put_number("Present", 1.5);
        assert_eq!(dash.get_number("Present", 4.2), 1.5);
        dash.put_number("Present", -3.0);
        assert_eq!(dash.get_number("Present", 4.2), -3.0);
        assert_eq!(dash.numbers().len(), 1);
    }

    #[test]
    fn test_chooser_defaults_to_curvature() {
        let dash = Dashboard::new();
        assert_eq!(dash.selected_mode(), DriveMode::Curvature);
        let names: Vec<&str> = dash.chooser().option_names().collect();
        assert_eq!(names, vec!["Curvature", "Arcade", "Tank"]);
    }

    #[test]
    fn test_chooser_selection() {
        let mut chooser = ModeChooser::default();
        assert!(chooser.select_name("tank"));
        assert_eq!(chooser.get_selected(), DriveMode::Tank);
        assert!(!chooser.select_name("Swerve"));
        assert_eq!(chooser.get_selected(), DriveMode::Tank);

        let mut narrow = ModeChooser::new("Arcade", DriveMode::Arcade);
        assert!(!narrow.select(DriveMode::Tank));
        assert_eq!(narrow.get_selected(), DriveMode::Arcade);
    }

    #[test]
    fn test_snapshot_falls_back_to_active_values() {
        let mut dash = Dashboard::new();
        let gains = GainSet { throttle: 0.8, turn: 0.6 };
        let limits = LimitSet { throttle: 2.0, turn: 3.0 };

        let snap = dash.snapshot(gains, limits);
        assert_eq!(snap.gains, gains);
        assert_eq!(snap.limits, limits);
        assert_eq!(snap.mode, DriveMode::Curvature);

        dash.put_number(KEY_TURN_FILTER, 5.0);
        dash.put_number(KEY_THROTTLE_CONSTANT, 0.5);
        let snap = dash.snapshot(gains, limits);
        assert_eq!(snap.gains.throttle, 0.5);
        assert_eq!(snap.gains.turn, 0.6);
        assert_eq!(snap.limits.turn, 5.0);
        assert_eq!(snap.limits.throttle, 2.0);
    }

    #[test]
    fn test_published_tuning_round_trips_through_snapshot() {
        let mut dash = Dashboard::new();
        let gains = GainSet { throttle: 0.9, turn: 0.7 };
        let limits = LimitSet { throttle: 1.5, turn: 2.5 };
        dash.publish_tuning(gains, limits);
        assert_eq!(dash.numbers().len(), 4);

        let snap = dash.snapshot(GainSet::default(), LimitSet::default());
        assert_eq!(snap.gains, gains);
        assert_eq!(snap.limits, limits);
    }

    #[test]
    fn test_apply_updates() {
        let mut dash = Dashboard::new();
        assert!(dash.apply(TuningUpdate::Number {
            key: KEY_THROTTLE_FILTER.to_string(),
            value: 2.5,
        }));
        assert_eq!(dash.get_number(KEY_THROTTLE_FILTER, 0.0), 2.5);

        assert!(!dash.apply(TuningUpdate::Number {
            key: KEY_THROTTLE_FILTER.to_string(),
            value: f64::NAN,
        }));
        assert_eq!(dash.get_number(KEY_THROTTLE_FILTER, 0.0), 2.5);

        assert!(dash.apply(TuningUpdate::Mode { mode: DriveMode::Arcade }));
        assert_eq!(dash.selected_mode(), DriveMode::Arcade);
    }
}
