// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration management for calibration runs.
//!
//! Configuration is loaded from multiple sources with the following priority
//! (later sources override earlier ones):
//!
//! 1. Built-in defaults
//! 2. calibration.yaml file
//! 3. Environment variables (QUBITOS_*)
//! 4. CLI arguments

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::error::{Error, Result};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Calibration store settings
    #[serde(default)]
    pub calibration: CalibrationConfig,

    /// Experiment defaults
    #[serde(default)]
    pub experiment: ExperimentConfig,

    /// Built-in simulator settings
    #[serde(default)]
    pub simulator: SimulatorConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Validation settings
    #[serde(default)]
    pub validation: ValidationConfig,
}

impl Config {
    /// Load configuration from file and environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(path) = config_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                config = serde_yaml::from_str(&content)?;
            }
        } else {
            for path in &[
                "calibration.yaml",
                "calibration.yml",
                "/etc/qubitos/calibration.yaml",
            ] {
                let path = Path::new(path);
                if path.exists() {
                    let content = std::fs::read_to_string(path)?;
                    config = serde_yaml::from_str(&content)?;
                    break;
                }
            }
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("QUBITOS_CALIBRATION_FILE") {
            self.calibration.file = val;
        }
        if let Ok(val) = env::var("QUBITOS_CALIBRATION_GROUP") {
            self.experiment.group = val;
        }
        if let Ok(val) = env::var("QUBITOS_CALIBRATION_SHOTS") {
            if let Ok(shots) = val.parse() {
                self.experiment.shots = shots;
            }
        }
        if let Ok(val) = env::var("QUBITOS_AUTO_UPDATE") {
            self.experiment.auto_update = val.to_lowercase() == "true" || val == "1";
        }
        if let Ok(val) = env::var("QUBITOS_SIM_BETA_OPTIMAL") {
            if let Ok(beta) = val.parse() {
                self.simulator.beta_optimal = beta;
            }
        }
        if let Ok(val) = env::var("QUBITOS_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("QUBITOS_LOG_FORMAT") {
            self.logging.format = val;
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        let exp = &self.experiment;
        if exp.shots == 0 {
            return Err(Error::Config("shots must be greater than 0".into()));
        }
        if exp.shots > self.validation.limits.max_shots {
            return Err(Error::Config(format!(
                "shots {} exceeds limit {}",
                exp.shots, self.validation.limits.max_shots
            )));
        }
        if exp.reps.is_empty() || exp.reps.contains(&0) {
            return Err(Error::Config("reps must be non-empty and positive".into()));
        }
        // Pulse durations live in the store; one sample per pulse is the floor.
        crate::validation::validate_sequence_length(&exp.reps, 1, &self.validation.limits)
            .map_err(|e| Error::Config(format!("reps: {}", e)))?;
        if let Some(scan) = &exp.betas {
            if scan.num < 2 {
                return Err(Error::Config("beta scan needs at least 2 points".into()));
            }
            if scan.start >= scan.stop {
                return Err(Error::Config("beta scan start must be below stop".into()));
            }
        }
        if exp.group.is_empty() {
            return Err(Error::Config("group cannot be empty".into()));
        }
        if self.simulator.num_qubits > self.validation.limits.max_qubits {
            return Err(Error::Config(format!(
                "simulator num_qubits {} exceeds limit {}",
                self.simulator.num_qubits, self.validation.limits.max_qubits
            )));
        }
        if self.simulator.rabi_rate <= 0.0 || self.simulator.sample_period_ns <= 0.0 {
            return Err(Error::Config(
                "simulator rabi_rate and sample_period_ns must be positive".into(),
            ));
        }
        if self.logging.format != "json" && self.logging.format != "pretty" {
            tracing::warn!(
                format = %self.logging.format,
                "Unknown log format, falling back to pretty"
            );
        }
        Ok(())
    }
}

/// Calibration store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Calibration store file (YAML)
    #[serde(default = "default_calibration_file")]
    pub file: String,

    /// Write the store back after a successful update
    #[serde(default = "default_true")]
    pub auto_save: bool,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            file: default_calibration_file(),
            auto_save: true,
        }
    }
}

fn default_calibration_file() -> String {
    "./calibration/calibrations.yaml".into()
}

fn default_true() -> bool {
    true
}

/// Linear scan specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRange {
    pub start: f64,
    pub stop: f64,
    pub num: usize,
}

impl ScanRange {
    /// Evenly spaced values including both endpoints.
    pub fn values(&self) -> Vec<f64> {
        crate::experiment::linspace(self.start, self.stop, self.num)
    }
}

/// Rough DRAG experiment defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Schedule to calibrate
    #[serde(default = "default_schedule_name")]
    pub schedule_name: String,

    /// Parameter to update
    #[serde(default = "default_param_name")]
    pub cal_parameter_name: String,

    /// Calibration group
    #[serde(default = "default_group")]
    pub group: String,

    /// Shots per circuit
    #[serde(default = "default_shots")]
    pub shots: u32,

    /// Rp/Rm repetition counts
    #[serde(default = "default_reps")]
    pub reps: Vec<u32>,

    /// Beta scan (None uses the experiment default)
    #[serde(default)]
    pub betas: Option<ScanRange>,

    /// Analysis result index used by the updater
    #[serde(default = "default_result_index")]
    pub result_index: i64,

    /// Write the fitted value back to the store
    #[serde(default = "default_true")]
    pub auto_update: bool,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            schedule_name: default_schedule_name(),
            cal_parameter_name: default_param_name(),
            group: default_group(),
            shots: default_shots(),
            reps: default_reps(),
            betas: None,
            result_index: default_result_index(),
            auto_update: true,
        }
    }
}

fn default_schedule_name() -> String {
    "x".into()
}

fn default_param_name() -> String {
    "β".into()
}

fn default_group() -> String {
    "default".into()
}

fn default_shots() -> u32 {
    1024
}

fn default_reps() -> Vec<u32> {
    vec![1, 3, 5]
}

fn default_result_index() -> i64 {
    -1
}

/// Built-in DRAG simulator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Number of simulated qubits
    #[serde(default = "default_sim_qubits")]
    pub num_qubits: u32,

    /// Beta that exactly compensates the simulated distortion
    #[serde(default = "default_beta_optimal")]
    pub beta_optimal: f64,

    /// Rabi rate at unit amplitude, rad per sample
    #[serde(default = "default_rabi_rate")]
    pub rabi_rate: f64,

    /// AWG sample period in nanoseconds
    #[serde(default = "default_sample_period")]
    pub sample_period_ns: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            num_qubits: default_sim_qubits(),
            beta_optimal: default_beta_optimal(),
            rabi_rate: default_rabi_rate(),
            sample_period_ns: default_sample_period(),
        }
    }
}

fn default_sim_qubits() -> u32 {
    5
}

fn default_beta_optimal() -> f64 {
    -1.2
}

fn default_rabi_rate() -> f64 {
    0.5
}

fn default_sample_period() -> f64 {
    1.0
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

/// Validation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Resource limits
    #[serde(default)]
    pub limits: ResourceLimits,
}

/// Resource limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Maximum qubits
    #[serde(default = "default_max_qubits")]
    pub max_qubits: u32,

    /// Maximum shots
    #[serde(default = "default_max_shots")]
    pub max_shots: u32,

    /// Maximum pulse duration in nanoseconds
    #[serde(default = "default_max_pulse_duration")]
    pub max_pulse_duration_ns: u32,

    /// Maximum time steps
    #[serde(default = "default_max_time_steps")]
    pub max_time_steps: u32,

    /// Maximum circuits per experiment
    #[serde(default = "default_max_circuits")]
    pub max_circuits: u32,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_qubits: default_max_qubits(),
            max_shots: default_max_shots(),
            max_pulse_duration_ns: default_max_pulse_duration(),
            max_time_steps: default_max_time_steps(),
            max_circuits: default_max_circuits(),
        }
    }
}

fn default_max_qubits() -> u32 {
    6
}

fn default_max_shots() -> u32 {
    100_000
}

fn default_max_pulse_duration() -> u32 {
    100_000
}

fn default_max_time_steps() -> u32 {
    10_000
}

fn default_max_circuits() -> u32 {
    1_000
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.experiment.schedule_name, "x");
        assert_eq!(config.experiment.cal_parameter_name, "β");
        assert_eq!(config.experiment.group, "default");
        assert_eq!(config.experiment.result_index, -1);
        assert!(config.experiment.auto_update);
        assert_eq!(config.experiment.reps, vec![1, 3, 5]);
        assert!(config.experiment.betas.is_none());
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());

        let mut bad_config = Config::default();
        bad_config.experiment.shots = 0;
        assert!(bad_config.validate().is_err());
    }

    #[test]
    fn test_validate_shots_over_limit() {
        let mut config = Config::default();
        config.experiment.shots = config.validation.limits.max_shots + 1;
        let msg = config.validate().unwrap_err().to_string();
        assert!(msg.contains("exceeds limit"));
    }

    #[test]
    fn test_validate_reps() {
        let mut config = Config::default();
        config.experiment.reps = vec![];
        assert!(config.validate().is_err());

        config.experiment.reps = vec![1, 0];
        assert!(config.validate().is_err());

        config.experiment.reps = vec![1, u32::MAX];
        let msg = config.validate().unwrap_err().to_string();
        assert!(msg.contains("num_time_steps"));

        config.experiment.reps = vec![1, 5_000];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_num_qubits_within_limit() {
        let mut config = Config::default();
        config.simulator.num_qubits = config.validation.limits.max_qubits;
        assert!(config.validate().is_ok());

        config.simulator.num_qubits = config.validation.limits.max_qubits + 1;
        let msg = config.validate().unwrap_err().to_string();
        assert!(msg.contains("num_qubits"));
    }

    #[test]
    fn test_validate_scan_range() {
        let mut config = Config::default();
        config.experiment.betas = Some(ScanRange {
            start: 2.0,
            stop: -2.0,
            num: 11,
        });
        assert!(config.validate().is_err());

        config.experiment.betas = Some(ScanRange {
            start: -2.0,
            stop: 2.0,
            num: 1,
        });
        assert!(config.validate().is_err());

        config.experiment.betas = Some(ScanRange {
            start: -2.0,
            stop: 2.0,
            num: 41,
        });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_scan_range_values() {
        let scan = ScanRange {
            start: -1.0,
            stop: 1.0,
            num: 5,
        };
        assert_eq!(scan.values(), vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_config_load_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            r#"
calibration:
  file: "/tmp/cals.yaml"
experiment:
  group: "night"
  shots: 2048
  betas:
    start: -3.0
    stop: 3.0
    num: 31
simulator:
  beta_optimal: 0.7
"#
        )
        .unwrap();

        let config = Config::load(Some(f.path())).unwrap();
        assert_eq!(config.calibration.file, "/tmp/cals.yaml");
        assert_eq!(config.experiment.group, "night");
        assert_eq!(config.experiment.shots, 2048);
        assert_eq!(config.experiment.betas.as_ref().unwrap().num, 31);
        assert_eq!(config.simulator.beta_optimal, 0.7);
        // Untouched sections keep their defaults
        assert_eq!(config.experiment.schedule_name, "x");
    }

    #[test]
    fn test_config_load_nonexistent_file() {
        let path = std::path::Path::new("/tmp/does_not_exist_qubitos_cal_test.yaml");
        let config = Config::load(Some(path)).unwrap();
        assert_eq!(config.experiment.shots, 1024);
    }

    #[test]
    fn test_config_load_invalid_yaml() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "{{{{not: valid: yaml::::").unwrap();

        let result = Config::load(Some(f.path()));
        assert!(result.is_err());
    }

    #[test]
    fn test_env_override_group_and_shots() {
        let mut config = Config::default();
        std::env::set_var("QUBITOS_CALIBRATION_GROUP", "weekly");
        std::env::set_var("QUBITOS_CALIBRATION_SHOTS", "4096");
        config.apply_env_overrides();
        assert_eq!(config.experiment.group, "weekly");
        assert_eq!(config.experiment.shots, 4096);
        std::env::remove_var("QUBITOS_CALIBRATION_GROUP");
        std::env::remove_var("QUBITOS_CALIBRATION_SHOTS");
    }

    #[test]
    fn test_env_override_auto_update() {
        let mut config = Config::default();
        std::env::set_var("QUBITOS_AUTO_UPDATE", "false");
        config.apply_env_overrides();
        assert!(!config.experiment.auto_update);

        std::env::set_var("QUBITOS_AUTO_UPDATE", "1");
        config.apply_env_overrides();
        assert!(config.experiment.auto_update);
        std::env::remove_var("QUBITOS_AUTO_UPDATE");
    }

    #[test]
    fn test_resource_limits_defaults() {
        let limits = ResourceLimits::default();
        assert_eq!(limits.max_qubits, 6);
        assert_eq!(limits.max_shots, 100_000);
        assert_eq!(limits.max_pulse_duration_ns, 100_000);
        assert_eq!(limits.max_time_steps, 10_000);
        assert_eq!(limits.max_circuits, 1_000);
    }
}
