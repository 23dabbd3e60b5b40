// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Calibration store.
//!
//! The store maps (parameter, qubits, schedule) to a history of timestamped
//! values, each tagged with a calibration group. It also keeps the DRAG
//! schedule templates that reference those parameters.
//!
//! Value lookup searches keys from most to least specific:
//!
//! ```text
//! (qubit, schedule) → (default qubits, schedule) → (qubit, *) → (default qubits, *)
//! ```
//!
//! and within the first key that has candidates returns the newest valid
//! value of the requested group.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::parameter::{Operand, ParamExpr, Parameter};
use super::schedule::{Schedule, ScheduleTemplate};
use crate::error::{CalibrationError, Result};

/// Key of a parameter table row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParameterKey {
    pub parameter: String,
    /// `None` for a value shared by every qubit.
    #[serde(default)]
    pub qubits: Option<Vec<u32>>,
    /// `None` for a value shared by every schedule.
    #[serde(default)]
    pub schedule: Option<String>,
}

impl ParameterKey {
    pub fn new(parameter: &str, qubits: Option<Vec<u32>>, schedule: Option<&str>) -> Self {
        Self {
            parameter: parameter.to_string(),
            qubits,
            schedule: schedule.map(str::to_string),
        }
    }
}

/// A single calibrated value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterValue {
    pub value: f64,
    pub date_time: DateTime<Utc>,
    #[serde(default = "default_valid")]
    pub valid: bool,
    /// Id of the experiment that produced the value.
    #[serde(default)]
    pub exp_id: Option<String>,
    pub group: String,
}

fn default_valid() -> bool {
    true
}

impl ParameterValue {
    /// A valid value timestamped now.
    pub fn new(value: f64, group: impl Into<String>) -> Self {
        Self {
            value,
            date_time: Utc::now(),
            valid: true,
            exp_id: None,
            group: group.into(),
        }
    }

    pub fn with_exp_id(mut self, exp_id: impl Into<String>) -> Self {
        self.exp_id = Some(exp_id.into());
        self
    }

    pub fn with_date_time(mut self, date_time: DateTime<Utc>) -> Self {
        self.date_time = date_time;
        self
    }
}

/// Serializable parameter table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterEntry {
    pub parameter: String,
    #[serde(default)]
    pub qubits: Option<Vec<u32>>,
    #[serde(default)]
    pub schedule: Option<String>,
    pub values: Vec<ParameterValue>,
}

/// Serializable form of the whole store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSnapshot {
    #[serde(default)]
    pub schedules: Vec<ScheduleTemplate>,
    #[serde(default)]
    pub parameters: Vec<ParameterEntry>,
}

#[derive(Default)]
struct StoreInner {
    /// (schedule name, qubits) → template
    schedules: HashMap<(String, Option<Vec<u32>>), ScheduleTemplate>,
    parameters: BTreeMap<ParameterKey, Vec<ParameterValue>>,
}

/// Thread-safe calibration store, shared as `Arc<Calibrations>`.
///
/// # Example
///
/// ```ignore
/// use qubit_os_calibration::calibration::{Calibrations, ParameterValue};
///
/// let cals = Calibrations::load("calibrations.yaml".as_ref())?;
/// let beta = cals.get_parameter_value("β", 0, "x", "default")?;
/// cals.add_parameter_value(ParameterValue::new(beta + 0.1, "default"), "β", 0, "x")?;
/// ```
#[derive(Default)]
pub struct Calibrations {
    inner: RwLock<StoreInner>,
}

impl Calibrations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a schedule template.
    pub fn add_schedule(&self, template: ScheduleTemplate) -> Result<()> {
        template.validate()?;
        debug!(schedule = %template.name, qubits = ?template.qubits, "Registering schedule");

        let key = (template.name.clone(), template.qubits.clone());
        self.inner.write().schedules.insert(key, template);
        Ok(())
    }

    /// Template for the qubit, falling back to the default template.
    pub fn get_template(
        &self,
        name: &str,
        qubit: u32,
    ) -> std::result::Result<ScheduleTemplate, CalibrationError> {
        let inner = self.inner.read();
        inner
            .schedules
            .get(&(name.to_string(), Some(vec![qubit])))
            .or_else(|| inner.schedules.get(&(name.to_string(), None)))
            .cloned()
            .ok_or_else(|| CalibrationError::ScheduleNotFound {
                schedule: name.to_string(),
                qubit,
            })
    }

    /// Resolve a schedule for a qubit.
    ///
    /// Operands naming a parameter in `assign_params` become the supplied
    /// symbol; all other parameter operands are looked up in `group`.
    pub fn get_schedule(
        &self,
        name: &str,
        qubit: u32,
        assign_params: &HashMap<String, Parameter>,
        group: &str,
    ) -> std::result::Result<Schedule, CalibrationError> {
        let template = self.get_template(name, qubit)?;

        let resolve = |expr: &ParamExpr| -> std::result::Result<Operand, CalibrationError> {
            match expr {
                ParamExpr::Value(v) => Ok(Operand::Value(*v)),
                ParamExpr::Parameter(p) => match assign_params.get(p) {
                    Some(symbol) => Ok(Operand::Symbol(symbol.clone())),
                    None => Ok(Operand::Value(
                        self.get_parameter_value(p, qubit, name, group)?,
                    )),
                },
            }
        };

        let schedule = Schedule {
            name: template.name.clone(),
            qubit,
            channel: format!("{}{}", template.channel, qubit),
            duration: template.pulse.duration,
            amp: resolve(&template.pulse.amp)?,
            sigma: resolve(&template.pulse.sigma)?,
            beta: resolve(&template.pulse.beta)?,
        };

        debug!(
            schedule = %name,
            qubit,
            group,
            free = schedule.parameters().len(),
            "Resolved schedule"
        );
        Ok(schedule)
    }

    /// Newest valid value of `parameter` for the qubit, schedule and group.
    pub fn get_parameter_value(
        &self,
        parameter: &str,
        qubit: u32,
        schedule: &str,
        group: &str,
    ) -> std::result::Result<f64, CalibrationError> {
        self.get_parameter_value_at(parameter, qubit, schedule, group, None)
    }

    /// As [`Self::get_parameter_value`], ignoring values newer than `cutoff`.
    pub fn get_parameter_value_at(
        &self,
        parameter: &str,
        qubit: u32,
        schedule: &str,
        group: &str,
        cutoff: Option<DateTime<Utc>>,
    ) -> std::result::Result<f64, CalibrationError> {
        let inner = self.inner.read();
        let candidates = [
            ParameterKey::new(parameter, Some(vec![qubit]), Some(schedule)),
            ParameterKey::new(parameter, None, Some(schedule)),
            ParameterKey::new(parameter, Some(vec![qubit]), None),
            ParameterKey::new(parameter, None, None),
        ];

        let not_found = || CalibrationError::ParameterNotFound {
            parameter: parameter.to_string(),
            qubit,
            schedule: schedule.to_string(),
            group: group.to_string(),
        };

        let values = candidates
            .iter()
            .find_map(|key| inner.parameters.get(key).filter(|v| !v.is_empty()))
            .ok_or_else(not_found)?;

        values
            .iter()
            .filter(|v| v.valid && v.group == group)
            .filter(|v| cutoff.map_or(true, |c| v.date_time <= c))
            // max_by keeps the last maximum, so same-timestamp writes resolve to the latest
            .max_by(|a, b| a.date_time.cmp(&b.date_time))
            .map(|v| v.value)
            .ok_or_else(not_found)
    }

    /// Append a value for (parameter, qubit, schedule).
    pub fn add_parameter_value(
        &self,
        value: ParameterValue,
        parameter: &str,
        qubit: u32,
        schedule: &str,
    ) -> std::result::Result<(), CalibrationError> {
        self.add_parameter_value_for(
            ParameterKey::new(parameter, Some(vec![qubit]), Some(schedule)),
            value,
        )
    }

    /// Append a value under an arbitrary key (qubit- or schedule-agnostic).
    pub fn add_parameter_value_for(
        &self,
        key: ParameterKey,
        value: ParameterValue,
    ) -> std::result::Result<(), CalibrationError> {
        validate_group(&value.group)?;
        if !value.value.is_finite() {
            return Err(CalibrationError::InvalidValue {
                parameter: key.parameter.clone(),
                value: value.value,
            });
        }

        let mut inner = self.inner.write();
        let declared = inner.schedules.values().any(|t| {
            key.schedule.as_deref().map_or(true, |s| t.name == s) && t.declares(&key.parameter)
        });
        if !declared {
            return Err(CalibrationError::UnknownParameter {
                parameter: key.parameter.clone(),
                schedule: key.schedule.clone().unwrap_or_else(|| "*".into()),
            });
        }

        info!(
            parameter = %key.parameter,
            qubits = ?key.qubits,
            schedule = ?key.schedule,
            group = %value.group,
            value = value.value,
            exp_id = ?value.exp_id,
            "Adding parameter value"
        );
        inner.parameters.entry(key).or_default().push(value);
        Ok(())
    }

    /// All stored values for the exact key, oldest first.
    pub fn parameter_history(
        &self,
        parameter: &str,
        qubit: u32,
        schedule: &str,
    ) -> Vec<ParameterValue> {
        let key = ParameterKey::new(parameter, Some(vec![qubit]), Some(schedule));
        let mut values = self
            .inner
            .read()
            .parameters
            .get(&key)
            .cloned()
            .unwrap_or_default();
        values.sort_by(|a, b| a.date_time.cmp(&b.date_time));
        values
    }

    /// Newest value per key, optionally restricted to a group.
    pub fn parameters_table(&self, group: Option<&str>) -> Vec<(ParameterKey, ParameterValue)> {
        self.inner
            .read()
            .parameters
            .iter()
            .filter_map(|(key, values)| {
                values
                    .iter()
                    .filter(|v| group.map_or(true, |g| v.group == g))
                    .max_by(|a, b| a.date_time.cmp(&b.date_time))
                    .map(|v| (key.clone(), v.clone()))
            })
            .collect()
    }

    /// Number of registered schedule templates.
    pub fn num_schedules(&self) -> usize {
        self.inner.read().schedules.len()
    }

    /// Serializable copy of the store, ordered deterministically.
    pub fn to_snapshot(&self) -> CalibrationSnapshot {
        let inner = self.inner.read();
        let mut schedules: Vec<ScheduleTemplate> = inner.schedules.values().cloned().collect();
        schedules.sort_by(|a, b| (&a.name, &a.qubits).cmp(&(&b.name, &b.qubits)));

        let parameters = inner
            .parameters
            .iter()
            .map(|(key, values)| ParameterEntry {
                parameter: key.parameter.clone(),
                qubits: key.qubits.clone(),
                schedule: key.schedule.clone(),
                values: values.clone(),
            })
            .collect();

        CalibrationSnapshot {
            schedules,
            parameters,
        }
    }

    /// Build a store from its serializable form.
    ///
    /// Schedules are registered first so that every stored value is checked
    /// against the templates that declare it.
    pub fn from_snapshot(snapshot: CalibrationSnapshot) -> Result<Self> {
        let cals = Self::new();
        for template in snapshot.schedules {
            cals.add_schedule(template)?;
        }
        for entry in snapshot.parameters {
            let key = ParameterKey {
                parameter: entry.parameter,
                qubits: entry.qubits,
                schedule: entry.schedule,
            };
            for value in entry.values {
                cals.add_parameter_value_for(key.clone(), value)?;
            }
        }
        Ok(cals)
    }

    /// Load a store from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let snapshot: CalibrationSnapshot = serde_yaml::from_str(&content)?;
        let cals = Self::from_snapshot(snapshot)?;
        info!(path = %path.display(), schedules = cals.num_schedules(), "Loaded calibrations");
        Ok(cals)
    }

    /// Write the store to a YAML file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_yaml::to_string(&self.to_snapshot())?;
        std::fs::write(path, content)?;
        info!(path = %path.display(), "Saved calibrations");
        Ok(())
    }
}

/// Group names are non-empty and limited to `[A-Za-z0-9_-]`.
fn validate_group(group: &str) -> std::result::Result<(), CalibrationError> {
    let ok = !group.is_empty()
        && group
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(CalibrationError::InvalidGroup(group.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::schedule::DragTemplate;
    use crate::error::Error;
    use chrono::Duration;

    fn x_template() -> ScheduleTemplate {
        ScheduleTemplate::new(
            "x",
            DragTemplate {
                duration: 64,
                sigma: 16.0.into(),
                amp: "amp".into(),
                beta: "β".into(),
            },
        )
    }

    fn store() -> Calibrations {
        let cals = Calibrations::new();
        cals.add_schedule(x_template()).unwrap();
        cals.add_parameter_value_for(
            ParameterKey::new("amp", None, Some("x")),
            ParameterValue::new(0.3, "default"),
        )
        .unwrap();
        cals.add_parameter_value(ParameterValue::new(0.1, "default"), "β", 0, "x")
            .unwrap();
        cals
    }

    #[test]
    fn test_get_parameter_value_exact_key() {
        let cals = store();
        assert_eq!(cals.get_parameter_value("β", 0, "x", "default").unwrap(), 0.1);
    }

    #[test]
    fn test_get_parameter_value_falls_back_to_default_qubits() {
        let cals = store();
        assert_eq!(cals.get_parameter_value("amp", 4, "x", "default").unwrap(), 0.3);
    }

    #[test]
    fn test_get_parameter_value_schedule_agnostic_keys() {
        let cals = store();
        cals.add_parameter_value_for(
            ParameterKey::new("β", Some(vec![1]), None),
            ParameterValue::new(0.7, "default"),
        )
        .unwrap();
        cals.add_parameter_value_for(
            ParameterKey::new("β", None, None),
            ParameterValue::new(-0.4, "default"),
        )
        .unwrap();

        // Schedule-specific value for qubit 0 still wins.
        assert_eq!(cals.get_parameter_value("β", 0, "x", "default").unwrap(), 0.1);
        assert_eq!(cals.get_parameter_value("β", 1, "x", "default").unwrap(), 0.7);
        assert_eq!(cals.get_parameter_value("β", 2, "x", "default").unwrap(), -0.4);

        let schedule = cals.get_schedule("x", 1, &HashMap::new(), "default").unwrap();
        assert_eq!(schedule.to_pulse().unwrap().beta, 0.7);
    }

    #[test]
    fn test_get_parameter_value_missing() {
        let cals = store();
        let err = cals.get_parameter_value("β", 1, "x", "default").unwrap_err();
        assert!(matches!(err, CalibrationError::ParameterNotFound { qubit: 1, .. }));
    }

    #[test]
    fn test_get_parameter_value_filters_group_and_validity() {
        let cals = store();
        assert!(cals.get_parameter_value("β", 0, "x", "other").is_err());

        let mut invalid = ParameterValue::new(9.0, "default");
        invalid.valid = false;
        cals.add_parameter_value(invalid, "β", 0, "x").unwrap();
        assert_eq!(cals.get_parameter_value("β", 0, "x", "default").unwrap(), 0.1);
    }

    #[test]
    fn test_newest_value_wins_and_cutoff() {
        let cals = store();
        let t0 = Utc::now() - Duration::hours(2);
        let cals2 = Calibrations::new();
        cals2.add_schedule(x_template()).unwrap();
        cals2
            .add_parameter_value(
                ParameterValue::new(0.5, "default").with_date_time(t0),
                "β",
                0,
                "x",
            )
            .unwrap();
        cals2
            .add_parameter_value(
                ParameterValue::new(0.7, "default").with_date_time(t0 + Duration::hours(1)),
                "β",
                0,
                "x",
            )
            .unwrap();
        assert_eq!(cals2.get_parameter_value("β", 0, "x", "default").unwrap(), 0.7);
        assert_eq!(
            cals2
                .get_parameter_value_at("β", 0, "x", "default", Some(t0 + Duration::minutes(30)))
                .unwrap(),
            0.5
        );

        cals.add_parameter_value(ParameterValue::new(0.2, "default"), "β", 0, "x")
            .unwrap();
        assert_eq!(cals.get_parameter_value("β", 0, "x", "default").unwrap(), 0.2);
        assert_eq!(cals.parameter_history("β", 0, "x").len(), 2);
    }

    #[test]
    fn test_add_rejects_invalid_group() {
        let cals = store();
        for group in ["", "two words", "naïve"] {
            let err = cals
                .add_parameter_value(ParameterValue::new(0.2, group), "β", 0, "x")
                .unwrap_err();
            assert!(matches!(err, CalibrationError::InvalidGroup(_)));
        }
    }

    #[test]
    fn test_add_rejects_unknown_parameter_and_nan() {
        let cals = store();
        let err = cals
            .add_parameter_value(ParameterValue::new(0.2, "default"), "sigma", 0, "x")
            .unwrap_err();
        assert!(matches!(err, CalibrationError::UnknownParameter { .. }));

        let err = cals
            .add_parameter_value(ParameterValue::new(0.2, "default"), "β", 0, "sx")
            .unwrap_err();
        assert!(matches!(err, CalibrationError::UnknownParameter { .. }));

        let err = cals
            .add_parameter_value(ParameterValue::new(f64::NAN, "default"), "β", 0, "x")
            .unwrap_err();
        assert!(matches!(err, CalibrationError::InvalidValue { .. }));
    }

    #[test]
    fn test_get_schedule_keeps_assigned_symbol() {
        let cals = store();
        let beta = Parameter::new("β");
        let mut assign = HashMap::new();
        assign.insert("β".to_string(), beta.clone());

        let schedule = cals.get_schedule("x", 0, &assign, "default").unwrap();
        assert_eq!(schedule.channel, "d0");
        assert_eq!(schedule.amp, Operand::Value(0.3));
        assert_eq!(schedule.sigma, Operand::Value(16.0));
        assert_eq!(schedule.beta, Operand::Symbol(beta));
    }

    #[test]
    fn test_get_schedule_resolves_all_values() {
        let cals = store();
        let schedule = cals.get_schedule("x", 0, &HashMap::new(), "default").unwrap();
        let pulse = schedule.to_pulse().unwrap();
        assert_eq!(pulse.beta, 0.1);
        assert_eq!(pulse.amp, 0.3);
    }

    #[test]
    fn test_get_schedule_not_found() {
        let cals = store();
        let err = cals
            .get_schedule("sx", 0, &HashMap::new(), "default")
            .unwrap_err();
        assert_eq!(
            err,
            CalibrationError::ScheduleNotFound {
                schedule: "sx".into(),
                qubit: 0
            }
        );
    }

    #[test]
    fn test_qubit_specific_template_takes_precedence() {
        let cals = store();
        let mut special = x_template().for_qubits(vec![2]);
        special.pulse.duration = 96;
        cals.add_schedule(special).unwrap();

        assert_eq!(cals.get_template("x", 2).unwrap().pulse.duration, 96);
        assert_eq!(cals.get_template("x", 0).unwrap().pulse.duration, 64);
    }

    #[test]
    fn test_parameters_table_latest_per_key() {
        let cals = store();
        cals.add_parameter_value(ParameterValue::new(0.4, "night"), "β", 0, "x")
            .unwrap();
        assert_eq!(cals.parameters_table(None).len(), 2);
        let night = cals.parameters_table(Some("night"));
        assert_eq!(night.len(), 1);
        assert_eq!(night[0].1.value, 0.4);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let cals = store();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cals.yaml");
        cals.save(&path).unwrap();

        let loaded = Calibrations::load(&path).unwrap();
        assert_eq!(loaded.to_snapshot(), cals.to_snapshot());
        assert_eq!(loaded.get_parameter_value("β", 0, "x", "default").unwrap(), 0.1);
    }

    #[test]
    fn test_from_snapshot_rejects_undeclared_parameter() {
        let snapshot = CalibrationSnapshot {
            schedules: vec![x_template()],
            parameters: vec![ParameterEntry {
                parameter: "duration".into(),
                qubits: None,
                schedule: Some("x".into()),
                values: vec![ParameterValue::new(1.0, "default")],
            }],
        };
        let err = Calibrations::from_snapshot(snapshot).err().unwrap();
        assert!(matches!(
            err,
            Error::Calibration(CalibrationError::UnknownParameter { .. })
        ));
    }
}
