// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Writes analysis results back into the calibration store.

use tracing::info;

use super::store::{Calibrations, ParameterValue};
use crate::error::{ExperimentError, Result};
use crate::experiment::ExperimentData;

/// Stateless helpers shared by calibration experiments.
pub struct Updater;

impl Updater {
    /// Value of the analysis result `name` at `index`.
    ///
    /// Negative indices count from the end, so `-1` is the latest result.
    pub fn get_value(data: &ExperimentData, name: &str, index: i64) -> Result<f64> {
        let candidates = data.analysis_results_named(name);
        let len = candidates.len() as i64;
        let resolved = if index < 0 { len + index } else { index };

        if resolved < 0 || resolved >= len {
            return Err(ExperimentError::ResultNotFound {
                name: name.to_string(),
                index,
            }
            .into());
        }
        Ok(candidates[resolved as usize].value)
    }

    /// Store `value` as a new valid value tagged with the experiment id.
    pub fn add_parameter_value(
        cals: &Calibrations,
        data: &ExperimentData,
        value: f64,
        parameter: &str,
        qubit: u32,
        schedule: &str,
        group: &str,
    ) -> Result<()> {
        let entry = ParameterValue::new(value, group).with_exp_id(data.experiment_id.to_string());
        cals.add_parameter_value(entry, parameter, qubit, schedule)?;

        info!(
            parameter,
            qubit,
            schedule,
            group,
            value,
            experiment_id = %data.experiment_id,
            "Updated calibration"
        );
        Ok(())
    }
}
