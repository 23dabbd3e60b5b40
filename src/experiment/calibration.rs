// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Shared machinery of calibration experiments.
//!
//! A calibration experiment is composed of a [`CalibrationContext`] (the
//! store, the calibrated parameter and schedule, and the options) and the
//! experiment it drives. The [`CalibrationExperiment`] trait glues them and
//! provides the run loop.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::circuit::Circuit;
use super::data::{AnalysisResult, CircuitResult, ExperimentData, FitQuality};
use crate::backend::{compile_circuit, QuantumBackend, ResultQuality};
use crate::calibration::Calibrations;
use crate::config::ResourceLimits;
use crate::error::{ExperimentError, Result};
use crate::validation;

fn default_group() -> String {
    "default".to_string()
}

fn default_result_index() -> i64 {
    -1
}

fn default_auto_update() -> bool {
    true
}

/// Options common to calibration experiments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentOptions {
    /// Calibration group read from and written to.
    #[serde(default = "default_group")]
    pub group: String,

    /// Which analysis result to use when several share a name. Negative
    /// values count from the end.
    #[serde(default = "default_result_index")]
    pub result_index: i64,

    /// Write the fitted value back to the store after analysis.
    #[serde(default = "default_auto_update")]
    pub auto_update: bool,
}

impl Default for ExperimentOptions {
    fn default() -> Self {
        Self {
            group: default_group(),
            result_index: default_result_index(),
            auto_update: default_auto_update(),
        }
    }
}

/// State shared by a calibration experiment and the store it updates.
#[derive(Clone)]
pub struct CalibrationContext {
    calibrations: Arc<Calibrations>,
    qubit: u32,
    param_name: String,
    schedule_name: String,
    options: ExperimentOptions,
}

impl CalibrationContext {
    pub fn new(
        calibrations: Arc<Calibrations>,
        qubit: u32,
        param_name: impl Into<String>,
        schedule_name: impl Into<String>,
        options: ExperimentOptions,
    ) -> Self {
        Self {
            calibrations,
            qubit,
            param_name: param_name.into(),
            schedule_name: schedule_name.into(),
            options,
        }
    }

    pub fn calibrations(&self) -> &Arc<Calibrations> {
        &self.calibrations
    }

    pub fn qubit(&self) -> u32 {
        self.qubit
    }

    pub fn param_name(&self) -> &str {
        &self.param_name
    }

    pub fn schedule_name(&self) -> &str {
        &self.schedule_name
    }

    pub fn options(&self) -> &ExperimentOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut ExperimentOptions {
        &mut self.options
    }
}

/// A calibration experiment: builds circuits, annotates them with the
/// store state, analyses the results and updates the store.
#[async_trait]
pub trait CalibrationExperiment: Send + Sync {
    /// Experiment type recorded in the produced data.
    fn experiment_type(&self) -> &str;

    fn context(&self) -> &CalibrationContext;

    /// Backend the experiment runs on, if one was set.
    fn backend(&self) -> Option<&Arc<dyn QuantumBackend>>;

    /// Circuits before calibration metadata is attached.
    fn circuits(&self) -> Result<Vec<Circuit>>;

    /// Attach calibration metadata to every circuit.
    fn add_cal_metadata(&self, circuits: &mut [Circuit]) -> Result<()>;

    fn analyze(&self, data: &ExperimentData) -> Result<Vec<AnalysisResult>>;

    /// Write the analysed value back to the store.
    fn update_calibrations(&self, data: &ExperimentData) -> Result<()>;

    /// Reject experiments that cannot fit the backend limits. Runs before
    /// any circuit is built.
    fn check_limits(&self, _limits: &ResourceLimits) -> Result<()> {
        Ok(())
    }

    /// Circuits with calibration metadata attached.
    fn transpiled_circuits(&self) -> Result<Vec<Circuit>> {
        let mut circuits = self.circuits()?;
        self.add_cal_metadata(&mut circuits)?;
        Ok(circuits)
    }

    /// Execute on the backend, analyse, and update the store when
    /// `auto_update` is set.
    async fn run(&self, shots: u32) -> Result<ExperimentData> {
        let backend = self.backend().ok_or(ExperimentError::NoBackend)?.clone();
        let ctx = self.context();

        self.check_limits(backend.resource_limits())?;
        let circuits = self.transpiled_circuits()?;
        validation::validate_circuit_count(circuits.len(), backend.resource_limits())?;

        let info = backend.get_hardware_info().await?;
        info!(
            experiment = self.experiment_type(),
            qubit = ctx.qubit(),
            backend = backend.name(),
            circuits = circuits.len(),
            shots,
            "Running calibration experiment"
        );

        let mut data = ExperimentData::new(self.experiment_type(), ctx.qubit());
        for circuit in circuits {
            let request = compile_circuit(&circuit, shots, info.sample_period_ns)?;
            let result = backend.execute_pulse(request).await?;
            if result.quality != ResultQuality::FullSuccess {
                warn!(
                    circuit = %circuit.name,
                    quality = ?result.quality,
                    successful_shots = result.successful_shots,
                    "Degraded circuit result"
                );
            }
            data.circuit_results.push(CircuitResult {
                metadata: circuit.metadata,
                counts: result.bitstring_counts,
                shots: result.successful_shots,
            });
        }

        for result in self.analyze(&data)? {
            if result.quality == FitQuality::Bad {
                warn!(name = %result.name, value = result.value, "Analysis result of bad quality");
            }
            data.add_analysis_result(result);
        }

        if ctx.options().auto_update {
            self.update_calibrations(&data)?;
        }

        info!(
            experiment_id = %data.experiment_id,
            results = data.analysis_results.len(),
            "Calibration experiment complete"
        );
        Ok(data)
    }
}
