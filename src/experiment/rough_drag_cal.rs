// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Rough DRAG calibration.
//!
//! Binds the DRAG coefficient of a stored schedule to a free parameter,
//! scans it with [`RoughDrag`], and writes the fitted β back to the
//! calibration store.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::analysis::DragCalAnalysis;
use super::calibration::{CalibrationContext, CalibrationExperiment, ExperimentOptions};
use super::circuit::{CalibrationMetadata, Circuit};
use super::data::{AnalysisResult, ExperimentData};
use super::rough_drag::RoughDrag;
use crate::backend::QuantumBackend;
use crate::calibration::{Calibrations, Parameter, Updater};
use crate::config::ResourceLimits;
use crate::error::Result;

/// Builder for [`RoughDragCal`].
pub struct RoughDragCalBuilder {
    qubit: u32,
    calibrations: Arc<Calibrations>,
    backend: Option<Arc<dyn QuantumBackend>>,
    schedule_name: String,
    cal_parameter_name: String,
    betas: Option<Vec<f64>>,
    reps: Option<Vec<u32>>,
    options: ExperimentOptions,
}

impl RoughDragCalBuilder {
    pub fn backend(mut self, backend: Arc<dyn QuantumBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Schedule whose β is calibrated. Defaults to `"x"`.
    pub fn schedule_name(mut self, name: impl Into<String>) -> Self {
        self.schedule_name = name.into();
        self
    }

    /// Name of the calibrated parameter. Defaults to `"β"`.
    pub fn cal_parameter_name(mut self, name: impl Into<String>) -> Self {
        self.cal_parameter_name = name.into();
        self
    }

    /// β scan values. Defaults to 51 points over [-5, 5].
    pub fn betas(mut self, betas: Vec<f64>) -> Self {
        self.betas = Some(betas);
        self
    }

    /// Repetition counts. Defaults to `[1, 3, 5]`.
    pub fn reps(mut self, reps: Vec<u32>) -> Self {
        self.reps = Some(reps);
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.options.group = group.into();
        self
    }

    pub fn auto_update(mut self, auto_update: bool) -> Self {
        self.options.auto_update = auto_update;
        self
    }

    pub fn result_index(mut self, index: i64) -> Self {
        self.options.result_index = index;
        self
    }

    pub fn options(mut self, options: ExperimentOptions) -> Self {
        self.options = options;
        self
    }

    /// Resolve the schedule from the store and build the experiment.
    ///
    /// Fails if the schedule is not registered for the qubit, if any of its
    /// other parameters has no value in the group, or if the calibrated
    /// parameter does not end up as the schedule's only free parameter.
    pub fn build(self) -> Result<RoughDragCal> {
        let param = Parameter::new(self.cal_parameter_name.clone());
        let assign = HashMap::from([(self.cal_parameter_name.clone(), param)]);

        let schedule = self.calibrations.get_schedule(
            &self.schedule_name,
            self.qubit,
            &assign,
            &self.options.group,
        )?;

        let mut experiment = RoughDrag::new(self.qubit, schedule)?;
        if let Some(betas) = self.betas {
            experiment = experiment.with_betas(betas)?;
        }
        if let Some(reps) = self.reps {
            experiment = experiment.with_reps(reps)?;
        }
        if let Some(backend) = &self.backend {
            experiment.check_limits(backend.resource_limits())?;
        }

        debug!(
            qubit = self.qubit,
            schedule = %self.schedule_name,
            parameter = %self.cal_parameter_name,
            group = %self.options.group,
            "Built rough DRAG calibration"
        );

        Ok(RoughDragCal {
            context: CalibrationContext::new(
                self.calibrations,
                self.qubit,
                self.cal_parameter_name,
                self.schedule_name,
                self.options,
            ),
            analysis: experiment.analysis(),
            experiment,
            backend: self.backend,
        })
    }
}

/// Rough DRAG calibration of one qubit's schedule.
pub struct RoughDragCal {
    context: CalibrationContext,
    experiment: RoughDrag,
    analysis: DragCalAnalysis,
    backend: Option<Arc<dyn QuantumBackend>>,
}

impl RoughDragCal {
    pub fn builder(qubit: u32, calibrations: Arc<Calibrations>) -> RoughDragCalBuilder {
        RoughDragCalBuilder {
            qubit,
            calibrations,
            backend: None,
            schedule_name: "x".to_string(),
            cal_parameter_name: "β".to_string(),
            betas: None,
            reps: None,
            options: ExperimentOptions::default(),
        }
    }

    pub fn experiment(&self) -> &RoughDrag {
        &self.experiment
    }

    pub fn set_backend(&mut self, backend: Arc<dyn QuantumBackend>) {
        self.backend = Some(backend);
    }

    pub fn set_auto_update(&mut self, auto_update: bool) {
        self.context.options_mut().auto_update = auto_update;
    }
}

impl CalibrationExperiment for RoughDragCal {
    fn experiment_type(&self) -> &str {
        RoughDrag::EXPERIMENT_TYPE
    }

    fn context(&self) -> &CalibrationContext {
        &self.context
    }

    fn backend(&self) -> Option<&Arc<dyn QuantumBackend>> {
        self.backend.as_ref()
    }

    fn check_limits(&self, limits: &ResourceLimits) -> Result<()> {
        self.experiment.check_limits(limits)
    }

    fn circuits(&self) -> Result<Vec<Circuit>> {
        self.experiment.circuits()
    }

    /// Record the stored β as it is before the run on every circuit.
    fn add_cal_metadata(&self, circuits: &mut [Circuit]) -> Result<()> {
        let ctx = &self.context;
        let group = &ctx.options().group;
        let value = ctx.calibrations().get_parameter_value(
            ctx.param_name(),
            ctx.qubit(),
            ctx.schedule_name(),
            group,
        )?;

        let metadata = CalibrationMetadata {
            cal_param_value: value,
            cal_param_name: ctx.param_name().to_string(),
            cal_schedule: ctx.schedule_name().to_string(),
            cal_group: group.clone(),
        };
        for circuit in circuits.iter_mut() {
            circuit.metadata.calibration = Some(metadata.clone());
        }
        Ok(())
    }

    fn analyze(&self, data: &ExperimentData) -> Result<Vec<AnalysisResult>> {
        self.analysis.run(data)
    }

    /// Store the fitted β for the qubit, schedule and group.
    fn update_calibrations(&self, data: &ExperimentData) -> Result<()> {
        let ctx = &self.context;
        let value = Updater::get_value(
            data,
            DragCalAnalysis::RESULT_NAME,
            ctx.options().result_index,
        )?;

        Updater::add_parameter_value(
            ctx.calibrations(),
            data,
            value,
            ctx.param_name(),
            ctx.qubit(),
            ctx.schedule_name(),
            &ctx.options().group,
        )
    }
}
