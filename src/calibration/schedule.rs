// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! DRAG schedule templates and resolved schedules.
//!
//! A [`ScheduleTemplate`] is what the calibration store keeps: a DRAG pulse
//! whose operands are literals or names of calibration parameters. Resolving
//! a template against the store yields a [`Schedule`], whose operands are
//! either bound values or free [`Parameter`] symbols. Once every operand is
//! bound the schedule lowers to a concrete [`DragPulse`].
//!
//! # References
//!
//! - Motzoi et al. (2009), "Simple pulses for elimination of leakage in
//!   weakly nonlinear qubits", PRL 103, 110501.

use serde::{Deserialize, Serialize};

use super::parameter::{Operand, ParamExpr, Parameter};
use crate::error::{CalibrationError, Result, ValidationError};

/// DRAG pulse template with symbolic operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragTemplate {
    /// Duration in samples.
    pub duration: u32,
    pub sigma: ParamExpr,
    pub amp: ParamExpr,
    pub beta: ParamExpr,
}

/// Schedule template registered in the calibration store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleTemplate {
    pub name: String,

    /// Qubits this template is specific to; `None` is the default template.
    #[serde(default)]
    pub qubits: Option<Vec<u32>>,

    /// Drive channel prefix; the qubit index is appended (`d` → `d0`).
    #[serde(default = "default_channel")]
    pub channel: String,

    pub pulse: DragTemplate,
}

fn default_channel() -> String {
    "d".into()
}

impl ScheduleTemplate {
    /// Default (qubit-agnostic) template.
    pub fn new(name: impl Into<String>, pulse: DragTemplate) -> Self {
        Self {
            name: name.into(),
            qubits: None,
            channel: default_channel(),
            pulse,
        }
    }

    /// Restrict the template to specific qubits.
    pub fn for_qubits(mut self, qubits: Vec<u32>) -> Self {
        self.qubits = Some(qubits);
        self
    }

    /// Calibration parameter names referenced by the template.
    pub fn parameter_names(&self) -> Vec<&str> {
        [&self.pulse.sigma, &self.pulse.amp, &self.pulse.beta]
            .into_iter()
            .filter_map(ParamExpr::parameter_name)
            .collect()
    }

    pub fn declares(&self, parameter: &str) -> bool {
        self.parameter_names().contains(&parameter)
    }

    /// Check structural constraints before registration.
    pub fn validate(&self) -> std::result::Result<(), CalibrationError> {
        let invalid = |message: &str| CalibrationError::InvalidSchedule {
            schedule: self.name.clone(),
            message: message.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name cannot be empty"));
        }
        if self.pulse.duration == 0 {
            return Err(invalid("duration must be greater than 0"));
        }
        if matches!(&self.qubits, Some(q) if q.is_empty()) {
            return Err(invalid("qubits cannot be an empty list"));
        }

        let names = self.parameter_names();
        for (i, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(invalid("parameter names cannot be empty"));
            }
            if names[..i].contains(name) {
                return Err(invalid(&format!("parameter '{}' used twice", name)));
            }
        }
        Ok(())
    }
}

/// A concrete DRAG pulse with every operand bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragPulse {
    /// Duration in samples.
    pub duration: u32,
    pub amp: f64,
    pub sigma: f64,
    pub beta: f64,
}

impl DragPulse {
    /// Validate pulse operands.
    pub fn validate(&self) -> Result<()> {
        if self.duration == 0 {
            return Err(ValidationError::Field {
                field: "duration".into(),
                message: "must be greater than 0".into(),
            }
            .into());
        }
        for (field, value) in [("amp", self.amp), ("sigma", self.sigma), ("beta", self.beta)] {
            if !value.is_finite() {
                return Err(ValidationError::Field {
                    field: field.into(),
                    message: format!("must be finite, got {}", value),
                }
                .into());
            }
        }
        if self.sigma <= 0.0 {
            return Err(ValidationError::Field {
                field: "sigma".into(),
                message: format!("must be positive, got {}", self.sigma),
            }
            .into());
        }
        if self.amp.abs() > 1.0 {
            return Err(ValidationError::Field {
                field: "amp".into(),
                message: format!("|amp| must be at most 1, got {}", self.amp),
            }
            .into());
        }
        Ok(())
    }

    /// In-phase envelope: amplitude times a Gaussian lifted so that it
    /// vanishes one sample outside either edge.
    pub fn samples(&self) -> Vec<f64> {
        let center = (self.duration as f64 - 1.0) / 2.0;
        let gauss = |t: f64| (-(t - center).powi(2) / (2.0 * self.sigma.powi(2))).exp();
        let edge = gauss(-1.0);

        (0..self.duration)
            .map(|k| self.amp * (gauss(k as f64) - edge) / (1.0 - edge))
            .collect()
    }

    /// The same pulse rotating the other way (Rm for an Rp pulse).
    pub fn negated(&self) -> Self {
        Self {
            amp: -self.amp,
            ..*self
        }
    }
}

/// A schedule resolved from the store for one qubit.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub name: String,
    pub qubit: u32,
    pub channel: String,
    pub duration: u32,
    pub amp: Operand,
    pub sigma: Operand,
    pub beta: Operand,
}

impl Schedule {
    /// Free symbolic parameters, in operand order.
    pub fn parameters(&self) -> Vec<&Parameter> {
        [&self.amp, &self.sigma, &self.beta]
            .into_iter()
            .filter_map(Operand::symbol)
            .collect()
    }

    /// Bind a free parameter to a value.
    pub fn assign(
        &self,
        parameter: &Parameter,
        value: f64,
    ) -> std::result::Result<Schedule, CalibrationError> {
        if !self.parameters().contains(&parameter) {
            return Err(CalibrationError::UnboundParameter {
                parameter: parameter.name().to_string(),
                schedule: self.name.clone(),
            });
        }

        let bind = |op: &Operand| match op {
            Operand::Symbol(p) if p == parameter => Operand::Value(value),
            other => other.clone(),
        };

        Ok(Schedule {
            amp: bind(&self.amp),
            sigma: bind(&self.sigma),
            beta: bind(&self.beta),
            ..self.clone()
        })
    }

    /// Lower to a concrete pulse. Fails while any operand is still free.
    pub fn to_pulse(&self) -> std::result::Result<DragPulse, CalibrationError> {
        match (self.amp.value(), self.sigma.value(), self.beta.value()) {
            (Some(amp), Some(sigma), Some(beta)) => Ok(DragPulse {
                duration: self.duration,
                amp,
                sigma,
                beta,
            }),
            _ => Err(CalibrationError::InvalidSchedule {
                schedule: self.name.clone(),
                message: format!(
                    "unbound parameters: {}",
                    self.parameters()
                        .iter()
                        .map(|p| p.name())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            }),
        }
    }
}
