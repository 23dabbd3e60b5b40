// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Rough DRAG experiment.
//!
//! Scans the DRAG coefficient β of a schedule. For every repetition count
//! `n` and every β the circuit plays `n` pairs of (Rp, Rm) and measures:
//!
//! ```text
//!      ┌────────┐┌────────┐         ┌────────┐┌────────┐┌─┐
//! q_0: ┤ Rp(β)  ├┤ Rm(β)  ├  ...  ──┤ Rp(β)  ├┤ Rm(β)  ├┤M├
//!      └────────┘└────────┘         └────────┘└────────┘└─┘
//!      ╰──────────────────── n times ───────────────────╯
//! ```
//!
//! Rm is Rp with negated amplitude, so each pair is the identity for the
//! right β and accumulates a phase error otherwise.

use tracing::debug;

use super::analysis::DragCalAnalysis;
use super::circuit::{Circuit, CircuitMetadata, Instruction};
use super::linspace;
use crate::calibration::{Parameter, Schedule};
use crate::config::ResourceLimits;
use crate::error::{ExperimentError, Result};
use crate::validation;

/// β scan over Rp/Rm repetitions.
#[derive(Debug, Clone)]
pub struct RoughDrag {
    qubit: u32,
    schedule: Schedule,
    beta_param: Parameter,
    betas: Vec<f64>,
    reps: Vec<u32>,
}

impl RoughDrag {
    pub const EXPERIMENT_TYPE: &'static str = "RoughDrag";

    /// 51 values spanning [-5, 5].
    pub fn default_betas() -> Vec<f64> {
        linspace(-5.0, 5.0, 51)
    }

    pub fn default_reps() -> Vec<u32> {
        vec![1, 3, 5]
    }

    /// Create the experiment. The schedule must have exactly one free
    /// parameter, which is the scanned β.
    pub fn new(qubit: u32, schedule: Schedule) -> Result<Self> {
        let beta_param = match schedule.parameters().as_slice() {
            [p] => (*p).clone(),
            params => {
                return Err(ExperimentError::InvalidOptions(format!(
                    "schedule '{}' must have exactly one free parameter, found {}",
                    schedule.name,
                    params.len()
                ))
                .into())
            }
        };

        Ok(Self {
            qubit,
            schedule,
            beta_param,
            betas: Self::default_betas(),
            reps: Self::default_reps(),
        })
    }

    /// Replace the β scan values.
    pub fn with_betas(mut self, betas: Vec<f64>) -> Result<Self> {
        if betas.is_empty() || betas.iter().any(|b| !b.is_finite()) {
            return Err(ExperimentError::InvalidOptions(
                "betas must be non-empty and finite".into(),
            )
            .into());
        }
        self.betas = betas;
        Ok(self)
    }

    /// Replace the repetition counts.
    pub fn with_reps(mut self, reps: Vec<u32>) -> Result<Self> {
        if reps.is_empty() || reps.contains(&0) {
            return Err(
                ExperimentError::InvalidOptions("reps must be non-empty and positive".into())
                    .into(),
            );
        }
        self.reps = reps;
        Ok(self)
    }

    pub fn qubit(&self) -> u32 {
        self.qubit
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn betas(&self) -> &[f64] {
        &self.betas
    }

    pub fn reps(&self) -> &[u32] {
        &self.reps
    }

    /// Check the longest Rp/Rm sequence against the backend limits.
    pub fn check_limits(&self, limits: &ResourceLimits) -> Result<()> {
        validation::validate_sequence_length(&self.reps, self.schedule.duration, limits)
    }

    /// Build one circuit per (rep, β).
    pub fn circuits(&self) -> Result<Vec<Circuit>> {
        let mut circuits = Vec::with_capacity(self.reps.len() * self.betas.len());

        for &rep in &self.reps {
            for &beta in &self.betas {
                let rp = self.schedule.assign(&self.beta_param, beta)?.to_pulse()?;
                let rm = rp.negated();

                let mut instructions = Vec::with_capacity(2 * rep as usize + 1);
                for _ in 0..rep {
                    instructions.push(Instruction::Play {
                        label: "Rp".into(),
                        pulse: rp,
                    });
                    instructions.push(Instruction::Play {
                        label: "Rm".into(),
                        pulse: rm,
                    });
                }
                instructions.push(Instruction::Measure);

                circuits.push(Circuit {
                    name: format!("DRAG_{}_{:.4}", rep, beta),
                    qubit: self.qubit,
                    instructions,
                    metadata: CircuitMetadata {
                        experiment_type: Self::EXPERIMENT_TYPE.into(),
                        qubit: self.qubit,
                        xval: beta,
                        series: rep,
                        calibration: None,
                    },
                });
            }
        }

        debug!(
            qubit = self.qubit,
            circuits = circuits.len(),
            "Built rough DRAG circuits"
        );
        Ok(circuits)
    }

    /// Analysis matching this experiment.
    pub fn analysis(&self) -> DragCalAnalysis {
        DragCalAnalysis::default()
    }
}
