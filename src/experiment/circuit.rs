// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Pulse-level circuits and their metadata.

use serde::{Deserialize, Serialize};

use crate::calibration::DragPulse;

/// One circuit instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// Play a DRAG pulse on the circuit's qubit.
    Play { label: String, pulse: DragPulse },
    /// Measure the qubit in the Z basis.
    Measure,
}

/// Calibration bookkeeping attached to every circuit of a calibration
/// experiment. Records the store value as it was before the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationMetadata {
    pub cal_param_value: f64,
    pub cal_param_name: String,
    pub cal_schedule: String,
    pub cal_group: String,
}

/// Per-circuit metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitMetadata {
    pub experiment_type: String,
    pub qubit: u32,
    /// Scanned value (beta for DRAG).
    pub xval: f64,
    /// Series label (number of Rp/Rm repetitions for DRAG).
    pub series: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calibration: Option<CalibrationMetadata>,
}

/// A single-qubit pulse circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    pub name: String,
    pub qubit: u32,
    pub instructions: Vec<Instruction>,
    pub metadata: CircuitMetadata,
}

impl Circuit {
    /// Pulses played by the circuit, in order.
    pub fn pulses(&self) -> impl Iterator<Item = &DragPulse> {
        self.instructions.iter().filter_map(|inst| match inst {
            Instruction::Play { pulse, .. } => Some(pulse),
            Instruction::Measure => None,
        })
    }

    /// Total played duration in samples.
    pub fn duration(&self) -> u32 {
        self.pulses().map(|p| p.duration).sum()
    }

    pub fn is_measured(&self) -> bool {
        self.instructions
            .iter()
            .any(|inst| matches!(inst, Instruction::Measure))
    }
}
