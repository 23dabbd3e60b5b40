// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Input validation for backend requests and experiment sizes.

use crate::config::ResourceLimits;
use crate::error::{Result, ValidationError};

/// Validate pulse execution request parameters.
pub fn validate_execute_pulse_request(
    num_shots: u32,
    pulse_duration_ns: u32,
    num_time_steps: u32,
    limits: &ResourceLimits,
) -> Result<()> {
    if num_shots == 0 {
        return Err(ValidationError::Field {
            field: "num_shots".into(),
            message: "must be greater than 0".into(),
        }
        .into());
    }

    if num_shots > limits.max_shots {
        return Err(ValidationError::ResourceLimit {
            resource: "num_shots".into(),
            limit: limits.max_shots as u64,
            requested: num_shots as u64,
        }
        .into());
    }

    if pulse_duration_ns > limits.max_pulse_duration_ns {
        return Err(ValidationError::ResourceLimit {
            resource: "pulse_duration_ns".into(),
            limit: limits.max_pulse_duration_ns as u64,
            requested: pulse_duration_ns as u64,
        }
        .into());
    }

    if num_time_steps == 0 || num_time_steps > limits.max_time_steps {
        return Err(ValidationError::ResourceLimit {
            resource: "num_time_steps".into(),
            limit: limits.max_time_steps as u64,
            requested: num_time_steps as u64,
        }
        .into());
    }

    Ok(())
}

/// Validate one envelope: length, finiteness and amplitude bound.
fn validate_envelope(
    field: &str,
    envelope: &[f64],
    num_time_steps: usize,
    max_amplitude: f64,
) -> Result<()> {
    if envelope.len() != num_time_steps {
        return Err(ValidationError::Field {
            field: field.into(),
            message: format!(
                "length {} does not match num_time_steps {}",
                envelope.len(),
                num_time_steps
            ),
        }
        .into());
    }

    for (i, val) in envelope.iter().enumerate() {
        if !val.is_finite() {
            return Err(ValidationError::Field {
                field: field.into(),
                message: format!("contains non-finite value at index {}", i),
            }
            .into());
        }
        if val.abs() > max_amplitude {
            return Err(ValidationError::Field {
                field: field.into(),
                message: format!(
                    "amplitude {} at index {} exceeds max {}",
                    val, i, max_amplitude
                ),
            }
            .into());
        }
    }

    Ok(())
}

/// Validate pulse envelope data.
pub fn validate_pulse_envelope(
    i_envelope: &[f64],
    q_envelope: &[f64],
    num_time_steps: usize,
    max_amplitude: f64,
) -> Result<()> {
    validate_envelope("i_envelope", i_envelope, num_time_steps, max_amplitude)?;
    validate_envelope("q_envelope", q_envelope, num_time_steps, max_amplitude)
}

/// Validate target qubits against the backend size. Single-qubit only.
pub fn validate_target_qubits(target_qubits: &[u32], num_qubits: u32) -> Result<()> {
    match target_qubits {
        [q] if *q < num_qubits => Ok(()),
        [q] => Err(ValidationError::Field {
            field: "target_qubits".into(),
            message: format!("qubit {} out of range (backend has {})", q, num_qubits),
        }
        .into()),
        _ => Err(ValidationError::Field {
            field: "target_qubits".into(),
            message: format!("expected exactly one qubit, got {}", target_qubits.len()),
        }
        .into()),
    }
}

/// Validate the number of circuits in one experiment.
pub fn validate_circuit_count(num_circuits: usize, limits: &ResourceLimits) -> Result<()> {
    if num_circuits == 0 {
        return Err(ValidationError::Field {
            field: "circuits".into(),
            message: "experiment produced no circuits".into(),
        }
        .into());
    }

    if num_circuits > limits.max_circuits as usize {
        return Err(ValidationError::ResourceLimit {
            resource: "circuits".into(),
            limit: limits.max_circuits as u64,
            requested: num_circuits as u64,
        }
        .into());
    }

    Ok(())
}

/// Validate the longest Rp/Rm sequence of a repetition scan.
///
/// Each repetition plays two pulses of `pulse_duration` samples, so the
/// compiled envelope of the largest count has `2 * rep * pulse_duration`
/// time steps. Checked before any circuit is built.
pub fn validate_sequence_length(
    reps: &[u32],
    pulse_duration: u32,
    limits: &ResourceLimits,
) -> Result<()> {
    let max_rep = reps.iter().copied().max().unwrap_or(0) as u64;
    let requested = 2 * max_rep * pulse_duration as u64;

    if requested > limits.max_time_steps as u64 {
        return Err(ValidationError::ResourceLimit {
            resource: "num_time_steps".into(),
            limit: limits.max_time_steps as u64,
            requested,
        }
        .into());
    }

    Ok(())
}
