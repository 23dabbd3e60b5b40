// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Circuit-to-envelope compilation.
//!
//! A circuit's played pulses are concatenated into one in-phase envelope.
//! The quadrature envelope carries the DRAG correction, the owning pulse's
//! beta times the derivative of the in-phase envelope:
//!
//! ```text
//! I[k] = Σ pulses, back to back
//! Q[k] = β(k) · (I[k+1] − I[k−1]) / 2        (I outside the window is 0)
//! ```
//!
//! Derivatives are taken on the concatenated envelope so that pulse
//! boundaries are handled the same way everywhere.

use crate::backend::ExecutePulseRequest;
use crate::error::{BackendError, Result};
use crate::experiment::Circuit;

/// Centered finite difference, in units per sample, with zero padding.
pub fn centered_difference(envelope: &[f64]) -> Vec<f64> {
    let n = envelope.len();
    (0..n)
        .map(|k| {
            let next = if k + 1 < n { envelope[k + 1] } else { 0.0 };
            let prev = if k > 0 { envelope[k - 1] } else { 0.0 };
            (next - prev) / 2.0
        })
        .collect()
}

/// Lower a measured circuit into a pulse execution request.
pub fn compile_circuit(
    circuit: &Circuit,
    num_shots: u32,
    sample_period_ns: f64,
) -> Result<ExecutePulseRequest> {
    if !circuit.is_measured() {
        return Err(BackendError::InvalidRequest(format!(
            "circuit '{}' has no measurement",
            circuit.name
        ))
        .into());
    }

    let mut i_envelope = Vec::with_capacity(circuit.duration() as usize);
    let mut betas = Vec::with_capacity(circuit.duration() as usize);
    for pulse in circuit.pulses() {
        pulse.validate()?;
        let samples = pulse.samples();
        betas.extend(std::iter::repeat(pulse.beta).take(samples.len()));
        i_envelope.extend(samples);
    }

    if i_envelope.is_empty() {
        return Err(BackendError::InvalidRequest(format!(
            "circuit '{}' plays no pulses",
            circuit.name
        ))
        .into());
    }

    let q_envelope = centered_difference(&i_envelope)
        .into_iter()
        .zip(&betas)
        .map(|(d, beta)| beta * d)
        .collect();

    let num_time_steps = i_envelope.len() as u32;
    Ok(ExecutePulseRequest {
        pulse_id: circuit.name.clone(),
        i_envelope,
        q_envelope,
        duration_ns: (num_time_steps as f64 * sample_period_ns).round() as u32,
        num_time_steps,
        target_qubits: vec![circuit.qubit],
        num_shots,
    })
}
