// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Quantum backend trait definition.
//!
//! Calibration experiments lower their circuits to I/Q envelopes and hand
//! them to a [`QuantumBackend`]. The backend only sees sampled envelopes and
//! returns measurement counts.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::config::ResourceLimits;
use crate::error::BackendError;

/// Where a calibration run executes. Shown by `qubit-os-cal backends`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// Model of the qubit response, e.g. the DRAG simulator
    Simulator,
    /// Control electronics driving a physical qubit
    Hardware,
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendType::Simulator => write!(f, "simulator"),
            BackendType::Hardware => write!(f, "hardware"),
        }
    }
}

/// Backend availability, as listed by `qubit-os-cal backends`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// Ready to execute calibration circuits
    Healthy,
    /// Executes, but results may carry fewer shots
    Degraded,
    /// Cannot execute circuits
    Unavailable,
}

/// Counts of one measured calibration circuit.
#[derive(Debug, Clone)]
pub struct MeasurementResult {
    /// Single-qubit outcome counts, keyed `"0"` and `"1"`
    pub bitstring_counts: HashMap<String, u32>,
    /// Shots asked for in the request
    pub total_shots: u32,
    /// Shots that contribute to the counts
    pub successful_shots: u32,
    pub quality: ResultQuality,
}

/// How much of a circuit's shots made it into the counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultQuality {
    /// Every shot is counted
    FullSuccess,
    /// Fewer shots than requested, still usable by the fit
    Degraded,
    /// Nothing to fit
    TotalFailure,
}

/// Static description of a backend, read once per calibration run.
#[derive(Debug, Clone)]
pub struct HardwareInfo {
    pub name: String,
    pub backend_type: BackendType,
    /// Qubits addressable as calibration targets
    pub num_qubits: u32,
    /// Envelope sample period in nanoseconds, used to compile schedules
    pub sample_period_ns: f64,
    pub software_version: String,
    /// Limits every request must respect
    pub limits: ResourceLimits,
}

/// One compiled calibration circuit: the concatenated Rp/Rm envelopes
/// for a single qubit, followed by a measurement.
#[derive(Debug, Clone)]
pub struct ExecutePulseRequest {
    /// Circuit name, e.g. `DRAG_3_-1.2000`
    pub pulse_id: String,
    /// In-phase samples
    pub i_envelope: Vec<f64>,
    /// Quadrature samples, the β-scaled derivative of I
    pub q_envelope: Vec<f64>,
    /// `num_time_steps` times the sample period, rounded
    pub duration_ns: u32,
    /// Length of both envelopes
    pub num_time_steps: u32,
    /// The calibrated qubit, as a one-element list
    pub target_qubits: Vec<u32>,
    pub num_shots: u32,
}

/// Executes compiled calibration circuits and returns their counts.
#[async_trait]
pub trait QuantumBackend: Send + Sync {
    /// Name the registry stores this backend under.
    fn name(&self) -> &str;

    fn backend_type(&self) -> BackendType;

    /// Play the envelopes on the target qubit, measure, and count outcomes.
    async fn execute_pulse(
        &self,
        request: ExecutePulseRequest,
    ) -> Result<MeasurementResult, BackendError>;

    /// Sample period and size used to compile and check circuits.
    async fn get_hardware_info(&self) -> Result<HardwareInfo, BackendError>;

    async fn health_check(&self) -> Result<HealthStatus, BackendError>;

    /// Limits checked before circuits are built and again per request.
    fn resource_limits(&self) -> &ResourceLimits;
}
