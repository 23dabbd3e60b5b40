// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Pure-Rust single-qubit DRAG simulator.
//!
//! The simulator propagates a two-level system in the drive frame under
//! piecewise-constant controls, one step per AWG sample:
//!
//! ```text
//! H_k = ½ Ω [ I_k σx + (Q_k − β* · dI_k) σy ]
//! ```
//!
//! where `dI` is the centered difference of the in-phase envelope. The
//! `−β* · dI` term models a derivative-like distortion of the drive line.
//! A DRAG quadrature `Q = β · dI` cancels it exactly when `β = β*`, so the
//! Rp/Rm sequences of a rough DRAG scan return to |0⟩ only at `β*`.
//!
//! Each step is the closed-form SU(2) rotation
//! `U = cos(θ/2) 𝟙 − i sin(θ/2) (n̂ · σ)`. Counts are deterministic:
//! `round(p1 · shots)` excited outcomes.

use async_trait::async_trait;
use num_complex::Complex64;
use std::collections::HashMap;
use tracing::debug;

use super::compiler::centered_difference;
use super::r#trait::{
    BackendType, ExecutePulseRequest, HardwareInfo, HealthStatus, MeasurementResult,
    QuantumBackend, ResultQuality,
};
use crate::config::{ResourceLimits, SimulatorConfig};
use crate::error::BackendError;
use crate::validation;

/// Largest accepted |I| or |Q| sample.
const MAX_ENVELOPE_AMPLITUDE: f64 = 1.0;

/// Single-qubit DRAG simulator backend.
pub struct DragSimulator {
    name: String,
    num_qubits: u32,
    beta_optimal: f64,
    /// Rabi rate at unit amplitude, rad per sample.
    rabi_rate: f64,
    sample_period_ns: f64,
    limits: ResourceLimits,
}

impl DragSimulator {
    /// Create a simulator from configuration.
    pub fn new(config: &SimulatorConfig, limits: ResourceLimits) -> Self {
        debug!(
            beta_optimal = config.beta_optimal,
            rabi_rate = config.rabi_rate,
            "Initializing DRAG simulator"
        );
        Self {
            name: "drag_simulator".to_string(),
            num_qubits: config.num_qubits,
            beta_optimal: config.beta_optimal,
            rabi_rate: config.rabi_rate,
            sample_period_ns: config.sample_period_ns,
            limits,
        }
    }

    pub fn beta_optimal(&self) -> f64 {
        self.beta_optimal
    }

    pub fn sample_period_ns(&self) -> f64 {
        self.sample_period_ns
    }

    /// Excited-state population after playing the envelopes from |0⟩.
    pub fn excited_population(&self, i_envelope: &[f64], q_envelope: &[f64]) -> f64 {
        let distortion = centered_difference(i_envelope);
        let mut psi = [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)];

        for ((&i, &q), &d) in i_envelope.iter().zip(q_envelope).zip(&distortion) {
            let hx = self.rabi_rate * i;
            let hy = self.rabi_rate * (q - self.beta_optimal * d);
            let theta = hx.hypot(hy);
            if theta == 0.0 {
                continue;
            }
            let (nx, ny) = (hx / theta, hy / theta);
            let c = Complex64::new((theta / 2.0).cos(), 0.0);
            let minus_i_s = Complex64::new(0.0, -(theta / 2.0).sin());

            // (n̂·σ)ψ = [(nx − i ny) ψ1, (nx + i ny) ψ0]
            let rot0 = Complex64::new(nx, -ny) * psi[1];
            let rot1 = Complex64::new(nx, ny) * psi[0];
            psi = [c * psi[0] + minus_i_s * rot0, c * psi[1] + minus_i_s * rot1];
        }

        psi[1].norm_sqr().clamp(0.0, 1.0)
    }

    fn validate(&self, request: &ExecutePulseRequest) -> Result<(), BackendError> {
        let invalid = |e: crate::error::Error| BackendError::InvalidRequest(e.to_string());

        validation::validate_execute_pulse_request(
            request.num_shots,
            request.duration_ns,
            request.num_time_steps,
            &self.limits,
        )
        .map_err(invalid)?;
        validation::validate_pulse_envelope(
            &request.i_envelope,
            &request.q_envelope,
            request.num_time_steps as usize,
            MAX_ENVELOPE_AMPLITUDE,
        )
        .map_err(invalid)?;
        validation::validate_target_qubits(&request.target_qubits, self.num_qubits)
            .map_err(invalid)
    }
}

#[async_trait]
impl QuantumBackend for DragSimulator {
    fn name(&self) -> &str {
        &self.name
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Simulator
    }

    async fn execute_pulse(
        &self,
        request: ExecutePulseRequest,
    ) -> Result<MeasurementResult, BackendError> {
        self.validate(&request)?;

        let p1 = self.excited_population(&request.i_envelope, &request.q_envelope);
        let ones = (p1 * request.num_shots as f64).round() as u32;
        let zeros = request.num_shots - ones;

        debug!(pulse_id = %request.pulse_id, p1, "Simulated pulse");

        let mut counts = HashMap::new();
        if zeros > 0 {
            counts.insert("0".to_string(), zeros);
        }
        if ones > 0 {
            counts.insert("1".to_string(), ones);
        }

        Ok(MeasurementResult {
            bitstring_counts: counts,
            total_shots: request.num_shots,
            successful_shots: request.num_shots,
            quality: ResultQuality::FullSuccess,
        })
    }

    async fn get_hardware_info(&self) -> Result<HardwareInfo, BackendError> {
        Ok(HardwareInfo {
            name: self.name.clone(),
            backend_type: BackendType::Simulator,
            num_qubits: self.num_qubits,
            sample_period_ns: self.sample_period_ns,
            software_version: crate::VERSION.to_string(),
            limits: self.limits.clone(),
        })
    }

    async fn health_check(&self) -> Result<HealthStatus, BackendError> {
        Ok(HealthStatus::Healthy)
    }

    fn resource_limits(&self) -> &ResourceLimits {
        &self.limits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::DragPulse;
    use approx::assert_relative_eq;

    fn simulator(beta_optimal: f64) -> DragSimulator {
        let config = SimulatorConfig {
            beta_optimal,
            ..Default::default()
        };
        DragSimulator::new(&config, ResourceLimits::default())
    }

    /// Envelopes of `reps` Rp/Rm pairs at the given beta.
    fn rp_rm(reps: usize, beta: f64) -> (Vec<f64>, Vec<f64>) {
        let rp = DragPulse {
            duration: 64,
            amp: 0.18,
            sigma: 16.0,
            beta,
        };
        let mut i = Vec::new();
        for _ in 0..reps {
            i.extend(rp.samples());
            i.extend(rp.negated().samples());
        }
        let q = centered_difference(&i).iter().map(|d| beta * d).collect();
        (i, q)
    }

    fn request(i: Vec<f64>, q: Vec<f64>, shots: u32) -> ExecutePulseRequest {
        let n = i.len() as u32;
        ExecutePulseRequest {
            pulse_id: "test".into(),
            i_envelope: i,
            q_envelope: q,
            duration_ns: n,
            num_time_steps: n,
            target_qubits: vec![0],
            num_shots: shots,
        }
    }

    #[test]
    fn test_idle_stays_in_ground_state() {
        let sim = simulator(0.0);
        assert_eq!(sim.excited_population(&[0.0; 10], &[0.0; 10]), 0.0);
    }

    #[test]
    fn test_constant_x_drive_rabi_flip() {
        let sim = simulator(0.0);
        let steps = 10;
        let amp = std::f64::consts::PI / (0.5 * steps as f64);
        let p1 = sim.excited_population(&vec![amp; steps], &vec![0.0; steps]);
        assert_relative_eq!(p1, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rp_rm_identity_at_optimal_beta() {
        let sim = simulator(-1.2);
        for reps in [1, 3, 5] {
            let (i, q) = rp_rm(reps, -1.2);
            assert!(sim.excited_population(&i, &q) < 1e-20);
        }
    }

    #[test]
    fn test_rp_rm_error_grows_away_from_optimum() {
        let sim = simulator(-1.2);
        let (i, q) = rp_rm(3, -1.2 + 0.25);
        let near = sim.excited_population(&i, &q);
        let (i, q) = rp_rm(3, -1.2 + 0.5);
        let far = sim.excited_population(&i, &q);
        assert!(near > 1e-4);
        assert!(far > near);
    }

    #[test]
    fn test_more_reps_amplify_error() {
        let sim = simulator(0.0);
        let (i1, q1) = rp_rm(1, 0.5);
        let (i3, q3) = rp_rm(3, 0.5);
        assert!(sim.excited_population(&i3, &q3) > sim.excited_population(&i1, &q1));
    }

    #[tokio::test]
    async fn test_execute_pulse_counts() {
        let sim = simulator(-1.2);
        let (i, q) = rp_rm(1, -1.2);
        let result = sim.execute_pulse(request(i, q, 1000)).await.unwrap();
        assert_eq!(result.total_shots, 1000);
        assert_eq!(result.bitstring_counts.get("0"), Some(&1000));
        assert!(!result.bitstring_counts.contains_key("1"));
        assert_eq!(result.quality, ResultQuality::FullSuccess);
    }

    #[tokio::test]
    async fn test_execute_pulse_rejects_bad_requests() {
        let sim = simulator(0.0);

        let (i, q) = rp_rm(1, 0.0);
        let mut req = request(i.clone(), q.clone(), 0);
        assert!(sim.execute_pulse(req.clone()).await.is_err());

        req.num_shots = 100;
        req.target_qubits = vec![42];
        assert!(sim.execute_pulse(req.clone()).await.is_err());

        req.target_qubits = vec![0];
        req.q_envelope.pop();
        assert!(matches!(
            sim.execute_pulse(req).await,
            Err(BackendError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_hardware_info_and_health() {
        let sim = simulator(0.0);
        let info = sim.get_hardware_info().await.unwrap();
        assert_eq!(info.name, "drag_simulator");
        assert_eq!(info.num_qubits, 5);
        assert_eq!(info.backend_type, BackendType::Simulator);
        assert_eq!(sim.health_check().await.unwrap(), HealthStatus::Healthy);
    }
}
