// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Shared test utilities: mock backends and calibration fixtures.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::backend::r#trait::{
    BackendType, ExecutePulseRequest, HardwareInfo, HealthStatus, MeasurementResult,
    QuantumBackend, ResultQuality,
};
use crate::calibration::{Calibrations, DragTemplate, ParamExpr, ParameterValue, ScheduleTemplate};
use crate::config::ResourceLimits;
use crate::error::BackendError;

/// Mock backend that leaves the qubit in |0⟩.
pub struct MockBackend {
    pub name: String,
    pub backend_type: BackendType,
    pub limits: ResourceLimits,
}

impl MockBackend {
    pub fn new(name: &str, backend_type: BackendType) -> Self {
        Self {
            name: name.to_string(),
            backend_type,
            limits: ResourceLimits::default(),
        }
    }

    pub fn simulator(name: &str) -> Arc<dyn QuantumBackend> {
        Arc::new(Self::new(name, BackendType::Simulator))
    }
}

#[async_trait]
impl QuantumBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn backend_type(&self) -> BackendType {
        self.backend_type
    }

    async fn execute_pulse(
        &self,
        request: ExecutePulseRequest,
    ) -> Result<MeasurementResult, BackendError> {
        let mut counts = HashMap::new();
        counts.insert("0".to_string(), request.num_shots);
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
            backend_type: self.backend_type,
            num_qubits: 2,
            sample_period_ns: 1.0,
            software_version: "1.0.0-mock".to_string(),
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

/// Mock backend that always returns errors.
pub struct FailingMockBackend {
    pub name: String,
    pub limits: ResourceLimits,
}

impl FailingMockBackend {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            limits: ResourceLimits::default(),
        }
    }

    pub fn shared(name: &str) -> Arc<dyn QuantumBackend> {
        Arc::new(Self::new(name))
    }
}

#[async_trait]
impl QuantumBackend for FailingMockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Simulator
    }

    async fn execute_pulse(
        &self,
        _request: ExecutePulseRequest,
    ) -> Result<MeasurementResult, BackendError> {
        Err(BackendError::ExecutionFailed(
            "mock execution failure".to_string(),
        ))
    }

    async fn get_hardware_info(&self) -> Result<HardwareInfo, BackendError> {
        Err(BackendError::Unavailable(
            "mock backend unavailable".to_string(),
        ))
    }

    async fn health_check(&self) -> Result<HealthStatus, BackendError> {
        Err(BackendError::Unavailable(
            "mock backend unavailable".to_string(),
        ))
    }

    fn resource_limits(&self) -> &ResourceLimits {
        &self.limits
    }
}

/// Mock backend that loses half the shots and reports degraded health.
pub struct DegradedMockBackend {
    pub name: String,
    pub limits: ResourceLimits,
}

impl DegradedMockBackend {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            limits: ResourceLimits::default(),
        }
    }

    pub fn shared(name: &str) -> Arc<dyn QuantumBackend> {
        Arc::new(Self::new(name))
    }
}

#[async_trait]
impl QuantumBackend for DegradedMockBackend {
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
        let kept = request.num_shots / 2;
        let mut counts = HashMap::new();
        counts.insert("0".to_string(), kept - kept / 4);
        counts.insert("1".to_string(), kept / 4);
        Ok(MeasurementResult {
            bitstring_counts: counts,
            total_shots: request.num_shots,
            successful_shots: kept,
            quality: ResultQuality::Degraded,
        })
    }

    async fn get_hardware_info(&self) -> Result<HardwareInfo, BackendError> {
        Ok(HardwareInfo {
            name: self.name.clone(),
            backend_type: BackendType::Simulator,
            num_qubits: 2,
            sample_period_ns: 0.5,
            software_version: "0.1.0-degraded".to_string(),
            limits: self.limits.clone(),
        })
    }

    async fn health_check(&self) -> Result<HealthStatus, BackendError> {
        Ok(HealthStatus::Degraded)
    }

    fn resource_limits(&self) -> &ResourceLimits {
        &self.limits
    }
}

/// Default `x` template: 64-sample Gaussian DRAG pulse with β as a parameter.
pub fn drag_template() -> ScheduleTemplate {
    ScheduleTemplate::new(
        "x",
        DragTemplate {
            duration: 64,
            sigma: ParamExpr::Value(16.0),
            amp: ParamExpr::Value(0.18),
            beta: ParamExpr::Parameter("β".into()),
        },
    )
}

/// Store holding [`drag_template`] and a default-group β for qubit 0.
pub fn drag_calibrations(beta: f64) -> Arc<Calibrations> {
    let cals = Calibrations::new();
    cals.add_schedule(drag_template())
        .expect("fixture template is valid");
    cals.add_parameter_value(ParameterValue::new(beta, "default"), "β", 0, "x")
        .expect("fixture value is valid");
    Arc::new(cals)
}
