// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Quantum backends.
//!
//! This module provides the [`QuantumBackend`] trait and:
//!
//! - [`compiler`]: lowering of pulse circuits into I/Q envelopes
//! - [`registry`]: named backend registry with a default backend
//! - [`simulator`]: single-qubit DRAG simulator

pub mod compiler;
pub mod registry;
pub mod simulator;
pub mod r#trait;

pub use compiler::{centered_difference, compile_circuit};
pub use r#trait::{
    BackendType, ExecutePulseRequest, HardwareInfo, HealthStatus, MeasurementResult,
    QuantumBackend, ResultQuality,
};
pub use registry::BackendRegistry;
pub use simulator::DragSimulator;
