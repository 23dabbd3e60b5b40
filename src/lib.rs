// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! QubitOS Calibration
//!
//! Pulse-level calibration experiments for QubitOS. The first experiment is
//! the rough DRAG calibration, which scans the DRAG coefficient β of a
//! stored schedule and writes the fitted value back to the store.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          Calibration Experiments         │
//! │   RoughDragCal = context + RoughDrag     │
//! ├──────────────────┬──────────────────────┤
//! │ Calibration      │   Analysis           │
//! │ Store + Updater  │   (shared-β fit)     │
//! ├──────────────────┴──────────────────────┤
//! │        Compiler → Backend Registry       │
//! ├─────────────────────────────────────────┤
//! │            DRAG Simulator                │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration management
//! - [`calibration`]: Parameters, schedules, the calibration store, the updater
//! - [`experiment`]: Circuits, experiment data, RoughDrag and its calibration
//! - [`backend`]: Quantum backend trait, compiler, registry and simulator
//! - [`validation`]: Input validation utilities
//! - [`error`]: Error types

pub mod backend;
pub mod calibration;
pub mod config;
pub mod error;
pub mod experiment;
pub mod validation;

pub use config::Config;
pub use error::{Error, Result};

#[cfg(test)]
pub mod test_utils;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
