// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Calibration management.
//!
//! - [`store`]: the parameter/schedule store ([`Calibrations`])
//! - [`schedule`]: DRAG schedule templates and resolved schedules
//! - [`parameter`]: symbolic parameters and operands
//! - [`updater`]: writes analysis results back into the store

pub mod parameter;
pub mod schedule;
pub mod store;
pub mod updater;

pub use parameter::{Operand, ParamExpr, Parameter};
pub use schedule::{DragPulse, DragTemplate, Schedule, ScheduleTemplate};
pub use store::{
    CalibrationSnapshot, Calibrations, ParameterEntry, ParameterKey, ParameterValue,
};
pub use updater::Updater;
