// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Calibration experiments.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 RoughDragCal                  │
//! ├──────────────────────┬───────────────────────┤
//! │  CalibrationContext  │      RoughDrag        │
//! │  (store, names,      │  (β scan circuits,    │
//! │   group, options)    │   DragCalAnalysis)    │
//! └──────────────────────┴───────────────────────┘
//!            │  CalibrationExperiment::run
//!            ▼
//!   circuits → cal metadata → backend → analysis → store update
//! ```
//!
//! # Modules
//!
//! - [`circuit`]: pulse circuits and their metadata
//! - [`data`]: circuit results, analysis results, experiment data
//! - [`rough_drag`]: the Rp/Rm β scan
//! - [`analysis`]: shared-β cosine fit
//! - [`calibration`]: options, context and the run loop
//! - [`rough_drag_cal`]: the rough DRAG calibration experiment

pub mod analysis;
pub mod calibration;
pub mod circuit;
pub mod data;
pub mod rough_drag;
pub mod rough_drag_cal;

pub use analysis::{DragCalAnalysis, DragFit};
pub use calibration::{CalibrationContext, CalibrationExperiment, ExperimentOptions};
pub use circuit::{CalibrationMetadata, Circuit, CircuitMetadata, Instruction};
pub use data::{AnalysisResult, CircuitResult, ExperimentData, FitQuality};
pub use rough_drag::RoughDrag;
pub use rough_drag_cal::{RoughDragCal, RoughDragCalBuilder};

/// `num` evenly spaced values from `start` to `stop` inclusive.
pub fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            (0..num)
                .map(|i| if i == num - 1 { stop } else { start + step * i as f64 })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linspace() {
        let v = linspace(-5.0, 5.0, 51);
        assert_eq!(v.len(), 51);
        assert_eq!(v[0], -5.0);
        assert_eq!(v[50], 5.0);
        assert_relative_eq!(v[25], 0.0, epsilon = 1e-12);
        assert_relative_eq!(v[1] - v[0], 0.2, epsilon = 1e-12);

        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(2.0, 3.0, 1), vec![2.0]);
    }
}
