// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Experiment data: raw circuit results plus analysis results.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::circuit::CircuitMetadata;

/// Measured outcome of one circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitResult {
    pub metadata: CircuitMetadata,
    /// Counts keyed by measured bitstring ("0" / "1").
    pub counts: HashMap<String, u32>,
    pub shots: u32,
}

impl CircuitResult {
    /// Fraction of shots that measured the excited state.
    pub fn excited_population(&self) -> f64 {
        if self.shots == 0 {
            return 0.0;
        }
        let ones = self.counts.get("1").copied().unwrap_or(0);
        ones as f64 / self.shots as f64
    }
}

/// Fit quality flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitQuality {
    Good,
    Bad,
}

impl fmt::Display for FitQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitQuality::Good => write!(f, "good"),
            FitQuality::Bad => write!(f, "bad"),
        }
    }
}

/// A named value extracted by an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub name: String,
    pub value: f64,
    pub stderr: Option<f64>,
    pub quality: FitQuality,
    pub experiment_id: Uuid,
    /// Reduced chi-squared of the underlying fit, if any.
    #[serde(default)]
    pub chisq: Option<f64>,
}

/// Everything one experiment run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentData {
    pub experiment_id: Uuid,
    pub experiment_type: String,
    pub qubit: u32,
    pub created_at: DateTime<Utc>,
    pub circuit_results: Vec<CircuitResult>,
    pub analysis_results: Vec<AnalysisResult>,
}

impl ExperimentData {
    pub fn new(experiment_type: impl Into<String>, qubit: u32) -> Self {
        Self {
            experiment_id: Uuid::new_v4(),
            experiment_type: experiment_type.into(),
            qubit,
            created_at: Utc::now(),
            circuit_results: Vec::new(),
            analysis_results: Vec::new(),
        }
    }

    /// Analysis results with the given name, in insertion order.
    pub fn analysis_results_named(&self, name: &str) -> Vec<&AnalysisResult> {
        self.analysis_results
            .iter()
            .filter(|r| r.name == name)
            .collect()
    }

    pub fn add_analysis_result(&mut self, result: AnalysisResult) {
        self.analysis_results.push(result);
    }

    /// Pretty JSON export.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
