// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Rough DRAG analysis.
//!
//! Every repetition series `n` is fit to
//!
//! ```text
//! y_n(x) = a_n · cos(2π f n (x − β)) + b_n
//! ```
//!
//! with the frequency `f` and the center `β` shared across series. For a
//! fixed `(β, f)` the per-series `(a_n, b_n)` are linear and solved in
//! closed form, so the search only runs over two dimensions: a coarse
//! grid followed by a few shrinking local grids.
//!
//! Only candidates with `Σ a_n < 0` are accepted. The shared extremum then
//! is a minimum of excited population, which rules out the equally good
//! fit at a common maximum that odd repetition counts would otherwise
//! allow.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use tracing::{debug, warn};

use super::data::{AnalysisResult, ExperimentData, FitQuality};
use super::linspace;
use crate::error::{ExperimentError, Result};

const BETA_GRID: usize = 201;
const FREQ_GRID: usize = 120;
const REFINE_GRID: usize = 21;
const REFINE_ROUNDS: usize = 3;
const DEFAULT_MAX_GOOD_CHISQ: f64 = 3.0;

/// Result of the shared-β cosine fit.
#[derive(Debug, Clone, PartialEq)]
pub struct DragFit {
    pub beta: f64,
    pub beta_stderr: Option<f64>,
    /// Oscillation frequency per unit β and per repetition.
    pub freq: f64,
    /// `(reps, amplitude, offset)` for every series.
    pub series: Vec<(u32, f64, f64)>,
    pub reduced_chisq: f64,
    /// Scanned β range.
    pub x_range: (f64, f64),
}

impl DragFit {
    fn in_range(&self) -> bool {
        self.beta >= self.x_range.0 && self.beta <= self.x_range.1
    }
}

#[derive(Debug, Clone)]
struct Series {
    reps: u32,
    x: Vec<f64>,
    y: Vec<f64>,
    sigma: Vec<f64>,
}

#[derive(Debug, Clone)]
struct Candidate {
    beta: f64,
    freq: f64,
    sse: f64,
    coeffs: Vec<(f64, f64)>,
}

impl Candidate {
    fn is_minimum(&self) -> bool {
        self.coeffs.iter().map(|(a, _)| a).sum::<f64>() < 0.0
    }
}

/// Least-squares `(a, b)` for `y = a·c + b`, plus the residual sum.
fn linear_fit(c: &[f64], y: &[f64]) -> (f64, f64, f64) {
    let n = c.len() as f64;
    let (mut sc, mut scc, mut sy, mut scy) = (0.0, 0.0, 0.0, 0.0);
    for (&ci, &yi) in c.iter().zip(y) {
        sc += ci;
        scc += ci * ci;
        sy += yi;
        scy += ci * yi;
    }

    let det = n * scc - sc * sc;
    let (a, b) = if det.abs() < 1e-12 {
        (0.0, sy / n)
    } else {
        let a = (n * scy - sc * sy) / det;
        (a, (sy - a * sc) / n)
    };

    let sse = c
        .iter()
        .zip(y)
        .map(|(&ci, &yi)| (yi - a * ci - b).powi(2))
        .sum();
    (a, b, sse)
}

fn evaluate(series: &[Series], beta: f64, freq: f64) -> Candidate {
    let mut sse = 0.0;
    let mut coeffs = Vec::with_capacity(series.len());

    for s in series {
        let w = 2.0 * PI * freq * s.reps as f64;
        let c: Vec<f64> = s.x.iter().map(|x| (w * (x - beta)).cos()).collect();
        let (a, b, e) = linear_fit(&c, &s.y);
        sse += e;
        coeffs.push((a, b));
    }

    Candidate {
        beta,
        freq,
        sse,
        coeffs,
    }
}

fn geomspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    linspace(start.ln(), stop.ln(), num)
        .into_iter()
        .map(f64::exp)
        .collect()
}

/// Analysis for rough DRAG scans.
#[derive(Debug, Clone)]
pub struct DragCalAnalysis {
    max_good_chisq: f64,
}

impl Default for DragCalAnalysis {
    fn default() -> Self {
        Self {
            max_good_chisq: DEFAULT_MAX_GOOD_CHISQ,
        }
    }
}

impl DragCalAnalysis {
    /// Name of the produced analysis result.
    pub const RESULT_NAME: &'static str = "beta";

    /// Reduced chi-squared threshold below which the fit is good.
    pub fn with_max_good_chisq(mut self, max_good_chisq: f64) -> Self {
        self.max_good_chisq = max_good_chisq;
        self
    }

    fn collect_series(data: &ExperimentData) -> Result<Vec<Series>> {
        let mut by_reps: BTreeMap<u32, Series> = BTreeMap::new();

        for result in &data.circuit_results {
            let x = result.metadata.xval;
            if !x.is_finite() {
                return Err(ExperimentError::FitFailed(format!("non-finite xval {}", x)).into());
            }
            if result.shots == 0 {
                return Err(
                    ExperimentError::FitFailed("circuit result with zero shots".into()).into(),
                );
            }

            let shots = result.shots as f64;
            let ones = result.counts.get("1").copied().unwrap_or(0) as f64;
            let p = (ones + 0.5) / (shots + 1.0);

            let reps = result.metadata.series;
            let series = by_reps.entry(reps).or_insert_with(|| Series {
                reps,
                x: Vec::new(),
                y: Vec::new(),
                sigma: Vec::new(),
            });
            series.x.push(x);
            series.y.push(result.excited_population());
            series.sigma.push((p * (1.0 - p) / shots).sqrt());
        }

        if by_reps.is_empty() {
            return Err(ExperimentError::FitFailed("no circuit results".into()).into());
        }
        Ok(by_reps.into_values().collect())
    }

    /// Fit the shared-β model to the experiment's circuit results.
    pub fn fit(&self, data: &ExperimentData) -> Result<DragFit> {
        let series = Self::collect_series(data)?;

        let mut xs: Vec<f64> = series.iter().flat_map(|s| s.x.iter().copied()).collect();
        xs.sort_by(f64::total_cmp);
        xs.dedup();
        let (x_min, x_max) = match (xs.first(), xs.last()) {
            (Some(&lo), Some(&hi)) if hi > lo => (lo, hi),
            _ => {
                return Err(
                    ExperimentError::FitFailed("scan needs at least two distinct β".into()).into(),
                )
            }
        };

        let num_points: usize = series.iter().map(|s| s.x.len()).sum();
        let num_params = 2 * series.len() + 2;
        if num_points <= num_params {
            return Err(ExperimentError::FitFailed(format!(
                "{} points for {} parameters",
                num_points, num_params
            ))
            .into());
        }
        let dof = (num_points - num_params) as f64;

        let span = x_max - x_min;
        let min_dx = xs
            .windows(2)
            .map(|w| w[1] - w[0])
            .fold(f64::INFINITY, f64::min);
        let max_reps = series.iter().map(|s| s.reps).max().unwrap_or(1).max(1) as f64;

        let f_lo = 1.0 / (20.0 * span);
        let f_hi = (1.0 / (2.0 * max_reps * min_dx)).max(10.0 * f_lo);

        let mut best: Option<Candidate> = None;
        let consider = |candidate: Candidate, best: &mut Option<Candidate>| {
            if candidate.is_minimum() && best.as_ref().map_or(true, |b| candidate.sse < b.sse) {
                *best = Some(candidate);
            }
        };

        let freqs = geomspace(f_lo, f_hi, FREQ_GRID);
        for beta in linspace(x_min, x_max, BETA_GRID) {
            for &freq in &freqs {
                consider(evaluate(&series, beta, freq), &mut best);
            }
        }

        let mut w_beta = span / (BETA_GRID - 1) as f64;
        let mut w_log_f = (f_hi / f_lo).ln() / (FREQ_GRID - 1) as f64;
        for _ in 0..REFINE_ROUNDS {
            let Some(center) = best.clone() else { break };
            let log_f = center.freq.ln();
            for beta in linspace(center.beta - w_beta, center.beta + w_beta, REFINE_GRID) {
                for lf in linspace(log_f - w_log_f, log_f + w_log_f, REFINE_GRID) {
                    consider(evaluate(&series, beta, lf.exp()), &mut best);
                }
            }
            w_beta /= 5.0;
            w_log_f /= 5.0;
        }

        let best = best.ok_or_else(|| {
            ExperimentError::FitFailed("no candidate with a population minimum".into())
        })?;

        let (beta, freq) = (best.beta, best.freq);
        let chisq: f64 = series
            .iter()
            .zip(&best.coeffs)
            .flat_map(|(s, &(a, b))| {
                let w = 2.0 * PI * freq * s.reps as f64;
                s.x.iter().zip(&s.y).zip(&s.sigma).map(move |((x, y), sigma)| {
                    let model = a * (w * (x - beta)).cos() + b;
                    ((y - model) / sigma).powi(2)
                })
            })
            .sum();

        let h = span * 1e-3;
        let plus = evaluate(&series, beta + h, freq).sse;
        let minus = evaluate(&series, beta - h, freq).sse;
        let curvature = (plus - 2.0 * best.sse + minus) / (h * h);
        let beta_stderr = if curvature.is_finite() && curvature > 0.0 {
            Some((2.0 * (best.sse / dof) / curvature).sqrt())
        } else {
            None
        };

        Ok(DragFit {
            beta,
            beta_stderr,
            freq,
            series: series
                .iter()
                .zip(&best.coeffs)
                .map(|(s, &(a, b))| (s.reps, a, b))
                .collect(),
            reduced_chisq: chisq / dof,
            x_range: (x_min, x_max),
        })
    }

    /// Fit and report the β estimate as a `"beta"` analysis result.
    pub fn run(&self, data: &ExperimentData) -> Result<Vec<AnalysisResult>> {
        let fit = self.fit(data)?;

        let quality = if fit.reduced_chisq < self.max_good_chisq && fit.in_range() {
            FitQuality::Good
        } else {
            FitQuality::Bad
        };

        if quality == FitQuality::Bad {
            warn!(
                experiment_id = %data.experiment_id,
                beta = fit.beta,
                reduced_chisq = fit.reduced_chisq,
                "Rough DRAG fit is of bad quality"
            );
        } else {
            debug!(
                experiment_id = %data.experiment_id,
                beta = fit.beta,
                freq = fit.freq,
                reduced_chisq = fit.reduced_chisq,
                "Rough DRAG fit"
            );
        }

        Ok(vec![AnalysisResult {
            name: Self::RESULT_NAME.to_string(),
            value: fit.beta,
            stderr: fit.beta_stderr,
            quality,
            experiment_id: data.experiment_id,
            chisq: Some(fit.reduced_chisq),
        }])
    }
}
