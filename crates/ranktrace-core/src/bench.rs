//! Single-step kernel comparison.
//!
//! Times one damped update step computed by two [`StepKernel`]s on the same
//! dense fixture and reports how long each took and how far apart their
//! results are. The default pairing is naive loops against the vectorized
//! gemv kernel on a 1000-node matrix filled with `1/N`.

use std::time::{Duration, Instant};

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::error::RankError;
use crate::graph::{MAX_NODES, check_node_count};
use crate::iterate::validate_damping;
use crate::kernel::{StepKernel, checked_apply};

/// Results closer than this (Euclidean norm) count as numerically equivalent.
pub const EQUIVALENCE_TOLERANCE: f64 = 1e-9;

/// Benchmark parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Matrix dimension N. Default: 1000.
    pub nodes: usize,
    /// Damping factor. Default: 0.85.
    pub damping: f64,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            nodes: 1000,
            damping: 0.85,
        }
    }
}

impl BenchConfig {
    /// # Errors
    ///
    /// [`RankError::EmptyGraph`] for `nodes == 0`, [`RankError::TooManyNodes`]
    /// above [`MAX_NODES`], [`RankError::InvalidDamping`] for a damping factor
    /// outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), RankError> {
        check_node_count(self.nodes)?;
        validate_damping(self.damping)
    }
}

/// Dense `N×N` matrix and length-`N` vector, every entry `1/N`.
///
/// `nodes` is not checked here; [`compare_kernels`] runs
/// [`BenchConfig::validate`] first.
#[must_use]
pub fn uniform_fixture(nodes: usize) -> (DMatrix<f64>, DVector<f64>) {
    let value = 1.0 / nodes as f64;
    (
        DMatrix::from_element(nodes, nodes, value),
        DVector::from_element(nodes, value),
    )
}

/// Wall-clock time of one kernel invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepTiming {
    pub kernel: &'static str,
    pub elapsed: Duration,
}

/// Outcome of comparing two kernels on one step.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkReport {
    pub nodes: usize,
    pub damping: f64,
    pub baseline: StepTiming,
    pub candidate: StepTiming,
    /// Euclidean norm of `baseline_result − candidate_result`.
    pub diff_norm: f64,
}

impl BenchmarkReport {
    /// How many times faster the candidate ran; `None` if it took no
    /// measurable time.
    #[must_use]
    pub fn speedup(&self) -> Option<f64> {
        let candidate = self.candidate.elapsed.as_secs_f64();
        (candidate > 0.0).then(|| self.baseline.elapsed.as_secs_f64() / candidate)
    }

    #[must_use]
    pub fn is_equivalent(&self) -> bool {
        self.diff_norm < EQUIVALENCE_TOLERANCE
    }
}

/// Compare `baseline` and `candidate` on the uniform fixture.
///
/// # Errors
///
/// Propagates [`BenchConfig::validate`] failures.
#[instrument(skip(baseline, candidate), fields(baseline = baseline.name(), candidate = candidate.name()))]
pub fn compare_kernels(
    config: &BenchConfig,
    baseline: &dyn StepKernel,
    candidate: &dyn StepKernel,
) -> Result<BenchmarkReport, RankError> {
    config.validate()?;
    let (m, v) = uniform_fixture(config.nodes);

    let (baseline_out, baseline_timing) = time_step(baseline, &m, &v, config.damping)?;
    let (candidate_out, candidate_timing) = time_step(candidate, &m, &v, config.damping)?;

    let report = BenchmarkReport {
        nodes: config.nodes,
        damping: config.damping,
        baseline: baseline_timing,
        candidate: candidate_timing,
        diff_norm: (baseline_out - candidate_out).norm(),
    };

    if report.is_equivalent() {
        info!(
            diff_norm = report.diff_norm,
            speedup = ?report.speedup(),
            "kernels agree"
        );
    } else {
        warn!(
            diff_norm = report.diff_norm,
            tolerance = EQUIVALENCE_TOLERANCE,
            "kernel results diverge"
        );
    }

    Ok(report)
}

fn time_step(
    kernel: &dyn StepKernel,
    m: &DMatrix<f64>,
    v: &DVector<f64>,
    damping: f64,
) -> Result<(DVector<f64>, StepTiming), RankError> {
    let start = Instant::now();
    let out = checked_apply(kernel, m, v, damping)?;
    let timing = StepTiming {
        kernel: kernel.name(),
        elapsed: start.elapsed(),
    };
    Ok((out, timing))
}
