//! Single damped update step, computed several ways.
//!
//! Every kernel evaluates the same expression for a square `M` of dimension
//! `N` and a rank vector `v` of length `N`:
//!
//! ```text
//! v' = α · (M · v) + (1 − α) / N
//! ```
//!
//! The `(1 − α) / N` teleportation term is added to every node equally.
//!
//! | Kernel | Strategy |
//! |--------|----------|
//! | [`NaiveKernel`] | row-major nested loops, natural index order |
//! | [`VectorizedKernel`] | `nalgebra` gemv |
//! | [`ParallelKernel`] | one dot product per row on the `rayon` pool |
//!
//! Kernels only differ in floating-point summation order, so their results
//! agree to within normal rounding error.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::RankError;

/// One strategy for computing a damped update step.
pub trait StepKernel: Send + Sync {
    /// Stable name used in logs and benchmark reports.
    fn name(&self) -> &'static str;

    /// Compute `α · (M · v) + (1 − α) / N`.
    ///
    /// Callers must pass a square `m` whose dimension equals `v.len()`; use
    /// [`checked_apply`] when that is not already guaranteed.
    fn apply(&self, m: &DMatrix<f64>, v: &DVector<f64>, damping: f64) -> DVector<f64>;
}

/// Uniform teleportation term `(1 − α) / N`.
#[must_use]
pub fn teleport(nodes: usize, damping: f64) -> f64 {
    (1.0 - damping) / nodes as f64
}

/// Run `kernel` after checking that `m` is square and matches `v`.
///
/// # Errors
///
/// Returns [`RankError::DimensionMismatch`] on any shape disagreement.
pub fn checked_apply(
    kernel: &dyn StepKernel,
    m: &DMatrix<f64>,
    v: &DVector<f64>,
    damping: f64,
) -> Result<DVector<f64>, RankError> {
    if m.nrows() != m.ncols() || m.ncols() != v.len() {
        return Err(RankError::DimensionMismatch {
            rows: m.nrows(),
            cols: m.ncols(),
            vector: v.len(),
        });
    }
    Ok(kernel.apply(m, v, damping))
}

/// Row-major nested-loop accumulation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaiveKernel;

impl StepKernel for NaiveKernel {
    fn name(&self) -> &'static str {
        "naive"
    }

    fn apply(&self, m: &DMatrix<f64>, v: &DVector<f64>, damping: f64) -> DVector<f64> {
        let n = v.len();
        let base = teleport(n, damping);
        let mut next = DVector::zeros(n);
        for i in 0..n {
            let mut dot = 0.0;
            for j in 0..n {
                dot += m[(i, j)] * v[j];
            }
            next[i] = damping * dot + base;
        }
        next
    }
}

/// Library matrix-vector product.
#[derive(Debug, Clone, Copy, Default)]
pub struct VectorizedKernel;

impl StepKernel for VectorizedKernel {
    fn name(&self) -> &'static str {
        "vectorized"
    }

    fn apply(&self, m: &DMatrix<f64>, v: &DVector<f64>, damping: f64) -> DVector<f64> {
        let n = v.len();
        let mut next = DVector::from_element(n, teleport(n, damping));
        // next = damping * (m * v) + 1.0 * next
        next.gemv(damping, m, v, 1.0);
        next
    }
}

/// Rows computed independently on the `rayon` thread pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParallelKernel;

impl StepKernel for ParallelKernel {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn apply(&self, m: &DMatrix<f64>, v: &DVector<f64>, damping: f64) -> DVector<f64> {
        let n = v.len();
        let base = teleport(n, damping);
        let rows: Vec<f64> = (0..n)
            .into_par_iter()
            .map(|i| {
                let dot: f64 = m.row(i).iter().zip(v.iter()).map(|(a, b)| a * b).sum();
                damping * dot + base
            })
            .collect();
        DVector::from_vec(rows)
    }
}

static NAIVE: NaiveKernel = NaiveKernel;
static VECTORIZED: VectorizedKernel = VectorizedKernel;
static PARALLEL: ParallelKernel = ParallelKernel;

/// Kernel selector used by configuration and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelKind {
    Naive,
    #[default]
    Vectorized,
    Parallel,
}

impl KernelKind {
    /// Every selectable kernel.
    pub const ALL: [Self; 3] = [Self::Naive, Self::Vectorized, Self::Parallel];

    #[must_use]
    pub fn kernel(self) -> &'static dyn StepKernel {
        match self {
            Self::Naive => &NAIVE,
            Self::Vectorized => &VECTORIZED,
            Self::Parallel => &PARALLEL,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        self.kernel().name()
    }
}
