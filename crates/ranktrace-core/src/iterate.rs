//! Damped PageRank power iteration with a full convergence trace.
//!
//! # Algorithm
//!
//! ```text
//! v₀ = (1/N, …, 1/N)
//! v_k = α · (M · v_{k−1}) + (1 − α) / N     for k = 1..=K
//! ```
//!
//! where `M` is the dangling-corrected, column-stochastic
//! [`TransitionMatrix`] and `α` the damping factor (default 0.85).
//!
//! There is no tolerance-based early exit: the iterator always performs
//! exactly `K` steps and returns all `K + 1` vectors, so callers can observe
//! how fast the ranks settle.
//!
//! # Output
//!
//! A [`ConvergenceTrace`]. Every [`RankVector`] in it is a separate owned
//! value; recording a step never touches an earlier one.

use std::ops::Index;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::RankError;
use crate::graph::Graph;
use crate::kernel::{KernelKind, StepKernel, checked_apply};
use crate::transition::TransitionMatrix;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for a PageRank run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IterationConfig {
    /// Damping factor (probability of following a link vs teleporting).
    /// Default: 0.85.
    pub damping: f64,
    /// Number of update steps K. The trace holds `max_iter + 1` vectors.
    /// Default: 20.
    pub max_iter: usize,
    /// Kernel used for each update step.
    /// Default: vectorized.
    pub kernel: KernelKind,
}

impl Default for IterationConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            max_iter: 20,
            kernel: KernelKind::Vectorized,
        }
    }
}

impl IterationConfig {
    /// Validate the damping factor.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::InvalidDamping`] unless `damping` is finite and
    /// within `[0, 1]`.
    pub fn validate(&self) -> Result<(), RankError> {
        validate_damping(self.damping)
    }
}

/// Check that `damping` is a finite value in `[0, 1]`.
///
/// # Errors
///
/// Returns [`RankError::InvalidDamping`] otherwise.
pub fn validate_damping(damping: f64) -> Result<(), RankError> {
    if damping.is_finite() && (0.0..=1.0).contains(&damping) {
        Ok(())
    } else {
        Err(RankError::InvalidDamping(damping))
    }
}

// ---------------------------------------------------------------------------
// Rank vectors and traces
// ---------------------------------------------------------------------------

/// One rank distribution over the N nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct RankVector(DVector<f64>);

impl RankVector {
    /// The uniform vector `1/N` in every entry.
    #[must_use]
    pub fn uniform(nodes: usize) -> Self {
        Self(DVector::from_element(nodes, 1.0 / nodes as f64))
    }

    #[must_use]
    pub const fn from_dvector(values: DVector<f64>) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, node: usize) -> Option<f64> {
        self.0.get(node).copied()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        self.0.as_slice()
    }

    #[must_use]
    pub const fn as_dvector(&self) -> &DVector<f64> {
        &self.0
    }

    /// Total rank mass.
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.0.sum()
    }

    /// L1 distance to `other`.
    #[must_use]
    pub fn l1_distance(&self, other: &Self) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b).abs())
            .sum()
    }
}

impl Index<usize> for RankVector {
    type Output = f64;

    fn index(&self, node: usize) -> &f64 {
        &self.0[node]
    }
}

/// Every rank vector of a run, `v₀` first.
///
/// Never empty: a trace always starts with the uniform vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceTrace {
    vectors: Vec<RankVector>,
}

impl ConvergenceTrace {
    fn start(initial: RankVector, steps: usize) -> Self {
        let mut vectors = Vec::with_capacity(steps + 1);
        vectors.push(initial);
        Self { vectors }
    }

    fn record(&mut self, vector: RankVector) {
        self.vectors.push(vector);
    }

    /// Number of recorded vectors (`K + 1`).
    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Always `false`; present for API symmetry with [`Self::len`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Number of update steps performed (`K`).
    #[must_use]
    pub fn steps(&self) -> usize {
        self.vectors.len() - 1
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.vectors[0].len()
    }

    #[must_use]
    pub fn get(&self, iteration: usize) -> Option<&RankVector> {
        self.vectors.get(iteration)
    }

    /// The uniform starting vector `v₀`.
    #[must_use]
    pub fn initial(&self) -> &RankVector {
        &self.vectors[0]
    }

    /// The last vector `v_K`.
    #[must_use]
    pub fn final_ranks(&self) -> &RankVector {
        &self.vectors[self.vectors.len() - 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = &RankVector> {
        self.vectors.iter()
    }

    /// Rank of `node` at every iteration, for plotting one curve.
    ///
    /// # Panics
    ///
    /// Panics if `node >= self.node_count()`.
    #[must_use]
    pub fn series(&self, node: usize) -> Vec<f64> {
        self.vectors.iter().map(|v| v[node]).collect()
    }

    /// L1 change between consecutive vectors; `deltas()[k]` is `|v_{k+1} − v_k|₁`.
    #[must_use]
    pub fn deltas(&self) -> Vec<f64> {
        self.vectors
            .windows(2)
            .map(|w| w[0].l1_distance(&w[1]))
            .collect()
    }

    /// Node indices by final rank, highest first; ties keep ascending index.
    #[must_use]
    pub fn ranking(&self) -> Vec<usize> {
        let last = self.final_ranks();
        let mut order: Vec<usize> = (0..last.len()).collect();
        order.sort_by(|&a, &b| last[b].total_cmp(&last[a]).then(a.cmp(&b)));
        order
    }
}

impl<'a> IntoIterator for &'a ConvergenceTrace {
    type Item = &'a RankVector;
    type IntoIter = std::slice::Iter<'a, RankVector>;

    fn into_iter(self) -> Self::IntoIter {
        self.vectors.iter()
    }
}

// ---------------------------------------------------------------------------
// Iterator
// ---------------------------------------------------------------------------

/// Damped power iteration over a fixed graph.
#[derive(Debug, Clone)]
pub struct RankIterator {
    transition: TransitionMatrix,
    config: IterationConfig,
}

impl RankIterator {
    /// Derive the transition matrix for `graph` and validate `config`.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::InvalidDamping`] for a damping factor outside
    /// `[0, 1]` or a non-finite one.
    pub fn new(graph: &Graph, config: IterationConfig) -> Result<Self, RankError> {
        config.validate()?;
        Ok(Self {
            transition: TransitionMatrix::from_graph(graph),
            config,
        })
    }

    #[must_use]
    pub const fn transition(&self) -> &TransitionMatrix {
        &self.transition
    }

    #[must_use]
    pub const fn config(&self) -> &IterationConfig {
        &self.config
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.transition.dimension()
    }

    /// Apply one update step to `v` with the configured kernel.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::DimensionMismatch`] if `v.len()` differs from
    /// the node count.
    pub fn step(&self, v: &RankVector) -> Result<RankVector, RankError> {
        checked_apply(
            self.config.kernel.kernel(),
            self.transition.matrix(),
            &v.0,
            self.config.damping,
        )
        .map(RankVector)
    }

    // Vectors produced by this iterator always match the node count.
    fn advance(&self, kernel: &dyn StepKernel, v: &RankVector) -> RankVector {
        RankVector(kernel.apply(self.transition.matrix(), &v.0, self.config.damping))
    }

    /// Run all `max_iter` steps with the configured kernel.
    #[must_use]
    pub fn run(&self) -> ConvergenceTrace {
        self.run_with(self.config.kernel.kernel())
    }

    /// Run all `max_iter` steps with an explicit kernel.
    #[must_use]
    #[instrument(skip(self, kernel), fields(kernel = kernel.name(), nodes = self.node_count()))]
    pub fn run_with(&self, kernel: &dyn StepKernel) -> ConvergenceTrace {
        let steps = self.config.max_iter;
        let mut trace = ConvergenceTrace::start(RankVector::uniform(self.node_count()), steps);
        let mut current = trace.initial().clone();

        for k in 1..=steps {
            let next = self.advance(kernel, &current);
            debug!(step = k, delta = next.l1_distance(&current), "rank step");
            trace.record(next.clone());
            current = next;
        }

        info!(
            steps,
            damping = self.config.damping,
            final_delta = trace.deltas().last().copied().unwrap_or(0.0),
            "PageRank trace complete"
        );

        trace
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::NaiveKernel;

    fn default_config() -> IterationConfig {
        IterationConfig::default()
    }

    fn king_trace() -> ConvergenceTrace {
        RankIterator::new(&Graph::king(), default_config())
            .expect("valid config")
            .run()
    }

    #[test]
    fn trace_starts_uniform() {
        let trace = king_trace();
        assert_eq!(trace.initial().as_slice(), &[0.25, 0.25, 0.25, 0.25]);
    }

    #[test]
    fn trace_has_one_vector_per_step_plus_initial() {
        let trace = king_trace();
        assert_eq!(trace.len(), 21);
        assert_eq!(trace.steps(), 20);
        assert_eq!(trace.deltas().len(), 20);
        assert!(!trace.is_empty());
    }

    #[test]
    fn zero_steps_returns_only_initial() {
        let config = IterationConfig {
            max_iter: 0,
            ..default_config()
        };
        let trace = RankIterator::new(&Graph::king(), config)
            .expect("valid")
            .run();
        assert_eq!(trace.len(), 1);
        assert_eq!(trace.final_ranks(), trace.initial());
        assert!(trace.deltas().is_empty());
    }

    #[test]
    fn first_step_matches_hand_computation() {
        // v1[B] = 0.85 * (0.25 * 3 + 0.25 / 4) + 0.15 / 4
        // v1[other] = 0.85 * (0.25 / 4) + 0.15 / 4
        let trace = king_trace();
        let v1 = trace.get(1).expect("step 1");
        let b = 0.85_f64.mul_add(0.75 + 0.0625, 0.0375);
        let other = 0.85_f64.mul_add(0.0625, 0.0375);
        assert!((v1[1] - b).abs() < 1e-12, "B: {}", v1[1]);
        for node in [0, 2, 3] {
            assert!((v1[node] - other).abs() < 1e-12);
        }
    }

    #[test]
    fn every_step_conserves_mass() {
        for v in &king_trace() {
            assert!((v.sum() - 1.0).abs() < 1e-9, "sum {}", v.sum());
        }
    }

    #[test]
    fn king_node_ranks_highest() {
        let trace = king_trace();
        assert_eq!(trace.ranking()[0], 1);
        // A, C and D are symmetric.
        let last = trace.final_ranks();
        assert!((last[0] - last[2]).abs() < 1e-15);
        assert!((last[2] - last[3]).abs() < 1e-15);
    }

    #[test]
    fn ranking_breaks_ties_by_index() {
        let graph = Graph::from_edges(3, &[]).expect("valid");
        let trace = RankIterator::new(&graph, default_config())
            .expect("valid")
            .run();
        assert_eq!(trace.ranking(), vec![0, 1, 2]);
    }

    #[test]
    fn single_node_keeps_all_mass() {
        let graph = Graph::from_edges(1, &[]).expect("valid");
        let trace = RankIterator::new(&graph, default_config())
            .expect("valid")
            .run();
        for v in &trace {
            assert!((v[0] - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn run_with_naive_matches_vectorized() {
        let iterator = RankIterator::new(&Graph::king(), default_config()).expect("valid");
        let fast = iterator.run();
        let slow = iterator.run_with(&NaiveKernel);
        for (a, b) in fast.iter().zip(slow.iter()) {
            assert!(a.l1_distance(b) < 1e-12);
        }
    }

    #[test]
    fn series_follows_one_node() {
        let trace = king_trace();
        let b = trace.series(1);
        assert_eq!(b.len(), 21);
        assert!((b[0] - 0.25).abs() < f64::EPSILON);
        assert!((b[20] - trace.final_ranks()[1]).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_damping_is_rejected() {
        for damping in [-0.1, 1.1, f64::NAN, f64::INFINITY] {
            let config = IterationConfig {
                damping,
                ..default_config()
            };
            let err = RankIterator::new(&Graph::king(), config).expect_err("invalid damping");
            assert!(matches!(err, RankError::InvalidDamping(_)));
        }
    }

    #[test]
    fn step_uses_configured_kernel() {
        let config = IterationConfig {
            kernel: KernelKind::Parallel,
            ..default_config()
        };
        let iterator = RankIterator::new(&Graph::king(), config).expect("valid");
        let v1 = iterator.step(&RankVector::uniform(4)).expect("matching length");
        let trace = iterator.run();
        assert!(v1.l1_distance(trace.get(1).expect("step 1")) < 1e-15);
    }

    #[test]
    fn step_rejects_wrong_length_vector() {
        let iterator = RankIterator::new(&Graph::king(), default_config()).expect("valid");
        assert_eq!(
            iterator.step(&RankVector::uniform(3)),
            Err(RankError::DimensionMismatch {
                rows: 4,
                cols: 4,
                vector: 3
            })
        );
    }
}
