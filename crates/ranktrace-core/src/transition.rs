//! Dangling-corrected transition matrix.
//!
//! # Algorithm
//!
//! For every source row `i` of the adjacency matrix:
//!
//! ```text
//! P[i, j] = A[i, j] / out_degree(i)     if out_degree(i) > 0
//! P[i, j] = 1 / N                       otherwise (dangling node)
//! ```
//!
//! `P` is row-stochastic: each row sums to 1. The iteration uses its
//! transpose `M = Pᵀ`, where `M[j, i]` is the probability mass node `i`
//! sends to node `j`, so each column of `M` sums to 1.
//!
//! The dangling branch is what keeps rank mass from leaking out of the
//! system, and it also means no row is ever divided by zero.

use nalgebra::DMatrix;
use tracing::{debug, instrument};

use crate::graph::Graph;

/// Tolerance used when checking row sums of the stochastic matrix.
pub const STOCHASTIC_TOLERANCE: f64 = 1e-9;

/// Row-stochastic matrix and its column-stochastic transpose.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionMatrix {
    stochastic: DMatrix<f64>,
    column: DMatrix<f64>,
    dangling: Vec<usize>,
}

impl TransitionMatrix {
    /// Derive the transition matrix from `graph`.
    #[must_use]
    #[instrument(skip(graph), fields(nodes = graph.node_count()))]
    pub fn from_graph(graph: &Graph) -> Self {
        let n = graph.node_count();
        let uniform = 1.0 / n as f64;
        let mut stochastic = DMatrix::zeros(n, n);
        let mut dangling = Vec::new();

        for i in 0..n {
            let out_degree = graph.out_degree(i);
            if out_degree == 0 {
                // Dangling node: spread its mass over every node, itself included.
                stochastic.row_mut(i).fill(uniform);
                dangling.push(i);
            } else {
                let share = 1.0 / out_degree as f64;
                for j in 0..n {
                    if graph.has_edge(i, j) {
                        stochastic[(i, j)] = share;
                    }
                }
            }
        }

        debug!(dangling = dangling.len(), "built transition matrix");

        let column = stochastic.transpose();
        Self {
            stochastic,
            column,
            dangling,
        }
    }

    /// Dimension N.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.column.nrows()
    }

    /// The column-stochastic matrix `M` used by the update rule.
    #[must_use]
    pub const fn matrix(&self) -> &DMatrix<f64> {
        &self.column
    }

    /// The row-stochastic matrix before transposition.
    #[must_use]
    pub const fn stochastic(&self) -> &DMatrix<f64> {
        &self.stochastic
    }

    /// Outgoing distribution of `node` (row `node` of the pre-transpose matrix).
    ///
    /// # Panics
    ///
    /// Panics if `node >= self.dimension()`.
    #[must_use]
    pub fn row_distribution(&self, node: usize) -> Vec<f64> {
        self.stochastic.row(node).iter().copied().collect()
    }

    /// Sum of row `node` of the pre-transpose matrix.
    ///
    /// # Panics
    ///
    /// Panics if `node >= self.dimension()`.
    #[must_use]
    pub fn row_sum(&self, node: usize) -> f64 {
        self.stochastic.row(node).sum()
    }

    /// Whether every pre-transpose row sums to 1 within `tolerance`.
    #[must_use]
    pub fn is_stochastic(&self, tolerance: f64) -> bool {
        (0..self.dimension()).all(|i| (self.row_sum(i) - 1.0).abs() <= tolerance)
    }

    /// Nodes whose rows were replaced by the uniform distribution.
    #[must_use]
    pub fn dangling_nodes(&self) -> &[usize] {
        &self.dangling
    }
}
