//! Dense adjacency-matrix graph.
//!
//! # Overview
//!
//! A [`Graph`] is an N×N matrix over node indices `0..N`, where entry
//! `(i, j)` is `1.0` when node `i` links to node `j` and `0.0` otherwise.
//! Edges are unweighted: repeated edges collapse into a single entry.
//!
//! The node count is fixed at construction and the matrix is never mutated
//! afterwards. Every constructor rejects an empty graph, so downstream code
//! can rely on `N >= 1`.
//!
//! # Construction
//!
//! - [`Graph::from_rows`]: explicit 0/1 rows, validated for squareness.
//! - [`Graph::from_edges`]: node count plus `(from, to)` index pairs.
//! - [`Graph::from_digraph`]: any `petgraph` [`DiGraph`], labels taken from
//!   node weights.

use std::fmt::Display;

use nalgebra::DMatrix;
use petgraph::graph::DiGraph;
use petgraph::visit::EdgeRef;

use crate::error::RankError;

/// Largest node count accepted by any constructor. The dense adjacency and
/// transition matrices hold `N²` entries each.
pub const MAX_NODES: usize = 16_384;

/// Check that `nodes` is in `1..=MAX_NODES`.
///
/// # Errors
///
/// [`RankError::EmptyGraph`] for zero, [`RankError::TooManyNodes`] above
/// [`MAX_NODES`].
pub fn check_node_count(nodes: usize) -> Result<(), RankError> {
    if nodes == 0 {
        return Err(RankError::EmptyGraph);
    }
    if nodes > MAX_NODES || nodes.checked_mul(nodes).is_none() {
        return Err(RankError::TooManyNodes {
            nodes,
            max: MAX_NODES,
        });
    }
    Ok(())
}

/// Immutable N×N adjacency matrix with per-node display labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    adjacency: DMatrix<f64>,
    labels: Vec<String>,
}

impl Graph {
    /// Build a graph from explicit adjacency rows.
    ///
    /// # Errors
    ///
    /// - [`RankError::EmptyGraph`] if `rows` is empty.
    /// - [`RankError::TooManyNodes`] above [`MAX_NODES`] rows.
    /// - [`RankError::NotSquare`] if any row length differs from `rows.len()`.
    /// - [`RankError::InvalidEntry`] if any entry is neither 0 nor 1.
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self, RankError> {
        let n = rows.len();
        check_node_count(n)?;

        let mut adjacency = DMatrix::zeros(n, n);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != n {
                return Err(RankError::NotSquare {
                    row: i,
                    expected: n,
                    found: row.len(),
                });
            }
            for (j, &value) in row.iter().enumerate() {
                match value {
                    0 => {}
                    1 => adjacency[(i, j)] = 1.0,
                    _ => {
                        return Err(RankError::InvalidEntry {
                            row: i,
                            col: j,
                            value,
                        });
                    }
                }
            }
        }

        Ok(Self::with_default_labels(adjacency))
    }

    /// Build a graph with `nodes` nodes from `(from, to)` index pairs.
    ///
    /// # Errors
    ///
    /// - [`RankError::EmptyGraph`] if `nodes == 0`.
    /// - [`RankError::TooManyNodes`] if `nodes > MAX_NODES`.
    /// - [`RankError::EdgeOutOfRange`] if an endpoint is `>= nodes`.
    pub fn from_edges(nodes: usize, edges: &[(usize, usize)]) -> Result<Self, RankError> {
        check_node_count(nodes)?;

        let mut adjacency = DMatrix::zeros(nodes, nodes);
        for &(from, to) in edges {
            if from >= nodes || to >= nodes {
                return Err(RankError::EdgeOutOfRange { from, to, nodes });
            }
            adjacency[(from, to)] = 1.0;
        }

        Ok(Self::with_default_labels(adjacency))
    }

    /// Build a graph from a `petgraph` digraph.
    ///
    /// Node indices follow the digraph's own indices; labels are the
    /// `Display` form of each node weight.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::EmptyGraph`] if the digraph has no nodes and
    /// [`RankError::TooManyNodes`] if it has more than [`MAX_NODES`].
    pub fn from_digraph<N: Display, E>(digraph: &DiGraph<N, E>) -> Result<Self, RankError> {
        let n = digraph.node_count();
        check_node_count(n)?;

        let mut adjacency = DMatrix::zeros(n, n);
        for edge in digraph.edge_references() {
            adjacency[(edge.source().index(), edge.target().index())] = 1.0;
        }

        let labels = digraph
            .node_indices()
            .map(|idx| digraph[idx].to_string())
            .collect();

        Ok(Self { adjacency, labels })
    }

    /// The four-page network used throughout the docs and the CLI defaults.
    ///
    /// `A → B`, `C → B`, `D → B`; `B` links nowhere (dangling) and collects
    /// every non-dangling link.
    #[must_use]
    pub fn king() -> Self {
        let mut adjacency = DMatrix::zeros(4, 4);
        for from in [0, 2, 3] {
            adjacency[(from, 1)] = 1.0;
        }
        Self {
            adjacency,
            labels: ["A", "B", "C", "D"].map(String::from).to_vec(),
        }
    }

    /// Replace the node labels.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::LabelCount`] unless there is one label per node.
    pub fn with_labels(mut self, labels: Vec<String>) -> Result<Self, RankError> {
        if labels.len() != self.node_count() {
            return Err(RankError::LabelCount {
                expected: self.node_count(),
                found: labels.len(),
            });
        }
        self.labels = labels;
        Ok(self)
    }

    fn with_default_labels(adjacency: DMatrix<f64>) -> Self {
        let labels = (0..adjacency.nrows()).map(|i| i.to_string()).collect();
        Self { adjacency, labels }
    }

    /// Number of nodes N (always at least 1).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.adjacency.nrows()
    }

    /// Number of distinct edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().filter(|&&a| a > 0.0).count()
    }

    /// The raw 0/1 adjacency matrix.
    #[must_use]
    pub const fn adjacency(&self) -> &DMatrix<f64> {
        &self.adjacency
    }

    #[must_use]
    pub fn has_edge(&self, from: usize, to: usize) -> bool {
        from < self.node_count() && to < self.node_count() && self.adjacency[(from, to)] > 0.0
    }

    /// Number of outgoing links from `node`.
    #[must_use]
    pub fn out_degree(&self, node: usize) -> usize {
        self.adjacency
            .row(node)
            .iter()
            .filter(|&&a| a > 0.0)
            .count()
    }

    /// Whether `node` has no outgoing links.
    #[must_use]
    pub fn is_dangling(&self, node: usize) -> bool {
        self.out_degree(node) == 0
    }

    /// Indices of every dangling node, ascending.
    #[must_use]
    pub fn dangling_nodes(&self) -> Vec<usize> {
        (0..self.node_count())
            .filter(|&i| self.is_dangling(i))
            .collect()
    }

    #[must_use]
    pub fn label(&self, node: usize) -> Option<&str> {
        self.labels.get(node).map(String::as_str)
    }

    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_rejects_empty() {
        let rows: [[u8; 0]; 0] = [];
        assert_eq!(Graph::from_rows(&rows), Err(RankError::EmptyGraph));
    }

    #[test]
    fn from_rows_rejects_ragged_rows() {
        let rows: Vec<Vec<u8>> = vec![vec![0, 1], vec![0]];
        assert_eq!(
            Graph::from_rows(&rows),
            Err(RankError::NotSquare {
                row: 1,
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn from_rows_rejects_weighted_entries() {
        let rows = [[0_u8, 2], [0, 0]];
        assert_eq!(
            Graph::from_rows(&rows),
            Err(RankError::InvalidEntry {
                row: 0,
                col: 1,
                value: 2
            })
        );
    }

    #[test]
    fn from_rows_matches_king_graph() {
        let rows = [[0_u8, 1, 0, 0], [0, 0, 0, 0], [0, 1, 0, 0], [0, 1, 0, 0]];
        let graph = Graph::from_rows(&rows).expect("valid rows");
        assert_eq!(graph.adjacency(), Graph::king().adjacency());
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn from_edges_collapses_parallel_edges() {
        let graph = Graph::from_edges(2, &[(0, 1), (0, 1)]).expect("valid edges");
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.out_degree(0), 1);
    }

    #[test]
    fn from_edges_rejects_out_of_range() {
        assert_eq!(
            Graph::from_edges(2, &[(0, 2)]),
            Err(RankError::EdgeOutOfRange {
                from: 0,
                to: 2,
                nodes: 2
            })
        );
        assert_eq!(Graph::from_edges(0, &[]), Err(RankError::EmptyGraph));
    }

    #[test]
    fn node_count_is_bounded() {
        assert_eq!(check_node_count(1), Ok(()));
        assert_eq!(check_node_count(MAX_NODES), Ok(()));
        assert_eq!(check_node_count(0), Err(RankError::EmptyGraph));
        for nodes in [MAX_NODES + 1, 5_000_000_001, usize::MAX] {
            assert_eq!(
                Graph::from_edges(nodes, &[]),
                Err(RankError::TooManyNodes {
                    nodes,
                    max: MAX_NODES
                })
            );
        }
    }

    #[test]
    fn king_graph_has_single_dangling_node() {
        let graph = Graph::king();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.dangling_nodes(), vec![1]);
        assert_eq!(graph.label(1), Some("B"));
        assert!(graph.has_edge(3, 1));
        assert!(!graph.has_edge(1, 3));
        assert!(!graph.has_edge(9, 1));
    }

    #[test]
    fn from_digraph_uses_node_weights_as_labels() {
        let mut dg = DiGraph::<&str, ()>::new();
        let a = dg.add_node("alpha");
        let b = dg.add_node("beta");
        dg.add_edge(a, b, ());
        dg.add_edge(b, a, ());

        let graph = Graph::from_digraph(&dg).expect("non-empty digraph");
        assert_eq!(graph.labels(), ["alpha".to_string(), "beta".to_string()]);
        assert!(graph.has_edge(0, 1));
        assert!(graph.has_edge(1, 0));
        assert!(graph.dangling_nodes().is_empty());
    }

    #[test]
    fn with_labels_checks_count() {
        let graph = Graph::from_edges(2, &[]).expect("valid");
        assert_eq!(graph.label(0), Some("0"));
        let err = graph
            .clone()
            .with_labels(vec!["only".to_string()])
            .expect_err("one label for two nodes");
        assert_eq!(
            err,
            RankError::LabelCount {
                expected: 2,
                found: 1
            }
        );
        let relabeled = graph
            .with_labels(vec!["x".to_string(), "y".to_string()])
            .expect("matching count");
        assert_eq!(relabeled.label(1), Some("y"));
    }
}
