use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::bench::BenchConfig;
use crate::error::RankError;
use crate::graph::Graph;
use crate::iterate::IterationConfig;

/// Default config file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "ranktrace.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub iteration: IterationConfig,
    #[serde(default)]
    pub bench: BenchConfig,
    /// Custom graph; the built-in four-page network when absent.
    #[serde(default)]
    pub graph: Option<GraphConfig>,
    #[serde(default)]
    pub chart: ChartSettings,
}

impl Config {
    /// Build the configured graph, or [`Graph::king`] when none is set.
    ///
    /// # Errors
    ///
    /// Propagates [`GraphConfig::build`] failures.
    pub fn graph(&self) -> Result<Graph, RankError> {
        self.graph
            .as_ref()
            .map_or_else(|| Ok(Graph::king()), GraphConfig::build)
    }

    /// Whether a custom `[graph]` section was supplied.
    #[must_use]
    pub const fn has_custom_graph(&self) -> bool {
        self.graph.is_some()
    }
}

/// `[graph]` section: node count, edges and optional labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Node count. Inferred from the largest edge endpoint when omitted.
    #[serde(default)]
    pub nodes: Option<usize>,
    #[serde(default)]
    pub edges: Vec<(usize, usize)>,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
}

impl GraphConfig {
    /// # Errors
    ///
    /// Returns the [`RankError`] raised by [`Graph::from_edges`] or
    /// [`Graph::with_labels`]. An inferred node count above
    /// [`crate::graph::MAX_NODES`] is [`RankError::TooManyNodes`].
    pub fn build(&self) -> Result<Graph, RankError> {
        let nodes = self.nodes.unwrap_or_else(|| {
            self.edges
                .iter()
                .map(|&(from, to)| from.max(to).saturating_add(1))
                .max()
                .or_else(|| self.labels.as_ref().map(Vec::len))
                .unwrap_or(0)
        });
        let graph = Graph::from_edges(nodes, &self.edges)?;
        match &self.labels {
            Some(labels) => graph.with_labels(labels.clone()),
            None => Ok(graph),
        }
    }
}

/// `[chart]` section: overrides for the convergence chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSettings {
    #[serde(default = "default_title")]
    pub title: String,
    /// Draw the convergence marker line.
    #[serde(default = "default_true")]
    pub show_threshold: bool,
    /// Iteration at which the convergence marker line is drawn.
    #[serde(default = "default_threshold_iteration")]
    pub threshold_iteration: usize,
    #[serde(default = "default_threshold_annotation")]
    pub threshold_annotation: String,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            title: default_title(),
            show_threshold: default_true(),
            threshold_iteration: default_threshold_iteration(),
            threshold_annotation: default_threshold_annotation(),
        }
    }
}

fn default_title() -> String {
    "PageRank Convergence Process".to_string()
}

const fn default_true() -> bool {
    true
}

const fn default_threshold_iteration() -> usize {
    10
}

fn default_threshold_annotation() -> String {
    "Convergence Area".to_string()
}

/// Load and parse a config file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid TOML for
/// [`Config`].
pub fn load_config(path: &Path) -> Result<Config> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("Failed to parse config {}", path.display()))
}

/// Load `path` if given, else `ranktrace.toml` in `dir` if it exists, else defaults.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be read or parsed.
pub fn resolve_config(path: Option<&Path>, dir: &Path) -> Result<Config> {
    if let Some(path) = path {
        return load_config(path);
    }
    let candidate = dir.join(DEFAULT_CONFIG_FILE);
    if candidate.is_file() {
        load_config(&candidate)
    } else {
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::KernelKind;
    use std::fs;

    #[test]
    fn defaults_reproduce_reference_run() {
        let config = Config::default();
        assert!((config.iteration.damping - 0.85).abs() < f64::EPSILON);
        assert_eq!(config.iteration.max_iter, 20);
        assert_eq!(config.bench.nodes, 1000);
        assert_eq!(config.chart.threshold_iteration, 10);
        assert!(config.chart.show_threshold);
        assert_eq!(config.graph().expect("built-in graph"), Graph::king());
        assert!(!config.has_custom_graph());
    }

    #[test]
    fn empty_file_parses_to_defaults() {
        let config: Config = toml::from_str("").expect("empty config");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [iteration]
            max_iter = 5
            kernel = "naive"

            [chart]
            title = "Custom"
            "#,
        )
        .expect("valid config");
        assert_eq!(config.iteration.max_iter, 5);
        assert_eq!(config.iteration.kernel, KernelKind::Naive);
        assert!((config.iteration.damping - 0.85).abs() < f64::EPSILON);
        assert_eq!(config.chart.title, "Custom");
        assert_eq!(config.chart.threshold_annotation, "Convergence Area");
    }

    #[test]
    fn graph_section_builds_labeled_graph() {
        let config: Config = toml::from_str(
            r#"
            [graph]
            edges = [[0, 1], [1, 2]]
            labels = ["x", "y", "z"]
            "#,
        )
        .expect("valid config");
        let graph = config.graph().expect("valid graph");
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.label(2), Some("z"));
        assert_eq!(graph.dangling_nodes(), vec![2]);
    }

    #[test]
    fn graph_section_reports_bad_edges() {
        let config: Config = toml::from_str(
            r"
            [graph]
            nodes = 2
            edges = [[0, 5]]
            ",
        )
        .expect("valid toml");
        assert!(matches!(
            config.graph(),
            Err(RankError::EdgeOutOfRange { to: 5, .. })
        ));
    }

    #[test]
    fn huge_inferred_node_count_is_an_error() {
        let config: Config =
            toml::from_str("[graph]\nedges = [[0, 5000000000]]\n").expect("valid toml");
        assert_eq!(
            config.graph(),
            Err(RankError::TooManyNodes {
                nodes: 5_000_000_001,
                max: crate::graph::MAX_NODES
            })
        );
    }

    #[test]
    fn empty_graph_section_is_rejected() {
        let config: Config = toml::from_str("[graph]\n").expect("valid toml");
        assert_eq!(config.graph(), Err(RankError::EmptyGraph));
    }

    #[test]
    fn resolve_prefers_explicit_path_then_directory_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(
            resolve_config(None, dir.path()).expect("defaults"),
            Config::default()
        );

        fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "[iteration]\nmax_iter = 3\n",
        )
        .expect("write");
        let found = resolve_config(None, dir.path()).expect("directory config");
        assert_eq!(found.iteration.max_iter, 3);

        let explicit = dir.path().join("other.toml");
        fs::write(&explicit, "[bench]\nnodes = 7\n").expect("write");
        let loaded = resolve_config(Some(&explicit), dir.path()).expect("explicit config");
        assert_eq!(loaded.bench.nodes, 7);
        assert_eq!(loaded.iteration.max_iter, 20);
    }

    #[test]
    fn load_reports_path_on_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[iteration\n").expect("write");
        let err = load_config(&path).expect_err("invalid toml");
        assert!(format!("{err}").contains("bad.toml"));
    }
}
