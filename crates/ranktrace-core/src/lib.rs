#![forbid(unsafe_code)]
//! ranktrace-core library.
//!
//! Damped PageRank power iteration over a small dense graph, recording every
//! intermediate rank vector so the approach to the fixed point can be
//! inspected or plotted.
//!
//! # Conventions
//!
//! - **Errors**: [`error::RankError`] for precondition violations in the
//!   numeric core; `anyhow::Result` for configuration loading.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).
//!
//! # Example
//!
//! ```rust
//! use ranktrace_core::graph::Graph;
//! use ranktrace_core::iterate::{IterationConfig, RankIterator};
//!
//! let graph = Graph::from_edges(4, &[(0, 1), (2, 1), (3, 1)])?;
//! let iterator = RankIterator::new(&graph, IterationConfig::default())?;
//! let trace = iterator.run();
//!
//! assert_eq!(trace.len(), 21);
//! assert_eq!(trace.ranking()[0], 1);
//! # Ok::<(), ranktrace_core::error::RankError>(())
//! ```

pub mod bench;
pub mod config;
pub mod error;
pub mod graph;
pub mod iterate;
pub mod kernel;
pub mod transition;

pub use error::RankError;
pub use graph::Graph;
pub use iterate::{ConvergenceTrace, IterationConfig, RankIterator, RankVector};
pub use kernel::{KernelKind, StepKernel};
pub use transition::TransitionMatrix;
