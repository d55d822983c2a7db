//! `ranktrace converge`: run the PageRank iteration and draw the trace.

use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use ranktrace_core::config::Config;
use ranktrace_core::iterate::RankIterator;
use serde::Serialize;
use tracing::debug;

use super::KernelArg;
use crate::output::{OutputMode, emit, field, heading};
use crate::render::{
    ChartData, SVG_SIZE, chart_data, render_svg, write_legend, write_table, write_tsv,
};

/// Arguments for `ranktrace converge`.
#[derive(Args, Debug, Default)]
pub struct ConvergeArgs {
    /// Damping factor in [0, 1] (default: 0.85).
    #[arg(long)]
    pub damping: Option<f64>,

    /// Number of update steps; the trace holds one more vector (default: 20).
    #[arg(short = 'k', long)]
    pub iterations: Option<usize>,

    /// Kernel used for each update step (default: vectorized).
    #[arg(long, value_enum)]
    pub kernel: Option<KernelArg>,
}

#[derive(Debug, Serialize)]
struct NodeRank {
    node: usize,
    label: String,
    rank: f64,
}

/// JSON output for `ranktrace converge`.
#[derive(Debug, Serialize)]
struct ConvergeOutput {
    nodes: usize,
    damping: f64,
    steps: usize,
    kernel: &'static str,
    /// Final ranks, highest first.
    ranking: Vec<NodeRank>,
    chart: ChartData,
}

pub fn run_converge(args: &ConvergeArgs, config: &Config, mode: OutputMode) -> Result<()> {
    let mut iteration = config.iteration;
    if let Some(damping) = args.damping {
        iteration.damping = damping;
    }
    if let Some(steps) = args.iterations {
        iteration.max_iter = steps;
    }
    if let Some(kernel) = args.kernel {
        iteration.kernel = kernel.into();
    }

    let graph = config.graph()?;
    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        custom = config.has_custom_graph(),
        "graph ready"
    );

    let iterator = RankIterator::new(&graph, iteration)?;
    let trace = iterator.run();
    let final_ranks = trace.final_ranks();

    let output = ConvergeOutput {
        nodes: graph.node_count(),
        damping: iteration.damping,
        steps: trace.steps(),
        kernel: iteration.kernel.name(),
        ranking: trace
            .ranking()
            .into_iter()
            .map(|node| NodeRank {
                node,
                label: graph.label(node).unwrap_or_default().to_string(),
                rank: final_ranks[node],
            })
            .collect(),
        chart: chart_data(&trace, &graph, &config.chart),
    };

    if mode == OutputMode::Svg {
        let svg = render_svg(&output.chart, SVG_SIZE)?;
        let mut out = io::stdout().lock();
        out.write_all(svg.as_bytes())?;
        writeln!(out)?;
        return Ok(());
    }

    emit(
        mode,
        &output,
        |o, w| write_tsv(w, &o.chart),
        write_pretty,
    )
}

fn write_pretty(o: &ConvergeOutput, w: &mut dyn Write) -> io::Result<()> {
    heading(w, &o.chart.title)?;
    field(w, "nodes", o.nodes.to_string())?;
    field(w, "damping", o.damping.to_string())?;
    field(w, "steps", o.steps.to_string())?;
    field(w, "kernel", o.kernel)?;
    writeln!(w)?;

    write_table(w, &o.chart)?;
    writeln!(w)?;

    heading(w, "Legend")?;
    write_legend(w, &o.chart)?;
    writeln!(w)?;

    heading(w, "Final ranking")?;
    for (place, entry) in o.ranking.iter().enumerate() {
        let label = o
            .chart
            .series
            .get(entry.node)
            .map_or(entry.label.as_str(), |s| s.style.label.as_str());
        writeln!(w, "{:>3}. {label:<18} {:.6}", place + 1, entry.rank)?;
    }
    Ok(())
}
