//! `ranktrace bench`: time one update step, naive loops vs a faster kernel.

use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use ranktrace_core::bench::{BenchmarkReport, EQUIVALENCE_TOLERANCE, compare_kernels};
use ranktrace_core::config::Config;
use ranktrace_core::kernel::{KernelKind, NaiveKernel};
use serde::Serialize;

use super::KernelArg;
use crate::output::{OutputMode, emit, field, heading};

/// Arguments for `ranktrace bench`.
#[derive(Args, Debug)]
pub struct BenchArgs {
    /// Matrix dimension N (default: 1000).
    #[arg(long)]
    pub nodes: Option<usize>,

    /// Damping factor in [0, 1] (default: 0.85).
    #[arg(long)]
    pub damping: Option<f64>,

    /// Kernel raced against the naive loops.
    #[arg(long, value_enum, default_value = "vectorized")]
    pub candidate: KernelArg,
}

/// JSON output for `ranktrace bench`.
#[derive(Debug, Serialize)]
struct BenchOutput {
    nodes: usize,
    damping: f64,
    baseline: &'static str,
    baseline_secs: f64,
    candidate: &'static str,
    candidate_secs: f64,
    speedup: Option<f64>,
    diff_norm: f64,
    equivalent: bool,
}

impl From<&BenchmarkReport> for BenchOutput {
    fn from(report: &BenchmarkReport) -> Self {
        Self {
            nodes: report.nodes,
            damping: report.damping,
            baseline: report.baseline.kernel,
            baseline_secs: report.baseline.elapsed.as_secs_f64(),
            candidate: report.candidate.kernel,
            candidate_secs: report.candidate.elapsed.as_secs_f64(),
            speedup: report.speedup(),
            diff_norm: report.diff_norm,
            equivalent: report.is_equivalent(),
        }
    }
}

pub fn run_bench(args: &BenchArgs, config: &Config, mode: OutputMode) -> Result<()> {
    let mut bench = config.bench;
    if let Some(nodes) = args.nodes {
        bench.nodes = nodes;
    }
    if let Some(damping) = args.damping {
        bench.damping = damping;
    }

    let candidate = KernelKind::from(args.candidate).kernel();
    let report = compare_kernels(&bench, &NaiveKernel, candidate)?;
    let output = BenchOutput::from(&report);

    emit(mode, &output, write_text, write_pretty)
}

fn write_text(o: &BenchOutput, w: &mut dyn Write) -> io::Result<()> {
    writeln!(
        w,
        "nodes={} {}={:.6} {}={:.6} diff_norm={:e} equivalent={}",
        o.nodes, o.baseline, o.baseline_secs, o.candidate, o.candidate_secs, o.diff_norm, o.equivalent
    )
}

fn write_pretty(o: &BenchOutput, w: &mut dyn Write) -> io::Result<()> {
    heading(w, &format!("PageRank step: {} vs {}", o.baseline, o.candidate))?;
    field(w, "nodes", o.nodes.to_string())?;
    field(w, "damping", o.damping.to_string())?;
    writeln!(w)?;

    writeln!(w, "Round 1: {:<12} {:.6} s", o.baseline, o.baseline_secs)?;
    writeln!(w, "Round 2: {:<12} {:.6} s", o.candidate, o.candidate_secs)?;
    writeln!(w)?;

    match o.speedup {
        Some(speedup) if speedup >= 1.0 => {
            writeln!(w, "Winner: {} (about {speedup:.1}x faster)", o.candidate)?;
        }
        Some(speedup) if speedup > 0.0 => {
            writeln!(w, "Winner: {} (about {:.1}x faster)", o.baseline, 1.0 / speedup)?;
        }
        _ => writeln!(w, "Winner: {} (too fast to measure)", o.candidate)?,
    }

    field(w, "diff norm", format!("{:.6e}", o.diff_norm))?;
    if o.equivalent {
        writeln!(w, "Results are numerically equivalent (< {EQUIVALENCE_TOLERANCE:e}).")
    } else {
        writeln!(w, "Results differ by more than {EQUIVALENCE_TOLERANCE:e}.")
    }
}
