#![forbid(unsafe_code)]

mod cmd;
mod output;
mod render;

use std::env;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use output::OutputMode;
use ranktrace_core::RankError;
use ranktrace_core::config::resolve_config;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "ranktrace: PageRank convergence traces and step benchmarks",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (default: pretty on a TTY, text when piped).
    #[arg(long, value_enum, global = true)]
    format: Option<OutputMode>,

    /// Config file (default: ./ranktrace.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Defaults to `converge` when omitted.
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Run PageRank and show every intermediate rank vector",
        long_about = "Run K damped power-iteration steps from the uniform vector and \
                      render the full convergence trace as a chart table, JSON chart data or an SVG line chart.",
        after_help = "EXAMPLES:\n    # Four-page demo network, 20 steps\n    ranktrace converge\n\n    # Longer run with a lower damping factor\n    ranktrace converge --damping 0.7 --iterations 40\n\n    # Chart data for an external plotter\n    ranktrace converge --format json\n\n    # Line chart\n    ranktrace converge --format svg > convergence.svg"
    )]
    Converge(cmd::converge::ConvergeArgs),

    #[command(
        about = "Time one update step: naive loops vs a faster kernel",
        long_about = "Build a uniform N x N fixture, run one update step with the naive \
                      kernel and with the candidate kernel, and report timings and the \
                      difference between the two results.",
        after_help = "EXAMPLES:\n    # Default 1000-node race\n    ranktrace bench\n\n    # Race the multi-threaded kernel on a larger matrix\n    ranktrace bench --nodes 2000 --candidate parallel"
    )]
    Bench(cmd::bench::BenchArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("RANKTRACE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "ranktrace=debug,ranktrace_core=debug,info"
        } else {
            "ranktrace=info,ranktrace_core=info,warn"
        })
    });

    let format = env::var("RANKTRACE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let cwd = env::current_dir()?;
    let config = resolve_config(cli.config.as_deref(), &cwd)?;
    let output = OutputMode::resolve(cli.format);

    let command_result = match cli.command {
        Some(Commands::Converge(ref args)) => cmd::converge::run_converge(args, &config, output),
        None => cmd::converge::run_converge(&cmd::converge::ConvergeArgs::default(), &config, output),
        Some(Commands::Bench(ref args)) => cmd::bench::run_bench(args, &config, output),
    };

    if let Err(err) = &command_result
        && let Some(rank) = err.downcast_ref::<RankError>()
    {
        let code = rank.code();
        eprintln!("error[{code}]: {rank}");
        if let Some(hint) = code.hint() {
            eprintln!("hint: {hint}");
        }
    }

    command_result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_invocation_has_no_subcommand() {
        let cli = Cli::parse_from(["ranktrace"]);
        assert!(cli.command.is_none());
        assert!(cli.format.is_none());
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::parse_from(["ranktrace", "converge", "--format", "json", "-v"]);
        assert!(cli.verbose);
        assert_eq!(cli.format, Some(OutputMode::Json));
        assert!(matches!(cli.command, Some(Commands::Converge(_))));

        let svg = Cli::parse_from(["ranktrace", "--format", "svg"]);
        assert_eq!(svg.format, Some(OutputMode::Svg));
    }

    #[test]
    fn converge_overrides_parse() {
        let cli = Cli::parse_from([
            "ranktrace",
            "converge",
            "--damping",
            "0.5",
            "-k",
            "7",
            "--kernel",
            "naive",
        ]);
        let Some(Commands::Converge(args)) = cli.command else {
            panic!("expected converge");
        };
        assert_eq!(args.damping, Some(0.5));
        assert_eq!(args.iterations, Some(7));
        assert_eq!(args.kernel, Some(cmd::KernelArg::Naive));
    }

    #[test]
    fn bench_candidate_defaults_to_vectorized() {
        let cli = Cli::parse_from(["ranktrace", "bench", "--nodes", "64"]);
        let Some(Commands::Bench(args)) = cli.command else {
            panic!("expected bench");
        };
        assert_eq!(args.nodes, Some(64));
        assert_eq!(args.candidate, cmd::KernelArg::Vectorized);
    }
}
