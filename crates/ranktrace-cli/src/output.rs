//! Output formats for `ranktrace` subcommands.
//!
//! The format is taken from `--format` when given, else from the `FORMAT`
//! environment variable, else `pretty` on a terminal and `text` in a pipe.
//! Unrecognized `FORMAT` values are ignored.

use std::io::{self, IsTerminal, Write};

use anyhow::bail;
use clap::ValueEnum;
use serde::Serialize;

/// Width of the underline drawn below pretty headings.
pub const HEADING_WIDTH: usize = 72;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Headings, aligned tables and summaries for a terminal.
    Pretty,
    /// Tab-separated rows.
    Text,
    /// The serialized result as JSON.
    Json,
    /// Line chart as an SVG document (`converge` only).
    Svg,
}

impl OutputMode {
    fn from_name(name: &str) -> Option<Self> {
        Self::value_variants()
            .iter()
            .copied()
            .find(|mode| {
                mode.to_possible_value()
                    .is_some_and(|value| value.get_name().eq_ignore_ascii_case(name))
            })
    }

    fn choose(flag: Option<Self>, env: Option<&str>, stdout_is_tty: bool) -> Self {
        flag.or_else(|| env.and_then(Self::from_name))
            .unwrap_or(if stdout_is_tty { Self::Pretty } else { Self::Text })
    }

    /// Pick the mode for this process from `flag`, `FORMAT` and stdout.
    pub fn resolve(flag: Option<Self>) -> Self {
        let env = std::env::var("FORMAT").ok();
        Self::choose(flag, env.as_deref(), io::stdout().is_terminal())
    }
}

/// Write `title` underlined with `=`.
pub fn heading(w: &mut dyn Write, title: &str) -> io::Result<()> {
    writeln!(w, "{title}")?;
    writeln!(w, "{}", "=".repeat(HEADING_WIDTH))
}

/// Write one `key: value` line with the values aligned.
pub fn field(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<12} {}", format!("{key}:"), value.as_ref())
}

/// Write `value` to stdout as JSON or through one of the text renderers.
///
/// # Errors
///
/// Fails on I/O errors, and for [`OutputMode::Svg`], which only commands
/// that draw a chart handle themselves.
pub fn emit<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Text => text(value, &mut out)?,
        OutputMode::Pretty => pretty(value, &mut out)?,
        OutputMode::Svg => bail!("--format svg is only supported by `ranktrace converge`"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_beats_environment_and_terminal() {
        assert_eq!(
            OutputMode::choose(Some(OutputMode::Text), Some("json"), true),
            OutputMode::Text
        );
    }

    #[test]
    fn environment_names_ignore_case() {
        assert_eq!(
            OutputMode::choose(None, Some("JSON"), true),
            OutputMode::Json
        );
        assert_eq!(
            OutputMode::choose(None, Some("Svg"), true),
            OutputMode::Svg
        );
        assert_eq!(
            OutputMode::choose(None, Some("pretty"), false),
            OutputMode::Pretty
        );
    }

    #[test]
    fn terminal_decides_when_nothing_else_does() {
        assert_eq!(
            OutputMode::choose(None, Some("yaml"), true),
            OutputMode::Pretty
        );
        assert_eq!(OutputMode::choose(None, None, false), OutputMode::Text);
    }

    #[test]
    fn field_aligns_values() {
        let mut buf = Vec::new();
        field(&mut buf, "nodes", "4").expect("write");
        assert_eq!(String::from_utf8_lossy(&buf), "nodes:       4\n");
    }

    #[test]
    fn heading_is_underlined() {
        let mut buf = Vec::new();
        heading(&mut buf, "Legend").expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Legend");
        assert_eq!(lines[1].len(), HEADING_WIDTH);
        assert!(lines[1].chars().all(|c| c == '='));
    }

    #[test]
    fn svg_is_rejected_by_generic_emit() {
        let err = emit(OutputMode::Svg, &1_u8, |_, _| Ok(()), |_, _| Ok(()))
            .expect_err("svg needs a chart");
        assert!(err.to_string().contains("converge"));
    }
}
