//! Convergence chart rendering.
//!
//! Turns a [`ConvergenceTrace`] into [`ChartData`]: one styled series per
//! node, fixed axes (`x ∈ [0, K]`, `y ∈ [0, 1]`) and an optional vertical
//! marker line at a chosen iteration. The chart data is emitted as JSON for
//! external plotting tools, or drawn as a table in the terminal.
//!
//! # Styling
//!
//! Node `i` gets color `PALETTE[i % 10]` and marker `MARKERS[i % 4]`. The
//! node with the highest final rank is drawn solid and thick and its label
//! gets a ` (King)` suffix; all other nodes are dashed and thin. A leader
//! must beat the runner-up by more than [`LEADER_MARGIN`]; when the top
//! ranks tie nobody is emphasized. On the built-in four-page network this
//! reproduces the reference chart exactly.
//!
//! [`render_svg`] draws the chart as an SVG document with `plotters`.

use std::io::{self, Write};

use plotters::prelude::*;
use ranktrace_core::config::ChartSettings;
use ranktrace_core::graph::Graph;
use ranktrace_core::iterate::ConvergenceTrace;
use serde::Serialize;

/// Matplotlib "tab10" colors.
const PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

const MARKERS: [char; 4] = ['o', 's', '^', 'D'];

const LEADER_WIDTH: f64 = 4.0;
const FOLLOWER_WIDTH: f64 = 2.0;

/// Minimum final-rank lead over the runner-up for the "(King)" emphasis.
pub const LEADER_MARGIN: f64 = 1e-9;

/// SVG canvas size in pixels.
pub const SVG_SIZE: (u32, u32) = (960, 600);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    Solid,
    Dashed,
    Dotted,
}

impl LineStyle {
    /// Matplotlib-style pattern string.
    pub const fn pattern(self) -> &'static str {
        match self {
            Self::Solid => "-",
            Self::Dashed => "--",
            Self::Dotted => ":",
        }
    }

    /// Dash and gap length in pixels; `None` for a continuous line.
    const fn dashes(self) -> Option<(u32, u32)> {
        match self {
            Self::Solid => None,
            Self::Dashed => Some((10, 6)),
            Self::Dotted => Some((2, 4)),
        }
    }
}

/// How one node's curve is drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesStyle {
    pub label: String,
    pub color: String,
    pub marker: char,
    pub linestyle: LineStyle,
    pub linewidth: f64,
}

/// Vertical line marking where the ranks are considered settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThresholdMarker {
    pub iteration: usize,
    pub annotation: String,
    pub linestyle: LineStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub label: String,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub node: usize,
    pub style: SeriesStyle,
    /// Rank at iterations `0..=K`.
    pub values: Vec<f64>,
}

/// Everything a plotting backend needs to draw the convergence chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub title: String,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub series: Vec<Series>,
    pub threshold: Option<ThresholdMarker>,
}

/// The node whose final rank beats every other node by more than
/// [`LEADER_MARGIN`], if any. A single-node graph always has a leader.
pub fn leader(trace: &ConvergenceTrace) -> Option<usize> {
    let ranking = trace.ranking();
    let last = trace.final_ranks();
    match ranking.as_slice() {
        [top] => Some(*top),
        [top, runner_up, ..] => (last[*top] - last[*runner_up] > LEADER_MARGIN).then_some(*top),
        [] => None,
    }
}

/// Per-node styles for `graph`, emphasizing the final leader of `trace`.
pub fn series_styles(graph: &Graph, trace: &ConvergenceTrace) -> Vec<SeriesStyle> {
    let king = leader(trace);
    (0..graph.node_count())
        .map(|node| {
            let name = graph.label(node).unwrap_or_default();
            let is_leader = king == Some(node);
            SeriesStyle {
                label: if is_leader {
                    format!("Page {name} (King)")
                } else {
                    format!("Page {name}")
                },
                color: PALETTE[node % PALETTE.len()].to_string(),
                marker: MARKERS[node % MARKERS.len()],
                linestyle: if is_leader {
                    LineStyle::Solid
                } else {
                    LineStyle::Dashed
                },
                linewidth: if is_leader {
                    LEADER_WIDTH
                } else {
                    FOLLOWER_WIDTH
                },
            }
        })
        .collect()
}

/// Assemble the chart for `trace`.
///
/// The threshold marker is dropped when disabled or when it falls beyond
/// the last iteration.
pub fn chart_data(trace: &ConvergenceTrace, graph: &Graph, settings: &ChartSettings) -> ChartData {
    let steps = trace.steps();
    let series = series_styles(graph, trace)
        .into_iter()
        .enumerate()
        .map(|(node, style)| Series {
            node,
            style,
            values: trace.series(node),
        })
        .collect();

    let threshold = (settings.show_threshold && settings.threshold_iteration <= steps).then(|| {
        ThresholdMarker {
            iteration: settings.threshold_iteration,
            annotation: settings.threshold_annotation.clone(),
            linestyle: LineStyle::Dotted,
        }
    });

    ChartData {
        title: settings.title.clone(),
        x_axis: Axis {
            label: "Iteration".to_string(),
            min: 0.0,
            max: steps as f64,
        },
        y_axis: Axis {
            label: "Rank Score".to_string(),
            min: 0.0,
            max: 1.0,
        },
        series,
        threshold,
    }
}

/// Tab-separated values: a header row, then one row per iteration.
pub fn write_tsv(w: &mut dyn Write, chart: &ChartData) -> io::Result<()> {
    write!(w, "iteration")?;
    for s in &chart.series {
        write!(w, "\t{}", s.style.label)?;
    }
    writeln!(w)?;

    for k in 0..iteration_count(chart) {
        write!(w, "{k}")?;
        for s in &chart.series {
            write!(w, "\t{}", s.values[k])?;
        }
        writeln!(w)?;
    }
    Ok(())
}

/// Aligned table with the threshold marker drawn under its iteration.
pub fn write_table(w: &mut dyn Write, chart: &ChartData) -> io::Result<()> {
    let widths: Vec<usize> = chart
        .series
        .iter()
        .map(|s| s.style.label.chars().count().max(8))
        .collect();

    write!(w, "{:>5}", "iter")?;
    for (s, &width) in chart.series.iter().zip(&widths) {
        write!(w, "  {:>width$}", s.style.label)?;
    }
    writeln!(w)?;

    for k in 0..iteration_count(chart) {
        write!(w, "{k:>5}")?;
        for (s, &width) in chart.series.iter().zip(&widths) {
            write!(w, "  {:>width$.6}", s.values[k])?;
        }
        writeln!(w)?;

        if let Some(marker) = chart.threshold.as_ref().filter(|m| m.iteration == k) {
            let rule_width = 5 + widths.iter().map(|width| width + 2).sum::<usize>();
            let text = format!(" {} ", marker.annotation);
            writeln!(w, "{text:·^rule_width$}")?;
        }
    }
    Ok(())
}

/// One legend line per series.
pub fn write_legend(w: &mut dyn Write, chart: &ChartData) -> io::Result<()> {
    for s in &chart.series {
        writeln!(
            w,
            "  {} {:<2} {:<18} {} lw={}",
            s.style.marker,
            s.style.linestyle.pattern(),
            s.style.label,
            s.style.color,
            s.style.linewidth
        )?;
    }
    Ok(())
}

/// Draw `chart` as a standalone SVG document of `size` pixels.
///
/// Each series gets its color, line pattern, width and point markers, plus a
/// legend entry. The threshold marker becomes a vertical line with its
/// annotation next to it.
///
/// # Errors
///
/// Returns an error if `plotters` fails to lay out or draw an element.
pub fn render_svg(chart: &ChartData, size: (u32, u32)) -> anyhow::Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&WHITE)?;

        // K = 0 still needs a non-empty x range.
        let x_max = chart.x_axis.max.max(chart.x_axis.min + 1.0);
        let mut ctx = ChartBuilder::on(&root)
            .caption(&chart.title, ("sans-serif", 26))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(56)
            .build_cartesian_2d(
                chart.x_axis.min..x_max,
                chart.y_axis.min..chart.y_axis.max,
            )?;

        ctx.configure_mesh()
            .x_desc(chart.x_axis.label.as_str())
            .y_desc(chart.y_axis.label.as_str())
            .draw()?;

        for s in &chart.series {
            let color = hex_color(&s.style.color);
            let line = color.stroke_width(stroke_width(s.style.linewidth));
            let points: Vec<(f64, f64)> = s
                .values
                .iter()
                .enumerate()
                .map(|(k, &v)| (k as f64, v))
                .collect();

            let anno = match s.style.linestyle.dashes() {
                None => ctx.draw_series(LineSeries::new(points.iter().copied(), line))?,
                Some((dash, gap)) => ctx.draw_series(DashedLineSeries::new(
                    points.iter().copied(),
                    dash,
                    gap,
                    line,
                ))?,
            };
            anno.label(s.style.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 24, y)], line));

            let fill = color.filled();
            match s.style.marker {
                'o' => {
                    ctx.draw_series(points.iter().map(|&p| Circle::new(p, 4, fill)))?;
                }
                's' => {
                    ctx.draw_series(points.iter().map(|&p| {
                        EmptyElement::at(p) + Rectangle::new([(-4, -4), (4, 4)], fill)
                    }))?;
                }
                '^' => {
                    ctx.draw_series(points.iter().map(|&p| {
                        EmptyElement::at(p) + Polygon::new(vec![(0, -5), (-5, 4), (5, 4)], fill)
                    }))?;
                }
                _ => {
                    ctx.draw_series(points.iter().map(|&p| {
                        EmptyElement::at(p)
                            + Polygon::new(vec![(0, -5), (5, 0), (0, 5), (-5, 0)], fill)
                    }))?;
                }
            }
        }

        if let Some(marker) = &chart.threshold {
            let x = marker.iteration as f64;
            let rule = vec![(x, chart.y_axis.min), (x, chart.y_axis.max)];
            let (dash, gap) = marker.linestyle.dashes().unwrap_or((2, 4));
            ctx.draw_series(DashedLineSeries::new(
                rule,
                dash,
                gap,
                BLACK.stroke_width(1),
            ))?;
            ctx.draw_series(std::iter::once(Text::new(
                marker.annotation.clone(),
                (x + 0.2, chart.y_axis.max * 0.95),
                ("sans-serif", 16).into_font(),
            )))?;
        }

        ctx.configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
    }
    Ok(svg)
}

/// Parse `#rrggbb`; malformed channels fall back to 0.
fn hex_color(hex: &str) -> RGBColor {
    let digits = hex.trim_start_matches('#');
    let channel = |at: usize| {
        digits
            .get(at..at + 2)
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
            .unwrap_or(0)
    };
    RGBColor(channel(0), channel(2), channel(4))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn stroke_width(linewidth: f64) -> u32 {
    linewidth.round().max(1.0) as u32
}

fn iteration_count(chart: &ChartData) -> usize {
    chart.series.first().map_or(0, |s| s.values.len())
}
