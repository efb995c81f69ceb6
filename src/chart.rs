//! Drawing summary tables as charts.
//!
//! [`ChartRenderer`] is the seam between the aggregations and whatever
//! presents them. [`PngRenderer`] is the bundled implementation: it draws
//! each chart with plotters and writes it to a PNG file.

use anyhow::{Context, Result};
use plotters::element::Pie;
use plotters::prelude::*;
use tracing::{info, warn};

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use crate::summary::{Aggregation, Column, SummaryTable};

/// Tried first so product names in Japanese render. plotters falls back to
/// the system sans-serif face when the family isn't installed.
pub const DEFAULT_FONT: &str = "Noto Sans CJK JP";

/// Plotly's default qualitative palette.
const PALETTE: [RGBColor; 10] = [
    RGBColor(0x63, 0x6e, 0xfa),
    RGBColor(0xef, 0x55, 0x3b),
    RGBColor(0x00, 0xcc, 0x96),
    RGBColor(0xab, 0x63, 0xfa),
    RGBColor(0xff, 0xa1, 0x5a),
    RGBColor(0x19, 0xd3, 0xf3),
    RGBColor(0xff, 0x66, 0x92),
    RGBColor(0xb6, 0xe8, 0x80),
    RGBColor(0xff, 0x97, 0xff),
    RGBColor(0xfe, 0xcb, 0x52),
];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChartKind {
    Bar,
    Pie,
}

/// Describes how to chart a [`SummaryTable`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    /// Bar categories, or pie slice names.
    pub x: Column,
    /// Bar heights, or pie slice sizes.
    pub y: Column,
    /// Splits each bar into stacked, coloured segments.
    pub color: Option<Column>,
}

/// Something that can present a summary table as a chart.
pub trait ChartRenderer {
    /// Draws `table` as described by `spec`.
    ///
    /// # Errors
    ///
    /// Returns any error from producing the chart.
    fn render(&mut self, table: &SummaryTable, spec: &ChartSpec) -> Result<()>;
}

/// Writes each chart to `<out_dir>/<aggregation name>.png`.
#[derive(Debug)]
pub struct PngRenderer {
    out_dir: PathBuf,
    size: (u32, u32),
    font: String,
}

impl PngRenderer {
    /// Creates a renderer writing into `out_dir`, creating the directory if
    /// it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns any error from creating `out_dir`.
    pub fn new(out_dir: impl Into<PathBuf>) -> Result<Self> {
        let out_dir = out_dir.into();
        fs::create_dir_all(&out_dir)
            .with_context(|| format!("creating chart directory {}", out_dir.display()))?;
        Ok(Self {
            out_dir,
            size: (1200, 700),
            font: DEFAULT_FONT.to_string(),
        })
    }

    /// Draws titles and labels in the font family `font` instead of
    /// [`DEFAULT_FONT`].
    #[must_use]
    pub fn with_font(mut self, font: impl Into<String>) -> Self {
        self.font = font.into();
        self
    }

    #[must_use]
    pub fn font(&self) -> &str {
        &self.font
    }

    #[must_use]
    pub fn path_for(&self, aggregation: Aggregation) -> PathBuf {
        self.out_dir.join(format!("{}.png", aggregation.name()))
    }
}

impl ChartRenderer for PngRenderer {
    fn render(&mut self, table: &SummaryTable, spec: &ChartSpec) -> Result<()> {
        let path = self.path_for(table.aggregation());
        if table.is_empty() {
            warn!(chart = %spec.title, "no data to chart");
        }
        let canvas = Canvas {
            path: &path,
            size: self.size,
            font: &self.font,
        };
        let drawn = match spec.kind {
            ChartKind::Bar => draw_bars(&canvas, &BarLayout::new(table, spec), spec),
            ChartKind::Pie => draw_pie(&canvas, &pie_slices(table, spec), spec),
        };
        drawn.with_context(|| format!("drawing {}", path.display()))?;
        info!(path = %path.display(), "wrote chart");
        Ok(())
    }
}

/// The stacked bars of a bar chart: one stack per category, one segment per
/// series.
#[derive(Clone, Debug, PartialEq)]
pub struct BarLayout {
    /// Category labels in the order they first appear in the table.
    pub categories: Vec<String>,
    /// Series sorted by name, each with one value per category.
    pub series: Vec<(String, Vec<f64>)>,
}

impl BarLayout {
    /// Stacks the `spec.y` values of `table` by `spec.x`, split by
    /// `spec.color`.
    #[must_use]
    pub fn new(table: &SummaryTable, spec: &ChartSpec) -> Self {
        let mut categories: Vec<String> = Vec::new();
        let mut series: BTreeMap<String, BTreeMap<usize, f64>> = BTreeMap::new();
        for row in table.rows() {
            let category = row.cell(spec.x).unwrap_or_default();
            let index = categories
                .iter()
                .position(|c| *c == category)
                .unwrap_or_else(|| {
                    categories.push(category);
                    categories.len() - 1
                });
            let name = spec
                .color
                .and_then(|c| row.cell(c))
                .unwrap_or_else(|| spec.y.header().to_string());
            let value = row.value(spec.y).map_or(0.0, |v| v.as_f64());
            *series.entry(name).or_default().entry(index).or_default() += value;
        }
        let series = series
            .into_iter()
            .map(|(name, by_category)| {
                let values = (0..categories.len())
                    .map(|i| by_category.get(&i).copied().unwrap_or_default())
                    .collect();
                (name, values)
            })
            .collect();
        Self { categories, series }
    }

    /// The height of the tallest stack.
    #[must_use]
    pub fn max_stack(&self) -> f64 {
        (0..self.categories.len())
            .map(|i| self.series.iter().map(|(_, values)| values[i]).sum::<f64>())
            .fold(0.0, f64::max)
    }
}

/// Sums the `spec.y` values of `table` per `spec.x` label, in order of first
/// appearance, dropping slices with nothing in them.
#[must_use]
pub fn pie_slices(table: &SummaryTable, spec: &ChartSpec) -> Vec<(String, f64)> {
    let mut slices: Vec<(String, f64)> = Vec::new();
    for row in table.rows() {
        let name = row.cell(spec.x).unwrap_or_default();
        let value = row.value(spec.y).map_or(0.0, |v| v.as_f64());
        match slices.iter_mut().find(|(n, _)| *n == name) {
            Some((_, total)) => *total += value,
            None => slices.push((name, value)),
        }
    }
    slices.retain(|(_, value)| *value > 0.0);
    slices
}

#[must_use]
pub fn palette(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

/// Where and how large to draw a chart.
struct Canvas<'a> {
    path: &'a Path,
    size: (u32, u32),
    font: &'a str,
}

fn draw_bars(canvas: &Canvas<'_>, layout: &BarLayout, spec: &ChartSpec) -> Result<()> {
    let root = BitMapBackend::new(canvas.path, canvas.size).into_drawing_area();
    root.fill(&WHITE)?;

    #[allow(clippy::cast_precision_loss)]
    let width = layout.categories.len().max(1) as f64;
    let y_max = (layout.max_stack() * 1.1).max(1.0);
    let mut chart = ChartBuilder::on(&root)
        .caption(&spec.title, (canvas.font, 28))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(100)
        .build_cartesian_2d(-0.5..width - 0.5, 0.0..y_max)?;

    let categories = &layout.categories;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(categories.len() + 1)
        .x_label_formatter(&|x| {
            let i = x.round();
            if (x - i).abs() > f64::EPSILON || i < 0.0 {
                return String::new();
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let index = i as usize;
            categories.get(index).cloned().unwrap_or_default()
        })
        .y_label_formatter(&|y| format!("{y:.0}"))
        .x_desc(spec.x.header())
        .y_desc(spec.y.header())
        .draw()?;

    let mut base = vec![0.0; categories.len()];
    for (n, (name, values)) in layout.series.iter().enumerate() {
        let color = palette(n);
        let bars: Vec<_> = values
            .iter()
            .enumerate()
            .map(|(i, &value)| {
                #[allow(clippy::cast_precision_loss)]
                let x = i as f64;
                let bottom = base[i];
                base[i] += value;
                Rectangle::new(
                    [(x - 0.4, bottom), (x + 0.4, bottom + value)],
                    color.filled(),
                )
            })
            .collect();
        chart
            .draw_series(bars)?
            .label(name.as_str())
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
            });
    }
    if !layout.series.is_empty() {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

fn draw_pie(canvas: &Canvas<'_>, slices: &[(String, f64)], spec: &ChartSpec) -> Result<()> {
    let root = BitMapBackend::new(canvas.path, canvas.size).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(&spec.title, (canvas.font, 28))?;

    if !slices.is_empty() {
        let total: f64 = slices.iter().map(|(_, v)| v).sum();
        let sizes: Vec<f64> = slices.iter().map(|(_, v)| *v).collect();
        let colors: Vec<RGBColor> = (0..slices.len()).map(palette).collect();
        let labels: Vec<String> = slices
            .iter()
            .map(|(name, v)| format!("{name} ({:.1}%)", v / total * 100.0))
            .collect();
        let (w, h) = root.dim_in_pixel();
        #[allow(clippy::cast_possible_wrap)]
        let center = ((w / 2) as i32, (h / 2) as i32);
        let radius = f64::from(w.min(h)) * 0.35;
        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.label_style((canvas.font, 16));
        root.draw(&pie)?;
    }

    root.present()?;
    Ok(())
}
