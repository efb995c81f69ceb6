use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use booth_sales::{
    chart::DEFAULT_FONT, find_files, Aggregation, ChartRenderer, DateRange, PngRenderer, Sales,
};
use chrono::NaiveDate;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
/// Aggregates BOOTH sales CSV exports and charts them.
///
/// Prints six summary tables (monthly revenue, monthly units, revenue and
/// units by product, cumulative revenue, and spend per user) and writes a
/// chart of each as a PNG file.
struct Args {
    /// Files to read. The file name may use the wildcards `*`, `?` and
    /// `[...]`; the directory part may not
    #[arg(long, default_value = "sales_*.csv")]
    files: String,
    /// Only include orders on or after this date (YYYY/MM/DD)
    #[arg(long, value_parser = parse_date)]
    start: Option<NaiveDate>,
    /// Only include orders on or before this date (YYYY/MM/DD)
    #[arg(long, value_parser = parse_date)]
    end: Option<NaiveDate>,
    /// Directory to write chart images to
    #[arg(long, default_value = "charts")]
    out_dir: PathBuf,
    /// Print the tables without drawing charts
    #[arg(long)]
    no_charts: bool,
    /// Font family for chart text
    #[arg(long, default_value = DEFAULT_FONT)]
    font: String,
    /// Log filter, e.g. `info` or `booth_sales=debug`
    #[arg(long, env = "BOOTH_SALES_LOG", default_value = "warn")]
    log_level: String,
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y/%m/%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .with_context(|| format!("expected a date like 2023/01/31, got {s:?}"))
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&args.log_level))
        .with_writer(std::io::stderr)
        .init();
    run(&args)
}

fn run(args: &Args) -> Result<ExitCode> {
    let files = find_files(&args.files)?;
    if files.is_empty() {
        eprintln!("no data exists");
        return Ok(ExitCode::FAILURE);
    }
    info!(files = files.len(), "loading sales data");
    let sales = Sales::read_files(files.as_slice())?.within(&DateRange::new(args.start, args.end));
    info!(records = sales.len(), "analysing sales data");

    let mut renderer = if args.no_charts {
        None
    } else {
        Some(PngRenderer::new(&args.out_dir)?.with_font(&args.font))
    };
    for aggregation in Aggregation::ALL {
        let table = aggregation.summarize(sales.records());
        println!("{table}");
        if let Some(renderer) = renderer.as_mut() {
            renderer.render(&table, &aggregation.chart())?;
        }
    }
    Ok(ExitCode::SUCCESS)
}
