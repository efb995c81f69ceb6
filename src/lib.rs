#![doc = include_str!("../README.md")]

pub mod chart;
mod discover;
mod error;
mod loader;
mod record;
mod sales;
pub mod summary;
mod yen;

pub use chart::{ChartKind, ChartRenderer, ChartSpec, PngRenderer};
pub use discover::find_files;
pub use error::LoadError;
pub use loader::{load_file, parse_timestamp};
pub use record::{Month, SalesRecord};
pub use sales::{DateRange, Sales};
pub use summary::{Aggregation, Column, SummaryRow, SummaryTable, Value};
pub use yen::Yen;
