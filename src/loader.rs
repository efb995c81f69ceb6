//! Reading BOOTH sales CSV exports.
//!
//! The BOOTH exporter writes order-level values (order number, timestamp,
//! buyer) only on the first line item of each order and leaves them blank on
//! the rest. [`load_file`] fills those blanks from the row above, in file
//! order, so every returned [`SalesRecord`] is complete.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::debug;

use std::path::Path;

use crate::{error::LoadError, record::SalesRecord, yen::Yen};

/// A required CSV column: the header BOOTH writes, and an English alias.
#[derive(Clone, Copy, Debug)]
struct Column {
    header: &'static str,
    alias: &'static str,
}

impl Column {
    const fn new(header: &'static str, alias: &'static str) -> Self {
        Self { header, alias }
    }
}

const REQUIRED_COLUMNS: [Column; 7] = [
    Column::new("注文番号", "Order ID"),
    Column::new("注文日時", "Order Date"),
    Column::new("商品ID", "Product ID"),
    Column::new("商品名", "Product Name"),
    Column::new("単価", "Unit Price"),
    Column::new("BOOST", "Boost"),
    Column::new("ユーザー識別コード", "User ID"),
];

const TIMESTAMP_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Defines the CSV format for sales data, before forward-filling.
///
/// Columns not listed here are ignored.
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "注文番号", alias = "Order ID")]
    order_id: Option<String>,
    #[serde(rename = "注文日時", alias = "Order Date")]
    ordered_at: Option<String>,
    #[serde(rename = "商品ID", alias = "Product ID")]
    product_id: Option<String>,
    #[serde(rename = "商品名", alias = "Product Name")]
    product_name: Option<String>,
    #[serde(rename = "単価", alias = "Unit Price")]
    unit_price: Option<Yen>,
    #[serde(rename = "BOOST", alias = "Boost")]
    boost: Option<Yen>,
    #[serde(rename = "ユーザー識別コード", alias = "User ID")]
    user_id: Option<String>,
}

/// The most recent non-blank order-level values seen in a file.
#[derive(Debug, Default)]
struct OrderFields {
    order_id: Option<String>,
    ordered_at: Option<NaiveDateTime>,
    user_id: Option<String>,
}

impl OrderFields {
    /// Turns `raw` into a complete record, remembering any order-level values
    /// it carries and filling in the ones it lacks.
    fn complete(
        &mut self,
        raw: RawRow,
        path: &Path,
        line: u64,
    ) -> Result<SalesRecord, LoadError> {
        let missing = |column: usize| LoadError::MissingValue {
            path: path.to_path_buf(),
            line,
            column: REQUIRED_COLUMNS[column].header,
        };
        if let Some(id) = raw.order_id {
            self.order_id = Some(id);
        }
        if let Some(value) = raw.ordered_at {
            let Some(at) = parse_timestamp(&value) else {
                return Err(LoadError::InvalidTimestamp {
                    path: path.to_path_buf(),
                    line,
                    value,
                });
            };
            self.ordered_at = Some(at);
        }
        if let Some(user) = raw.user_id {
            self.user_id = Some(user);
        }
        Ok(SalesRecord {
            order_id: self.order_id.clone().ok_or_else(|| missing(0))?,
            ordered_at: self.ordered_at.ok_or_else(|| missing(1))?,
            product_id: raw.product_id.ok_or_else(|| missing(2))?,
            product_name: raw.product_name.ok_or_else(|| missing(3))?,
            unit_price: raw.unit_price.ok_or_else(|| missing(4))?,
            boost: raw.boost.unwrap_or_default(),
            user_id: self.user_id.clone().ok_or_else(|| missing(6))?,
        })
    }
}

/// Reads the sales CSV file at `path`, returning its line items in file
/// order with blank order-level fields filled from the row above.
///
/// # Errors
///
/// Returns a [`LoadError`] if:
/// * The file cannot be opened, read, or parsed as CSV
/// * A required column is absent from the header row
/// * An order-level field is blank with no earlier value to carry forward
/// * A product or price field is blank
/// * An order timestamp cannot be parsed
pub fn load_file(path: impl AsRef<Path>) -> Result<Vec<SalesRecord>, LoadError> {
    let path = path.as_ref();
    let csv_err = |source: csv::Error| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;
    let headers = rdr.headers().map_err(csv_err)?.clone();
    check_columns(path, &headers)?;

    let mut fill = OrderFields::default();
    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result.map_err(csv_err)?;
        let line = row.position().map_or(0, csv::Position::line);
        let raw: RawRow = row.deserialize(Some(&headers)).map_err(csv_err)?;
        records.push(fill.complete(raw, path, line)?);
    }
    debug!(path = %path.display(), records = records.len(), "loaded sales file");
    Ok(records)
}

fn check_columns(path: &Path, headers: &csv::StringRecord) -> Result<(), LoadError> {
    for column in REQUIRED_COLUMNS {
        if !headers
            .iter()
            .any(|h| h == column.header || h == column.alias)
        {
            return Err(LoadError::MissingColumn {
                path: path.to_path_buf(),
                column: column.header,
            });
        }
    }
    Ok(())
}

/// Parses an order timestamp in any of the formats BOOTH exports have used.
///
/// A bare date is taken as midnight.
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
