//! The six summary tables computed from a set of sales records.
//!
//! Every aggregation is a pure function of its input records: the same
//! records always produce the same table, in the same row order.

use std::{
    collections::BTreeMap,
    fmt::{Debug, Display},
};

use crate::{
    chart::{ChartKind, ChartSpec},
    record::{Month, SalesRecord},
    yen::Yen,
};

/// Identifies one of the summaries this crate can compute.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Aggregation {
    /// Revenue per month and product.
    MonthlyRevenue,
    /// Line items sold per month and product.
    MonthlyUnits,
    /// Revenue and boost per product.
    ProductRevenue,
    /// Line items sold per product.
    ProductUnits,
    /// Running revenue total per product over every month in the data.
    CumulativeRevenue,
    /// Revenue per buyer and product.
    UserSpend,
}

impl Aggregation {
    /// Every aggregation, in report order.
    pub const ALL: [Self; 6] = [
        Self::MonthlyRevenue,
        Self::MonthlyUnits,
        Self::ProductRevenue,
        Self::ProductUnits,
        Self::CumulativeRevenue,
        Self::UserSpend,
    ];

    /// A short identifier, suitable as a file name stem.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::MonthlyRevenue => "monthly_revenue",
            Self::MonthlyUnits => "monthly_units",
            Self::ProductRevenue => "product_revenue",
            Self::ProductUnits => "product_units",
            Self::CumulativeRevenue => "cumulative_revenue",
            Self::UserSpend => "user_spend",
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::MonthlyRevenue => "Revenue per month",
            Self::MonthlyUnits => "Units sold per month",
            Self::ProductRevenue => "Revenue by product",
            Self::ProductUnits => "Units sold by product",
            Self::CumulativeRevenue => "Cumulative revenue",
            Self::UserSpend => "Spend per user",
        }
    }

    /// The columns of the table this aggregation produces, keys first.
    #[must_use]
    pub fn columns(self) -> &'static [Column] {
        use Column::{Boost, Month, ProductId, ProductName, Revenue, Units, UserId};
        match self {
            Self::MonthlyRevenue => &[Month, ProductId, ProductName, Revenue],
            Self::MonthlyUnits => &[Month, ProductId, ProductName, Units, Boost],
            Self::ProductRevenue => &[ProductId, ProductName, Revenue, Boost],
            Self::ProductUnits => &[ProductId, ProductName, Units],
            Self::CumulativeRevenue => &[ProductId, ProductName, Month, Revenue, Boost],
            Self::UserSpend => &[UserId, ProductId, ProductName, Revenue],
        }
    }

    /// How this aggregation's table should be charted.
    #[must_use]
    pub fn chart(self) -> ChartSpec {
        let (kind, x, y, color) = match self {
            Self::MonthlyRevenue | Self::CumulativeRevenue => (
                ChartKind::Bar,
                Column::Month,
                Column::Revenue,
                Some(Column::ProductName),
            ),
            Self::MonthlyUnits => (
                ChartKind::Bar,
                Column::Month,
                Column::Units,
                Some(Column::ProductName),
            ),
            Self::ProductRevenue => (ChartKind::Pie, Column::ProductName, Column::Revenue, None),
            Self::ProductUnits => (ChartKind::Pie, Column::ProductName, Column::Units, None),
            Self::UserSpend => (
                ChartKind::Bar,
                Column::UserId,
                Column::Revenue,
                Some(Column::ProductName),
            ),
        };
        ChartSpec {
            kind,
            title: self.title().to_string(),
            x,
            y,
            color,
        }
    }

    /// Computes this aggregation over `records`.
    ///
    /// An empty slice produces an empty table.
    #[must_use]
    pub fn summarize(self, records: &[SalesRecord]) -> SummaryTable {
        let rows = match self {
            Self::MonthlyRevenue => group_by(records, GroupKey::by_month)
                .into_iter()
                .map(|(key, totals)| key.into_row(Value::Yen(totals.revenue), None))
                .collect(),
            Self::MonthlyUnits => group_by(records, GroupKey::by_month)
                .into_iter()
                .map(|(key, totals)| {
                    key.into_row(Value::Units(totals.units), Some(Value::Units(totals.units)))
                })
                .collect(),
            Self::ProductRevenue => group_by(records, GroupKey::by_product)
                .into_iter()
                .map(|(key, totals)| {
                    key.into_row(Value::Yen(totals.revenue), Some(Value::Yen(totals.boost)))
                })
                .collect(),
            Self::ProductUnits => group_by(records, GroupKey::by_product)
                .into_iter()
                .map(|(key, totals)| key.into_row(Value::Units(totals.units), None))
                .collect(),
            Self::CumulativeRevenue => cumulative_revenue(records),
            Self::UserSpend => group_by(records, GroupKey::by_user)
                .into_iter()
                .map(|(key, totals)| key.into_row(Value::Yen(totals.revenue), None))
                .collect(),
        };
        SummaryTable {
            aggregation: self,
            rows,
        }
    }
}

/// A column of a [`SummaryTable`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Column {
    Month,
    UserId,
    ProductId,
    ProductName,
    Revenue,
    Units,
    Boost,
}

impl Column {
    #[must_use]
    pub fn header(self) -> &'static str {
        match self {
            Self::Month => "Month",
            Self::UserId => "User",
            Self::ProductId => "Product ID",
            Self::ProductName => "Product",
            Self::Revenue => "Revenue",
            Self::Units => "Units",
            Self::Boost => "Boost",
        }
    }

    /// Reports whether the column holds numbers rather than labels.
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Revenue | Self::Units | Self::Boost)
    }
}

/// A summed or counted quantity in a [`SummaryTable`].
#[derive(Clone, Copy, Eq, PartialEq)]
pub enum Value {
    Yen(Yen),
    Units(u64),
}

impl Value {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Yen(yen) => yen.amount() as f64,
            Self::Units(n) => n as f64,
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yen(yen) => Display::fmt(yen, f),
            Self::Units(n) => Display::fmt(n, f),
        }
    }
}

/// One group of a [`SummaryTable`]: its key columns and its values.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SummaryRow {
    pub month: Option<Month>,
    pub user_id: Option<String>,
    pub product_id: String,
    pub product_name: String,
    pub value: Value,
    pub boost: Option<Value>,
}

impl SummaryRow {
    /// Returns the numeric value in `column`, if this row has one there.
    #[must_use]
    pub fn value(&self, column: Column) -> Option<Value> {
        match (column, self.value) {
            (Column::Revenue, v @ Value::Yen(_)) | (Column::Units, v @ Value::Units(_)) => Some(v),
            (Column::Boost, _) => self.boost,
            _ => None,
        }
    }

    /// Returns the contents of `column` formatted as text.
    #[must_use]
    pub fn cell(&self, column: Column) -> Option<String> {
        match column {
            Column::Month => self.month.map(|m| m.to_string()),
            Column::UserId => self.user_id.clone(),
            Column::ProductId => Some(self.product_id.clone()),
            Column::ProductName => Some(self.product_name.clone()),
            Column::Revenue | Column::Units | Column::Boost => {
                self.value(column).map(|v| v.to_string())
            }
        }
    }
}

/// The result of an [`Aggregation`]: rows ordered by their group key.
///
/// To get a printable version of the table, use its [`Display`]
/// implementation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SummaryTable {
    aggregation: Aggregation,
    rows: Vec<SummaryRow>,
}

impl SummaryTable {
    #[must_use]
    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }

    #[must_use]
    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    #[must_use]
    pub fn columns(&self) -> &'static [Column] {
        self.aggregation.columns()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Display for SummaryTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let columns = self.columns();
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|&c| row.cell(c).unwrap_or_default())
                    .collect()
            })
            .collect();
        let widths: Vec<usize> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                cells
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain([c.header().chars().count()])
                    .max()
                    .unwrap_or_default()
            })
            .collect();
        writeln!(f, "{}", self.aggregation.title())?;
        let headers: Vec<&str> = columns.iter().map(|c| c.header()).collect();
        write_line(f, columns, &widths, &headers)?;
        let length = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        writeln!(f, "{:-<length$}", "")?;
        for row in &cells {
            let row: Vec<&str> = row.iter().map(String::as_str).collect();
            write_line(f, columns, &widths, &row)?;
        }
        Ok(())
    }
}

/// Writes one line of a table, right-aligning numeric columns.
fn write_line(
    f: &mut std::fmt::Formatter<'_>,
    columns: &[Column],
    widths: &[usize],
    line: &[&str],
) -> std::fmt::Result {
    for (i, (text, column)) in line.iter().zip(columns).enumerate() {
        let width = widths[i];
        if i > 0 {
            write!(f, "  ")?;
        }
        if column.is_numeric() {
            write!(f, "{text:>width$}")?;
        } else if i + 1 == line.len() {
            write!(f, "{text}")?;
        } else {
            write!(f, "{text:width$}")?;
        }
    }
    writeln!(f)
}

#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
struct GroupKey {
    month: Option<Month>,
    user_id: Option<String>,
    product_id: String,
    product_name: String,
}

impl GroupKey {
    fn by_product(record: &SalesRecord) -> Self {
        Self {
            month: None,
            user_id: None,
            product_id: record.product_id.clone(),
            product_name: record.product_name.clone(),
        }
    }

    fn by_month(record: &SalesRecord) -> Self {
        Self {
            month: Some(record.month()),
            ..Self::by_product(record)
        }
    }

    fn by_user(record: &SalesRecord) -> Self {
        Self {
            user_id: Some(record.user_id.clone()),
            ..Self::by_product(record)
        }
    }

    fn into_row(self, value: Value, boost: Option<Value>) -> SummaryRow {
        SummaryRow {
            month: self.month,
            user_id: self.user_id,
            product_id: self.product_id,
            product_name: self.product_name,
            value,
            boost,
        }
    }
}

/// Running sums over one group of records.
#[derive(Clone, Copy, Debug, Default)]
struct Totals {
    revenue: Yen,
    boost: Yen,
    units: u64,
}

impl Totals {
    fn add(&mut self, record: &SalesRecord) {
        self.revenue += record.unit_price;
        self.boost += record.boost;
        self.units += 1;
    }
}

fn group_by<K: Ord>(
    records: &[SalesRecord],
    key: impl Fn(&SalesRecord) -> K,
) -> BTreeMap<K, Totals> {
    let mut groups: BTreeMap<K, Totals> = BTreeMap::new();
    for record in records {
        groups.entry(key(record)).or_default().add(record);
    }
    groups
}

/// Sums revenue per product and month, then accumulates each product's sums
/// over every month from the earliest record to the latest.
///
/// Months in which a product sold nothing still get a row, carrying the
/// previous month's total.
fn cumulative_revenue(records: &[SalesRecord]) -> Vec<SummaryRow> {
    let (Some(first), Some(last)) = (
        records.iter().map(SalesRecord::month).min(),
        records.iter().map(SalesRecord::month).max(),
    ) else {
        return Vec::new();
    };
    let months = Month::range_inclusive(first, last);

    let mut per_product: BTreeMap<GroupKey, BTreeMap<Month, Totals>> = BTreeMap::new();
    for record in records {
        per_product
            .entry(GroupKey::by_product(record))
            .or_default()
            .entry(record.month())
            .or_default()
            .add(record);
    }

    let mut rows = Vec::with_capacity(per_product.len() * months.len());
    for (key, by_month) in per_product {
        let mut revenue = Yen::default();
        let mut boost = Yen::default();
        for &month in &months {
            if let Some(totals) = by_month.get(&month) {
                revenue += totals.revenue;
                boost += totals.boost;
            }
            let key = GroupKey {
                month: Some(month),
                ..key.clone()
            };
            rows.push(key.into_row(Value::Yen(revenue), Some(Value::Yen(boost))));
        }
    }
    rows
}
