use chrono::NaiveDate;
use tracing::{info, warn};

use std::path::Path;

use crate::{error::LoadError, loader::load_file, record::SalesRecord};

/// Holds the line items from one or more sales files, sorted by order time.
///
/// To load files, use [`Sales::read_files`]. To combine records that were
/// already loaded, use [`Sales::merge`].
///
/// To restrict the records to a date window, use [`Sales::within`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sales {
    records: Vec<SalesRecord>,
}

impl Sales {
    /// Creates an empty set of sales.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every file in `paths` and merges the results.
    ///
    /// Each file is loaded (and forward-filled) on its own before any
    /// merging, so a blank order field is never filled from a different file.
    ///
    /// # Errors
    ///
    /// Returns the [`LoadError`] of the first file that fails to load. No
    /// records are returned in that case.
    pub fn read_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, LoadError> {
        let batches = paths.iter().map(load_file).collect::<Result<Vec<_>, _>>()?;
        let sales = Self::merge(batches);
        info!(
            files = paths.len(),
            records = sales.len(),
            "read sales files"
        );
        Ok(sales)
    }

    /// Concatenates `batches` in the order given and sorts the result by
    /// order time.
    ///
    /// The sort is stable: records with equal timestamps keep their
    /// batch-then-row order.
    #[must_use]
    pub fn merge(batches: impl IntoIterator<Item = Vec<SalesRecord>>) -> Self {
        let mut records: Vec<_> = batches.into_iter().flatten().collect();
        records.sort_by_key(|r| r.ordered_at);
        Self { records }
    }

    /// Returns the records ordered within `range`.
    #[must_use]
    pub fn within(&self, range: &DateRange) -> Self {
        if range.is_inverted() {
            warn!(?range, "start date is after end date, no records will match");
        }
        Self {
            records: self
                .records
                .iter()
                .filter(|r| range.contains(r.date()))
                .cloned()
                .collect(),
        }
    }

    #[must_use]
    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// An inclusive window of calendar dates, open on either side when a bound
/// is absent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    #[must_use]
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Reports whether `date` falls within the window. Both bounds are
    /// inclusive.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }

    fn is_inverted(&self) -> bool {
        matches!((self.start, self.end), (Some(start), Some(end)) if start > end)
    }
}

#[cfg(test)]
mod tests {
    use crate::loader::parse_timestamp;

    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y/%m/%d").unwrap()
    }

    fn both_files() -> Sales {
        Sales::read_files(&["testdata/sales_a.csv", "testdata/sales_b.csv"]).unwrap()
    }

    #[test]
    fn read_files_fn_sorts_records_by_order_time() {
        let sales = both_files();
        assert_eq!(sales.len(), 9, "wrong record count");
        assert!(sales
            .records()
            .windows(2)
            .all(|pair| pair[0].ordered_at <= pair[1].ordered_at));
    }

    #[test]
    fn read_files_fn_keeps_file_then_row_order_for_ties() {
        let sales = both_files();
        let ids: Vec<_> = sales.records().iter().map(|r| r.order_id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["2003", "1001", "1001", "1002", "1002", "2002", "1003", "2001", "2001"]
        );
        let products: Vec<_> = sales.records()[3..6]
            .iter()
            .map(|r| r.product_id.as_str())
            .collect();
        assert_eq!(products, vec!["A-1", "C-3", "B-2"]);
    }

    #[test]
    fn read_files_fn_fills_each_file_before_sorting() {
        let sales = both_files();
        let acrylic: Vec<_> = sales
            .records()
            .iter()
            .filter(|r| r.product_id == "C-3")
            .map(|r| (r.order_id.as_str(), r.user_id.as_str()))
            .collect();
        assert_eq!(acrylic, vec![("1002", "u-bbb"), ("2001", "u-ccc")]);
    }

    #[test]
    fn read_files_fn_fails_if_any_file_fails() {
        let result = Sales::read_files(&["testdata/sales_a.csv", "testdata/missing_column.csv"]);
        assert!(matches!(result, Err(LoadError::MissingColumn { .. })));
    }

    #[test]
    fn read_files_fn_with_no_files_is_empty() {
        let sales = Sales::read_files::<&str>(&[]).unwrap();
        assert!(sales.is_empty());
    }

    #[test]
    fn within_fn_includes_records_on_both_bounds() {
        let sales = both_files();
        let range = DateRange::new(Some(date("2023/01/05")), Some(date("2023/01/31")));
        let ids: Vec<_> = sales
            .within(&range)
            .records()
            .iter()
            .map(|r| r.order_id.clone())
            .collect();
        // 1003 is at 23:59:59 on the end date
        assert_eq!(ids, vec!["1001", "1001", "1002", "1002", "2002", "1003"]);
    }

    #[test]
    fn within_fn_excludes_records_one_day_outside() {
        let sales = both_files();
        let range = DateRange::new(Some(date("2023/01/06")), Some(date("2023/01/30")));
        let filtered = sales.within(&range);
        assert!(filtered.records().iter().all(|r| r.order_id != "1001"));
        assert!(filtered.records().iter().all(|r| r.order_id != "1003"));
        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn within_fn_leaves_open_sides_unfiltered() {
        let sales = both_files();
        let from = sales.within(&DateRange::new(Some(date("2023/01/31")), None));
        assert_eq!(from.len(), 3);
        let until = sales.within(&DateRange::new(None, Some(date("2023/01/03"))));
        assert_eq!(until.len(), 1);
        assert_eq!(sales.within(&DateRange::default()), sales);
    }

    #[test]
    fn within_fn_with_inverted_range_is_empty() {
        let sales = both_files();
        let range = DateRange::new(Some(date("2023/02/01")), Some(date("2023/01/01")));
        assert!(sales.within(&range).is_empty());
    }

    #[test]
    fn merge_fn_is_stable_for_equal_timestamps() {
        let mut first = load_file("testdata/sales_a.csv").unwrap();
        first.truncate(1);
        let mut second = first.clone();
        second[0].order_id = "other".into();
        assert_eq!(
            second[0].ordered_at,
            parse_timestamp("2023-01-05 10:00:00").unwrap()
        );
        let merged = Sales::merge([second.clone(), first.clone()]);
        assert_eq!(merged.records()[0].order_id, "other");
        assert_eq!(merged.records()[1].order_id, "1001");
    }
}
