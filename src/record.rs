use chrono::{Datelike, NaiveDate, NaiveDateTime};

use std::fmt::Display;

use crate::yen::Yen;

/// One line item of an order, with order-level fields already filled in.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SalesRecord {
    pub order_id: String,
    pub ordered_at: NaiveDateTime,
    pub product_id: String,
    pub product_name: String,
    pub unit_price: Yen,
    pub boost: Yen,
    pub user_id: String,
}

impl SalesRecord {
    /// The calendar date the order was placed.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.ordered_at.date()
    }

    /// The calendar month the order was placed.
    #[must_use]
    pub fn month(&self) -> Month {
        Month::of(self.ordered_at.date())
    }
}

/// A calendar month, ordered chronologically.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Ord, PartialOrd)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    /// Returns the month `month` (1-12) of `year`, or `None` if `month` is out
    /// of range.
    #[must_use]
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// Returns the month containing `date`.
    #[must_use]
    pub fn of(date: impl Datelike) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    #[must_use]
    pub fn year(self) -> i32 {
        self.year
    }

    #[must_use]
    pub fn month(self) -> u32 {
        self.month
    }

    /// Returns the month after this one.
    #[must_use]
    pub fn succ(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Returns every month from `first` to `last`, both included.
    ///
    /// The result is empty if `first` is after `last`.
    #[must_use]
    pub fn range_inclusive(first: Self, last: Self) -> Vec<Self> {
        let mut months = Vec::new();
        let mut current = first;
        while current <= last {
            months.push(current);
            current = current.succ();
        }
        months
    }
}

impl Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&format!("{:04}/{:02}", self.year, self.month))
    }
}
