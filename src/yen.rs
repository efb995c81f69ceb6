use serde_with::DeserializeFromStr;

use std::{
    fmt::{Debug, Display},
    iter::Sum,
    ops::{Add, AddAssign},
    str::FromStr,
};

/// Represents an amount of money in Japanese yen.
///
/// Yen has no minor unit in practice, so the amount is stored as a whole
/// number of yen. The [`Display`] implementation adds the `¥` sign and
/// thousands separators.
#[derive(Clone, Copy, Default, DeserializeFromStr, Eq, Hash, PartialEq, Ord, PartialOrd)]
pub struct Yen(i64);

impl Yen {
    #[must_use]
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    #[must_use]
    pub const fn amount(self) -> i64 {
        self.0
    }
}

impl Debug for Yen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Yen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 2);
        if self.0 < 0 {
            grouped.push('-');
        }
        grouped.push('¥');
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        f.pad(&grouped)
    }
}

impl FromStr for Yen {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix(['¥', '￥']).unwrap_or(s);
        let s = s.strip_suffix('円').unwrap_or(s);
        Ok(Self(s.replace(',', "").trim().parse()?))
    }
}

impl Add for Yen {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Yen {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Yen {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}
