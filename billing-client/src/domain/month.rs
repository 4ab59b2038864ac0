use std::{fmt, str::FromStr};

use time::{Date, Month};

/// A calendar month, rendered as `YYYY-MM`. Used to deduplicate fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey {
    year: i32,
    month: u8,
}

impl MonthKey {
    /// `month` is 1-based. Returns `None` for months outside 1..=12 or years
    /// the calendar cannot represent.
    pub fn new(year: i32, month: u8) -> Option<Self> {
        let m = Month::try_from(month).ok()?;
        Date::from_calendar_date(year, m, 1).ok()?;
        Some(Self { year, month })
    }

    pub fn from_date(date: Date) -> Self {
        Self {
            year: date.year(),
            month: u8::from(date.month()),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// 1-based month number, as sent on the wire.
    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn next(&self) -> Self {
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

    pub fn contains(&self, date: Date) -> bool {
        date.year() == self.year && u8::from(date.month()) == self.month
    }

    pub fn first_day(&self) -> Option<Date> {
        let m = Month::try_from(self.month).ok()?;
        Date::from_calendar_date(self.year, m, 1).ok()
    }

    /// Month name and year, e.g. `March 2024`.
    pub fn title(&self) -> String {
        match Month::try_from(self.month) {
            Ok(m) => format!("{m} {}", self.year),
            Err(_) => self.to_string(),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("invalid month key '{0}', expected YYYY-MM")]
pub struct InvalidMonthKey(pub String);

impl FromStr for MonthKey {
    type Err = InvalidMonthKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidMonthKey(s.to_string());
        let (y, m) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = y.parse().map_err(|_| invalid())?;
        let month: u8 = m.parse().map_err(|_| invalid())?;
        MonthKey::new(year, month).ok_or_else(invalid)
    }
}
