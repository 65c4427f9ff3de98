//! Reporting-month calendar helpers
//!
//! Analyses are keyed by a human-readable month label ("March 2026"). The
//! label list is fixed so the key format never depends on system locale.

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// One reporting month, the second half of the analysis composite key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportingMonth {
    pub year: i32,
    /// 1-12
    pub month: u32,
}

impl ReportingMonth {
    /// The current local reporting month
    pub fn current() -> Self {
        let today = Local::now().date_naive();
        Self {
            year: today.year(),
            month: today.month(),
        }
    }

    /// The reporting month `offset` months from this one (may be negative)
    pub fn offset(&self, offset: i32) -> Self {
        let zero_based = self.year * 12 + self.month as i32 - 1 + offset;
        Self {
            year: zero_based.div_euclid(12),
            month: (zero_based.rem_euclid(12) + 1) as u32,
        }
    }

    /// Canonical month label used as the analysis key ("March 2026")
    pub fn label(&self) -> String {
        format!("{} {}", MONTH_NAMES[(self.month - 1) as usize], self.year)
    }

    /// Parse a canonical month label back into a month
    pub fn parse(label: &str) -> Option<Self> {
        let (name, year) = label.rsplit_once(' ')?;
        let month = MONTH_NAMES.iter().position(|m| *m == name)? as u32 + 1;
        let year = year.parse::<i32>().ok()?;
        Some(Self { year, month })
    }

    /// First day of the month, for archive comparisons
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Labels for this month and the `count - 1` following months
    pub fn upcoming(count: usize) -> Vec<String> {
        let now = Self::current();
        (0..count as i32).map(|i| now.offset(i).label()).collect()
    }
}

impl fmt::Display for ReportingMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
