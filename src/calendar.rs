//! CF calendars and month lengths
//!
//! Month lengths drive the day weighting of seasonal means, so each
//! calendar reproduces its own leap-year rule.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// First year of the Gregorian rules in the mixed `standard` calendar
pub const GREGORIAN_CUTOVER_YEAR: i32 = 1583;

/// CF calendar systems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Calendar {
    /// Mixed Julian/Gregorian, also called `gregorian`
    #[default]
    Standard,
    ProlepticGregorian,
    Julian,
    /// 365 days every year, also called `365_day`
    NoLeap,
    /// 366 days every year, also called `366_day`
    AllLeap,
    /// Twelve 30-day months
    #[serde(rename = "360_day")]
    Day360,
}

const DAYS_365: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
const DAYS_366: [u32; 12] = [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
const DAYS_360: [u32; 12] = [30; 12];

fn julian_leap(year: i32) -> bool {
    year.rem_euclid(4) == 0
}

fn gregorian_leap(year: i32) -> bool {
    (year.rem_euclid(4) == 0 && year.rem_euclid(100) != 0) || year.rem_euclid(400) == 0
}

impl Calendar {
    /// Whether `year` has a leap day in this calendar
    #[must_use]
    pub fn is_leap_year(self, year: i32) -> bool {
        match self {
            Self::Standard => {
                if year < GREGORIAN_CUTOVER_YEAR {
                    julian_leap(year)
                } else {
                    gregorian_leap(year)
                }
            }
            Self::ProlepticGregorian => gregorian_leap(year),
            Self::Julian => julian_leap(year),
            Self::AllLeap => true,
            Self::NoLeap | Self::Day360 => false,
        }
    }

    /// Month lengths for `year`, January first
    #[must_use]
    pub fn month_lengths(self, year: i32) -> &'static [u32; 12] {
        match self {
            Self::Day360 => &DAYS_360,
            _ if self.is_leap_year(year) => &DAYS_366,
            _ => &DAYS_365,
        }
    }

    /// Days in a 1-based `month` of `year`
    ///
    /// # Panics
    ///
    /// Panics if `month` is not in `1..=12`.
    #[must_use]
    pub fn days_in_month(self, year: i32, month: u32) -> u32 {
        assert!((1..=12).contains(&month), "month {month} out of range");
        self.month_lengths(year)[(month - 1) as usize]
    }

    /// Days in `year`
    #[must_use]
    pub fn days_in_year(self, year: i32) -> u32 {
        self.month_lengths(year).iter().sum()
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::ProlepticGregorian => "proleptic_gregorian",
            Self::Julian => "julian",
            Self::NoLeap => "noleap",
            Self::AllLeap => "all_leap",
            Self::Day360 => "360_day",
        }
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Calendar {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "gregorian" => Ok(Self::Standard),
            "proleptic_gregorian" => Ok(Self::ProlepticGregorian),
            "julian" => Ok(Self::Julian),
            "noleap" | "no_leap" | "365_day" => Ok(Self::NoLeap),
            "all_leap" | "366_day" => Ok(Self::AllLeap),
            "360_day" => Ok(Self::Day360),
            other => Err(format!("Unknown calendar '{other}'")),
        }
    }
}

/// Year and 1-based month labelling one step of a monthly series
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthStamp {
    pub year: i32,
    pub month: u32,
}

impl MonthStamp {
    #[must_use]
    pub const fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// The following month
    #[must_use]
    pub const fn next(self) -> Self {
        if self.month >= 12 {
            Self::new(self.year + 1, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }

    /// `count` consecutive months starting at `self`
    #[must_use]
    pub fn series(self, count: usize) -> Vec<Self> {
        std::iter::successors(Some(self), |m| Some(m.next()))
            .take(count)
            .collect()
    }
}

impl FromStr for MonthStamp {
    type Err = String;

    /// Parse `YYYY-MM`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let date = chrono::NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
            .map_err(|e| format!("Invalid month '{s}', expected YYYY-MM: {e}"))?;
        Ok(Self::new(chrono::Datelike::year(&date), chrono::Datelike::month(&date)))
    }
}
