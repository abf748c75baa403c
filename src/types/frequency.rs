//! Calendar bucketing for trend series.

use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate};
use strum_macros::Display;

use crate::error::AnalyticsError;

/// Calendar period used to bucket timestamps.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Frequency {
    /// Calendar day
    Day,
    /// Week ending on Sunday
    Week,
    /// Calendar month, labelled by its last day
    MonthEnd,
    /// Calendar month, labelled by its first day
    MonthStart,
    /// Calendar quarter, labelled by its last day
    QuarterEnd,
    /// Calendar year, labelled by 31 December
    YearEnd,
    /// Calendar year, labelled by 1 January
    YearStart,
}

/// Accepted frequency tokens, matched case-insensitively.
///
/// Covers the usual period aliases, including the legacy `M`, `Q`, `Y` and `A` spellings of the
/// period-end frequencies.
const ALIASES: &[(&str, Frequency)] = &[
    ("d", Frequency::Day),
    ("day", Frequency::Day),
    ("daily", Frequency::Day),
    ("w", Frequency::Week),
    ("w-sun", Frequency::Week),
    ("week", Frequency::Week),
    ("weekly", Frequency::Week),
    ("m", Frequency::MonthEnd),
    ("me", Frequency::MonthEnd),
    ("month", Frequency::MonthEnd),
    ("monthly", Frequency::MonthEnd),
    ("ms", Frequency::MonthStart),
    ("q", Frequency::QuarterEnd),
    ("qe", Frequency::QuarterEnd),
    ("quarter", Frequency::QuarterEnd),
    ("quarterly", Frequency::QuarterEnd),
    ("y", Frequency::YearEnd),
    ("ye", Frequency::YearEnd),
    ("a", Frequency::YearEnd),
    ("year", Frequency::YearEnd),
    ("yearly", Frequency::YearEnd),
    ("annual", Frequency::YearEnd),
    ("ys", Frequency::YearStart),
    ("as", Frequency::YearStart),
];

impl FromStr for Frequency {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_lowercase();
        ALIASES
            .iter()
            .find(|(alias, _)| *alias == token)
            .map(|(_, freq)| *freq)
            .ok_or_else(|| AnalyticsError::UnsupportedFrequency {
                freq: s.to_string(),
            })
    }
}

impl Frequency {
    /// Returns the date that labels the bucket containing `date`.
    pub fn bucket(self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Day => Some(date),
            Self::Week => {
                let to_sunday = 6 - date.weekday().num_days_from_monday();
                date.checked_add_days(Days::new(to_sunday.into()))
            }
            Self::MonthEnd => last_day_of_month(date.year(), date.month()),
            Self::MonthStart => NaiveDate::from_ymd_opt(date.year(), date.month(), 1),
            Self::QuarterEnd => {
                let quarter_end_month = (date.month0() / 3 + 1) * 3;
                last_day_of_month(date.year(), quarter_end_month)
            }
            Self::YearEnd => NaiveDate::from_ymd_opt(date.year(), 12, 31),
            Self::YearStart => NaiveDate::from_ymd_opt(date.year(), 1, 1),
        }
    }
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parse_aliases() {
        assert_eq!(Frequency::MonthEnd, "M".parse().unwrap());
        assert_eq!(Frequency::MonthEnd, "ME".parse().unwrap());
        assert_eq!(Frequency::MonthStart, "MS".parse().unwrap());
        assert_eq!(Frequency::Week, "W-SUN".parse().unwrap());
        assert_eq!(Frequency::Day, " day ".parse().unwrap());
        assert_eq!(Frequency::YearEnd, "A".parse().unwrap());
        assert_eq!(Frequency::QuarterEnd, "Q".parse().unwrap());
    }

    #[test]
    fn parse_unknown() {
        let err = "fortnight".parse::<Frequency>().unwrap_err();
        assert_eq!("unsupported frequency fortnight", err.to_string());
    }

    #[test]
    fn bucket_day() {
        assert_eq!(Some(date(2025, 3, 4)), Frequency::Day.bucket(date(2025, 3, 4)));
    }

    #[test]
    fn bucket_week_ends_on_sunday() {
        // 2025-01-01 is a Wednesday.
        assert_eq!(Some(date(2025, 1, 5)), Frequency::Week.bucket(date(2025, 1, 1)));
        assert_eq!(Some(date(2025, 1, 5)), Frequency::Week.bucket(date(2025, 1, 5)));
        assert_eq!(Some(date(2025, 1, 12)), Frequency::Week.bucket(date(2025, 1, 6)));
    }

    #[test]
    fn bucket_month_end() {
        assert_eq!(Some(date(2025, 1, 31)), Frequency::MonthEnd.bucket(date(2025, 1, 1)));
        assert_eq!(Some(date(2025, 2, 28)), Frequency::MonthEnd.bucket(date(2025, 2, 1)));
        assert_eq!(Some(date(2024, 2, 29)), Frequency::MonthEnd.bucket(date(2024, 2, 10)));
        assert_eq!(Some(date(2025, 12, 31)), Frequency::MonthEnd.bucket(date(2025, 12, 1)));
    }

    #[test]
    fn bucket_month_start() {
        assert_eq!(Some(date(2025, 2, 1)), Frequency::MonthStart.bucket(date(2025, 2, 17)));
    }

    #[test]
    fn bucket_quarter_end() {
        assert_eq!(Some(date(2025, 3, 31)), Frequency::QuarterEnd.bucket(date(2025, 1, 15)));
        assert_eq!(Some(date(2025, 6, 30)), Frequency::QuarterEnd.bucket(date(2025, 4, 1)));
        assert_eq!(Some(date(2025, 12, 31)), Frequency::QuarterEnd.bucket(date(2025, 12, 31)));
    }

    #[test]
    fn bucket_year() {
        assert_eq!(Some(date(2025, 12, 31)), Frequency::YearEnd.bucket(date(2025, 6, 1)));
        assert_eq!(Some(date(2025, 1, 1)), Frequency::YearStart.bucket(date(2025, 6, 1)));
    }
}
