// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Field tokens, detail levels, and the AM/PM indicator.

use std::fmt;
use std::ops::RangeInclusive;

use serde::Deserialize;

use crate::models::error::InputError;

/// Finest time granularity exposed by the widget.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaxDetail {
    Hour,
    #[default]
    Minute,
    Second,
}

impl MaxDetail {
    pub const ALL: [MaxDetail; 3] = [MaxDetail::Hour, MaxDetail::Minute, MaxDetail::Second];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Minute => "minute",
            Self::Second => "second",
        }
    }
}

/// One kind of interactive segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldToken {
    Year,
    Month,
    MonthName,
    Day,
    Hour12,
    Hour24,
    Minute,
    Second,
    AmPm,
}

impl FieldToken {
    pub const ALL: [FieldToken; 9] = [
        FieldToken::Year,
        FieldToken::Month,
        FieldToken::MonthName,
        FieldToken::Day,
        FieldToken::Hour12,
        FieldToken::Hour24,
        FieldToken::Minute,
        FieldToken::Second,
        FieldToken::AmPm,
    ];

    /// Pattern letter this field is written with.
    pub fn letter(self) -> char {
        match self {
            Self::Year => 'y',
            Self::Month | Self::MonthName => 'M',
            Self::Day => 'd',
            Self::Hour12 => 'h',
            Self::Hour24 => 'H',
            Self::Minute => 'm',
            Self::Second => 's',
            Self::AmPm => 'a',
        }
    }

    /// Segment name used for `name` attributes, labels, and test hooks.
    pub fn segment_name(self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Month | Self::MonthName => "month",
            Self::Day => "day",
            Self::Hour12 => "hour12",
            Self::Hour24 => "hour24",
            Self::Minute => "minute",
            Self::Second => "second",
            Self::AmPm => "amPm",
        }
    }

    /// Allowed repetition counts of the pattern letter.
    pub fn widths(self) -> RangeInclusive<usize> {
        match self {
            Self::Year => 1..=4,
            Self::Month | Self::Day | Self::Hour12 | Self::Hour24 | Self::Minute | Self::Second => {
                1..=2
            }
            Self::MonthName => 3..=4,
            Self::AmPm => 1..=1,
        }
    }

    /// Number of digits the segment accepts when typing.
    pub fn max_digits(self) -> usize {
        match self {
            Self::Year => 4,
            Self::MonthName | Self::AmPm => 0,
            _ => 2,
        }
    }

    /// Detail level a time field belongs to; date fields have none.
    pub fn detail(self) -> Option<MaxDetail> {
        match self {
            Self::Hour12 | Self::Hour24 | Self::AmPm => Some(MaxDetail::Hour),
            Self::Minute => Some(MaxDetail::Minute),
            Self::Second => Some(MaxDetail::Second),
            _ => None,
        }
    }

    /// Whether the field is shown at the given max detail.
    pub fn visible_at(self, detail: MaxDetail) -> bool {
        self.detail().is_none_or(|d| d <= detail)
    }

    /// Slot that stores this field's value; month variants and hour variants share one.
    pub fn slot(self) -> FieldToken {
        match self {
            Self::MonthName => Self::Month,
            Self::Hour12 => Self::Hour24,
            other => other,
        }
    }

    /// Resolve a run of pattern letters (e.g. `"dd"`, `"MMM"`) to a field.
    ///
    /// Exact runs are looked up first; anything else is routed by its letter
    /// and rejected when wider than the field supports.
    pub fn from_run(run: &str) -> Result<(FieldToken, bool), InputError> {
        if let Some(hit) = exact_run(run) {
            return Ok(hit);
        }

        let len = run.chars().count();
        let family = family_of(run).ok_or_else(|| InputError::UnsupportedToken(run.to_string()))?;
        let token = match family {
            // Anything wider than a numeric month is a month name, width permitting.
            FieldToken::Month if len > 2 => FieldToken::MonthName,
            other => other,
        };
        if !token.widths().contains(&len) {
            return Err(InputError::UnsupportedToken(run.to_string()));
        }
        Ok((token, leading_zeros_for(token, len)))
    }
}

impl fmt::Display for FieldToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment_name())
    }
}

/// Table of runs the renderer dispatch knows verbatim.
fn exact_run(run: &str) -> Option<(FieldToken, bool)> {
    let hit = match run {
        "y" | "yyyy" => (FieldToken::Year, false),
        "M" => (FieldToken::Month, false),
        "MM" => (FieldToken::Month, true),
        "MMM" | "MMMM" => (FieldToken::MonthName, false),
        "d" => (FieldToken::Day, false),
        "dd" => (FieldToken::Day, true),
        "h" => (FieldToken::Hour12, false),
        "hh" => (FieldToken::Hour12, true),
        "H" => (FieldToken::Hour24, false),
        "HH" => (FieldToken::Hour24, true),
        "m" => (FieldToken::Minute, false),
        "mm" => (FieldToken::Minute, true),
        "s" => (FieldToken::Second, false),
        "ss" => (FieldToken::Second, true),
        "a" => (FieldToken::AmPm, false),
        _ => return None,
    };
    Some(hit)
}

/// Disambiguation predicate: which family a run belongs to, by its letter.
fn family_of(run: &str) -> Option<FieldToken> {
    if run.contains('h') {
        Some(FieldToken::Hour12)
    } else if run.contains('H') {
        Some(FieldToken::Hour24)
    } else if run.contains('y') {
        Some(FieldToken::Year)
    } else if run.contains('M') {
        Some(FieldToken::Month)
    } else if run.contains('d') {
        Some(FieldToken::Day)
    } else if run.contains('m') {
        Some(FieldToken::Minute)
    } else if run.contains('s') {
        Some(FieldToken::Second)
    } else if run.contains('a') {
        Some(FieldToken::AmPm)
    } else {
        None
    }
}

fn leading_zeros_for(token: FieldToken, len: usize) -> bool {
    token != FieldToken::Year && token.max_digits() == 2 && len == 2
}

/// Half of the day for 12-hour display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AmPm {
    Am,
    Pm,
}

impl AmPm {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Am => "am",
            Self::Pm => "pm",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "am" => Some(Self::Am),
            "pm" => Some(Self::Pm),
            _ => None,
        }
    }

    pub fn of_hour(hour24: u32) -> Self {
        if hour24 < 12 { Self::Am } else { Self::Pm }
    }
}

/// Convert a 12-hour clock value to 24-hour form.
///
/// Values outside 1-12 pass through unchanged so the segment can flag them.
pub fn to_24_hour(hour12: u32, am_pm: AmPm) -> u32 {
    match (am_pm, hour12) {
        (AmPm::Am, 12) => 0,
        (AmPm::Pm, h) if h < 12 => h + 12,
        (_, h) => h,
    }
}

/// Convert a 24-hour clock value to its 12-hour display and half of day.
pub fn to_12_hour(hour24: u32) -> (u32, AmPm) {
    let am_pm = AmPm::of_hour(hour24);
    let h = hour24 % 12;
    (if h == 0 { 12 } else { h }, am_pm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_runs_resolve_with_leading_zero_hint() {
        assert_eq!(FieldToken::from_run("d").unwrap(), (FieldToken::Day, false));
        assert_eq!(FieldToken::from_run("dd").unwrap(), (FieldToken::Day, true));
        assert_eq!(
            FieldToken::from_run("MMMM").unwrap(),
            (FieldToken::MonthName, false)
        );
        assert_eq!(FieldToken::from_run("yyyy").unwrap(), (FieldToken::Year, false));
    }

    #[test]
    fn predicate_fallback_routes_by_letter() {
        assert_eq!(FieldToken::from_run("yy").unwrap().0, FieldToken::Year);
        assert_eq!(FieldToken::from_run("yyy").unwrap().0, FieldToken::Year);
    }

    #[test]
    fn too_wide_runs_are_rejected_by_name() {
        let err = FieldToken::from_run("ddd").unwrap_err();
        assert_eq!(err.to_string(), "Unsupported token: ddd");

        let err = FieldToken::from_run("MMMMM").unwrap_err();
        assert_eq!(err.to_string(), "Unsupported token: MMMMM");

        assert!(FieldToken::from_run("yyyyy").is_err());
        assert!(FieldToken::from_run("hhh").is_err());
        assert!(FieldToken::from_run("aa").is_err());
    }

    #[test]
    fn hour_conversions_cover_noon_and_midnight() {
        assert_eq!(to_24_hour(12, AmPm::Am), 0);
        assert_eq!(to_24_hour(12, AmPm::Pm), 12);
        assert_eq!(to_24_hour(10, AmPm::Pm), 22);
        assert_eq!(to_12_hour(0), (12, AmPm::Am));
        assert_eq!(to_12_hour(22), (10, AmPm::Pm));
        assert_eq!(to_12_hour(12), (12, AmPm::Pm));
    }

    #[test]
    fn visibility_follows_detail() {
        assert!(FieldToken::Day.visible_at(MaxDetail::Hour));
        assert!(FieldToken::AmPm.visible_at(MaxDetail::Hour));
        assert!(!FieldToken::Minute.visible_at(MaxDetail::Hour));
        assert!(FieldToken::Minute.visible_at(MaxDetail::Minute));
        assert!(!FieldToken::Second.visible_at(MaxDetail::Minute));
    }
}
