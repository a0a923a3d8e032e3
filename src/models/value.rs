// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Value types: supplied values, bounds, and the decomposed composite.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};

use crate::models::error::InputError;
use crate::models::field::{AmPm, FieldToken, MaxDetail, to_12_hour};

/// Value handed to the widget by its host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputValue {
    DateTime(NaiveDateTime),
    /// ISO-8601 text; an empty string means "no value".
    Text(String),
}

impl InputValue {
    /// Resolve to a concrete date-time, or `None` for an empty value.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::InvalidValue`] when the text is not a date-time.
    pub fn resolve(&self) -> Result<Option<NaiveDateTime>, InputError> {
        match self {
            Self::DateTime(dt) => Ok(Some(*dt)),
            Self::Text(raw) if raw.trim().is_empty() => Ok(None),
            Self::Text(raw) => parse_datetime(raw).map(Some),
        }
    }
}

impl From<NaiveDateTime> for InputValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl From<&str> for InputValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Parse an ISO-8601 civil date-time, or an instant converted to local time.
pub fn parse_datetime(raw: &str) -> Result<NaiveDateTime, InputError> {
    let raw = raw.trim();
    let civil = match raw.parse::<jiff::civil::DateTime>() {
        Ok(dt) => dt,
        Err(civil_err) => match raw.parse::<jiff::Timestamp>() {
            Ok(ts) => ts.to_zoned(jiff::tz::TimeZone::system()).datetime(),
            Err(_) => return Err(InputError::InvalidValue(format!("{raw:?}: {civil_err}"))),
        },
    };
    from_civil(civil).ok_or_else(|| InputError::InvalidValue(raw.to_string()))
}

fn from_civil(dt: jiff::civil::DateTime) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(i32::from(dt.year()), dt.month() as u32, dt.day() as u32)?
        .and_hms_nano_opt(
            dt.hour() as u32,
            dt.minute() as u32,
            dt.second() as u32,
            dt.subsec_nanosecond() as u32,
        )
}

/// Drop every component finer than `detail`.
pub fn truncate(value: NaiveDateTime, detail: MaxDetail) -> NaiveDateTime {
    let (minute, second) = match detail {
        MaxDetail::Hour => (0, 0),
        MaxDetail::Minute => (value.minute(), 0),
        MaxDetail::Second => (value.minute(), value.second()),
    };
    value
        .date()
        .and_hms_opt(value.hour(), minute, second)
        .unwrap_or(value)
}

/// Effective minimum and maximum instants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bounds {
    pub min: NaiveDateTime,
    pub max: NaiveDateTime,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl Bounds {
    /// Build bounds, filling unset ends with year 1 and the end of year 9999.
    pub fn new(min: Option<NaiveDateTime>, max: Option<NaiveDateTime>) -> Self {
        Self {
            min: min.unwrap_or_else(default_min),
            max: max.unwrap_or_else(default_max),
        }
    }

    pub fn contains(&self, value: NaiveDateTime) -> bool {
        value >= self.min && value <= self.max
    }

    /// Pull an out-of-range value onto the nearest bound.
    pub fn clamp(&self, value: NaiveDateTime) -> NaiveDateTime {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }

    /// Bounds as the segments can show them at `detail`.
    ///
    /// The minimum rounds up and the maximum rounds down, so a value clamped
    /// onto them has nothing finer than `detail`.
    pub fn at_detail(&self, detail: MaxDetail) -> Self {
        let max = truncate(self.max, detail);
        let mut min = truncate(self.min, detail);
        if min < self.min {
            let step = match detail {
                MaxDetail::Hour => TimeDelta::hours(1),
                MaxDetail::Minute => TimeDelta::minutes(1),
                MaxDetail::Second => TimeDelta::seconds(1),
            };
            min = min.checked_add_signed(step).filter(|m| *m <= max).unwrap_or(self.min);
        }
        Self { min, max }
    }
}

fn default_min() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .unwrap_or(NaiveDate::MIN)
        .and_time(NaiveTime::MIN)
}

fn default_max() -> NaiveDateTime {
    let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    NaiveDate::from_ymd_opt(9999, 12, 31)
        .unwrap_or(NaiveDate::MAX)
        .and_time(end_of_day)
}

/// Decomposed value: one optional slot per field plus the cached composition.
///
/// The hour slot always holds the 24-hour value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompositeValue {
    pub year: Option<String>,
    pub month: Option<String>,
    pub day: Option<String>,
    pub hour: Option<String>,
    pub minute: Option<String>,
    pub second: Option<String>,
    pub am_pm: Option<AmPm>,
    pub composed: Option<NaiveDateTime>,
}

impl CompositeValue {
    /// Split a concrete value into slots, deriving am/pm from the hour.
    pub fn from_datetime(value: NaiveDateTime) -> Self {
        Self {
            year: Some(value.year().to_string()),
            month: Some(value.month().to_string()),
            day: Some(value.day().to_string()),
            hour: Some(value.hour().to_string()),
            minute: Some(value.minute().to_string()),
            second: Some(value.second().to_string()),
            am_pm: Some(AmPm::of_hour(value.hour())),
            composed: Some(value),
        }
    }

    /// Slot content for a field, as shown by that field's segment.
    pub fn display(&self, token: FieldToken) -> Option<String> {
        match token {
            FieldToken::Hour12 => {
                let hour = self.hour.as_deref()?.parse::<u32>().ok()?;
                Some(to_12_hour(hour).0.to_string())
            }
            FieldToken::AmPm => self.am_pm.map(|v| v.as_str().to_string()),
            other => self.slot(other).map(str::to_string),
        }
    }

    pub fn slot(&self, token: FieldToken) -> Option<&str> {
        match token.slot() {
            FieldToken::Year => self.year.as_deref(),
            FieldToken::Month => self.month.as_deref(),
            FieldToken::Day => self.day.as_deref(),
            FieldToken::Hour24 => self.hour.as_deref(),
            FieldToken::Minute => self.minute.as_deref(),
            FieldToken::Second => self.second.as_deref(),
            FieldToken::AmPm => self.am_pm.map(AmPm::as_str),
            _ => None,
        }
    }

    /// Store a numeric slot; empty strings become unset.
    pub fn set_slot(&mut self, token: FieldToken, value: Option<String>) {
        let value = value.filter(|v| !v.is_empty());
        match token.slot() {
            FieldToken::Year => self.year = value,
            FieldToken::Month => self.month = value,
            FieldToken::Day => self.day = value,
            FieldToken::Hour24 => self.hour = value,
            FieldToken::Minute => self.minute = value,
            FieldToken::Second => self.second = value,
            FieldToken::AmPm => self.am_pm = value.as_deref().and_then(AmPm::parse),
            _ => {}
        }
    }

    /// Numeric slot value, when set and numeric.
    pub fn number(&self, token: FieldToken) -> Option<u32> {
        self.slot(token)?.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn parses_iso_text() {
        let value = InputValue::from("2017-09-30T22:17:03");
        assert_eq!(value.resolve().unwrap(), Some(dt(2017, 9, 30, 22, 17, 3)));
    }

    #[test]
    fn empty_text_is_no_value() {
        assert_eq!(InputValue::from("  ").resolve().unwrap(), None);
    }

    #[test]
    fn malformed_text_is_an_error() {
        let err = InputValue::from("not a date").resolve().unwrap_err();
        assert!(matches!(err, InputError::InvalidValue(_)));
        assert!(InputValue::from("2017-02-31T00:00:00").resolve().is_err());
    }

    #[test]
    fn bounds_clamp_to_nearest_end() {
        let bounds = Bounds::new(Some(dt(2000, 1, 1, 0, 0, 0)), Some(dt(2010, 1, 1, 0, 0, 0)));
        assert_eq!(bounds.clamp(dt(1990, 5, 5, 5, 5, 5)), bounds.min);
        assert_eq!(bounds.clamp(dt(2020, 5, 5, 5, 5, 5)), bounds.max);
        let inside = dt(2005, 5, 5, 5, 5, 5);
        assert_eq!(bounds.clamp(inside), inside);
    }

    #[test]
    fn bounds_at_detail_round_inwards() {
        let bounds = Bounds::new(Some(dt(2000, 1, 1, 8, 0, 30)), Some(dt(2000, 1, 1, 18, 45, 59)));
        let minute = bounds.at_detail(MaxDetail::Minute);
        assert_eq!(minute.min, dt(2000, 1, 1, 8, 1, 0));
        assert_eq!(minute.max, dt(2000, 1, 1, 18, 45, 0));

        let hour = bounds.at_detail(MaxDetail::Hour);
        assert_eq!(hour.min, dt(2000, 1, 1, 9, 0, 0));
        assert_eq!(hour.max, dt(2000, 1, 1, 18, 0, 0));

        assert_eq!(bounds.at_detail(MaxDetail::Second), bounds);
        assert_eq!(Bounds::default().at_detail(MaxDetail::Hour).min, Bounds::default().min);
    }

    #[test]
    fn default_bounds_span_year_one_to_9999() {
        let bounds = Bounds::default();
        assert_eq!(bounds.min, dt(1, 1, 1, 0, 0, 0));
        assert_eq!(bounds.max, dt(9999, 12, 31, 23, 59, 59));
    }

    #[test]
    fn truncation_zeroes_finer_fields() {
        let value = dt(2017, 9, 30, 22, 17, 3);
        assert_eq!(truncate(value, MaxDetail::Hour), dt(2017, 9, 30, 22, 0, 0));
        assert_eq!(truncate(value, MaxDetail::Minute), dt(2017, 9, 30, 22, 17, 0));
        assert_eq!(truncate(value, MaxDetail::Second), value);
    }

    #[test]
    fn composite_derives_am_pm_and_hour12() {
        let composite = CompositeValue::from_datetime(dt(2017, 9, 30, 22, 17, 3));
        assert_eq!(composite.hour.as_deref(), Some("22"));
        assert_eq!(composite.am_pm, Some(AmPm::Pm));
        assert_eq!(composite.display(FieldToken::Hour12).as_deref(), Some("10"));
        assert_eq!(composite.display(FieldToken::AmPm).as_deref(), Some("pm"));
    }
}
