// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Native date-time control bridge: local ISO strings at the active detail.

use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use log::warn;
use regex::Regex;

use crate::models::value::Bounds;
use crate::models::{InputError, MaxDetail};

static NATIVE_RE: OnceLock<Regex> = OnceLock::new();

fn native_regex() -> &'static Regex {
    NATIVE_RE.get_or_init(|| {
        Regex::new(r"^(\d{4,})-(\d{2})-(\d{2})T(\d{2}):(\d{2})(?::(\d{2}))?$")
            .expect("native value regex must compile")
    })
}

/// Zero-padded `YYYY-MM-DDTHH:MM[:SS]` text, or empty for no value.
///
/// At hour detail the minutes read `00`.
pub fn native_value(value: Option<NaiveDateTime>, detail: MaxDetail) -> String {
    let Some(value) = value else {
        return String::new();
    };
    let date = format!("{:04}-{:02}-{:02}", value.year(), value.month(), value.day());
    match detail {
        MaxDetail::Hour => format!("{date}T{:02}:00", value.hour()),
        MaxDetail::Minute => format!("{date}T{:02}:{:02}", value.hour(), value.minute()),
        MaxDetail::Second => format!(
            "{date}T{:02}:{:02}:{:02}",
            value.hour(),
            value.minute(),
            value.second()
        ),
    }
}

/// `min` and `max` attributes of the native control.
pub fn native_bounds(bounds: &Bounds, detail: MaxDetail) -> (String, String) {
    (
        native_value(Some(bounds.min), detail),
        native_value(Some(bounds.max), detail),
    )
}

/// Step of the native control in seconds.
pub fn native_step(detail: MaxDetail) -> u32 {
    match detail {
        MaxDetail::Hour => 3600,
        MaxDetail::Minute => 60,
        MaxDetail::Second => 1,
    }
}

/// Decode the native control's value; empty text clears.
///
/// Date and time are built together, so a day that does not exist in the
/// month is rejected instead of rolling over.
///
/// # Errors
///
/// Returns [`InputError::InvalidNativeValue`] for text of another shape or
/// naming a date-time that does not exist.
pub fn parse_native(raw: &str) -> Result<Option<NaiveDateTime>, InputError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let invalid = || InputError::InvalidNativeValue(raw.to_string());
    let caps = native_regex().captures(raw).ok_or_else(invalid)?;
    let number = |i: usize| -> Result<u32, InputError> {
        caps.get(i)
            .map_or(Ok(0), |m| m.as_str().parse::<u32>().map_err(|_| invalid()))
    };

    let year = i32::try_from(number(1)?).map_err(|_| invalid())?;
    let (month, day) = (number(2)?, number(3)?);
    let (hour, minute, second) = (number(4)?, number(5)?, number(6)?);
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .map(Some)
        .ok_or_else(invalid)
}

/// Decode, logging and dropping text that is not a date-time.
pub fn decode_native(raw: &str) -> Option<Option<NaiveDateTime>> {
    match parse_native(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("Ignoring native input: {err}");
            None
        }
    }
}
