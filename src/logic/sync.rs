// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Composite value synchronizer.
//!
//! Owns the decomposed value. Segments report raw edits here; the
//! synchronizer recomposes and decides whether to report a change, a clear,
//! an invalid composite, or nothing. Hydration from an external value never
//! reports, so a host that echoes reported values back cannot loop.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Timelike};
use log::debug;

use crate::models::field::{AmPm, FieldToken, MaxDetail, to_24_hour};
use crate::models::value::{Bounds, CompositeValue, truncate};

/// Outcome reported to the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncEvent {
    /// New value, or `None` when everything was cleared.
    Changed {
        value: Option<NaiveDateTime>,
        close_popovers: bool,
    },
    /// Every segment is filled but the composite is not a valid value.
    Invalid,
}

/// Fill state of the composite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompositeState {
    Empty,
    Partial,
    Complete,
}

#[derive(Clone, Debug)]
pub struct Synchronizer {
    composite: CompositeValue,
    /// Latest text of each live field, as its segment shows it.
    raw: BTreeMap<FieldToken, String>,
    live: BTreeSet<FieldToken>,
    bounds: Bounds,
    detail: MaxDetail,
}

impl Synchronizer {
    pub fn new(live: impl IntoIterator<Item = FieldToken>, bounds: Bounds, detail: MaxDetail) -> Self {
        let live: BTreeSet<FieldToken> = live.into_iter().collect();
        let raw = live.iter().map(|t| (*t, String::new())).collect();
        Self {
            composite: CompositeValue::default(),
            raw,
            live,
            bounds,
            detail,
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Cached composed value.
    pub fn value(&self) -> Option<NaiveDateTime> {
        self.composite.composed
    }

    pub fn composite(&self) -> &CompositeValue {
        &self.composite
    }

    /// Text a segment of this field shows.
    pub fn text(&self, token: FieldToken) -> &str {
        self.raw.get(&token).map(String::as_str).unwrap_or_default()
    }

    pub fn state(&self) -> CompositeState {
        let filled = self.live.iter().filter(|t| !self.text(**t).is_empty()).count();
        if filled == 0 {
            CompositeState::Empty
        } else if filled == self.live.len() && self.live.iter().all(|t| self.is_valid(*t)) {
            CompositeState::Complete
        } else {
            CompositeState::Partial
        }
    }

    /// Rebuild every slot from an external value. Never reports.
    ///
    /// Out-of-range values are clamped onto the nearest bound.
    pub fn hydrate(&mut self, value: Option<NaiveDateTime>) {
        let shown = self.bounds.at_detail(self.detail);
        let value = value.map(|v| shown.clamp(truncate(v, self.detail)));
        self.composite = value.map(CompositeValue::from_datetime).unwrap_or_default();
        self.refresh_raw(|_| true);
        debug!("Hydrated composite with {value:?}");
    }

    /// Apply a segment edit and evaluate what to report.
    pub fn edit(&mut self, token: FieldToken, raw: &str) -> Option<SyncEvent> {
        let text = sanitize(token, raw);
        self.raw.insert(token, text.clone());

        match token {
            FieldToken::Hour12 => {
                let am_pm = self.composite.am_pm.unwrap_or(AmPm::Am);
                self.composite.hour = text
                    .parse::<u32>()
                    .ok()
                    .map(|h| to_24_hour(h, am_pm).to_string());
                self.refresh_raw(|t| t == FieldToken::Hour24);
            }
            FieldToken::AmPm => {
                self.composite.am_pm = AmPm::parse(&text);
                let hour12 = self.text(FieldToken::Hour12).parse::<u32>().ok();
                if let (Some(am_pm), Some(h)) = (self.composite.am_pm, hour12) {
                    self.composite.hour = Some(to_24_hour(h, am_pm).to_string());
                }
                self.refresh_raw(|t| t == FieldToken::Hour24);
            }
            FieldToken::Hour24 => {
                self.composite.set_slot(token, Some(text));
                if let Some(hour) = self.composite.number(FieldToken::Hour24) {
                    self.composite.am_pm = Some(AmPm::of_hour(hour));
                }
                self.refresh_raw(|t| matches!(t, FieldToken::Hour12 | FieldToken::AmPm));
            }
            _ => {
                self.composite.set_slot(token, Some(text));
                self.refresh_raw(|t| t != token && t.slot() == token.slot());
            }
        }

        self.evaluate()
    }

    /// Take a value picked from the calendar or clock.
    pub fn select(&mut self, value: NaiveDateTime, close_popovers: bool) -> SyncEvent {
        self.hydrate(Some(value));
        let value = self.composite.composed;
        debug!("Picked {value:?}");
        SyncEvent::Changed {
            value,
            close_popovers,
        }
    }

    /// Empty every slot and report the clear once.
    pub fn clear(&mut self) -> SyncEvent {
        self.hydrate(None);
        SyncEvent::Changed {
            value: None,
            close_popovers: false,
        }
    }

    /// Take a value decoded from the native bridge.
    ///
    /// Reports like a completed edit; a value outside the bounds is invalid
    /// and leaves the slots untouched.
    pub fn native(&mut self, value: Option<NaiveDateTime>) -> SyncEvent {
        let Some(value) = value else {
            return self.clear();
        };
        let value = truncate(value, self.detail);
        if !self.bounds.contains(value) {
            debug!("Native value {value} is out of range");
            return SyncEvent::Invalid;
        }
        self.select(value, false)
    }

    /// Allowed range of a segment, narrowed by bounds that share its context.
    ///
    /// Month and day narrow when year (and month) match a bound; hour narrows
    /// on the same calendar day, minute additionally on the same hour, second
    /// on the same minute. Evaluated against the current slots on every call.
    pub fn segment_range(&self, token: FieldToken) -> RangeInclusive<u32> {
        let Bounds { min, max } = self.bounds;
        let year = self.composite.number(FieldToken::Year).map(|y| y as i32);
        let month = self.composite.number(FieldToken::Month);
        let hour = self.composite.number(FieldToken::Hour24);
        let minute = self.composite.number(FieldToken::Minute);
        let same_min_day = self.selected_date() == Some(min.date());
        let same_max_day = self.selected_date() == Some(max.date());

        let (lo, hi) = match token {
            FieldToken::Year => (min.year().max(1) as u32, max.year().max(1) as u32),
            FieldToken::Month | FieldToken::MonthName => (
                if year == Some(min.year()) { min.month() } else { 1 },
                if year == Some(max.year()) { max.month() } else { 12 },
            ),
            FieldToken::Day => {
                let same_min_month = year == Some(min.year()) && month == Some(min.month());
                let same_max_month = year == Some(max.year()) && month == Some(max.month());
                let month_days = match (year, month) {
                    (Some(y), Some(m)) => days_in_month(y, m),
                    _ => 31,
                };
                (
                    if same_min_month { min.day() } else { 1 },
                    if same_max_month { max.day().min(month_days) } else { month_days },
                )
            }
            FieldToken::Hour24 => (
                if same_min_day { min.hour() } else { 0 },
                if same_max_day { max.hour() } else { 23 },
            ),
            FieldToken::Hour12 => (1, 12),
            FieldToken::Minute => (
                if same_min_day && hour == Some(min.hour()) { min.minute() } else { 0 },
                if same_max_day && hour == Some(max.hour()) { max.minute() } else { 59 },
            ),
            FieldToken::Second => (
                if same_min_day && hour == Some(min.hour()) && minute == Some(min.minute()) {
                    min.second()
                } else {
                    0
                },
                if same_max_day && hour == Some(max.hour()) && minute == Some(max.minute()) {
                    max.second()
                } else {
                    59
                },
            ),
            FieldToken::AmPm => (0, 1),
        };
        lo..=hi
    }

    /// Whether a half of the day is reachable within the bounds.
    pub fn am_pm_enabled(&self, am_pm: AmPm) -> bool {
        let Bounds { min, max } = self.bounds;
        let date = self.selected_date();
        match am_pm {
            AmPm::Am => !(date == Some(min.date()) && min.hour() >= 12),
            AmPm::Pm => !(date == Some(max.date()) && max.hour() < 12),
        }
    }

    /// Whether a month option can be picked given the bounds and selected year.
    pub fn month_enabled(&self, month: u32) -> bool {
        self.segment_range(FieldToken::Month).contains(&month)
    }

    /// Whether a segment's current text is acceptable on its own.
    pub fn is_valid(&self, token: FieldToken) -> bool {
        let text = self.text(token);
        if token == FieldToken::AmPm {
            return AmPm::parse(text).is_some_and(|v| self.am_pm_enabled(v));
        }
        let Ok(n) = text.parse::<u32>() else {
            return false;
        };
        if !self.segment_range(token).contains(&n) {
            return false;
        }
        if token == FieldToken::Hour12 {
            let am_pm = self.composite.am_pm.unwrap_or(AmPm::Am);
            return self
                .segment_range(FieldToken::Hour24)
                .contains(&to_24_hour(n, am_pm));
        }
        true
    }

    fn evaluate(&mut self) -> Option<SyncEvent> {
        let all_empty = self
            .live
            .iter()
            .filter(|t| **t != FieldToken::AmPm)
            .all(|t| self.text(*t).is_empty());
        if all_empty {
            self.composite.composed = None;
            debug!("All segments empty, reporting clear");
            return Some(SyncEvent::Changed {
                value: None,
                close_popovers: false,
            });
        }

        if self.live.iter().any(|t| self.text(*t).is_empty()) {
            debug!("Partial entry, not reporting");
            return None;
        }

        if let Some(invalid) = self.live.iter().find(|t| !self.is_valid(**t)) {
            debug!("Segment {invalid} is invalid");
            return Some(SyncEvent::Invalid);
        }

        match self.compose().filter(|v| self.bounds.contains(*v)) {
            Some(value) => {
                self.composite.composed = Some(value);
                debug!("Reporting {value}");
                Some(SyncEvent::Changed {
                    value: Some(value),
                    close_popovers: false,
                })
            }
            None => {
                debug!("Composite does not form a date in range");
                Some(SyncEvent::Invalid)
            }
        }
    }

    /// Build a value from live slots; missing year is this year, missing day is 1.
    fn compose(&self) -> Option<NaiveDateTime> {
        let date = self.compose_date()?;
        let number = |token: FieldToken, fallback: u32| -> Option<u32> {
            if self.is_live(token) {
                self.composite.number(token)
            } else {
                Some(fallback)
            }
        };
        let hour = number(FieldToken::Hour24, 0)?;
        let minute = number(FieldToken::Minute, 0)?;
        let second = number(FieldToken::Second, 0)?;
        date.and_hms_opt(hour, minute, second)
    }

    fn compose_date(&self) -> Option<NaiveDate> {
        let year = if self.is_live(FieldToken::Year) {
            self.composite.number(FieldToken::Year)? as i32
        } else {
            Local::now().year()
        };
        let month = if self.is_live(FieldToken::Month) {
            self.composite.number(FieldToken::Month)?
        } else {
            1
        };
        let day = if self.is_live(FieldToken::Day) {
            self.composite.number(FieldToken::Day)?
        } else {
            1
        };
        // Full numeric assignment: year 19 stays 19.
        NaiveDate::from_ymd_opt(year, month, day)
    }

    /// Date the slots currently describe, for same-day narrowing.
    fn selected_date(&self) -> Option<NaiveDate> {
        self.compose_date()
    }

    /// Whether any live segment writes the given slot.
    fn is_live(&self, slot: FieldToken) -> bool {
        self.live.iter().any(|t| t.slot() == slot.slot())
    }

    fn refresh_raw(&mut self, which: impl Fn(FieldToken) -> bool) {
        for token in self.live.iter().copied().filter(|t| which(*t)) {
            let text = self.composite.display(token).unwrap_or_default();
            self.raw.insert(token, text);
        }
    }
}

/// Keep what a segment can hold: digits up to its width, or an am/pm marker.
fn sanitize(token: FieldToken, raw: &str) -> String {
    match token {
        FieldToken::AmPm => AmPm::parse(raw)
            .map(|v| v.as_str().to_string())
            .unwrap_or_default(),
        FieldToken::MonthName => raw.trim().chars().filter(char::is_ascii_digit).collect(),
        _ => raw
            .chars()
            .filter(char::is_ascii_digit)
            .take(token.max_digits())
            .collect(),
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month >= 12 { (year + 1, 1) } else { (year, month + 1) };
    match (
        NaiveDate::from_ymd_opt(year, month, 1),
        NaiveDate::from_ymd_opt(next_year, next_month, 1),
    ) {
        (Some(first), Some(next)) => next.signed_duration_since(first).num_days() as u32,
        _ => 31,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use FieldToken::AmPm as Meridiem;
    use FieldToken::{Day, Hour12, Hour24, Minute, Month, Second, Year};

    const US_SECOND: [FieldToken; 7] = [Month, Day, Year, Hour12, Minute, Second, Meridiem];
    const DE_MINUTE: [FieldToken; 5] = [Day, Month, Year, Hour24, Minute];

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    fn changed(value: NaiveDateTime) -> Option<SyncEvent> {
        Some(SyncEvent::Changed {
            value: Some(value),
            close_popovers: false,
        })
    }

    fn cleared() -> Option<SyncEvent> {
        Some(SyncEvent::Changed {
            value: None,
            close_popovers: false,
        })
    }

    #[test]
    fn hydrate_decomposes_into_segments() {
        let mut sync = Synchronizer::new(US_SECOND, Bounds::default(), MaxDetail::Second);
        sync.hydrate(Some(dt(2017, 9, 30, 22, 17, 3)));

        let shown: Vec<_> = US_SECOND.iter().map(|t| sync.text(*t)).collect();
        assert_eq!(shown, ["9", "30", "2017", "10", "17", "3", "pm"]);
        assert_eq!(sync.value(), Some(dt(2017, 9, 30, 22, 17, 3)));
        assert_eq!(sync.state(), CompositeState::Complete);
    }

    #[test]
    fn round_trip_truncates_to_detail() {
        let original = dt(2017, 9, 30, 22, 17, 3);
        for (detail, live) in [
            (MaxDetail::Hour, &[Month, Day, Year, Hour12, Meridiem][..]),
            (MaxDetail::Minute, &[Month, Day, Year, Hour12, Minute, Meridiem][..]),
            (MaxDetail::Second, &US_SECOND[..]),
        ] {
            let mut sync = Synchronizer::new(live.iter().copied(), Bounds::default(), detail);
            sync.hydrate(Some(original));

            // Re-typing what is shown recomposes the truncated value.
            let mut last = None;
            for token in live {
                let shown = sync.text(*token).to_string();
                last = sync.edit(*token, &shown);
            }
            assert_eq!(last, changed(truncate(original, detail)), "{detail:?}");
        }
    }

    #[test]
    fn hydrate_never_reports_and_edit_reports_once() {
        let mut sync = Synchronizer::new(DE_MINUTE, Bounds::default(), MaxDetail::Minute);
        sync.hydrate(Some(dt(2020, 1, 1, 0, 0, 0)));
        sync.hydrate(Some(dt(2020, 1, 1, 0, 0, 0)));
        assert_eq!(sync.edit(Minute, "5"), changed(dt(2020, 1, 1, 0, 5, 0)));
    }

    #[test]
    fn small_years_are_kept() {
        let mut sync = Synchronizer::new(DE_MINUTE, Bounds::default(), MaxDetail::Minute);
        sync.hydrate(Some(dt(19, 3, 4, 5, 6, 0)));
        assert_eq!(sync.text(Year), "19");

        assert_eq!(sync.edit(Day, "5"), changed(dt(19, 3, 5, 5, 6, 0)));
        assert_eq!(sync.edit(Year, "19"), changed(dt(19, 3, 5, 5, 6, 0)));
    }

    #[test]
    fn partial_entry_is_silent() {
        let mut sync = Synchronizer::new(DE_MINUTE, Bounds::default(), MaxDetail::Minute);
        assert_eq!(sync.edit(Day, "3"), None);
        assert_eq!(sync.edit(Month, "4"), None);
        assert_eq!(sync.edit(Year, "2021"), None);
        assert_eq!(sync.edit(Hour24, "12"), None);
        assert_eq!(sync.state(), CompositeState::Partial);
        assert_eq!(sync.edit(Minute, "30"), changed(dt(2021, 4, 3, 12, 30, 0)));
    }

    #[test]
    fn filled_but_invalid_reports_invalid() {
        let mut sync = Synchronizer::new(DE_MINUTE, Bounds::default(), MaxDetail::Minute);
        sync.hydrate(Some(dt(2021, 2, 3, 12, 30, 0)));
        assert_eq!(sync.edit(Day, "31"), Some(SyncEvent::Invalid));
        assert_eq!(sync.edit(Minute, "75"), Some(SyncEvent::Invalid));
        assert_eq!(sync.value(), Some(dt(2021, 2, 3, 12, 30, 0)));
    }

    #[test]
    fn clearing_every_segment_reports_null_once() {
        let mut sync = Synchronizer::new(US_SECOND, Bounds::default(), MaxDetail::Second);
        sync.hydrate(Some(dt(2017, 9, 30, 22, 17, 3)));

        let events: Vec<_> = [Month, Day, Year, Hour12, Minute, Second]
            .iter()
            .filter_map(|t| sync.edit(*t, ""))
            .collect();
        assert_eq!(events, vec![cleared().unwrap()]);
        assert_eq!(sync.value(), None);
    }

    #[test]
    fn clear_empties_all_slots() {
        let mut sync = Synchronizer::new(US_SECOND, Bounds::default(), MaxDetail::Second);
        sync.hydrate(Some(dt(2017, 9, 30, 22, 17, 3)));
        assert_eq!(Some(sync.clear()), cleared());
        assert_eq!(sync.state(), CompositeState::Empty);
        assert_eq!(sync.text(Meridiem), "");
    }

    #[test]
    fn hour12_combines_with_am_pm() {
        let mut sync = Synchronizer::new(US_SECOND, Bounds::default(), MaxDetail::Second);
        sync.hydrate(Some(dt(2017, 9, 30, 8, 0, 0)));
        assert_eq!(sync.edit(Meridiem, "pm"), changed(dt(2017, 9, 30, 20, 0, 0)));
        assert_eq!(sync.edit(Hour12, "12"), changed(dt(2017, 9, 30, 12, 0, 0)));
        assert_eq!(sync.edit(Meridiem, "am"), changed(dt(2017, 9, 30, 0, 0, 0)));
        assert_eq!(sync.composite().hour.as_deref(), Some("0"));
        assert_eq!(sync.edit(Hour12, "13"), Some(SyncEvent::Invalid));
    }

    #[test]
    fn missing_year_and_day_default() {
        let live = [Month, Hour24];
        let mut sync = Synchronizer::new(live, Bounds::default(), MaxDetail::Hour);
        sync.edit(Month, "6");
        let this_year = Local::now().year();
        assert_eq!(sync.edit(Hour24, "7"), changed(dt(this_year, 6, 1, 7, 0, 0)));
    }

    #[test]
    fn out_of_range_value_is_clamped() {
        let bounds = Bounds::new(Some(dt(2000, 1, 1, 8, 0, 0)), Some(dt(2000, 12, 31, 18, 0, 0)));
        let mut sync = Synchronizer::new(DE_MINUTE, bounds, MaxDetail::Minute);
        sync.hydrate(Some(dt(1999, 5, 5, 5, 5, 0)));
        assert_eq!(sync.value(), Some(dt(2000, 1, 1, 8, 0, 0)));
        sync.hydrate(Some(dt(2030, 5, 5, 5, 5, 0)));
        assert_eq!(sync.value(), Some(dt(2000, 12, 31, 18, 0, 0)));
    }

    #[test]
    fn clamping_onto_a_finer_bound_keeps_what_is_shown() {
        let bounds = Bounds::new(Some(dt(2000, 1, 1, 8, 0, 30)), None);
        let mut sync = Synchronizer::new(DE_MINUTE, bounds, MaxDetail::Minute);
        sync.hydrate(Some(dt(1999, 5, 5, 5, 5, 0)));
        assert_eq!(sync.value(), Some(dt(2000, 1, 1, 8, 1, 0)));
        assert_eq!(sync.text(Minute), "1");

        let shown = sync.text(Minute).to_string();
        assert_eq!(sync.edit(Minute, &shown), changed(dt(2000, 1, 1, 8, 1, 0)));
    }

    #[test]
    fn same_day_bound_narrows_time_segments() {
        let bounds = Bounds::new(Some(dt(2000, 3, 10, 14, 30, 15)), None);
        let mut sync = Synchronizer::new(US_SECOND, bounds, MaxDetail::Second);
        sync.hydrate(Some(dt(2000, 3, 10, 15, 0, 0)));

        assert_eq!(sync.segment_range(Year), 2000..=9999);
        assert_eq!(sync.segment_range(Month), 3..=12);
        assert_eq!(sync.segment_range(Day), 10..=31);
        assert_eq!(sync.segment_range(Hour24), 14..=23);
        assert_eq!(sync.segment_range(Minute), 0..=59);
        assert!(!sync.am_pm_enabled(AmPm::Am));
        assert!(!sync.month_enabled(2));
        assert!(sync.month_enabled(3));

        // Moving to the bound's hour narrows minutes; a later day lifts it all.
        sync.edit(Hour12, "2");
        assert_eq!(sync.segment_range(Minute), 30..=59);
        assert_eq!(sync.edit(Minute, "10"), Some(SyncEvent::Invalid));
        sync.edit(Day, "11");
        assert_eq!(sync.segment_range(Hour24), 0..=23);
        assert_eq!(sync.edit(Minute, "10"), changed(dt(2000, 3, 11, 14, 10, 0)));
    }

    #[test]
    fn day_range_follows_month_length() {
        let mut sync = Synchronizer::new(DE_MINUTE, Bounds::default(), MaxDetail::Minute);
        sync.edit(Year, "2024");
        sync.edit(Month, "2");
        assert_eq!(sync.segment_range(Day), 1..=29);
        sync.edit(Year, "2023");
        assert_eq!(sync.segment_range(Day), 1..=28);
    }

    #[test]
    fn select_reports_with_close_flag() {
        let mut sync = Synchronizer::new(DE_MINUTE, Bounds::default(), MaxDetail::Minute);
        let event = sync.select(dt(2022, 7, 8, 9, 10, 11), true);
        assert_eq!(
            event,
            SyncEvent::Changed {
                value: Some(dt(2022, 7, 8, 9, 10, 0)),
                close_popovers: true,
            }
        );
        assert_eq!(sync.text(Minute), "10");
    }

    #[test]
    fn native_values_report_or_clear() {
        let bounds = Bounds::new(None, Some(dt(2030, 1, 1, 0, 0, 0)));
        let mut sync = Synchronizer::new(DE_MINUTE, bounds, MaxDetail::Minute);
        assert_eq!(
            Some(sync.native(Some(dt(2024, 2, 29, 23, 59, 30)))),
            changed(dt(2024, 2, 29, 23, 59, 0))
        );
        assert_eq!(sync.text(Day), "29");
        assert_eq!(sync.native(Some(dt(2031, 1, 1, 0, 0, 0))), SyncEvent::Invalid);
        assert_eq!(sync.value(), Some(dt(2024, 2, 29, 23, 59, 0)));
        assert_eq!(Some(sync.native(None)), cleared());
    }

    #[test]
    fn input_is_sanitized_to_segment_width() {
        let mut sync = Synchronizer::new(DE_MINUTE, Bounds::default(), MaxDetail::Minute);
        sync.edit(Day, "1/");
        assert_eq!(sync.text(Day), "1");
        sync.edit(Year, "202455");
        assert_eq!(sync.text(Year), "2024");
    }
}
