// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Derive a display pattern (e.g. `M/d/y h:mm:ss a`) from a locale by
//! formatting probe values and substituting the numerals with tokens.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};
use log::debug;

use crate::logic::locale::{LocaleFormat, PosixLocale};
use crate::logic::tokenizer::tokenize;
use crate::models::MaxDetail;

/// Joins the date and time halves of a derived pattern.
pub const DATE_TIME_JOINER: char = '\u{a0}';

const PROBE_YEAR: i32 = 2017;
const PROBE_MONTH: u32 = 12;
const PROBE_DAY: u32 = 11;
/// Last two digits of the probe year; left behind by locales with short years.
const PROBE_SHORT_YEAR: u32 = 17;

const PROBE_HOUR24: u32 = 21;
const PROBE_HOUR12: u32 = 9;
const PROBE_MINUTE: u32 = 13;
const PROBE_SECOND: u32 = 14;

/// Owned cache of resolved formatters and derived patterns.
#[derive(Default)]
pub struct PlaceholderDeriver {
    formatters: HashMap<String, PosixLocale>,
    patterns: HashMap<(String, MaxDetail), String>,
}

impl PlaceholderDeriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Formatter for a locale tag; `None` means the platform locale.
    pub fn formatter(&mut self, locale: Option<&str>) -> PosixLocale {
        let key = locale.unwrap_or_default().to_string();
        self.formatters
            .entry(key)
            .or_insert_with(|| PosixLocale::resolve(locale))
            .clone()
    }

    /// Date-time pattern for a locale at the given detail, memoized.
    pub fn derive(&mut self, locale: Option<&str>, detail: MaxDetail) -> String {
        let key = (locale.unwrap_or_default().to_string(), detail);
        if let Some(hit) = self.patterns.get(&key) {
            return hit.clone();
        }
        let formatter = self.formatter(locale);
        let pattern = derive_placeholder(&formatter, detail);
        debug!("Derived placeholder {pattern:?} for {}", formatter.tag());
        self.patterns.insert(key, pattern.clone());
        pattern
    }

    /// Number of memoized patterns.
    pub fn cached(&self) -> usize {
        self.patterns.len()
    }
}

/// Full pattern: date half, a non-breaking space, time half.
pub fn derive_placeholder(formatter: &dyn LocaleFormat, detail: MaxDetail) -> String {
    format!(
        "{}{}{}",
        date_placeholder(formatter),
        DATE_TIME_JOINER,
        time_placeholder(formatter, detail)
    )
}

/// Locale order of year, month, and day, e.g. `d.M.y`.
pub fn date_placeholder(formatter: &dyn LocaleFormat) -> String {
    let Some(date) = NaiveDate::from_ymd_opt(PROBE_YEAR, PROBE_MONTH, PROBE_DAY) else {
        return "y-M-d".to_string();
    };
    let formatted = formatter.format_date(date);
    let probes = [
        (PROBE_YEAR as u32, "y"),
        (PROBE_MONTH, "M"),
        (PROBE_DAY, "d"),
    ];
    let substituted = substitute_numerals(formatter, &formatted, &probes);
    // Two-digit years show up as "17", which matches none of the probes above.
    substitute_numerals(formatter, &substituted, &[(PROBE_SHORT_YEAR, "y")])
}

/// Locale time pattern restricted to `detail`, e.g. `h:mm a` for minutes.
pub fn time_placeholder(formatter: &dyn LocaleFormat, detail: MaxDetail) -> String {
    let Some(time) = NaiveTime::from_hms_opt(PROBE_HOUR24, PROBE_MINUTE, PROBE_SECOND) else {
        return "HH:mm:ss".to_string();
    };
    let mut formatted = formatter.format_time(time);

    let [am, pm] = formatter.am_pm_labels();
    let mut labels = [am, pm];
    labels.sort_by_key(|l| std::cmp::Reverse(l.len()));
    if let Some(label) = labels
        .iter()
        .find(|l| !l.is_empty() && formatted.contains(l.as_str()))
    {
        formatted = formatted.replacen(label.as_str(), "a", 1);
    }

    let probes = [
        (PROBE_HOUR24, "H"),
        (PROBE_HOUR12, "h"),
        (PROBE_MINUTE, "mm"),
        (PROBE_SECOND, "ss"),
    ];
    let full = substitute_numerals(formatter, &formatted, &probes);
    match tokenize(&full, true) {
        Ok(pattern) => pattern.restrict(detail).to_string(),
        Err(err) => {
            debug!("Keeping unrestricted time placeholder {full:?}: {err}");
            full
        }
    }
}

/// Replace each numeral run equal to a probe value with that probe's token.
///
/// Runs compare by formatted number (plain or zero-padded), so locales with
/// their own digit glyphs match as long as the formatter produces them.
fn substitute_numerals(
    formatter: &dyn LocaleFormat,
    text: &str,
    probes: &[(u32, &str)],
) -> String {
    let mut used = vec![false; probes.len()];
    let mut out = String::with_capacity(text.len());
    let mut run = String::new();

    let mut flush = |run: &mut String, out: &mut String| {
        if run.is_empty() {
            return;
        }
        let hit = probes
            .iter()
            .enumerate()
            .find(|(i, (value, _))| !used[*i] && numeral_matches(formatter, run, *value));
        match hit {
            Some((i, (_, token))) => {
                used[i] = true;
                out.push_str(token);
            }
            None => out.push_str(run),
        }
        run.clear();
    };

    for ch in text.chars() {
        if ch.is_numeric() {
            run.push(ch);
        } else {
            flush(&mut run, &mut out);
            out.push(ch);
        }
    }
    flush(&mut run, &mut out);
    out
}

fn numeral_matches(formatter: &dyn LocaleFormat, run: &str, value: u32) -> bool {
    let plain = formatter.format_number(value);
    if run == plain {
        return true;
    }
    value < 10 && run == format!("{}{}", formatter.format_number(0), plain)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Deterministic stand-in for a locale.
    pub(crate) struct FakeLocale {
        pub date: fn(NaiveDate) -> String,
        pub time: fn(NaiveTime) -> String,
        pub digits: Option<[char; 10]>,
        pub am_pm: [&'static str; 2],
    }

    impl FakeLocale {
        pub(crate) fn en_us() -> Self {
            Self {
                date: |d| d.format("%-m/%-d/%Y").to_string(),
                time: |t| t.format("%-I:%M:%S %p").to_string(),
                digits: None,
                am_pm: ["AM", "PM"],
            }
        }

        pub(crate) fn de_de() -> Self {
            Self {
                date: |d| d.format("%d.%m.%Y").to_string(),
                time: |t| t.format("%H:%M:%S").to_string(),
                digits: None,
                am_pm: ["AM", "PM"],
            }
        }
    }

    impl LocaleFormat for FakeLocale {
        fn tag(&self) -> &str {
            "fake"
        }

        fn format_date(&self, date: NaiveDate) -> String {
            self.localize((self.date)(date))
        }

        fn format_time(&self, time: NaiveTime) -> String {
            self.localize((self.time)(time))
        }

        fn format_number(&self, n: u32) -> String {
            self.localize(n.to_string())
        }

        fn am_pm_labels(&self) -> [String; 2] {
            self.am_pm.map(str::to_string)
        }

        fn month_name(&self, month: u32, _short: bool) -> String {
            format!("M{month}")
        }
    }

    impl FakeLocale {
        fn localize(&self, text: String) -> String {
            match self.digits {
                None => text,
                Some(glyphs) => text
                    .chars()
                    .map(|c| c.to_digit(10).map_or(c, |d| glyphs[d as usize]))
                    .collect(),
            }
        }
    }

    #[test]
    fn month_first_locale() {
        let pattern = derive_placeholder(&FakeLocale::en_us(), MaxDetail::Second);
        assert_eq!(pattern, "M/d/y\u{a0}h:mm:ss a");
    }

    #[test]
    fn day_first_locale_keeps_its_order() {
        let pattern = derive_placeholder(&FakeLocale::de_de(), MaxDetail::Minute);
        assert_eq!(pattern, "d.M.y\u{a0}H:mm");
    }

    #[test]
    fn two_digit_year_is_patched() {
        let locale = FakeLocale {
            date: |d| d.format("%d/%m/%y").to_string(),
            ..FakeLocale::de_de()
        };
        assert_eq!(date_placeholder(&locale), "d/M/y");
    }

    #[test]
    fn padded_hour_is_recognized() {
        let locale = FakeLocale {
            time: |t| t.format("%I:%M:%S %p").to_string(),
            ..FakeLocale::en_us()
        };
        assert_eq!(time_placeholder(&locale, MaxDetail::Second), "h:mm:ss a");
    }

    #[test]
    fn native_digit_glyphs_are_matched() {
        let locale = FakeLocale {
            digits: Some(['٠', '١', '٢', '٣', '٤', '٥', '٦', '٧', '٨', '٩']),
            ..FakeLocale::de_de()
        };
        assert_eq!(derive_placeholder(&locale, MaxDetail::Second), "d.M.y\u{a0}H:mm:ss");
    }

    #[test]
    fn detail_levels_trim_time_fields() {
        let us = FakeLocale::en_us();
        assert_eq!(time_placeholder(&us, MaxDetail::Hour), "h a");
        assert_eq!(time_placeholder(&us, MaxDetail::Minute), "h:mm a");
        assert_eq!(time_placeholder(&us, MaxDetail::Second), "h:mm:ss a");
    }

    #[test]
    fn suffix_separators_go_with_their_field() {
        let locale = FakeLocale {
            time: |t| t.format("%H時%M分%S秒").to_string(),
            ..FakeLocale::de_de()
        };
        assert_eq!(time_placeholder(&locale, MaxDetail::Minute), "H時mm分");
        assert_eq!(time_placeholder(&locale, MaxDetail::Hour), "H時");
    }

    #[test]
    fn deriver_memoizes_per_locale_and_detail() {
        let mut deriver = PlaceholderDeriver::new();
        let first = deriver.derive(Some("de_DE"), MaxDetail::Minute);
        let again = deriver.derive(Some("de_DE"), MaxDetail::Minute);
        assert_eq!(first, again);
        assert_eq!(deriver.cached(), 1);

        deriver.derive(Some("de_DE"), MaxDetail::Second);
        assert_eq!(deriver.cached(), 2);
    }

    #[test]
    fn posix_locales_produce_their_field_order() {
        let mut deriver = PlaceholderDeriver::new();
        assert_eq!(deriver.derive(Some("de_DE"), MaxDetail::Second), "d.M.y\u{a0}H:mm:ss");

        let us = deriver.derive(Some("en_US"), MaxDetail::Second);
        let month = us.find('M').unwrap();
        let day = us.find('d').unwrap();
        let year = us.find('y').unwrap();
        assert!(month < day && day < year, "{us}");
        assert!(us.ends_with(" a"), "{us}");
    }
}
