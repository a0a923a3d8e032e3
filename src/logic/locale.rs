// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Locale-aware formatting capability consumed by the placeholder deriver
//! and the month/AM-PM select segments.

use std::fmt::Write;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use log::warn;
use pure_rust_locales::{Locale, locale_match};

/// Locale used when neither the requested nor the platform locale resolves.
const FALLBACK_LOCALE: &str = "en_US";

/// Format dates, times, and numbers the way a locale displays them.
pub trait LocaleFormat {
    /// Canonical tag of the resolved locale.
    fn tag(&self) -> &str;
    /// Short numeric date.
    fn format_date(&self, date: NaiveDate) -> String;
    /// Time of day including seconds.
    fn format_time(&self, time: NaiveTime) -> String;
    fn format_number(&self, n: u32) -> String {
        n.to_string()
    }
    /// AM and PM labels, in that order.
    fn am_pm_labels(&self) -> [String; 2];
    /// Month name for a 1-based month.
    fn month_name(&self, month: u32, short: bool) -> String;
}

/// Formatter backed by the glibc locale tables shipped with `pure-rust-locales`.
#[derive(Clone, Debug)]
pub struct PosixLocale {
    tag: String,
    locale: Locale,
}

impl PosixLocale {
    /// Resolve a tag such as `en-US`, `de_DE.UTF-8`, or `fr`.
    ///
    /// Unknown tags fall back to the platform locale, then to `en_US`.
    pub fn resolve(tag: Option<&str>) -> Self {
        if let Some(requested) = tag.filter(|t| !t.trim().is_empty()) {
            if let Some(found) = Self::lookup(requested) {
                return found;
            }
            warn!("Unknown locale {requested:?}, falling back to the platform locale");
        }
        Self::platform()
    }

    /// Platform locale from `LC_ALL`, `LC_TIME`, or `LANG`.
    pub fn platform() -> Self {
        ["LC_ALL", "LC_TIME", "LANG"]
            .iter()
            .filter_map(|key| std::env::var(key).ok())
            .filter(|v| !v.is_empty() && v != "C" && v != "POSIX")
            .find_map(|v| Self::lookup(&v))
            .or_else(|| Self::lookup(FALLBACK_LOCALE))
            .unwrap_or(Self {
                tag: "POSIX".to_string(),
                locale: Locale::POSIX,
            })
    }

    fn lookup(tag: &str) -> Option<Self> {
        let base = tag.trim().split(['.', '@']).next()?.replace('-', "_");
        let mut candidates = vec![base.clone()];
        if !base.contains('_') {
            candidates.push(format!("{}_{}", base, base.to_ascii_uppercase()));
        }
        candidates.into_iter().find_map(|candidate| {
            Locale::try_from(candidate.as_str())
                .ok()
                .map(|locale| Self {
                    tag: candidate,
                    locale,
                })
        })
    }

    fn d_fmt(&self) -> &'static str {
        locale_match!(self.locale => LC_TIME::D_FMT)
    }

    fn t_fmt(&self) -> &'static str {
        locale_match!(self.locale => LC_TIME::T_FMT)
    }

    fn t_fmt_ampm(&self) -> &'static str {
        locale_match!(self.locale => LC_TIME::T_FMT_AMPM)
    }

    fn am_pm(&self) -> &'static [&'static str] {
        locale_match!(self.locale => LC_TIME::AM_PM)
    }

    fn months(&self, short: bool) -> &'static [&'static str] {
        if short {
            locale_match!(self.locale => LC_TIME::ABMON)
        } else {
            locale_match!(self.locale => LC_TIME::MON)
        }
    }

    /// Expand locale-dependent specifiers so chrono only sees plain ones.
    fn expand(&self, fmt: &str, value: NaiveDateTime, depth: u8) -> String {
        let mut out = String::with_capacity(fmt.len());
        let mut chars = fmt.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch != '%' {
                push_literal(&mut out, ch);
                continue;
            }
            let mut flags = String::new();
            while let Some(&flag) = chars.peek() {
                if matches!(flag, '-' | '_' | '0' | '^' | '#' | 'E' | 'O') {
                    chars.next();
                    if !matches!(flag, 'E' | 'O' | '^' | '#') {
                        flags.push(flag);
                    }
                } else {
                    break;
                }
            }
            let Some(spec) = chars.next() else { break };
            match spec {
                'x' | 'X' | 'r' if depth < 2 => {
                    let nested = match spec {
                        'x' => self.d_fmt(),
                        'X' => self.t_fmt(),
                        _ => self.t_fmt_ampm(),
                    };
                    out.push_str(&self.expand(nested, value, depth + 1));
                }
                'p' | 'P' => {
                    let [am, pm] = self.am_pm_labels();
                    let label = if value.hour() < 12 { am } else { pm };
                    let label = if spec == 'P' { label.to_lowercase() } else { label };
                    label.chars().for_each(|c| push_literal(&mut out, c));
                }
                'b' | 'h' | 'B' => {
                    let name = self.month_name(chrono::Datelike::month(&value), spec != 'B');
                    name.chars().for_each(|c| push_literal(&mut out, c));
                }
                // Civil values carry no zone.
                'Z' | 'z' => {}
                other => {
                    out.push('%');
                    out.push_str(&flags);
                    out.push(other);
                }
            }
        }
        out
    }

    fn render(&self, fmt: &str, value: NaiveDateTime, fallback: &str) -> String {
        let expanded = self.expand(fmt, value, 0);
        let mut out = String::new();
        if write!(out, "{}", value.format(&expanded)).is_err() {
            warn!("Locale {} format {fmt:?} is not renderable, using {fallback:?}", self.tag);
            out.clear();
            let _ = write!(out, "{}", value.format(fallback));
        }
        out.trim().to_string()
    }
}

fn push_literal(out: &mut String, ch: char) {
    if ch == '%' {
        out.push_str("%%");
    } else {
        out.push(ch);
    }
}

impl LocaleFormat for PosixLocale {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn format_date(&self, date: NaiveDate) -> String {
        self.render(self.d_fmt(), date.and_time(NaiveTime::MIN), "%Y-%m-%d")
    }

    fn format_time(&self, time: NaiveTime) -> String {
        let fmt = match self.t_fmt() {
            "" => self.t_fmt_ampm(),
            fmt => fmt,
        };
        let fmt = if fmt.is_empty() { "%H:%M:%S" } else { fmt };
        let value = NaiveDate::MIN.and_time(time);
        self.render(fmt, value, "%H:%M:%S")
    }

    fn am_pm_labels(&self) -> [String; 2] {
        match self.am_pm() {
            [am, pm, ..] if !am.is_empty() && !pm.is_empty() => [am.to_string(), pm.to_string()],
            _ => ["AM".to_string(), "PM".to_string()],
        }
    }

    fn month_name(&self, month: u32, short: bool) -> String {
        let index = month.clamp(1, 12) as usize - 1;
        self.months(short)
            .get(index)
            .map(|name| name.to_string())
            .unwrap_or_else(|| month.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bcp47_and_posix_spellings() {
        assert_eq!(PosixLocale::resolve(Some("de-DE")).tag(), "de_DE");
        assert_eq!(PosixLocale::resolve(Some("de_DE.UTF-8")).tag(), "de_DE");
        assert_eq!(PosixLocale::resolve(Some("fr")).tag(), "fr_FR");
    }

    #[test]
    fn unknown_locale_falls_back() {
        let resolved = PosixLocale::resolve(Some("xx-NOPE"));
        assert_eq!(resolved.tag(), PosixLocale::platform().tag());
    }

    #[test]
    fn german_date_uses_dots() {
        let de = PosixLocale::resolve(Some("de_DE"));
        let date = NaiveDate::from_ymd_opt(2017, 12, 11).unwrap();
        assert_eq!(de.format_date(date), "11.12.2017");
    }

    #[test]
    fn us_time_is_twelve_hour() {
        let us = PosixLocale::resolve(Some("en_US"));
        let time = NaiveTime::from_hms_opt(21, 13, 14).unwrap();
        let formatted = us.format_time(time);
        assert!(formatted.contains("PM"), "{formatted}");
        assert!(formatted.contains("13"));
        assert!(!formatted.contains("21"));
    }

    #[test]
    fn month_names_are_localized() {
        let de = PosixLocale::resolve(Some("de_DE"));
        assert_eq!(de.month_name(3, false), "März");
        let us = PosixLocale::resolve(Some("en_US"));
        assert_eq!(us.month_name(12, true), "Dec");
    }
}
