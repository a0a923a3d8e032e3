// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Split a format string into separator literals and field runs.

use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::models::{FieldToken, InputError, MaxDetail};

static RUN_RE: OnceLock<Regex> = OnceLock::new();

/// Matches one run of any recognized pattern letter, e.g. `dd` or `MMM`.
fn run_regex() -> &'static Regex {
    RUN_RE.get_or_init(|| {
        let mut letters: Vec<char> = FieldToken::ALL.iter().map(|t| t.letter()).collect();
        letters.dedup();
        let alternation = letters
            .iter()
            .map(|c| format!("{}+", regex::escape(&c.to_string())))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&alternation).expect("field run regex must compile")
    })
}

/// A field run resolved to its token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldRun {
    pub token: FieldToken,
    /// Letters as written in the format, e.g. `dd`.
    pub run: String,
    /// Whether the run asks for zero-padded display (`dd`, `MM`, ...).
    pub leading_zeros: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatternPart {
    /// Literal text between fields, shown as a divider.
    Separator(String),
    /// A live segment.
    Field(FieldRun),
    /// A repeated run rendered as plain text.
    Inert(String),
}

impl PatternPart {
    fn text(&self) -> &str {
        match self {
            Self::Separator(s) | Self::Inert(s) => s,
            Self::Field(f) => &f.run,
        }
    }
}

/// Ordered separators and fields of a format.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormatPattern {
    parts: Vec<PatternPart>,
}

impl FormatPattern {
    pub fn parts(&self) -> &[PatternPart] {
        &self.parts
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldRun> {
        self.parts.iter().filter_map(|p| match p {
            PatternPart::Field(f) => Some(f),
            _ => None,
        })
    }

    /// Drop fields finer than `detail`.
    ///
    /// A dropped field takes the punctuation before it along (`:ss`), or the
    /// literal after it when what precedes is not punctuation (`ss秒`).
    pub fn restrict(self, detail: MaxDetail) -> Self {
        let mut parts: Vec<PatternPart> = Vec::with_capacity(self.parts.len());
        let mut drop_next_separator = false;

        for part in self.parts {
            match part {
                PatternPart::Field(f) if !f.token.visible_at(detail) => {
                    match parts.last() {
                        Some(PatternPart::Separator(s)) if is_punctuation(s) => {
                            parts.pop();
                        }
                        _ => drop_next_separator = true,
                    }
                }
                PatternPart::Separator(_) if drop_next_separator => {
                    drop_next_separator = false;
                }
                other => {
                    drop_next_separator = false;
                    parts.push(other);
                }
            }
        }

        Self { parts }
    }
}

impl fmt::Display for FormatPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.parts.iter().try_for_each(|p| f.write_str(p.text()))
    }
}

fn is_punctuation(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_punctuation() || c.is_whitespace())
}

/// Split `pattern` into separators and field runs.
///
/// With `allow_repeats` false (locale-derived layouts) a field seen earlier
/// is kept as inert text instead of becoming a second live segment.
///
/// # Errors
///
/// Returns [`InputError::UnsupportedToken`] naming the first run that is wider
/// than its field supports, e.g. `ddd`.
pub fn tokenize(pattern: &str, allow_repeats: bool) -> Result<FormatPattern, InputError> {
    let mut parts = Vec::new();
    let mut used = HashSet::new();
    let mut cursor = 0;

    for found in run_regex().find_iter(pattern) {
        if found.start() > cursor {
            parts.push(PatternPart::Separator(
                pattern[cursor..found.start()].to_string(),
            ));
        }
        cursor = found.end();

        let run = found.as_str();
        let (token, leading_zeros) = FieldToken::from_run(run)?;
        let first_use = used.insert(token);
        if !allow_repeats && !first_use {
            parts.push(PatternPart::Inert(run.to_string()));
            continue;
        }
        parts.push(PatternPart::Field(FieldRun {
            token,
            run: run.to_string(),
            leading_zeros,
        }));
    }

    if cursor < pattern.len() {
        parts.push(PatternPart::Separator(pattern[cursor..].to_string()));
    }

    Ok(FormatPattern { parts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sep(s: &str) -> PatternPart {
        PatternPart::Separator(s.to_string())
    }

    fn field(token: FieldToken, run: &str, leading_zeros: bool) -> PatternPart {
        PatternPart::Field(FieldRun {
            token,
            run: run.to_string(),
            leading_zeros,
        })
    }

    #[test]
    fn splits_locale_pattern() {
        let pattern = tokenize("M/d/y\u{a0}h:mm a", false).unwrap();
        assert_eq!(
            pattern.parts(),
            &[
                field(FieldToken::Month, "M", false),
                sep("/"),
                field(FieldToken::Day, "d", false),
                sep("/"),
                field(FieldToken::Year, "y", false),
                sep("\u{a0}"),
                field(FieldToken::Hour12, "h", false),
                sep(":"),
                field(FieldToken::Minute, "mm", true),
                sep(" "),
                field(FieldToken::AmPm, "a", false),
            ]
        );
    }

    #[test]
    fn keeps_leading_and_trailing_literals() {
        let pattern = tokenize("[dd.MM]", true).unwrap();
        assert_eq!(pattern.parts().first(), Some(&sep("[")));
        assert_eq!(pattern.parts().last(), Some(&sep("]")));
        assert_eq!(pattern.to_string(), "[dd.MM]");
    }

    #[test]
    fn month_names_route_to_select() {
        let pattern = tokenize("d MMMM y", true).unwrap();
        let tokens: Vec<_> = pattern.fields().map(|f| f.token).collect();
        assert_eq!(tokens, [FieldToken::Day, FieldToken::MonthName, FieldToken::Year]);
    }

    #[test]
    fn oversized_run_aborts() {
        assert_eq!(
            tokenize("ddd", true).unwrap_err().to_string(),
            "Unsupported token: ddd"
        );
        assert_eq!(
            tokenize("y-MMMMM-d", false).unwrap_err().to_string(),
            "Unsupported token: MMMMM"
        );
    }

    #[test]
    fn locale_layout_repeats_become_inert() {
        let pattern = tokenize("d.M.y d", false).unwrap();
        assert_eq!(pattern.fields().count(), 3);
        assert_eq!(pattern.parts().last(), Some(&PatternPart::Inert("d".to_string())));
    }

    #[test]
    fn explicit_format_repeats_stay_live() {
        let pattern = tokenize("d.M.y (d)", true).unwrap();
        assert_eq!(pattern.fields().count(), 4);
    }

    #[test]
    fn restrict_removes_fields_with_their_separator() {
        let pattern = tokenize("dd.MM.y HH:mm:ss", true).unwrap();
        assert_eq!(pattern.clone().restrict(MaxDetail::Minute).to_string(), "dd.MM.y HH:mm");
        assert_eq!(pattern.restrict(MaxDetail::Hour).to_string(), "dd.MM.y HH");
    }
}
