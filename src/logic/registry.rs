// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Field registry: turns a resolved pattern into the ordered segment layout.
//!
//! Each [`FieldToken`] maps to exactly one renderer; renderers thread the
//! shared configuration (labels, placeholders, disabled/required, locale)
//! into a [`SegmentSpec`].

use std::collections::BTreeSet;

use log::debug;

use crate::logic::locale::LocaleFormat;
use crate::logic::placeholder::PlaceholderDeriver;
use crate::logic::tokenizer::{FieldRun, FormatPattern, PatternPart, tokenize};
use crate::models::config::InputConfig;
use crate::models::{FieldToken, InputError};

/// How a segment is edited.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SegmentKind {
    Numeric { max_digits: usize },
    MonthSelect { labels: Vec<String> },
    AmPmSelect { labels: [String; 2] },
}

/// One interactive segment of the layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentSpec {
    /// Position among segments; focus order follows it.
    pub id: usize,
    pub token: FieldToken,
    /// `name` attribute: `<prefix>_<segment>`.
    pub name: String,
    pub aria_label: String,
    pub placeholder: String,
    pub leading_zeros: bool,
    pub disabled: bool,
    pub required: bool,
    pub kind: SegmentKind,
    /// Set on composite segments; the native bridge input lacks it.
    pub internal: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayoutNode {
    Divider(String),
    Segment(SegmentSpec),
}

/// Rendered segment tree plus the facts the focus navigator needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentLayout {
    pub nodes: Vec<LayoutNode>,
    /// Pattern the layout was built from, after detail restriction.
    pub pattern: String,
    pub date_separator: Option<char>,
    pub time_separator: Option<char>,
    /// `name` of the native bridge input.
    pub native_name: String,
}

impl SegmentLayout {
    pub fn segments(&self) -> impl Iterator<Item = &SegmentSpec> {
        self.nodes.iter().filter_map(|n| match n {
            LayoutNode::Segment(s) => Some(s),
            LayoutNode::Divider(_) => None,
        })
    }

    pub fn segment(&self, id: usize) -> Option<&SegmentSpec> {
        self.segments().find(|s| s.id == id)
    }

    /// Ids of composite segments in focus order.
    pub fn order(&self) -> Vec<usize> {
        self.segments().filter(|s| s.internal).map(|s| s.id).collect()
    }

    /// Number of typed segments; the select segments are not counted.
    pub fn numeric_count(&self) -> usize {
        self.segments()
            .filter(|s| matches!(s.kind, SegmentKind::Numeric { .. }))
            .count()
    }

    /// Distinct live fields.
    pub fn tokens(&self) -> BTreeSet<FieldToken> {
        self.segments().map(|s| s.token).collect()
    }
}

struct RenderContext<'a> {
    config: &'a InputConfig,
    locale: &'a dyn LocaleFormat,
}

type Renderer = fn(&RenderContext<'_>, &FieldRun) -> SegmentSpec;

/// Renderer for each field.
fn renderer(token: FieldToken) -> Renderer {
    match token {
        FieldToken::Year => render_year,
        FieldToken::Month => render_month,
        FieldToken::MonthName => render_month_select,
        FieldToken::Day => render_day,
        FieldToken::Hour12 => render_hour12,
        FieldToken::Hour24 => render_hour24,
        FieldToken::Minute => render_minute,
        FieldToken::Second => render_second,
        FieldToken::AmPm => render_am_pm,
    }
}

/// Build the segment layout for a configuration.
///
/// An explicit `format` wins over the locale-derived placeholder and may
/// repeat fields; a derived one never does.
///
/// # Errors
///
/// Returns [`InputError::UnsupportedToken`] for format runs wider than their field.
pub fn build_layout(
    config: &InputConfig,
    deriver: &mut PlaceholderDeriver,
) -> Result<SegmentLayout, InputError> {
    let locale_tag = config.locale.as_deref();
    let explicit = config
        .format
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty());
    let source = match explicit {
        Some(format) => format.to_string(),
        None => deriver.derive(locale_tag, config.max_detail),
    };
    let pattern = tokenize(&source, explicit.is_some())?.restrict(config.max_detail);
    let locale = deriver.formatter(locale_tag);
    let ctx = RenderContext {
        config,
        locale: &locale,
    };

    let mut nodes = Vec::with_capacity(pattern.parts().len());
    let mut next_id = 0;
    for part in pattern.parts() {
        match part {
            PatternPart::Separator(text) | PatternPart::Inert(text) => {
                nodes.push(LayoutNode::Divider(text.clone()));
            }
            PatternPart::Field(run) => {
                let mut spec = renderer(run.token)(&ctx, run);
                spec.id = next_id;
                next_id += 1;
                nodes.push(LayoutNode::Segment(spec));
            }
        }
    }

    let (date_separator, time_separator) = separators(&pattern);
    debug!(
        "Built {next_id} segment(s) from {:?} (date sep {date_separator:?}, time sep {time_separator:?})",
        pattern.to_string()
    );

    Ok(SegmentLayout {
        nodes,
        pattern: pattern.to_string(),
        date_separator,
        time_separator,
        native_name: config.name.clone(),
    })
}

/// First divider character between two date fields and between two time fields.
fn separators(pattern: &FormatPattern) -> (Option<char>, Option<char>) {
    let mut date = None;
    let mut time = None;
    for window in pattern.parts().windows(3) {
        let [PatternPart::Field(left), PatternPart::Separator(text), PatternPart::Field(right)] =
            window
        else {
            continue;
        };
        let Some(ch) = text.chars().find(|c| !c.is_whitespace()) else {
            continue;
        };
        match (left.token.detail(), right.token.detail()) {
            (None, None) if date.is_none() => date = Some(ch),
            (Some(_), Some(_)) if time.is_none() => time = Some(ch),
            _ => {}
        }
    }
    (date, time)
}

fn base(ctx: &RenderContext<'_>, run: &FieldRun, label: &str, placeholder: &str) -> SegmentSpec {
    let token = run.token;
    SegmentSpec {
        id: 0,
        token,
        name: format!("{}_{}", ctx.config.name, token.segment_name()),
        aria_label: ctx.config.aria_label(token).unwrap_or(label).to_string(),
        placeholder: ctx
            .config
            .placeholder(token)
            .unwrap_or(placeholder)
            .to_string(),
        leading_zeros: run.leading_zeros || ctx.config.show_leading_zeros,
        disabled: ctx.config.disabled,
        required: ctx.config.required,
        kind: SegmentKind::Numeric {
            max_digits: token.max_digits(),
        },
        internal: true,
    }
}

fn render_year(ctx: &RenderContext<'_>, run: &FieldRun) -> SegmentSpec {
    SegmentSpec {
        leading_zeros: false,
        ..base(ctx, run, "Year", "----")
    }
}

fn render_month(ctx: &RenderContext<'_>, run: &FieldRun) -> SegmentSpec {
    base(ctx, run, "Month", "--")
}

fn render_month_select(ctx: &RenderContext<'_>, run: &FieldRun) -> SegmentSpec {
    let short = run.run.chars().count() == 3;
    let labels = (1..=12)
        .map(|m| ctx.locale.month_name(m, short))
        .collect();
    SegmentSpec {
        leading_zeros: false,
        kind: SegmentKind::MonthSelect { labels },
        ..base(ctx, run, "Month", "--")
    }
}

fn render_day(ctx: &RenderContext<'_>, run: &FieldRun) -> SegmentSpec {
    base(ctx, run, "Day", "--")
}

fn render_hour12(ctx: &RenderContext<'_>, run: &FieldRun) -> SegmentSpec {
    base(ctx, run, "Hour", "--")
}

fn render_hour24(ctx: &RenderContext<'_>, run: &FieldRun) -> SegmentSpec {
    base(ctx, run, "Hour", "--")
}

fn render_minute(ctx: &RenderContext<'_>, run: &FieldRun) -> SegmentSpec {
    base(ctx, run, "Minute", "--")
}

fn render_second(ctx: &RenderContext<'_>, run: &FieldRun) -> SegmentSpec {
    base(ctx, run, "Second", "--")
}

fn render_am_pm(ctx: &RenderContext<'_>, run: &FieldRun) -> SegmentSpec {
    SegmentSpec {
        leading_zeros: false,
        kind: SegmentKind::AmPmSelect {
            labels: ctx.locale.am_pm_labels(),
        },
        ..base(ctx, run, "AM/PM", "--")
    }
}
