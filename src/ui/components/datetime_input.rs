// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Segmented date-time input as an MVU component.
//!
//! The model owns the layout, the synchronizer, and the focus navigator;
//! `view` turns user input into messages and `update` turns messages into
//! at most one event for the host.

use std::ops::RangeInclusive;

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use eframe::egui;
use egui_extras::DatePickerButton;
use log::debug;

use crate::logic::bridge::{decode_native, native_bounds, native_step, native_value};
use crate::logic::focus::{FocusNavigator, NavKey};
use crate::logic::placeholder::PlaceholderDeriver;
use crate::logic::registry::{LayoutNode, SegmentKind, SegmentLayout, SegmentSpec, build_layout};
use crate::logic::sync::{CompositeState, SyncEvent, Synchronizer};
use crate::models::config::InputConfig;
use crate::models::value::{Bounds, InputValue};
use crate::models::{AmPm, FieldToken, InputError, MaxDetail};

/// Width of a digit segment per accepted digit.
const DIGIT_WIDTH: f32 = 9.0;
/// Years listed on either side of the shown date in the calendar.
const CALENDAR_YEAR_WINDOW: i32 = 100;

pub struct DateTimeInputModel {
    config: InputConfig,
    layout: SegmentLayout,
    sync: Synchronizer,
    navigator: FocusNavigator,
    /// Segment that should take keyboard focus on the next frame.
    pending_focus: Option<usize>,
    clock_open: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DateTimeInputMsg {
    /// A segment's text changed; select segments send the chosen value.
    SegmentEdited { id: usize, text: String },
    KeyDown { id: usize, key: NavKey },
    KeyUp { id: usize, key: NavKey },
    FocusApplied,
    CalendarPicked(NaiveDate),
    ClockPicked { hour: u32, minute: u32, second: u32 },
    ToggleClock,
    Clear,
    /// Text written to the native control.
    NativeChanged(String),
}

/// Outcome reported to the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DateTimeInputEvent {
    Changed {
        value: Option<NaiveDateTime>,
        close_popovers: bool,
    },
    Invalid,
}

impl From<SyncEvent> for DateTimeInputEvent {
    fn from(event: SyncEvent) -> Self {
        match event {
            SyncEvent::Changed {
                value,
                close_popovers,
            } => Self::Changed {
                value,
                close_popovers,
            },
            SyncEvent::Invalid => Self::Invalid,
        }
    }
}

impl DateTimeInputModel {
    /// Build the segment tree for `config` and hydrate it with the configured value.
    ///
    /// # Errors
    ///
    /// Fails on unsupported format runs and on malformed values or bounds.
    pub fn new(config: InputConfig, deriver: &mut PlaceholderDeriver) -> Result<Self, InputError> {
        let layout = build_layout(&config, deriver)?;
        let bounds = config.bounds()?;
        let value = match config.input_value() {
            Some(value) => value.resolve()?,
            None => None,
        };

        let mut sync = Synchronizer::new(layout.tokens(), bounds, config.max_detail);
        sync.hydrate(value);
        let navigator = FocusNavigator::new(layout.order(), layout.date_separator, layout.time_separator);

        Ok(Self {
            config,
            layout,
            sync,
            navigator,
            pending_focus: None,
            clock_open: false,
        })
    }

    pub fn layout(&self) -> &SegmentLayout {
        &self.layout
    }

    pub fn value(&self) -> Option<NaiveDateTime> {
        self.sync.value()
    }

    /// Text a segment currently shows, leading zeros applied.
    pub fn segment_text(&self, id: usize) -> Option<String> {
        let spec = self.layout.segment(id)?;
        Some(display_text(spec, self.sync.text(spec.token), false))
    }

    /// Value of the hidden native control.
    pub fn native_value(&self) -> String {
        native_value(self.sync.value(), self.config.max_detail)
    }

    pub fn pending_focus(&self) -> Option<usize> {
        self.pending_focus
    }

    pub fn clock_open(&self) -> bool {
        self.clock_open
    }

    /// Replace the value from outside. Never reports back.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::InvalidValue`] when the text does not parse.
    pub fn set_value(&mut self, value: InputValue) -> Result<(), InputError> {
        let value = value.resolve()?;
        self.sync.hydrate(value);
        Ok(())
    }

    fn value_or_now(&self) -> NaiveDateTime {
        self.sync.value().unwrap_or_else(|| Local::now().naive_local())
    }
}

/// Apply a message and return the event to report, if any.
pub fn update(model: &mut DateTimeInputModel, msg: DateTimeInputMsg) -> Option<DateTimeInputEvent> {
    let event = match msg {
        DateTimeInputMsg::SegmentEdited { id, text } => {
            let token = model.layout.segment(id)?.token;
            model.sync.edit(token, &text)
        }
        DateTimeInputMsg::KeyDown { id, key } => {
            if let Some(target) = model.navigator.key_down(id, key) {
                model.pending_focus = Some(target);
            }
            None
        }
        DateTimeInputMsg::KeyUp { id, key } => {
            let spec = model.layout.segment(id)?;
            if let SegmentKind::Numeric { max_digits } = spec.kind {
                let max = *model.sync.segment_range(spec.token).end();
                let value = model.sync.text(spec.token).to_string();
                if let Some(target) = model.navigator.key_up(id, key, &value, max, max_digits) {
                    model.pending_focus = Some(target);
                }
            }
            None
        }
        DateTimeInputMsg::FocusApplied => {
            model.pending_focus = None;
            None
        }
        DateTimeInputMsg::CalendarPicked(date) => {
            let time = model.sync.value().map_or(NaiveTime::MIN, |v| v.time());
            Some(model.sync.select(date.and_time(time), true))
        }
        DateTimeInputMsg::ClockPicked {
            hour,
            minute,
            second,
        } => {
            let date = model.value_or_now().date();
            let time = NaiveTime::from_hms_opt(hour, minute, second)?;
            Some(model.sync.select(date.and_time(time), false))
        }
        DateTimeInputMsg::ToggleClock => {
            model.clock_open = !model.clock_open;
            let current = model.sync.value();
            model.sync.hydrate(current);
            None
        }
        DateTimeInputMsg::Clear => Some(model.sync.clear()),
        DateTimeInputMsg::NativeChanged(text) => {
            let value = decode_native(&text)?;
            Some(model.sync.native(value))
        }
    };

    if let Some(SyncEvent::Changed {
        close_popovers: true,
        ..
    }) = event
    {
        model.clock_open = false;
    }
    if let Some(event) = &event {
        debug!("Date-time input event: {event:?}");
    }
    event.map(DateTimeInputEvent::from)
}

/// Render the segments, popover buttons, and the hidden native control.
pub fn view(model: &DateTimeInputModel, ui: &mut egui::Ui) -> Vec<DateTimeInputMsg> {
    let mut msgs = Vec::new();
    let enabled = !model.config.disabled;

    ui.horizontal(|ui| {
        ui.scope(|ui| {
            ui.spacing_mut().item_spacing.x = 1.0;
            for node in &model.layout.nodes {
                match node {
                    LayoutNode::Divider(text) => {
                        ui.label(text);
                    }
                    LayoutNode::Segment(spec) => {
                        ui.add_enabled_ui(!spec.disabled, |ui| {
                            render_segment(model, spec, ui, &mut msgs);
                        });
                    }
                }
            }
        });

        if model.config.required && model.sync.state() != CompositeState::Complete {
            ui.label(egui::RichText::new("*").color(ui.visuals().error_fg_color))
                .on_hover_text("Required");
        }

        ui.add_space(6.0);
        ui.add_enabled_ui(enabled, |ui| {
            render_popover_buttons(model, ui, &mut msgs);
        });
        render_native_bridge(model, ui);
    });

    if model.clock_open {
        render_clock(model, ui.ctx(), &mut msgs);
    }

    msgs
}

fn segment_id(spec: &SegmentSpec) -> egui::Id {
    egui::Id::new(("segment", &spec.name, spec.id))
}

fn render_segment(
    model: &DateTimeInputModel,
    spec: &SegmentSpec,
    ui: &mut egui::Ui,
    msgs: &mut Vec<DateTimeInputMsg>,
) {
    let response = match &spec.kind {
        SegmentKind::Numeric { max_digits } => render_numeric(model, spec, *max_digits, ui, msgs),
        SegmentKind::MonthSelect { labels } => render_month_select(model, spec, labels, ui, msgs),
        SegmentKind::AmPmSelect { labels } => render_am_pm_select(model, spec, labels, ui, msgs),
    };

    let label = if spec.required {
        format!("{} (required)", spec.aria_label)
    } else {
        spec.aria_label.clone()
    };
    let response = response.on_hover_text(&label);
    response.widget_info(|| {
        egui::WidgetInfo::labeled(egui::WidgetType::TextEdit, !spec.disabled, &label)
    });

    if model.pending_focus == Some(spec.id) {
        response.request_focus();
        msgs.push(DateTimeInputMsg::FocusApplied);
    }
}

fn render_numeric(
    model: &DateTimeInputModel,
    spec: &SegmentSpec,
    max_digits: usize,
    ui: &mut egui::Ui,
    msgs: &mut Vec<DateTimeInputMsg>,
) -> egui::Response {
    let id = segment_id(spec);
    let focused = ui.memory(|m| m.has_focus(id));
    let mut key_ups = Vec::new();

    if focused {
        for (key, pressed) in key_events(ui) {
            if pressed {
                msgs.push(DateTimeInputMsg::KeyDown { id: spec.id, key });
            } else {
                key_ups.push(DateTimeInputMsg::KeyUp { id: spec.id, key });
            }
        }
        consume_navigation(&model.navigator, ui);
    }

    let raw = model.sync.text(spec.token);
    let mut text = display_text(spec, raw, focused);
    let mut edit = egui::TextEdit::singleline(&mut text)
        .id(id)
        .hint_text(&spec.placeholder)
        .char_limit(max_digits)
        .desired_width(DIGIT_WIDTH * max_digits as f32)
        .horizontal_align(egui::Align::Center);
    if !raw.is_empty() && !model.sync.is_valid(spec.token) {
        edit = edit.text_color(ui.visuals().error_fg_color);
    }
    let response = ui.add(edit);

    // Edits are applied before key releases of the same frame.
    if response.changed() {
        msgs.push(DateTimeInputMsg::SegmentEdited {
            id: spec.id,
            text,
        });
    }
    msgs.extend(key_ups);
    response
}

fn render_month_select(
    model: &DateTimeInputModel,
    spec: &SegmentSpec,
    labels: &[String],
    ui: &mut egui::Ui,
    msgs: &mut Vec<DateTimeInputMsg>,
) -> egui::Response {
    let current = model.sync.composite().number(FieldToken::Month);
    let selected = current
        .and_then(|m| m.checked_sub(1))
        .and_then(|i| labels.get(i as usize))
        .cloned()
        .unwrap_or_else(|| spec.placeholder.clone());

    egui::ComboBox::from_id_salt(segment_id(spec))
        .selected_text(selected)
        .show_ui(ui, |ui| {
            for (month, label) in (1..=12u32).zip(labels) {
                let enabled = model.sync.month_enabled(month);
                let clicked = ui
                    .add_enabled_ui(enabled, |ui| ui.selectable_label(current == Some(month), label))
                    .inner
                    .clicked();
                if clicked {
                    msgs.push(DateTimeInputMsg::SegmentEdited {
                        id: spec.id,
                        text: month.to_string(),
                    });
                }
            }
        })
        .response
}

fn render_am_pm_select(
    model: &DateTimeInputModel,
    spec: &SegmentSpec,
    labels: &[String; 2],
    ui: &mut egui::Ui,
    msgs: &mut Vec<DateTimeInputMsg>,
) -> egui::Response {
    let current = AmPm::parse(model.sync.text(spec.token));
    let label_of = |v: AmPm| match v {
        AmPm::Am => labels[0].clone(),
        AmPm::Pm => labels[1].clone(),
    };
    let selected = current.map(label_of).unwrap_or_else(|| spec.placeholder.clone());

    egui::ComboBox::from_id_salt(segment_id(spec))
        .selected_text(selected)
        .width(48.0)
        .show_ui(ui, |ui| {
            for option in [AmPm::Am, AmPm::Pm] {
                let enabled = model.sync.am_pm_enabled(option);
                let clicked = ui
                    .add_enabled_ui(enabled, |ui| {
                        ui.selectable_label(current == Some(option), label_of(option))
                    })
                    .inner
                    .clicked();
                if clicked {
                    msgs.push(DateTimeInputMsg::SegmentEdited {
                        id: spec.id,
                        text: option.as_str().to_string(),
                    });
                }
            }
        })
        .response
}

fn render_popover_buttons(
    model: &DateTimeInputModel,
    ui: &mut egui::Ui,
    msgs: &mut Vec<DateTimeInputMsg>,
) {
    let bounds = model.sync.bounds();
    let mut date = model.value_or_now().date();
    let years = calendar_years(&bounds, date.year());
    let salt = format!("{}_calendar", model.layout.native_name);
    if ui
        .add(
            DatePickerButton::new(&mut date)
                .id_salt(&salt)
                .show_icon(true)
                .start_end_years(years),
        )
        .changed()
    {
        msgs.push(DateTimeInputMsg::CalendarPicked(date));
    }

    if ui
        .selectable_label(model.clock_open, egui_phosphor::regular::CLOCK)
        .on_hover_text("Pick a time")
        .clicked()
    {
        msgs.push(DateTimeInputMsg::ToggleClock);
    }

    if ui
        .button(egui_phosphor::regular::X)
        .on_hover_text("Clear")
        .clicked()
    {
        msgs.push(DateTimeInputMsg::Clear);
    }
}

/// Years offered by the calendar: the bounds, cut to a window around `year`.
fn calendar_years(bounds: &Bounds, year: i32) -> RangeInclusive<i32> {
    let (first, last) = (bounds.min.year(), bounds.max.year());
    let year = year.clamp(first, last);
    (year - CALENDAR_YEAR_WINDOW).max(first)..=(year + CALENDAR_YEAR_WINDOW).min(last)
}

fn render_clock(model: &DateTimeInputModel, ctx: &egui::Context, msgs: &mut Vec<DateTimeInputMsg>) {
    let current = model.value_or_now();
    let (mut hour, mut minute, mut second) = (current.hour(), current.minute(), current.second());
    let detail = model.config.max_detail;
    let mut open = true;

    egui::Window::new("Time")
        .id(egui::Id::new((&model.layout.native_name, "clock")))
        .collapsible(false)
        .resizable(false)
        .open(&mut open)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                let mut changed = ui.add(two_digit_drag(&mut hour, 23)).changed();
                if detail >= MaxDetail::Minute {
                    ui.label(":");
                    changed |= ui.add(two_digit_drag(&mut minute, 59)).changed();
                }
                if detail >= MaxDetail::Second {
                    ui.label(":");
                    changed |= ui.add(two_digit_drag(&mut second, 59)).changed();
                }
                if changed {
                    msgs.push(DateTimeInputMsg::ClockPicked {
                        hour,
                        minute,
                        second,
                    });
                }
            });
        });

    if !open {
        msgs.push(DateTimeInputMsg::ToggleClock);
    }
}

fn two_digit_drag(value: &mut u32, max: u32) -> egui::DragValue<'_> {
    egui::DragValue::new(value)
        .range(0..=max)
        .speed(0.1)
        .clamp_existing_to_range(true)
        .custom_formatter(|v, _| format!("{:02}", v as u32))
}

/// Invisible control exposing the value, bounds, and step to accessibility tools.
fn render_native_bridge(model: &DateTimeInputModel, ui: &mut egui::Ui) {
    let detail = model.config.max_detail;
    let (min, max) = native_bounds(&model.sync.bounds(), detail);
    let description = format!(
        "{}: {} (min {min}, max {max}, step {})",
        model.layout.native_name,
        model.native_value(),
        native_step(detail)
    );
    let response = ui.allocate_response(egui::Vec2::ZERO, egui::Sense::hover());
    response.widget_info(|| {
        egui::WidgetInfo::labeled(egui::WidgetType::TextEdit, false, &description)
    });
}

/// Digit presses/releases and navigation keys from this frame, in order.
fn key_events(ui: &egui::Ui) -> Vec<(NavKey, bool)> {
    ui.input(|input| {
        input
            .events
            .iter()
            .filter_map(|event| match event {
                egui::Event::Key {
                    key: egui::Key::ArrowLeft,
                    pressed: true,
                    ..
                } => Some((NavKey::ArrowLeft, true)),
                egui::Event::Key {
                    key: egui::Key::ArrowRight,
                    pressed: true,
                    ..
                } => Some((NavKey::ArrowRight, true)),
                egui::Event::Key { key, pressed, .. } => {
                    digit_of(*key).map(|d| (NavKey::Digit(d), *pressed))
                }
                egui::Event::Text(text) => text
                    .chars()
                    .next()
                    .filter(|c| !c.is_ascii_digit())
                    .map(|c| (NavKey::from_char(c), true)),
                _ => None,
            })
            .collect()
    })
}

/// Keep navigation keys away from the focused text field.
fn consume_navigation(navigator: &FocusNavigator, ui: &mut egui::Ui) {
    ui.input_mut(|input| {
        input.consume_key(egui::Modifiers::NONE, egui::Key::ArrowLeft);
        input.consume_key(egui::Modifiers::NONE, egui::Key::ArrowRight);
        input.events.retain(|event| match event {
            egui::Event::Text(text) => !text
                .chars()
                .all(|c| navigator.intercepts(NavKey::from_char(c))),
            _ => true,
        });
    });
}

fn digit_of(key: egui::Key) -> Option<char> {
    let digit = match key {
        egui::Key::Num0 => '0',
        egui::Key::Num1 => '1',
        egui::Key::Num2 => '2',
        egui::Key::Num3 => '3',
        egui::Key::Num4 => '4',
        egui::Key::Num5 => '5',
        egui::Key::Num6 => '6',
        egui::Key::Num7 => '7',
        egui::Key::Num8 => '8',
        egui::Key::Num9 => '9',
        _ => return None,
    };
    Some(digit)
}

/// Segment text, zero-padded to two digits unless it is being edited.
fn display_text(spec: &SegmentSpec, raw: &str, editing: bool) -> String {
    if spec.leading_zeros && !editing && raw.len() == 1 {
        format!("0{raw}")
    } else {
        raw.to_string()
    }
}
