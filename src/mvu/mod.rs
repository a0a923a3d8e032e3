// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Root Model-View-Update kernel for the host application.

use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDateTime, TimeZone, Utc};
use log::{debug, info};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::logic::bridge::native_value;
use crate::logic::placeholder::PlaceholderDeriver;
use crate::models::MaxDetail;
use crate::models::config::InputConfig;
use crate::models::value::InputValue;
use crate::ui::components::datetime_input::{
    self, DateTimeInputEvent, DateTimeInputModel, DateTimeInputMsg,
};

/// Top-level application state.
pub struct AppModel {
    /// Settings as edited in the side panel; applied on request.
    pub draft: InputConfig,
    /// Live widget; kept when a rebuild fails.
    pub input: Option<DateTimeInputModel>,
    /// Shared pattern cache across rebuilds.
    pub deriver: PlaceholderDeriver,
    /// Last value the widget reported.
    pub reported: Option<NaiveDateTime>,
    /// Number of change reports received.
    pub report_count: usize,
    /// Text typed into the "set value" field.
    pub value_input: String,
    /// Text typed into the native control field.
    pub native_input: String,
    /// Latest status message to display.
    pub status: Option<String>,
    /// Latest error message to display in modal.
    pub error: Option<String>,
}

impl AppModel {
    /// Build the host around `config`; a config that fails to render opens the error modal.
    pub fn new(config: InputConfig) -> Self {
        let mut model = Self {
            draft: config,
            input: None,
            deriver: PlaceholderDeriver::new(),
            reported: None,
            report_count: 0,
            value_input: String::new(),
            native_input: String::new(),
            status: None,
            error: None,
        };
        rebuild(&mut model);
        model
    }
}

impl Default for AppModel {
    fn default() -> Self {
        Self::new(InputConfig::default())
    }
}

/// Application messages routed through the update function.
pub enum Msg {
    SetLocale(String),
    SetFormat(String),
    SetMaxDetail(MaxDetail),
    SetMinDate(String),
    SetMaxDate(String),
    SetName(String),
    SetDisabled(bool),
    SetRequired(bool),
    SetLeadingZeros(bool),
    ApplySettings,
    ValueInputChanged(String),
    ApplyValue,
    NativeInputChanged(String),
    SubmitNative,
    DismissError,
    Input(DateTimeInputMsg),
}

/// Update the application model.
pub fn update(model: &mut AppModel, msg: Msg) {
    match msg {
        Msg::SetLocale(locale) => model.draft.locale = non_empty(locale),
        Msg::SetFormat(format) => model.draft.format = non_empty(format),
        Msg::SetMaxDetail(detail) => model.draft.max_detail = detail,
        Msg::SetMinDate(raw) => model.draft.min_date = non_empty(raw),
        Msg::SetMaxDate(raw) => model.draft.max_date = non_empty(raw),
        Msg::SetName(name) => model.draft.name = name,
        Msg::SetDisabled(on) => model.draft.disabled = on,
        Msg::SetRequired(on) => model.draft.required = on,
        Msg::SetLeadingZeros(on) => model.draft.show_leading_zeros = on,
        Msg::ApplySettings => rebuild(model),
        Msg::ValueInputChanged(text) => model.value_input = text,
        Msg::ApplyValue => apply_value(model),
        Msg::NativeInputChanged(text) => model.native_input = text,
        Msg::SubmitNative => {
            let text = model.native_input.clone();
            forward(model, DateTimeInputMsg::NativeChanged(text));
        }
        Msg::DismissError => model.error = None,
        Msg::Input(m) => forward(model, m),
    }
}

fn forward(model: &mut AppModel, msg: DateTimeInputMsg) {
    let Some(input) = model.input.as_mut() else {
        return;
    };
    match datetime_input::update(input, msg) {
        Some(DateTimeInputEvent::Changed { value, .. }) => {
            model.reported = value;
            model.report_count += 1;
            let message = describe_value(value);
            info!("{message}");
            surface_event(model, message, false);
        }
        Some(DateTimeInputEvent::Invalid) => {
            surface_event(model, "The entered date-time is not valid.".to_string(), false);
        }
        None => {}
    }
}

/// Rebuild the widget from the draft settings, keeping the current value.
fn rebuild(model: &mut AppModel) {
    let mut config = model.draft.clone();
    if let Some(current) = model.input.as_ref().and_then(DateTimeInputModel::value) {
        config.value = Some(native_value(Some(current), MaxDetail::Second));
    }

    match DateTimeInputModel::new(config, &mut model.deriver) {
        Ok(input) => {
            debug!(
                "Rebuilt date-time input with pattern {:?} ({} cached pattern(s))",
                input.layout().pattern,
                model.deriver.cached()
            );
            let message = format!("Pattern: {}", input.layout().pattern);
            model.input = Some(input);
            surface_event(model, message, false);
        }
        Err(err) => surface_event(model, format!("Could not render the input:\n\n{err}"), true),
    }
}

fn apply_value(model: &mut AppModel) {
    let Some(input) = model.input.as_mut() else {
        return;
    };
    let raw = model.value_input.trim().to_string();
    match input.set_value(InputValue::from(raw.as_str())) {
        Ok(()) => {
            let message = format!("Value set to {raw:?}");
            surface_event(model, message, false);
        }
        Err(err) => surface_event(model, err.to_string(), true),
    }
}

/// Status line text for a reported value.
fn describe_value(value: Option<NaiveDateTime>) -> String {
    let Some(value) = value else {
        return "Value cleared.".to_string();
    };
    let utc = to_offset_datetime(value)
        .and_then(|dt| dt.format(&Rfc3339).context("Failed to format timestamp"));
    match utc {
        Ok(utc) => format!("Value: {value} (UTC {utc})"),
        Err(err) => format!("Value: {value} ({err:#})"),
    }
}

/// Convert a local wall-clock value to an `OffsetDateTime` in UTC.
pub fn to_offset_datetime(naive: NaiveDateTime) -> Result<OffsetDateTime> {
    let local_dt = Local
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| anyhow!("Invalid local date/time (likely skipped by offset)"))?;

    let utc_ts = local_dt.with_timezone(&Utc).timestamp();
    OffsetDateTime::from_unix_timestamp(utc_ts).context("Failed to construct timestamp")
}

/// Update status/error fields consistently for user feedback.
fn surface_event(model: &mut AppModel, message: String, is_error: bool) {
    if is_error {
        model.error = Some(message.clone());
    }
    model.status = Some(message);
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    fn model_with(format: &str) -> AppModel {
        AppModel::new(InputConfig {
            format: Some(format.to_string()),
            value: Some("2020-05-06T07:08".to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn default_host_renders_locale_layout() {
        let model = AppModel::default();
        assert!(model.error.is_none());
        assert!(model.input.as_ref().unwrap().layout().segments().count() >= 4);
    }

    #[test]
    fn bad_format_keeps_previous_widget() {
        let mut model = model_with("dd.MM.y HH:mm");
        update(&mut model, Msg::SetFormat("ddd".into()));
        update(&mut model, Msg::ApplySettings);

        let error = model.error.clone().unwrap();
        assert!(error.contains("Unsupported token: ddd"), "{error}");
        assert_eq!(model.input.as_ref().unwrap().layout().pattern, "dd.MM.y HH:mm");

        update(&mut model, Msg::DismissError);
        assert!(model.error.is_none());
    }

    #[test]
    fn rebuild_keeps_current_value() {
        let mut model = model_with("dd.MM.y HH:mm");
        update(&mut model, Msg::SetMaxDetail(MaxDetail::Second));
        update(&mut model, Msg::SetFormat("y-MM-dd HH:mm:ss".into()));
        update(&mut model, Msg::ApplySettings);

        let input = model.input.as_ref().unwrap();
        assert_eq!(input.value(), Some(dt(2020, 5, 6, 7, 8, 0)));
        assert_eq!(input.native_value(), "2020-05-06T07:08:00");
    }

    #[test]
    fn clear_is_reported_to_host() {
        let mut model = model_with("dd.MM.y HH:mm");
        update(&mut model, Msg::Input(DateTimeInputMsg::Clear));
        assert_eq!(model.reported, None);
        assert_eq!(model.report_count, 1);
        assert_eq!(model.status.as_deref(), Some("Value cleared."));
    }

    #[test]
    fn native_submission_reports_value() {
        let mut model = model_with("dd.MM.y HH:mm");
        update(&mut model, Msg::NativeInputChanged("2021-01-02T03:04".into()));
        update(&mut model, Msg::SubmitNative);
        assert_eq!(model.reported, Some(dt(2021, 1, 2, 3, 4, 0)));
        assert!(model.status.as_deref().unwrap().contains("UTC"));
    }

    #[test]
    fn invalid_entry_sets_status_without_modal() {
        let mut model = model_with("dd.MM.y HH:mm");
        update(
            &mut model,
            Msg::Input(DateTimeInputMsg::SegmentEdited {
                id: 0,
                text: "32".into(),
            }),
        );
        assert!(model.error.is_none());
        assert_eq!(model.status.as_deref(), Some("The entered date-time is not valid."));
        assert_eq!(model.report_count, 0);
    }

    #[test]
    fn malformed_external_value_opens_modal() {
        let mut model = model_with("dd.MM.y HH:mm");
        update(&mut model, Msg::ValueInputChanged("not a date".into()));
        update(&mut model, Msg::ApplyValue);
        assert!(model.error.as_deref().unwrap().starts_with("Invalid value"));

        update(&mut model, Msg::ValueInputChanged("1999-12-31T23:59".into()));
        update(&mut model, Msg::ApplyValue);
        assert_eq!(
            model.input.as_ref().unwrap().value(),
            Some(dt(1999, 12, 31, 23, 59, 0))
        );
        // Setting a value from outside is not a report.
        assert_eq!(model.report_count, 0);
    }

    #[test]
    fn to_offset_datetime_succeeds_with_valid_input() {
        let result = to_offset_datetime(dt(2024, 6, 15, 14, 30, 0));
        assert!(result.is_ok());
    }
}
