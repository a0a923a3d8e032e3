// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Top-level egui application shell hosting the segmented date-time input.
//! Handles layout, the settings panel, and status/error feedback.

pub mod components;

use eframe::egui;

use crate::models::MaxDetail;
use crate::models::config::InputConfig;
use crate::mvu::{self, AppModel, Msg};
use crate::ui::components::datetime_input;

/// Stateful egui application around one date-time input.
pub struct DateTimeInputApp {
    model: AppModel,
    inbox: Vec<Msg>,
}

impl DateTimeInputApp {
    pub fn new(config: InputConfig) -> Self {
        Self {
            model: AppModel::new(config),
            inbox: Vec::new(),
        }
    }
}

impl eframe::App for DateTimeInputApp {
    /// Drives a single UI frame: applies queued messages in arrival order,
    /// then renders the top bar, settings panel, status bar, and the input.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ensure_spacing(ctx);

        // Segment edits must land before the key releases queued after them.
        for msg in std::mem::take(&mut self.inbox) {
            mvu::update(&mut self.model, msg);
        }

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.heading("Date-time input");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    egui::widgets::global_theme_preference_switch(ui);
                });
            });
            ui.add_space(4.0);
        });

        self.render_error_modal(ctx);

        egui::TopBottomPanel::bottom("status_panel")
            .resizable(false)
            .show(ctx, |ui| {
                self.render_status(ui);
            });

        egui::SidePanel::left("settings_panel")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.render_settings(ui);
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(8.0);
            self.render_input_group(ui);
            ui.add_space(12.0);
            self.render_value_controls(ui);
        });

        if !self.inbox.is_empty() {
            ctx.request_repaint();
        }
    }
}

impl DateTimeInputApp {
    fn ensure_spacing(&self, ctx: &egui::Context) {
        ctx.style_mut(|style| {
            style.spacing.item_spacing = egui::vec2(6.0, 6.0);
        });
    }

    /// Grouped block with the live input and its reported value.
    fn render_input_group(&mut self, ui: &mut egui::Ui) {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_width(ui.available_width());
            match &self.model.input {
                Some(input) => {
                    let msgs = datetime_input::view(input, ui);
                    self.inbox.extend(msgs.into_iter().map(Msg::Input));

                    ui.add_space(6.0);
                    let native = input.native_value();
                    ui.label(
                        egui::RichText::new(format!(
                            "Pattern {}  ·  {} typed fields  ·  native value {}",
                            input.layout().pattern,
                            input.layout().numeric_count(),
                            if native.is_empty() { "(empty)" } else { native.as_str() }
                        ))
                        .small()
                        .color(egui::Color32::from_gray(110)),
                    );
                }
                None => {
                    ui.label("The input could not be rendered with the current settings.");
                }
            }
        });

        ui.add_space(6.0);
        let reported = self
            .model
            .reported
            .map_or_else(|| "none".to_string(), |v| v.to_string());
        ui.label(format!(
            "Last reported value: {reported} ({} report(s))",
            self.model.report_count
        ));
    }

    /// Fields to set the value from outside and to write the native control.
    fn render_value_controls(&mut self, ui: &mut egui::Ui) {
        egui::Grid::new("value_grid")
            .num_columns(3)
            .spacing(egui::vec2(8.0, 10.0))
            .min_col_width(120.0)
            .show(ui, |ui| {
                ui.label("Set value");
                let mut value = self.model.value_input.clone();
                if ui
                    .add(egui::TextEdit::singleline(&mut value).hint_text("2017-09-30T22:17:03"))
                    .changed()
                {
                    self.inbox.push(Msg::ValueInputChanged(value));
                }
                if ui.button("Apply").clicked() {
                    self.inbox.push(Msg::ApplyValue);
                }
                ui.end_row();

                ui.label("Native control");
                let mut native = self.model.native_input.clone();
                if ui
                    .add(egui::TextEdit::singleline(&mut native).hint_text("YYYY-MM-DDTHH:MM"))
                    .changed()
                {
                    self.inbox.push(Msg::NativeInputChanged(native));
                }
                if ui.button("Submit").clicked() {
                    self.inbox.push(Msg::SubmitNative);
                }
                ui.end_row();
            });
    }

    /// Editable configuration; changes take effect on "Apply settings".
    fn render_settings(&mut self, ui: &mut egui::Ui) {
        let draft = &self.model.draft;
        ui.heading("Settings");
        ui.add_space(4.0);

        text_setting(ui, "Locale", draft.locale.as_deref(), "e.g. de-DE", |v| {
            self.inbox.push(Msg::SetLocale(v))
        });
        text_setting(ui, "Format", draft.format.as_deref(), "e.g. dd.MM.y HH:mm", |v| {
            self.inbox.push(Msg::SetFormat(v))
        });
        text_setting(ui, "Minimum", draft.min_date.as_deref(), "ISO date-time", |v| {
            self.inbox.push(Msg::SetMinDate(v))
        });
        text_setting(ui, "Maximum", draft.max_date.as_deref(), "ISO date-time", |v| {
            self.inbox.push(Msg::SetMaxDate(v))
        });
        text_setting(ui, "Name", Some(&draft.name), "field name prefix", |v| {
            self.inbox.push(Msg::SetName(v))
        });

        ui.label("Max detail");
        let mut detail = draft.max_detail;
        ui.horizontal(|ui| {
            for option in MaxDetail::ALL {
                ui.selectable_value(&mut detail, option, option.as_str());
            }
        });
        if detail != draft.max_detail {
            self.inbox.push(Msg::SetMaxDetail(detail));
        }

        let mut disabled = draft.disabled;
        if ui.checkbox(&mut disabled, "Disabled").changed() {
            self.inbox.push(Msg::SetDisabled(disabled));
        }
        let mut required = draft.required;
        if ui.checkbox(&mut required, "Required").changed() {
            self.inbox.push(Msg::SetRequired(required));
        }
        let mut zeros = draft.show_leading_zeros;
        if ui.checkbox(&mut zeros, "Leading zeros").changed() {
            self.inbox.push(Msg::SetLeadingZeros(zeros));
        }

        ui.add_space(8.0);
        if ui
            .button(format!("{} Apply settings", egui_phosphor::regular::CHECK))
            .clicked()
        {
            self.inbox.push(Msg::ApplySettings);
        }
    }

    /// Render a simple modal window for error messages.
    fn render_error_modal(&mut self, ctx: &egui::Context) {
        if let Some(message) = self.model.error.clone() {
            egui::Window::new("Input error")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
                .show(ctx, |ui| {
                    ui.label(message);
                    ui.add_space(8.0);
                    if ui.button("OK").clicked() {
                        self.inbox.push(Msg::DismissError);
                    }
                });
        }
    }

    /// Render latest status message when present.
    fn render_status(&self, ui: &mut egui::Ui) {
        if let Some(text) = &self.model.status {
            ui.label(egui::RichText::new(text).color(egui::Color32::from_gray(68)));
        }
    }
}

/// Labeled single-line text field; `on_change` receives the new text.
fn text_setting(
    ui: &mut egui::Ui,
    label: &str,
    value: Option<&str>,
    hint: &str,
    mut on_change: impl FnMut(String),
) {
    ui.label(label);
    let mut text = value.unwrap_or_default().to_string();
    if ui
        .add(egui::TextEdit::singleline(&mut text).hint_text(hint))
        .changed()
    {
        on_change(text);
    }
}
