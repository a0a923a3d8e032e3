// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Application entry point wiring egui/eframe to launch the date-time input host.

use eframe::egui;
use egui_phosphor::Variant;
use log::{error, info};

use crate::models::config::{CONFIG_ENV, InputConfig, config_from_env};
use crate::ui::DateTimeInputApp;

/// Bootstrap the desktop application and run the main egui event loop.
pub fn run() -> eframe::Result<()> {
    let config = load_startup_config();

    // Register Phosphor icon font.
    let mut fonts = egui::FontDefinitions::default();
    egui_phosphor::add_to_fonts(&mut fonts, Variant::Regular);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 520.0])
            .with_min_inner_size([600.0, 360.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Date-time input",
        options,
        Box::new(|cc| {
            cc.egui_ctx.set_fonts(fonts);
            Ok(Box::new(DateTimeInputApp::new(config)))
        }),
    )
}

/// Configuration named by the environment, or defaults when it cannot be loaded.
fn load_startup_config() -> InputConfig {
    match config_from_env() {
        Ok(config) => {
            info!("Loaded configuration (locale {:?}, format {:?})", config.locale, config.format);
            config
        }
        Err(err) => {
            error!("Ignoring {CONFIG_ENV}: {err:#}");
            InputConfig::default()
        }
    }
}
