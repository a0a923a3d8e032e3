// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Widget configuration, loadable from JSON.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::error::InputError;
use crate::models::field::{FieldToken, MaxDetail};
use crate::models::value::{Bounds, InputValue, parse_datetime};

/// Environment variable naming an optional JSON configuration file.
pub const CONFIG_ENV: &str = "DATETIME_INPUT_CONFIG";

/// Everything the widget needs to render.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Locale tag (`en-US` or `en_US`); platform locale when unset.
    pub locale: Option<String>,
    /// Explicit format such as `dd.MM.y HH:mm`; derived from the locale when unset.
    pub format: Option<String>,
    pub max_detail: MaxDetail,
    pub min_date: Option<String>,
    pub max_date: Option<String>,
    pub value: Option<String>,
    pub disabled: bool,
    pub required: bool,
    /// Accessible labels keyed by segment name (`day`, `hour12`, ...).
    pub aria_labels: BTreeMap<String, String>,
    /// Placeholder text keyed by segment name.
    pub placeholders: BTreeMap<String, String>,
    pub show_leading_zeros: bool,
    /// Prefix for segment `name` attributes.
    pub name: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            locale: None,
            format: None,
            max_detail: MaxDetail::default(),
            min_date: None,
            max_date: None,
            value: None,
            disabled: false,
            required: false,
            aria_labels: BTreeMap::new(),
            placeholders: BTreeMap::new(),
            show_leading_zeros: false,
            name: "datetime".to_string(),
        }
    }
}

impl InputConfig {
    /// Resolve `min_date`/`max_date` into effective bounds.
    pub fn bounds(&self) -> Result<Bounds, InputError> {
        let min = non_empty(&self.min_date).map(parse_datetime).transpose()?;
        let max = non_empty(&self.max_date).map(parse_datetime).transpose()?;
        Ok(Bounds::new(min, max))
    }

    pub fn input_value(&self) -> Option<InputValue> {
        self.value.as_deref().map(InputValue::from)
    }

    pub fn aria_label(&self, token: FieldToken) -> Option<&str> {
        self.aria_labels
            .get(token.segment_name())
            .map(String::as_str)
    }

    pub fn placeholder(&self, token: FieldToken) -> Option<&str> {
        self.placeholders
            .get(token.segment_name())
            .map(String::as_str)
    }
}

fn non_empty(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Parse a configuration from JSON text.
pub fn parse_config(json: &str) -> Result<InputConfig> {
    serde_json::from_str(json).context("Invalid date-time input configuration")
}

/// Read a configuration file from disk.
///
/// # Errors
///
/// Returns an error when the file cannot be read or does not parse.
pub fn load_config(path: &Path) -> Result<InputConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    parse_config(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
}

/// Load the file named by [`CONFIG_ENV`], or defaults when it is unset.
pub fn config_from_env() -> Result<InputConfig> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) => load_config(Path::new(&path)),
        None => Ok(InputConfig::default()),
    }
}
