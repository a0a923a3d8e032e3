// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Domain layer: pure data types shared between the engine and the UI.

pub mod config;
pub mod error;
pub mod field;
pub mod value;

pub use error::InputError;
pub use field::{AmPm, FieldToken, MaxDetail};
