// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Errors raised by the date-time input engine.

use thiserror::Error;

/// Fatal and recoverable failures of the segmented input.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InputError {
    /// A format run is wider than its field supports (configuration error).
    #[error("Unsupported token: {0}")]
    UnsupportedToken(String),
    /// A supplied value could not be parsed into a date-time.
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    /// The native bridge produced a string that is not `YYYY-MM-DDTHH:MM[:SS]`.
    #[error("Invalid native value: {0}")]
    InvalidNativeValue(String),
}
