// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Engine layer: pattern derivation, segment layout, value synchronization,
//! focus navigation, and the native bridge. Free of any UI dependency.

pub mod bridge;
pub mod focus;
pub mod locale;
pub mod placeholder;
pub mod registry;
pub mod sync;
pub mod tokenizer;
