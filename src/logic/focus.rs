// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Keyboard focus movement between segments.
//!
//! Works over the ordered segment ids of a layout, so dividers and the
//! native bridge never take part in navigation.

use log::debug;

/// Key identity as seen by the navigator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavKey {
    ArrowLeft,
    ArrowRight,
    Digit(char),
    /// Any other printable character, e.g. a separator.
    Char(char),
}

impl NavKey {
    pub fn from_char(ch: char) -> Self {
        if ch.is_ascii_digit() {
            Self::Digit(ch)
        } else {
            Self::Char(ch)
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct FocusNavigator {
    order: Vec<usize>,
    date_separator: Option<char>,
    time_separator: Option<char>,
    last_key: Option<NavKey>,
}

impl FocusNavigator {
    pub fn new(order: Vec<usize>, date_separator: Option<char>, time_separator: Option<char>) -> Self {
        Self {
            order,
            date_separator,
            time_separator,
            last_key: None,
        }
    }

    pub fn previous(&self, current: usize) -> Option<usize> {
        let index = self.position(current)?;
        index.checked_sub(1).and_then(|i| self.order.get(i)).copied()
    }

    pub fn next(&self, current: usize) -> Option<usize> {
        let index = self.position(current)?;
        self.order.get(index + 1).copied()
    }

    /// Handle a key press on `current`.
    ///
    /// Arrows move to the neighbouring segment; a date or time separator
    /// moves forward like the right arrow. Returns the segment to focus.
    /// Keys for which [`Self::intercepts`] holds never reach the segment,
    /// even at the first or last segment where focus stays put.
    pub fn key_down(&mut self, current: usize, key: NavKey) -> Option<usize> {
        self.last_key = Some(key);
        let target = match key {
            NavKey::ArrowLeft => self.previous(current),
            NavKey::ArrowRight => self.next(current),
            NavKey::Char(_) if self.intercepts(key) => self.next(current),
            NavKey::Char(_) | NavKey::Digit(_) => None,
        }?;
        debug!("Moving focus from segment {current} to {target} on {key:?}");
        Some(target)
    }

    /// Handle a key release after the segment's text was updated.
    ///
    /// Only the most recently pressed digit can advance focus, so releasing
    /// an earlier key during fast typing does nothing.
    pub fn key_up(&mut self, current: usize, key: NavKey, value: &str, max: u32, max_digits: usize) -> Option<usize> {
        if !matches!(key, NavKey::Digit(_)) || self.last_key != Some(key) {
            return None;
        }
        if !should_advance(value, max, max_digits) {
            return None;
        }
        let target = self.next(current)?;
        debug!("Auto-advancing from segment {current} to {target}");
        Some(target)
    }

    /// Whether a key press is handled here instead of reaching the segment.
    pub fn intercepts(&self, key: NavKey) -> bool {
        match key {
            NavKey::ArrowLeft | NavKey::ArrowRight => true,
            NavKey::Char(ch) => self.is_separator(ch),
            NavKey::Digit(_) => false,
        }
    }

    fn position(&self, id: usize) -> Option<usize> {
        self.order.iter().position(|s| *s == id)
    }

    fn is_separator(&self, ch: char) -> bool {
        Some(ch) == self.date_separator || Some(ch) == self.time_separator
    }
}

/// Whether no further digit can be appended to `value`.
///
/// True when one more digit would exceed `max`, or the value already has
/// `max_digits` digits.
pub fn should_advance(value: &str, max: u32, max_digits: usize) -> bool {
    let Ok(n) = value.parse::<u32>() else {
        return false;
    };
    n.saturating_mul(10) > max || value.len() >= max_digits
}
