//! Customer contact numbers.
//!
//! Older orders store the phone field as a list of numbers, orders taken
//! through the intake form store a single string. [`PhoneField`] accepts
//! both shapes and [`normalize_phone`] turns whatever was typed into the
//! digits-only international form the messaging deep-link expects.

use serde::{Deserialize, Serialize};

/// Country calling codes that mark a number as already international.
pub const KNOWN_COUNTRY_CODES: &[&str] = &["60", "1", "44", "91", "81", "61"];

/// Code prepended to numbers without a recognized country code (Malaysia).
pub const DEFAULT_COUNTRY_CODE: &str = "60";

/// Stored shape of an order's phone field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PhoneField {
    /// A single number as typed into the intake form.
    Single(String),
    /// Several numbers.
    Many(Vec<String>),
}

impl Default for PhoneField {
    fn default() -> Self {
        Self::Single(String::new())
    }
}

impl PhoneField {
    /// Numbers to notify.
    ///
    /// A list is used as-is; a single non-blank string becomes a one-element
    /// list; a blank string yields nothing.
    #[must_use]
    pub fn contact_numbers(&self) -> Vec<String> {
        match self {
            Self::Many(numbers) => numbers.clone(),
            Self::Single(number) if !number.trim().is_empty() => vec![number.clone()],
            Self::Single(_) => Vec::new(),
        }
    }

    /// Human-readable rendering for views and emails.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Single(number) => number.clone(),
            Self::Many(numbers) => numbers.join(", "),
        }
    }
}

impl From<String> for PhoneField {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

/// Normalize a typed phone number for the messaging deep-link.
///
/// Strips every non-digit. If the result does not start with one of
/// [`KNOWN_COUNTRY_CODES`], leading zeros are dropped and `default_code`
/// is prepended. Returns `None` when no digits remain.
///
/// ```
/// use sejuk_core::{DEFAULT_COUNTRY_CODE, normalize_phone};
///
/// assert_eq!(normalize_phone("012-345 6789", DEFAULT_COUNTRY_CODE).as_deref(), Some("60123456789"));
/// assert_eq!(normalize_phone("+60 12-345 6789", DEFAULT_COUNTRY_CODE).as_deref(), Some("60123456789"));
/// ```
#[must_use]
pub fn normalize_phone(raw: &str, default_code: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }

    if KNOWN_COUNTRY_CODES
        .iter()
        .any(|code| digits.starts_with(code))
    {
        return Some(digits);
    }

    Some(format!("{default_code}{}", digits.trim_start_matches('0')))
}
