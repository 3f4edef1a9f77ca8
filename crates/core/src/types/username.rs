//! Technician usernames.
//!
//! The username is the key orders are assigned by, so it is always stored
//! and compared lowercase.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::Email;

/// Errors that can occur when parsing a [`Username`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UsernameError {
    /// The input is blank.
    #[error("username cannot be empty")]
    Empty,
    /// The input is too long.
    #[error("username must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// A lowercase-normalized username.
///
/// ```
/// use sejuk_core::{Email, Username};
///
/// assert_eq!(Username::parse(" Ali ").unwrap().as_str(), "ali");
///
/// let email = Email::parse("Siti.Tech@sejuk.my").unwrap();
/// assert_eq!(Username::from_email(&email).as_str(), "siti.tech");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Maximum username length.
    pub const MAX_LENGTH: usize = 64;

    /// Parse and lowercase a username.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or too long.
    pub fn parse(s: &str) -> Result<Self, UsernameError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(UsernameError::Empty);
        }
        if s.chars().count() > Self::MAX_LENGTH {
            return Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(s.to_lowercase()))
    }

    /// Fallback key derived from the local part of an email address.
    #[must_use]
    pub fn from_email(email: &Email) -> Self {
        Self(email.local_part().to_lowercase())
    }

    /// Returns the username as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
