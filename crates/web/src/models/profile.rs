//! Directory profiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sejuk_core::{AccountId, Email, Role, Username};

/// A directory profile, keyed by the account it belongs to.
///
/// Email and username are optional because profiles predating the sign-up
/// form were written by hand; such profiles still carry a role but are left
/// out of the technician list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub account_id: AccountId,
    pub email: Option<Email>,
    pub username: Option<Username>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Profile fields written at sign-up.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub account_id: AccountId,
    pub email: Email,
    pub username: Username,
    pub role: Role,
}

impl Profile {
    /// Key that orders are assigned by.
    ///
    /// The profile username when present, otherwise the lowercased local part
    /// of `fallback_email`.
    #[must_use]
    pub fn technician_key(&self, fallback_email: &Email) -> Username {
        self.username
            .clone()
            .unwrap_or_else(|| Username::from_email(fallback_email))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn profile(username: Option<&str>) -> Profile {
        Profile {
            account_id: AccountId::new(1),
            email: Some(Email::parse("ali@sejuk.my").unwrap()),
            username: username.map(|u| Username::parse(u).unwrap()),
            role: Role::Technician,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_technician_key_prefers_username() {
        let email = Email::parse("Someone.Else@sejuk.my").unwrap();
        assert_eq!(profile(Some("Ali")).technician_key(&email).as_str(), "ali");
    }

    #[test]
    fn test_technician_key_falls_back_to_email() {
        let email = Email::parse("Siti@sejuk.my").unwrap();
        assert_eq!(profile(None).technician_key(&email).as_str(), "siti");
    }
}
