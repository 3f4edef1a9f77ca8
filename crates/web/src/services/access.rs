//! Session and role resolution.
//!
//! Every request resolves the signed-in account (from the session) and its
//! role (from the directory) afresh, so a sign-out in another tab or a role
//! change takes effect on the next request. A directory failure leaves the
//! request signed in with no role rather than signing it out.

use sejuk_core::{Role, Username};

use crate::db::DirectoryStore;
use crate::models::{CurrentUser, Profile};

/// Resolved access state for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessState {
    /// Resolution has not settled yet.
    Loading,
    /// No account in the session.
    SignedOut,
    /// An account is in the session. `profile` is `None` when the directory
    /// has no entry for it or could not be reached.
    SignedIn {
        user: CurrentUser,
        profile: Option<Profile>,
    },
}

/// What a role-gated view should do with the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Show the neutral waiting view.
    Wait,
    RedirectLogin,
    RedirectUnauthorized,
    Allow,
}

impl AccessState {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::SignedIn { .. })
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        match self {
            Self::SignedIn { profile, .. } => profile.as_ref().map(|p| p.role),
            Self::Loading | Self::SignedOut => None,
        }
    }

    /// Signed-in account, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&CurrentUser> {
        match self {
            Self::SignedIn { user, .. } => Some(user),
            Self::Loading | Self::SignedOut => None,
        }
    }

    /// Key orders are assigned by, for a signed-in account.
    #[must_use]
    pub fn technician_key(&self) -> Option<Username> {
        match self {
            Self::SignedIn { user, profile } => Some(
                profile
                    .as_ref()
                    .map_or_else(|| Username::from_email(&user.email), |p| p.technician_key(&user.email)),
            ),
            Self::Loading | Self::SignedOut => None,
        }
    }

    /// Gate a view that needs `required`, or only a signed-in account when
    /// `required` is `None`.
    #[must_use]
    pub fn decide(&self, required: Option<Role>) -> AccessDecision {
        match self {
            Self::Loading => AccessDecision::Wait,
            Self::SignedOut => AccessDecision::RedirectLogin,
            Self::SignedIn { .. } => match required {
                Some(role) if self.role() != Some(role) => AccessDecision::RedirectUnauthorized,
                _ => AccessDecision::Allow,
            },
        }
    }
}

/// Resolve the access state for a request.
///
/// Never returns [`AccessState::Loading`]: the directory lookup is awaited
/// before this returns.
pub async fn resolve(user: Option<CurrentUser>, directory: &dyn DirectoryStore) -> AccessState {
    let Some(user) = user else {
        return AccessState::SignedOut;
    };

    let profile = match directory.get(user.id).await {
        Ok(Some(profile)) => Some(profile),
        Ok(None) => {
            tracing::warn!(account_id = %user.id, "No directory profile for signed-in account");
            None
        }
        Err(e) => {
            tracing::error!(account_id = %user.id, error = %e, "Failed to fetch directory profile");
            None
        }
    };

    AccessState::SignedIn { user, profile }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use sejuk_core::{AccountId, Email};

    use super::*;
    use crate::db::memory::InMemoryDirectory;

    fn user() -> CurrentUser {
        CurrentUser {
            id: AccountId::new(1),
            email: Email::parse("ali@sejuk.my").unwrap(),
        }
    }

    fn directory_with(role: Role) -> InMemoryDirectory {
        let directory = InMemoryDirectory::new();
        directory.insert(Profile {
            account_id: AccountId::new(1),
            email: Some(Email::parse("ali@sejuk.my").unwrap()),
            username: Some(Username::parse("Ali").unwrap()),
            role,
            created_at: Utc::now(),
        });
        directory
    }

    #[tokio::test]
    async fn test_no_session_redirects_to_login() {
        let state = resolve(None, &InMemoryDirectory::new()).await;
        assert!(!state.is_authenticated());
        assert_eq!(state.role(), None);
        assert_eq!(state.decide(Some(Role::Admin)), AccessDecision::RedirectLogin);
    }

    #[tokio::test]
    async fn test_matching_role_allowed() {
        let state = resolve(Some(user()), &directory_with(Role::Technician)).await;
        assert_eq!(state.role(), Some(Role::Technician));
        assert_eq!(state.decide(Some(Role::Technician)), AccessDecision::Allow);
        assert_eq!(
            state.decide(Some(Role::Admin)),
            AccessDecision::RedirectUnauthorized
        );
        assert_eq!(state.technician_key().unwrap().as_str(), "ali");
    }

    #[tokio::test]
    async fn test_missing_profile_has_no_role() {
        let state = resolve(Some(user()), &InMemoryDirectory::new()).await;
        assert!(state.is_authenticated());
        assert_eq!(state.role(), None);
        assert_eq!(
            state.decide(Some(Role::Technician)),
            AccessDecision::RedirectUnauthorized
        );
        assert_eq!(state.decide(None), AccessDecision::Allow);
    }

    #[tokio::test]
    async fn test_directory_failure_settles_without_role() {
        let directory = directory_with(Role::Admin);
        directory.set_failing(true);

        let state = resolve(Some(user()), &directory).await;

        assert!(!state.is_loading());
        assert!(state.is_authenticated());
        assert_eq!(state.role(), None);
        assert_eq!(state.technician_key().unwrap().as_str(), "ali");
    }

    #[test]
    fn test_loading_waits() {
        assert_eq!(AccessState::Loading.decide(Some(Role::Admin)), AccessDecision::Wait);
    }
}
