//! Authentication and role extractors.
//!
//! Each extractor resolves the session and directory profile afresh for the
//! request (see [`crate::services::access`]) and turns the access decision
//! into a redirect when the view may not be shown.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use sejuk_core::{Role, Username};

use crate::models::{CurrentUser, Profile, session_keys};
use crate::services::access::{self, AccessDecision, AccessState};
use crate::state::AppState;

/// A signed-in account whose profile carries the required role.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user: CurrentUser,
    pub profile: Profile,
}

impl Principal {
    /// Key orders are assigned by.
    #[must_use]
    pub fn technician_key(&self) -> Username {
        self.profile.technician_key(&self.user.email)
    }
}

/// Extractor that requires the `admin` role.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", admin.user.email)
/// }
/// ```
pub struct RequireAdmin(pub Principal);

/// Extractor that requires the `technician` role.
pub struct RequireTechnician(pub Principal);

/// Extractor that resolves access without rejecting.
///
/// Used by pages that render for everyone but show the signed-in account.
pub struct CurrentAccess(pub AccessState);

/// Returned when a role-gated view may not be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRejection {
    /// Resolution has not settled; show the waiting view.
    Waiting,
    /// Not signed in.
    RedirectToLogin,
    /// Signed in without the required role.
    RedirectToUnauthorized,
}

impl IntoResponse for AccessRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Waiting => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Checking authentication and role...",
            )
                .into_response(),
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::RedirectToUnauthorized => Redirect::to("/unauthorized").into_response(),
        }
    }
}

/// Read the signed-in account from the session, if any.
async fn session_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    match session.get::<CurrentUser>(session_keys::CURRENT_USER).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read session");
            None
        }
    }
}

async fn resolve_parts(parts: &Parts, state: &AppState) -> AccessState {
    access::resolve(session_user(parts).await, state.directory()).await
}

async fn require_role(
    parts: &Parts,
    state: &AppState,
    role: Role,
) -> Result<Principal, AccessRejection> {
    let access = resolve_parts(parts, state).await;

    match access.decide(Some(role)) {
        AccessDecision::Wait => Err(AccessRejection::Waiting),
        AccessDecision::RedirectLogin => Err(AccessRejection::RedirectToLogin),
        AccessDecision::RedirectUnauthorized => {
            tracing::warn!(
                path = %parts.uri.path(),
                required = %role,
                actual = ?access.role(),
                "Access denied"
            );
            Err(AccessRejection::RedirectToUnauthorized)
        }
        AccessDecision::Allow => match access {
            AccessState::SignedIn {
                user,
                profile: Some(profile),
            } => Ok(Principal { user, profile }),
            _ => Err(AccessRejection::RedirectToUnauthorized),
        },
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AccessRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_role(parts, state, Role::Admin).await.map(Self)
    }
}

impl FromRequestParts<AppState> for RequireTechnician {
    type Rejection = AccessRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_role(parts, state, Role::Technician).await.map(Self)
    }
}

impl FromRequestParts<AppState> for CurrentAccess {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(resolve_parts(parts, state).await))
    }
}

/// Helper to set the signed-in account in the session.
///
/// Cycles the session id first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to drop everything in the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be deleted.
pub async fn clear_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
