//! Authentication route handlers.
//!
//! Sign-in looks up the directory profile before establishing the session:
//! an account without a profile is never signed in.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use sejuk_core::{Role, Username, UsernameError};

use super::Nav;
use crate::db::RepositoryError;
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_session, set_current_user};
use crate::models::{CurrentUser, NewProfile};
use crate::services::auth::{AuthError, Identity, MIN_PASSWORD_LENGTH};
use crate::state::AppState;

const PROFILE_MISSING: &str = "User data incomplete. Please contact support.";
const LOGIN_FAILED: &str = "Login failed. Please try again.";
const SIGNUP_FAILED: &str = "Failed to sign up. Please try again.";
const USERNAME_TAKEN: &str = "Username is already taken.";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Sign-up form data.
#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub role: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub nav: Nav,
    pub error: Option<String>,
    pub email: String,
}

/// Sign-up page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/signup.html")]
pub struct SignupTemplate {
    pub nav: Nav,
    pub error: Option<String>,
    pub email: String,
    pub username: String,
    pub role: String,
}

impl SignupTemplate {
    fn with_error(form: &SignupForm, error: &str) -> Self {
        Self {
            nav: Nav::anonymous(),
            error: Some(error.to_string()),
            email: form.email.clone(),
            username: form.username.clone(),
            role: form.role.clone(),
        }
    }
}

fn login_error(email: &str, error: &str) -> Response {
    LoginTemplate {
        nav: Nav::anonymous(),
        error: Some(error.to_string()),
        email: email.to_string(),
    }
    .into_response()
}

/// Store the identity in the session and tag Sentry with it.
async fn establish_session(
    session: &Session,
    identity: Identity,
) -> Result<(), tower_sessions::session::Error> {
    let user = CurrentUser {
        id: identity.id,
        email: identity.email,
    };
    set_current_user(session, &user).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page() -> impl IntoResponse {
    LoginTemplate {
        nav: Nav::anonymous(),
        error: None,
        email: String::new(),
    }
}

/// Handle login form submission.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let identity = match state.identity().sign_in(&form.email, &form.password).await {
        Ok(identity) => identity,
        Err(e) => {
            if matches!(e, AuthError::Repository(_) | AuthError::PasswordHash) {
                tracing::error!(error = %e, "Sign-in failed");
            } else {
                tracing::info!(error = %e, "Sign-in rejected");
            }
            return login_error(&form.email, e.user_message());
        }
    };

    let profile = match state.directory().get(identity.id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            tracing::warn!(account_id = %identity.id, "Signed-in account has no profile");
            return login_error(&form.email, PROFILE_MISSING);
        }
        Err(e) => {
            tracing::error!(account_id = %identity.id, error = %e, "Failed to fetch profile at sign-in");
            return login_error(&form.email, LOGIN_FAILED);
        }
    };

    if let Err(e) = establish_session(&session, identity).await {
        tracing::error!(error = %e, "Failed to set session");
        return login_error(&form.email, LOGIN_FAILED);
    }

    Redirect::to(profile.role.home_path()).into_response()
}

// =============================================================================
// Sign-up Routes
// =============================================================================

/// Display the sign-up page.
pub async fn signup_page() -> impl IntoResponse {
    SignupTemplate {
        nav: Nav::anonymous(),
        error: None,
        email: String::new(),
        username: String::new(),
        role: Role::Technician.to_string(),
    }
}

fn signup_message(e: &AuthError) -> &'static str {
    match e {
        AuthError::EmailAlreadyInUse
        | AuthError::InvalidEmail(_)
        | AuthError::WeakPassword(_) => e.user_message(),
        AuthError::InvalidCredentials | AuthError::Repository(_) | AuthError::PasswordHash => {
            SIGNUP_FAILED
        }
    }
}

/// Handle sign-up form submission.
///
/// Checks the username is free, creates the account, then its profile, then
/// signs the new account in.
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Response {
    if form.password != form.confirm_password {
        return SignupTemplate::with_error(&form, "Passwords do not match.").into_response();
    }
    if form.password.chars().count() < MIN_PASSWORD_LENGTH {
        return SignupTemplate::with_error(&form, "Password should be at least 6 characters.")
            .into_response();
    }
    let username = match Username::parse(&form.username) {
        Ok(username) => username,
        Err(UsernameError::Empty) => {
            return SignupTemplate::with_error(&form, "Please enter a username.").into_response();
        }
        Err(UsernameError::TooLong { .. }) => {
            return SignupTemplate::with_error(&form, "Username is too long.").into_response();
        }
    };
    let Ok(role) = form.role.parse::<Role>() else {
        return SignupTemplate::with_error(&form, "Please choose a role.").into_response();
    };

    // Checked before the account exists so a taken username leaves nothing behind.
    match state.directory().username_taken(&username).await {
        Ok(false) => {}
        Ok(true) => {
            return SignupTemplate::with_error(&form, USERNAME_TAKEN).into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to check username");
            return SignupTemplate::with_error(&form, SIGNUP_FAILED).into_response();
        }
    }

    let identity = match state.identity().sign_up(&form.email, &form.password).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::info!(error = %e, "Sign-up rejected");
            return SignupTemplate::with_error(&form, signup_message(&e)).into_response();
        }
    };

    let profile = NewProfile {
        account_id: identity.id,
        email: identity.email.clone(),
        username,
        role,
    };
    if let Err(e) = state.directory().create(&profile).await {
        tracing::error!(account_id = %identity.id, error = %e, "Failed to create profile");
        let message = match e {
            RepositoryError::Conflict(_) => USERNAME_TAKEN,
            _ => SIGNUP_FAILED,
        };
        return SignupTemplate::with_error(&form, message).into_response();
    }

    if let Err(e) = establish_session(&session, identity).await {
        tracing::error!(error = %e, "Failed to set session");
        return SignupTemplate::with_error(&form, SIGNUP_FAILED).into_response();
    }

    Redirect::to(role.home_path()).into_response()
}

// =============================================================================
// Logout Route
// =============================================================================

/// Handle logout.
pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    clear_session(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/login"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_messages() {
        assert_eq!(
            signup_message(&AuthError::EmailAlreadyInUse),
            "Email address is already in use."
        );
        assert_eq!(
            signup_message(&AuthError::WeakPassword("short".into())),
            "Password is too weak."
        );
        assert_eq!(signup_message(&AuthError::PasswordHash), SIGNUP_FAILED);
    }
}
