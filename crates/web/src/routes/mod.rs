//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Redirect to /login
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Auth
//! GET  /login                  - Sign-in page
//! POST /login                  - Sign in, redirect to the role's home
//! GET  /signup                 - Sign-up page
//! POST /signup                 - Create account and profile
//! POST /logout                 - Sign out
//!
//! # Admin (role: admin)
//! GET  /admin                  - Order form
//! POST /admin                  - Submit order
//!
//! # Technician (role: technician)
//! GET  /technician             - Job board (fetches active orders)
//! POST /technician/select      - Select an order on the board
//! POST /technician/complete    - Complete the selected order
//!
//! GET  /unauthorized           - Wrong or missing role
//! *                            - 404 Page Not Found
//! ```

pub mod admin;
pub mod auth;
pub mod pages;
pub mod technician;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::Principal;
use crate::models::Flash;
use crate::services::access::AccessState;
use crate::state::AppState;

/// Signed-in account shown in the page header.
#[derive(Debug, Clone, Default)]
pub struct Nav {
    pub email: Option<String>,
    pub role: Option<&'static str>,
    pub home: Option<&'static str>,
}

impl Nav {
    /// Header for a signed-out visitor.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_access(access: &AccessState) -> Self {
        let role = access.role();
        Self {
            email: access.user().map(|u| u.email.as_str().to_string()),
            role: role.map(sejuk_core::Role::label),
            home: role.map(sejuk_core::Role::home_path),
        }
    }

    #[must_use]
    pub fn from_principal(principal: &Principal) -> Self {
        Self {
            email: Some(principal.user.email.as_str().to_string()),
            role: Some(principal.profile.role.label()),
            home: Some(principal.profile.role.home_path()),
        }
    }
}

/// Flash message as rendered by the templates.
#[derive(Debug, Clone)]
pub struct FlashView {
    pub class: &'static str,
    pub text: String,
}

impl From<&Flash> for FlashView {
    fn from(flash: &Flash) -> Self {
        Self {
            class: flash.css_class(),
            text: flash.text.clone(),
        }
    }
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/signup", get(auth::signup_page).post(auth::signup))
        .route("/logout", post(auth::logout))
}

/// Create the technician routes router.
pub fn technician_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(technician::board))
        .route("/select", post(technician::select))
        .route("/complete", post(technician::complete))
}

/// Create all page routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::index))
        .route("/health", get(pages::health))
        .route("/health/ready", get(pages::readiness))
        .route("/unauthorized", get(pages::unauthorized))
        .route("/admin", get(admin::order_form).post(admin::submit))
        .nest("/technician", technician_routes())
        .merge(auth_routes())
        .fallback(pages::not_found)
}
