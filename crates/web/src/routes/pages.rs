//! Shared page route handlers: landing, health checks, and error pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect},
};
use tracing::instrument;

use super::Nav;
use crate::middleware::CurrentAccess;
use crate::state::AppState;

/// Unauthorized page template.
#[derive(Template, WebTemplate)]
#[template(path = "unauthorized.html")]
pub struct UnauthorizedTemplate {
    pub nav: Nav,
}

/// 404 page template.
#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub nav: Nav,
}

/// Landing page; everyone starts at sign-in.
pub async fn index() -> Redirect {
    Redirect::to("/login")
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the order store is not reachable.
#[instrument(skip(state))]
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.orders().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Shown when a signed-in account lacks the role a page needs.
pub async fn unauthorized(CurrentAccess(access): CurrentAccess) -> impl IntoResponse {
    (
        StatusCode::FORBIDDEN,
        UnauthorizedTemplate {
            nav: Nav::from_access(&access),
        },
    )
}

/// Fallback for unknown paths.
pub async fn not_found(CurrentAccess(access): CurrentAccess) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        NotFoundTemplate {
            nav: Nav::from_access(&access),
        },
    )
}
