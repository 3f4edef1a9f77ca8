//! HTTP middleware stack.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions)
//!
//! Role checks are extractors rather than layers, see [`auth`].

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::{
    AccessRejection, CurrentAccess, Principal, RequireAdmin, RequireTechnician, clear_session,
    set_current_user,
};
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
