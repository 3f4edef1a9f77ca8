//! Session-related types.
//!
//! Types stored in the session for authentication and per-view state.

use serde::{Deserialize, Serialize};

use sejuk_core::{AccountId, Email};

/// Session-stored identity.
///
/// Minimal data stored in the session to identify the signed-in account.
/// The role is never cached here; it is looked up on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Account ID from the identity gateway.
    pub id: AccountId,
    /// Account email address.
    pub email: Email,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current signed-in account.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the technician username to email mapping fetched by the
    /// order form.
    pub const TECHNICIAN_DIRECTORY: &str = "technician_directory";

    /// Key for the technician job board.
    pub const JOB_BOARD: &str = "job_board";
}
