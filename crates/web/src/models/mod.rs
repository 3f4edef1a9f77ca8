//! Domain models for the service-order site.
//!
//! These are validated domain types, separate from the database row types in
//! [`crate::db`]. Anything stored in the HTTP session derives serde.

pub mod job_board;
pub mod order;
pub mod profile;
pub mod session;

pub use job_board::{CompletionForm, Flash, FlashKind, JobBoard};
pub use order::{Completion, NewOrder, Order};
pub use profile::{NewProfile, Profile};
pub use session::{CurrentUser, keys as session_keys};
