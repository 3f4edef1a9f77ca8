//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Identity gateway (sign-up, sign-in, password hashing)
//! - `access` - Per-request session and role resolution
//! - `intake` - Admin order intake
//! - `completion` - Technician job board and completion
//! - `notify` - Assignment and completion notices (SMTP)
//! - `whatsapp` - Customer follow-up deep-links

pub mod access;
pub mod auth;
pub mod completion;
pub mod intake;
pub mod notify;
pub mod whatsapp;
