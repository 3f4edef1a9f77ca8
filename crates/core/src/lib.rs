//! Sejuk Core - Shared domain types.
//!
//! This crate provides the types used across the Sejuk components:
//! - `web` - Role-gated order intake and job completion site
//! - `cli` - Migrations and account provisioning
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. Money coercion and phone number
//! normalization live here so both the web workflows and tests can use
//! them without any runtime.
//!
//! # Modules
//!
//! - [`types`] - IDs, emails, usernames, roles, statuses, amounts and phone numbers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
