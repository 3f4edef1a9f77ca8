//! Core types for Sejuk.
//!
//! This module provides type-safe wrappers for the service-order domain.

pub mod amount;
pub mod email;
pub mod id;
pub mod phone;
pub mod status;
pub mod username;

pub use amount::{Amount, AmountError, coerce_amount};
pub use email::{Email, EmailError};
pub use id::*;
pub use phone::{
    DEFAULT_COUNTRY_CODE, KNOWN_COUNTRY_CODES, PhoneField, normalize_phone,
};
pub use status::*;
pub use username::{Username, UsernameError};
