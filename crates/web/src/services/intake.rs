//! Order intake.
//!
//! An admin fills in the order form; the order is stored as `Pending` and the
//! assigned technician gets an assignment notice when the technician list
//! knows their email.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinHandle;

use sejuk_core::{AccountId, Amount, OrderId, PhoneField, Role, Username, UsernameError};

use super::notify::{AssignmentNotice, Notice, Notifier, dispatch};
use crate::config::NotificationConfig;
use crate::db::{DirectoryStore, OrderStore, RepositoryError};
use crate::models::NewOrder;

/// Technician username to email, for technicians that have both.
pub type TechnicianDirectory = BTreeMap<String, String>;

/// Order form fields as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderForm {
    #[serde(default)]
    pub customer: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub problem: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub technician: String,
    #[serde(default)]
    pub notes: String,
}

/// Reasons an order was not taken.
#[derive(Debug, Error)]
pub enum IntakeError {
    /// A required field is blank.
    #[error("{0} is required.")]
    MissingField(&'static str),

    /// The price is not a storable, non-negative number.
    #[error("Price must be a number from 0 to {max}.")]
    InvalidPrice { max: Amount },

    /// The technician username is longer than any stored username.
    #[error("Technician username must be at most {max} characters.")]
    TechnicianTooLong { max: usize },

    /// The order could not be stored.
    #[error("Failed to submit order")]
    Repository(#[from] RepositoryError),
}

/// A stored order and its in-flight assignment notice.
#[derive(Debug)]
pub struct IntakeOutcome {
    pub order_id: OrderId,
    /// Present when the technician's email was known.
    pub notice: Option<JoinHandle<()>>,
}

impl OrderForm {
    /// Check required fields and build the order to store.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::MissingField` for the first blank required field,
    /// `IntakeError::InvalidPrice` for a price that is not a storable
    /// non-negative number, and `IntakeError::TechnicianTooLong` for an
    /// over-long technician username.
    pub fn validate(&self, created_by: Option<AccountId>) -> Result<NewOrder, IntakeError> {
        let required = [
            ("Customer name", &self.customer),
            ("Phone", &self.phone),
            ("Address", &self.address),
            ("Problem", &self.problem),
            ("Service", &self.service),
            ("Price", &self.price),
            ("Technician", &self.technician),
        ];
        if let Some((label, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(IntakeError::MissingField(*label));
        }

        Amount::parse(&self.price).map_err(|_| IntakeError::InvalidPrice {
            max: Amount::max_storable(),
        })?;

        let technician = Username::parse(&self.technician).map_err(|e| match e {
            UsernameError::Empty => IntakeError::MissingField("Technician"),
            UsernameError::TooLong { max } => IntakeError::TechnicianTooLong { max },
        })?;

        Ok(NewOrder {
            customer: self.customer.trim().to_string(),
            phone: PhoneField::Single(self.phone.trim().to_string()),
            address: self.address.trim().to_string(),
            problem: self.problem.trim().to_string(),
            service: self.service.trim().to_string(),
            price: self.price.trim().to_string(),
            technician,
            notes: self.notes.trim().to_string(),
            created_by,
        })
    }
}

/// Fetch the technician list for the order form.
///
/// Profiles missing a username or an email are left out.
///
/// # Errors
///
/// Returns `RepositoryError` if the directory cannot be read.
pub async fn fetch_technicians(
    directory: &dyn DirectoryStore,
) -> Result<TechnicianDirectory, RepositoryError> {
    let profiles = directory.list_by_role(Role::Technician).await?;

    Ok(profiles
        .into_iter()
        .filter_map(|p| match (p.username, p.email) {
            (Some(username), Some(email)) => {
                Some((username.as_str().to_string(), email.as_str().to_string()))
            }
            _ => None,
        })
        .collect())
}

/// Store an order and notify its technician.
///
/// The assignment notice is sent from a detached task, so a delivery failure
/// never undoes the stored order.
///
/// # Errors
///
/// Returns the validation errors of [`OrderForm::validate`] and
/// `IntakeError::Repository` if the order could not be stored.
pub async fn submit_order(
    orders: &dyn OrderStore,
    notifier: Arc<dyn Notifier>,
    settings: &NotificationConfig,
    technicians: &TechnicianDirectory,
    form: &OrderForm,
    created_by: Option<AccountId>,
    now: DateTime<Utc>,
) -> Result<IntakeOutcome, IntakeError> {
    let order = form.validate(created_by)?;
    let order_id = orders.create(&order).await?;

    tracing::info!(
        order_id = %order_id,
        technician = %order.technician,
        "Order created"
    );

    let notice = match technicians.get(order.technician.as_str()) {
        Some(email) => {
            let notice = Notice::TechnicianAssignment(AssignmentNotice {
                to_email: email.clone(),
                technician_name: order.technician.as_str().to_string(),
                order_id,
                customer: order.customer.clone(),
                phone: order.phone.display(),
                address: order.address.clone(),
                service: order.service.clone(),
                problem: order.problem.clone(),
                price: order.price.clone(),
                notes: order.notes.clone(),
                time: settings.local_time(now),
                from_name: settings.admin_sender_name.clone(),
                reply_email: email.clone(),
            });
            Some(dispatch(notifier, notice))
        }
        None => {
            tracing::warn!(
                order_id = %order_id,
                technician = %order.technician,
                "No email on file for technician, assignment notice skipped"
            );
            None
        }
    };

    Ok(IntakeOutcome { order_id, notice })
}
