//! Service orders.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use sejuk_core::{AccountId, Amount, OrderId, OrderStatus, PhoneField, Username};

/// A persisted service order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer: String,
    pub phone: PhoneField,
    pub address: String,
    pub problem: String,
    pub service: String,
    /// Quoted price as entered; read through [`Amount::coerce`].
    pub price: String,
    /// Username of the assigned technician.
    pub technician: String,
    pub notes: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<AccountId>,
    pub work_done: Option<String>,
    pub extra_charges: Option<Decimal>,
    pub final_amount: Option<Decimal>,
    pub remarks: Option<String>,
    pub job_completed_at: Option<DateTime<Utc>>,
    pub completed_by_technician: Option<String>,
}

impl Order {
    /// Quoted price, zero when the stored text is not numeric.
    #[must_use]
    pub fn price_amount(&self) -> Amount {
        Amount::coerce(&self.price)
    }
}

/// A validated order ready to be persisted.
///
/// Status and creation time are set by the store.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer: String,
    pub phone: PhoneField,
    pub address: String,
    pub problem: String,
    pub service: String,
    pub price: String,
    pub technician: Username,
    pub notes: String,
    pub created_by: Option<AccountId>,
}

/// Fields written when a technician closes out a job.
#[derive(Debug, Clone)]
pub struct Completion {
    pub work_done: String,
    pub extra_charges: Amount,
    pub final_amount: Amount,
    pub remarks: String,
    pub completed_by: Username,
    pub completed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_price_amount_coerces_garbage_to_zero() {
        let mut order = Order {
            id: OrderId::new(1),
            customer: "Aminah".into(),
            phone: PhoneField::Single("0123456789".into()),
            address: "Jalan 1".into(),
            problem: "Not cold".into(),
            service: "Aircond".into(),
            price: "150.50".into(),
            technician: "ali".into(),
            notes: String::new(),
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            created_by: None,
            work_done: None,
            extra_charges: None,
            final_amount: None,
            remarks: None,
            job_completed_at: None,
            completed_by_technician: None,
        };
        assert_eq!(
            order.price_amount().value(),
            Decimal::from_str("150.50").unwrap_or_default()
        );

        order.price = "call for quote".into();
        assert_eq!(order.price_amount(), Amount::ZERO);
    }
}
