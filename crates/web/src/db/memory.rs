//! In-memory store implementations for testing and local development.
//!
//! ## Limitations
//!
//! - **NOT suitable for production**: nothing is persisted
//! - **Single-process only**: state is not shared across process boundaries
//!
//! Every store can be switched into a failing mode to exercise the error
//! paths of the workflows.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use sejuk_core::{AccountId, Email, OrderId, OrderStatus, Role, Username};

use super::{
    AccountStore, DirectoryStore, OrderStore, RepositoryError, StoredAccount,
    check_completion_amounts,
};
use crate::models::{Completion, NewOrder, NewProfile, Order, Profile};

/// Converts a lock poison error to a repository error.
fn poison_err<T>(_: PoisonError<T>) -> RepositoryError {
    RepositoryError::Unavailable("lock poisoned".to_string())
}

/// Switch that makes every call on a store fail.
#[derive(Debug, Default)]
struct FailSwitch(AtomicBool);

impl FailSwitch {
    fn set(&self, failing: bool) {
        self.0.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.0.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "store switched to failing".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Accounts
// =============================================================================

/// In-memory credential store.
#[derive(Debug, Default)]
pub struct InMemoryAccounts {
    accounts: RwLock<BTreeMap<AccountId, StoredAccount>>,
}

impl InMemoryAccounts {
    /// Creates an empty account store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccounts {
    async fn create(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<AccountId, RepositoryError> {
        let mut accounts = self.accounts.write().map_err(poison_err)?;
        if accounts.values().any(|a| a.email == *email) {
            return Err(RepositoryError::Conflict("email already exists".to_string()));
        }

        let next = accounts.keys().next_back().map_or(1, |id| id.as_i32() + 1);
        let id = AccountId::new(next);
        accounts.insert(
            id,
            StoredAccount {
                id,
                email: email.clone(),
                password_hash: password_hash.to_string(),
            },
        );
        Ok(id)
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<StoredAccount>, RepositoryError> {
        let accounts = self.accounts.read().map_err(poison_err)?;
        Ok(accounts.values().find(|a| a.email == *email).cloned())
    }
}

// =============================================================================
// Directory
// =============================================================================

/// In-memory profile directory.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    profiles: RwLock<BTreeMap<AccountId, Profile>>,
    failing: FailSwitch,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a profile as-is.
    ///
    /// Lets tests seed profiles the sign-up form would never write, such as
    /// ones missing a username.
    pub fn insert(&self, profile: Profile) {
        self.profiles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(profile.account_id, profile);
    }

    /// Make every subsequent call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }
}

#[async_trait]
impl DirectoryStore for InMemoryDirectory {
    async fn get(&self, id: AccountId) -> Result<Option<Profile>, RepositoryError> {
        self.failing.check()?;
        let profiles = self.profiles.read().map_err(poison_err)?;
        Ok(profiles.get(&id).cloned())
    }

    async fn create(&self, profile: &NewProfile) -> Result<Profile, RepositoryError> {
        self.failing.check()?;
        let mut profiles = self.profiles.write().map_err(poison_err)?;
        if profiles.contains_key(&profile.account_id) {
            return Err(RepositoryError::Conflict("profile already exists".to_string()));
        }
        if profiles
            .values()
            .any(|p| p.username.as_ref() == Some(&profile.username))
        {
            return Err(RepositoryError::Conflict("username already exists".to_string()));
        }

        let stored = Profile {
            account_id: profile.account_id,
            email: Some(profile.email.clone()),
            username: Some(profile.username.clone()),
            role: profile.role,
            created_at: Utc::now(),
        };
        profiles.insert(profile.account_id, stored.clone());
        Ok(stored)
    }

    async fn username_taken(&self, username: &Username) -> Result<bool, RepositoryError> {
        self.failing.check()?;
        let profiles = self.profiles.read().map_err(poison_err)?;
        Ok(profiles
            .values()
            .any(|p| p.username.as_ref() == Some(username)))
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<Profile>, RepositoryError> {
        self.failing.check()?;
        let profiles = self.profiles.read().map_err(poison_err)?;
        Ok(profiles.values().filter(|p| p.role == role).cloned().collect())
    }
}

// =============================================================================
// Orders
// =============================================================================

/// In-memory order store.
#[derive(Debug, Default)]
pub struct InMemoryOrders {
    orders: RwLock<BTreeMap<OrderId, Order>>,
    failing: FailSwitch,
    failing_completion: FailSwitch,
}

impl InMemoryOrders {
    /// Creates an empty order store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    /// Make only the completion write fail.
    pub fn set_failing_completion(&self, failing: bool) {
        self.failing_completion.set(failing);
    }

    /// Snapshot of every stored order.
    #[must_use]
    pub fn all(&self) -> Vec<Order> {
        self.orders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrders {
    async fn create(&self, order: &NewOrder) -> Result<OrderId, RepositoryError> {
        self.failing.check()?;
        let mut orders = self.orders.write().map_err(poison_err)?;

        let next = orders.keys().next_back().map_or(1, |id| id.as_i32() + 1);
        let id = OrderId::new(next);
        orders.insert(
            id,
            Order {
                id,
                customer: order.customer.clone(),
                phone: order.phone.clone(),
                address: order.address.clone(),
                problem: order.problem.clone(),
                service: order.service.clone(),
                price: order.price.clone(),
                technician: order.technician.as_str().to_string(),
                notes: order.notes.clone(),
                status: OrderStatus::Pending,
                created_at: Utc::now(),
                created_by: order.created_by,
                work_done: None,
                extra_charges: None,
                final_amount: None,
                remarks: None,
                job_completed_at: None,
                completed_by_technician: None,
            },
        );
        Ok(id)
    }

    async fn complete(&self, id: OrderId, completion: &Completion) -> Result<(), RepositoryError> {
        self.failing.check()?;
        self.failing_completion.check()?;
        check_completion_amounts(completion)?;
        let mut orders = self.orders.write().map_err(poison_err)?;
        let order = orders.get_mut(&id).ok_or(RepositoryError::NotFound)?;

        order.status = order
            .status
            .complete()
            .map_err(|_| RepositoryError::Conflict(format!("order {id} is already completed")))?;
        order.work_done = Some(completion.work_done.clone());
        order.extra_charges = Some(completion.extra_charges.value());
        order.final_amount = Some(completion.final_amount.value());
        order.remarks = Some(completion.remarks.clone());
        order.job_completed_at = Some(completion.completed_at);
        order.completed_by_technician = Some(completion.completed_by.as_str().to_string());
        Ok(())
    }

    async fn list_for_technician(
        &self,
        technician: &Username,
    ) -> Result<Vec<Order>, RepositoryError> {
        self.failing.check()?;
        let orders = self.orders.read().map_err(poison_err)?;
        Ok(orders
            .values()
            .filter(|o| o.technician == technician.as_str())
            .cloned()
            .collect())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        self.failing.check()?;
        let orders = self.orders.read().map_err(poison_err)?;
        Ok(orders.get(&id).cloned())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.failing.check()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use sejuk_core::{Amount, PhoneField};

    use super::*;

    fn new_order(technician: &str) -> NewOrder {
        NewOrder {
            customer: "Aminah".into(),
            phone: PhoneField::Single("0123456789".into()),
            address: "Jalan Ampang".into(),
            problem: "Not cold".into(),
            service: "Aircond".into(),
            price: "100".into(),
            technician: Username::parse(technician).unwrap(),
            notes: String::new(),
            created_by: None,
        }
    }

    fn completion() -> Completion {
        Completion {
            work_done: "Topped up gas".into(),
            extra_charges: Amount::ZERO,
            final_amount: Amount::coerce("100"),
            remarks: String::new(),
            completed_by: Username::parse("ali").unwrap(),
            completed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let accounts = InMemoryAccounts::new();
        let email = Email::parse("ali@sejuk.my").unwrap();
        accounts.create(&email, "hash").await.unwrap();

        let err = accounts.create(&email, "hash").await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_orders_filtered_by_technician() {
        let orders = InMemoryOrders::new();
        orders.create(&new_order("ali")).await.unwrap();
        orders.create(&new_order("siti")).await.unwrap();

        let ali = orders
            .list_for_technician(&Username::parse("ali").unwrap())
            .await
            .unwrap();
        assert_eq!(ali.len(), 1);
        assert_eq!(ali[0].status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_completion_happens_once() {
        let orders = InMemoryOrders::new();
        let id = orders.create(&new_order("ali")).await.unwrap();

        orders.complete(id, &completion()).await.unwrap();
        let err = orders.complete(id, &completion()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));

        let stored = orders.get(id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::JobDone);
        assert_eq!(stored.completed_by_technician.as_deref(), Some("ali"));
    }

    #[tokio::test]
    async fn test_completion_rejects_unstorable_amounts() {
        let orders = InMemoryOrders::new();
        let id = orders.create(&new_order("ali")).await.unwrap();

        let mut too_large = completion();
        too_large.extra_charges = Amount::coerce("1e10");
        let err = orders.complete(id, &too_large).await.unwrap_err();
        assert!(matches!(err, RepositoryError::OutOfRange(_)));

        let stored = orders.get(id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);
        assert!(stored.extra_charges.is_none());
    }

    #[tokio::test]
    async fn test_complete_unknown_order() {
        let orders = InMemoryOrders::new();
        let err = orders
            .complete(OrderId::new(7), &completion())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let directory = InMemoryDirectory::new();
        let profile = |id: i32, email: &str| NewProfile {
            account_id: AccountId::new(id),
            email: Email::parse(email).unwrap(),
            username: Username::parse("Ali").unwrap(),
            role: Role::Technician,
        };
        directory.create(&profile(1, "ali@sejuk.my")).await.unwrap();

        assert!(
            directory
                .username_taken(&Username::parse("ali").unwrap())
                .await
                .unwrap()
        );
        let err = directory
            .create(&profile(2, "ali2@sejuk.my"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert!(directory.get(AccountId::new(2)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failing_directory() {
        let directory = InMemoryDirectory::new();
        directory.set_failing(true);
        assert!(directory.get(AccountId::new(1)).await.is_err());
        directory.set_failing(false);
        assert!(directory.get(AccountId::new(1)).await.unwrap().is_none());
    }
}
