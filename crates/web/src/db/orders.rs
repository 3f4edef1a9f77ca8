//! Service order repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use sejuk_core::{AccountId, OrderId, OrderStatus, PhoneField, Username};

use super::{OrderStore, RepositoryError, check_completion_amounts};
use crate::models::{Completion, NewOrder, Order};

const ORDER_COLUMNS: &str = "id, customer, phone, address, problem, service, price, technician, \
     notes, status, created_at, created_by, work_done, extra_charges, final_amount, remarks, \
     job_completed_at, completed_by_technician";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    customer: String,
    phone: Json<PhoneField>,
    address: String,
    problem: String,
    service: String,
    price: String,
    technician: String,
    notes: String,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    created_by: Option<AccountId>,
    work_done: Option<String>,
    extra_charges: Option<Decimal>,
    final_amount: Option<Decimal>,
    remarks: Option<String>,
    job_completed_at: Option<DateTime<Utc>>,
    completed_by_technician: Option<String>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            customer: row.customer,
            phone: row.phone.0,
            address: row.address,
            problem: row.problem,
            service: row.service,
            price: row.price,
            technician: row.technician,
            notes: row.notes,
            status: row.status,
            created_at: row.created_at,
            created_by: row.created_by,
            work_done: row.work_done,
            extra_charges: row.extra_charges,
            final_amount: row.final_amount,
            remarks: row.remarks,
            job_completed_at: row.job_completed_at,
            completed_by_technician: row.completed_by_technician,
        }
    }
}

/// Repository for service order database operations.
#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for OrderRepository {
    async fn create(&self, order: &NewOrder) -> Result<OrderId, RepositoryError> {
        let id: OrderId = sqlx::query_scalar(
            r"
            INSERT INTO sejuk.service_order
                (customer, phone, address, problem, service, price, technician, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            ",
        )
        .bind(&order.customer)
        .bind(Json(&order.phone))
        .bind(&order.address)
        .bind(&order.problem)
        .bind(&order.service)
        .bind(&order.price)
        .bind(order.technician.as_str())
        .bind(&order.notes)
        .bind(order.created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn complete(&self, id: OrderId, completion: &Completion) -> Result<(), RepositoryError> {
        check_completion_amounts(completion)?;

        // The status guard makes a racing second submit a no-op.
        let updated = sqlx::query(
            r"
            UPDATE sejuk.service_order
            SET work_done = $2,
                extra_charges = $3,
                final_amount = $4,
                remarks = $5,
                status = 'job_done',
                job_completed_at = $6,
                completed_by_technician = $7
            WHERE id = $1 AND status = 'pending'
            ",
        )
        .bind(id)
        .bind(&completion.work_done)
        .bind(completion.extra_charges.value())
        .bind(completion.final_amount.value())
        .bind(&completion.remarks)
        .bind(completion.completed_at)
        .bind(completion.completed_by.as_str())
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 1 {
            return Ok(());
        }

        match self.get(id).await? {
            Some(_) => Err(RepositoryError::Conflict(format!(
                "order {id} is already completed"
            ))),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn list_for_technician(
        &self,
        technician: &Username,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM sejuk.service_order WHERE technician = $1 ORDER BY created_at, id"
        ))
        .bind(technician.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Order::from).collect())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM sejuk.service_order WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Order::from))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
