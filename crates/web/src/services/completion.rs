//! Job completion.
//!
//! A technician opens their board (the active orders assigned to their
//! username), picks one, and closes it out. Closing out stores the work done
//! and the final amount, hands back WhatsApp deep-links for the customer, and
//! sends the oversight notice.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::task::JoinHandle;

use sejuk_core::{Amount, OrderId, Username};

use super::notify::{CompletionNotice, Notice, Notifier, dispatch};
use super::whatsapp::{self, DeepLink};
use crate::config::NotificationConfig;
use crate::db::{OrderStore, RepositoryError};
use crate::models::{Completion, CompletionForm, Flash, JobBoard};

/// Message shown after a successful completion.
pub const COMPLETED_MESSAGE: &str = "Job marked as done, WhatsApp opened, and email sent!";

/// Reasons a completion was not stored.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Please select an order first.")]
    NoSelection,

    #[error("Please describe the work done.")]
    MissingWorkDone,

    #[error("This job has already been completed.")]
    AlreadyCompleted,

    #[error("The final amount is too large to record. Please check the price and extra charges.")]
    AmountOutOfRange,

    #[error("Failed to complete job. Please try again.")]
    Repository(#[source] RepositoryError),
}

impl From<RepositoryError> for CompletionError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::Conflict(_) => Self::AlreadyCompleted,
            RepositoryError::OutOfRange(_) => Self::AmountOutOfRange,
            other => Self::Repository(other),
        }
    }
}

/// A stored completion and its follow-ups.
#[derive(Debug)]
pub struct CompletionOutcome {
    pub order_id: OrderId,
    pub final_amount: Amount,
    /// One per usable customer number; opened by the browser.
    pub deep_links: Vec<DeepLink>,
    /// In-flight oversight notice.
    pub notice: JoinHandle<()>,
}

/// Fetch the active orders for `technician` and build a fresh board.
///
/// A fetch failure yields an empty board carrying an error message.
pub async fn load_board(orders: &dyn OrderStore, technician: Username) -> JobBoard {
    match orders.list_for_technician(&technician).await {
        Ok(fetched) => {
            let active = fetched
                .into_iter()
                .filter(|order| order.status.is_active())
                .collect();
            JobBoard::new(technician, active)
        }
        Err(e) => {
            tracing::error!(technician = %technician, error = %e, "Failed to fetch orders");
            JobBoard::fetch_failed(technician)
        }
    }
}

/// Close out the selected order.
///
/// On success the order leaves the board and the form is reset. On failure
/// the board keeps the selection and the typed form, and carries the error
/// message.
///
/// # Errors
///
/// Returns `CompletionError` when nothing is selected, the work-done field is
/// blank, the final amount does not fit a stored amount, or the store
/// rejects the update.
pub async fn complete_selected(
    board: &mut JobBoard,
    form: CompletionForm,
    orders: &dyn OrderStore,
    notifier: Arc<dyn Notifier>,
    settings: &NotificationConfig,
    now: DateTime<Utc>,
) -> Result<CompletionOutcome, CompletionError> {
    board.form = form;
    let result = store_completion(board, orders, notifier, settings, now).await;

    match &result {
        Ok(outcome) => board.finish(outcome.order_id, Flash::success(COMPLETED_MESSAGE)),
        Err(e) => board.message = Some(Flash::error(e.to_string())),
    }
    result
}

async fn store_completion(
    board: &JobBoard,
    orders: &dyn OrderStore,
    notifier: Arc<dyn Notifier>,
    settings: &NotificationConfig,
    now: DateTime<Utc>,
) -> Result<CompletionOutcome, CompletionError> {
    let order = board.selected_order().ok_or(CompletionError::NoSelection)?;
    let work_done = board.form.work_done.trim();
    if work_done.is_empty() {
        return Err(CompletionError::MissingWorkDone);
    }

    let extra_charges = Amount::coerce_non_negative(&board.form.extra_charges);
    let final_amount = order
        .price_amount()
        .checked_add(extra_charges)
        .ok_or(CompletionError::AmountOutOfRange)?;
    let completion = Completion {
        work_done: work_done.to_string(),
        extra_charges,
        final_amount,
        remarks: board.form.remarks.trim().to_string(),
        completed_by: board.technician.clone(),
        completed_at: now,
    };

    orders.complete(order.id, &completion).await?;

    tracing::info!(
        order_id = %order.id,
        technician = %board.technician,
        final_amount = %final_amount,
        "Job completed"
    );

    let time = settings.local_time(now);
    let message = whatsapp::completion_message(
        &order.customer,
        order.id,
        board.technician.as_str(),
        &time,
    );
    let deep_links = whatsapp::deep_links(&order.phone, &message, &settings.default_country_code);

    let notice = dispatch(
        notifier,
        Notice::JobCompleted(CompletionNotice {
            to_email: settings.oversight_email.as_str().to_string(),
            technician_name: board.technician.as_str().to_string(),
            order_id: order.id,
            time,
            from_name: board.technician.as_str().to_string(),
            reply_email: settings.noreply_email.clone(),
        }),
    );

    Ok(CompletionOutcome {
        order_id: order.id,
        final_amount,
        deep_links,
        notice,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use sejuk_core::{Email, OrderStatus, PhoneField};

    use super::*;
    use crate::config::offset_from_hours;
    use crate::db::memory::InMemoryOrders;
    use crate::models::{FlashKind, NewOrder};
    use crate::services::notify::RecordingNotifier;

    fn settings() -> NotificationConfig {
        NotificationConfig {
            oversight_email: Email::parse("ops@sejuk.my").unwrap(),
            admin_sender_name: "Sejuk Admin".to_string(),
            noreply_email: "noreply@sejuk.my".to_string(),
            utc_offset: offset_from_hours(8).unwrap(),
            default_country_code: "60".to_string(),
        }
    }

    fn ali() -> Username {
        Username::parse("ali").unwrap()
    }

    async fn seed(orders: &InMemoryOrders, price: &str, phone: PhoneField) -> OrderId {
        orders
            .create(&NewOrder {
                customer: "Aminah".into(),
                phone,
                address: "12 Jalan Ampang".into(),
                problem: "Not cold".into(),
                service: "Aircond service".into(),
                price: price.into(),
                technician: ali(),
                notes: String::new(),
                created_by: None,
            })
            .await
            .unwrap()
    }

    fn work(extra: &str) -> CompletionForm {
        CompletionForm {
            work_done: "Topped up gas".into(),
            extra_charges: extra.into(),
            remarks: String::new(),
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn test_board_excludes_done_orders() {
        let orders = InMemoryOrders::new();
        let done = seed(&orders, "100", PhoneField::default()).await;
        let open = seed(&orders, "80", PhoneField::default()).await;

        let mut board = load_board(&orders, ali()).await;
        board.select(Some(done));
        complete_selected(
            &mut board,
            work(""),
            &orders,
            Arc::new(RecordingNotifier::new()),
            &settings(),
            Utc::now(),
        )
        .await
        .unwrap();

        for _ in 0..3 {
            let board = load_board(&orders, ali()).await;
            let ids: Vec<_> = board.orders.iter().map(|o| o.id).collect();
            assert_eq!(ids, vec![open]);
        }
    }

    #[tokio::test]
    async fn test_fetch_failure_gives_empty_board_with_error() {
        let orders = InMemoryOrders::new();
        orders.set_failing(true);

        let board = load_board(&orders, ali()).await;

        assert!(board.orders.is_empty());
        assert_eq!(board.message, Some(Flash::error("Failed to fetch orders.")));
    }

    #[tokio::test]
    async fn test_blank_extra_charges_keeps_price() {
        let orders = InMemoryOrders::new();
        let id = seed(&orders, "100", PhoneField::Single("0123456789".into())).await;
        let notifier = Arc::new(RecordingNotifier::new());

        let mut board = load_board(&orders, ali()).await;
        board.select(Some(id));
        let outcome = complete_selected(
            &mut board,
            work(""),
            &orders,
            notifier.clone(),
            &settings(),
            Utc::now(),
        )
        .await
        .unwrap();
        outcome.notice.await.unwrap();

        let stored = orders.get(id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::JobDone);
        assert_eq!(stored.final_amount, Some(dec("100")));
        assert_eq!(stored.extra_charges, Some(Decimal::ZERO));

        assert!(board.orders.is_empty());
        assert!(board.selected.is_none());
        assert_eq!(board.message, Some(Flash::success(COMPLETED_MESSAGE)));

        assert_eq!(outcome.deep_links.len(), 1);
        assert!(
            outcome.deep_links[0]
                .url
                .starts_with("https://wa.me/60123456789?text=Hi%20Aminah")
        );

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        let Notice::JobCompleted(notice) = &sent[0] else {
            panic!("expected a completion notice");
        };
        assert_eq!(notice.to_email, "ops@sejuk.my");
        assert_eq!(notice.technician_name, "ali");
        assert_eq!(notice.reply_email, "noreply@sejuk.my");
    }

    #[tokio::test]
    async fn test_final_amount_arithmetic() {
        let cases = [
            ("100", "", "100"),
            ("100", "0", "100"),
            ("100", "25.50", "125.50"),
            ("100", "-40", "100"),
            ("100", "lots", "100"),
            ("abc", "30", "30"),
            ("", "", "0"),
        ];

        for (price, extra, expected) in cases {
            let orders = InMemoryOrders::new();
            let id = seed(&orders, price, PhoneField::default()).await;
            let mut board = load_board(&orders, ali()).await;
            board.select(Some(id));

            let outcome = complete_selected(
                &mut board,
                work(extra),
                &orders,
                Arc::new(RecordingNotifier::new()),
                &settings(),
                Utc::now(),
            )
            .await
            .unwrap();

            assert_eq!(
                outcome.final_amount.value(),
                dec(expected),
                "price {price:?} extra {extra:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_out_of_range_amount_leaves_order_pending() {
        let cases = [("79228162514264337593543950335", "1"), ("100", "1e10")];

        for (price, extra) in cases {
            let orders = InMemoryOrders::new();
            let id = seed(&orders, price, PhoneField::Single("0123456789".into())).await;
            let notifier = Arc::new(RecordingNotifier::new());
            let mut board = load_board(&orders, ali()).await;
            board.select(Some(id));

            let err = complete_selected(
                &mut board,
                work(extra),
                &orders,
                notifier.clone(),
                &settings(),
                Utc::now(),
            )
            .await
            .unwrap_err();

            assert!(matches!(err, CompletionError::AmountOutOfRange), "price {price:?}");
            assert_eq!(board.selected, Some(id));
            assert_eq!(board.message.as_ref().map(|m| m.kind), Some(FlashKind::Error));
            assert_eq!(
                orders.get(id).await.unwrap().unwrap().status,
                OrderStatus::Pending
            );
            assert!(notifier.sent().is_empty());
        }
    }

    #[tokio::test]
    async fn test_final_amount_is_stored_to_the_sen() {
        let orders = InMemoryOrders::new();
        let id = seed(&orders, "100.005", PhoneField::default()).await;
        let mut board = load_board(&orders, ali()).await;
        board.select(Some(id));

        let outcome = complete_selected(
            &mut board,
            work("0.004"),
            &orders,
            Arc::new(RecordingNotifier::new()),
            &settings(),
            Utc::now(),
        )
        .await
        .unwrap();

        let stored = orders.get(id).await.unwrap().unwrap();
        assert_eq!(outcome.final_amount.value(), dec("100.01"));
        assert_eq!(stored.final_amount, Some(dec("100.01")));
        assert_eq!(stored.extra_charges, Some(dec("0.00")));
    }

    #[tokio::test]
    async fn test_validation_errors_store_nothing() {
        let orders = InMemoryOrders::new();
        let id = seed(&orders, "100", PhoneField::default()).await;
        let notifier = Arc::new(RecordingNotifier::new());
        let mut board = load_board(&orders, ali()).await;

        let err = complete_selected(
            &mut board,
            work(""),
            &orders,
            notifier.clone(),
            &settings(),
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CompletionError::NoSelection));
        assert_eq!(
            board.message,
            Some(Flash::error("Please select an order first."))
        );

        board.select(Some(id));
        let mut blank = work("10");
        blank.work_done = "   ".into();
        let err = complete_selected(
            &mut board,
            blank.clone(),
            &orders,
            notifier.clone(),
            &settings(),
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CompletionError::MissingWorkDone));
        assert_eq!(board.form, blank);
        assert_eq!(board.selected, Some(id));

        assert_eq!(
            orders.get(id).await.unwrap().unwrap().status,
            OrderStatus::Pending
        );
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_preserves_selection_and_form() {
        let orders = InMemoryOrders::new();
        let id = seed(&orders, "100", PhoneField::default()).await;
        let mut board = load_board(&orders, ali()).await;
        board.select(Some(id));
        orders.set_failing_completion(true);

        let err = complete_selected(
            &mut board,
            work("15"),
            &orders,
            Arc::new(RecordingNotifier::new()),
            &settings(),
            Utc::now(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CompletionError::Repository(_)));
        assert_eq!(board.selected, Some(id));
        assert_eq!(board.form, work("15"));
        assert_eq!(
            board.message.as_ref().map(|m| m.kind),
            Some(FlashKind::Error)
        );
        assert_eq!(board.orders.len(), 1);
    }

    #[tokio::test]
    async fn test_second_completion_reports_already_done() {
        let orders = InMemoryOrders::new();
        let id = seed(&orders, "100", PhoneField::default()).await;
        let mut first = load_board(&orders, ali()).await;
        let mut second = first.clone();
        first.select(Some(id));
        second.select(Some(id));

        complete_selected(
            &mut first,
            work(""),
            &orders,
            Arc::new(RecordingNotifier::new()),
            &settings(),
            Utc::now(),
        )
        .await
        .unwrap();
        let err = complete_selected(
            &mut second,
            work(""),
            &orders,
            Arc::new(RecordingNotifier::new()),
            &settings(),
            Utc::now(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CompletionError::AlreadyCompleted));
    }
}
