//! Order intake by an admin and job completion by a technician.

#![allow(clippy::unwrap_used)]

use std::str::FromStr;

use axum::http::StatusCode;
use rust_decimal::Decimal;
use sejuk_core::{OrderStatus, PhoneField, Role, Username};
use sejuk_integration_tests::{OVERSIGHT_EMAIL, TestApp, body_text, location};
use sejuk_web::db::OrderStore;
use sejuk_web::models::NewOrder;
use sejuk_web::services::notify::Notice;

const COMPLETED: &str = "Job marked as done, WhatsApp opened, and email sent!";

async fn staffed_app() -> TestApp {
    let app = TestApp::new();
    app.add_account("boss@sejuk.my", Some(("boss", Role::Admin)))
        .await;
    app.add_account("ali@sejuk.my", Some(("ali", Role::Technician)))
        .await;
    app
}

fn order_fields<'a>(technician: &'a str, phone: &'a str) -> Vec<(&'static str, &'a str)> {
    vec![
        ("customer", "Aminah"),
        ("phone", phone),
        ("address", "12 Jalan Ampang"),
        ("problem", "Aircond not cold"),
        ("service", "Aircond service"),
        ("price", "100"),
        ("technician", technician),
        ("notes", ""),
    ]
}

async fn seed_order(app: &TestApp, phone: PhoneField) -> sejuk_core::OrderId {
    app.orders
        .create(&NewOrder {
            customer: "Aminah".into(),
            phone,
            address: "12 Jalan Ampang".into(),
            problem: "Aircond not cold".into(),
            service: "Aircond service".into(),
            price: "100".into(),
            technician: Username::parse("ali").unwrap(),
            notes: String::new(),
            created_by: None,
        })
        .await
        .unwrap()
}

// =============================================================================
// Intake
// =============================================================================

#[tokio::test]
async fn test_order_form_lists_technicians() {
    let app = staffed_app().await;
    let mut admin = app.signed_in("boss@sejuk.my").await;

    let response = admin.get("/admin").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("<option value=\"ali\""));
    assert!(!body.contains("<option value=\"boss\""));
}

#[tokio::test]
async fn test_submit_stores_order_and_notifies_technician() {
    let app = staffed_app().await;
    let mut admin = app.signed_in("boss@sejuk.my").await;
    admin.get("/admin").await;

    let response = admin
        .post_form("/admin", &order_fields("ali", "0123456789"))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Order submitted!"));

    let orders = app.orders.all();
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.technician, "ali");
    assert_eq!(order.phone, PhoneField::Single("0123456789".into()));

    let sent = app.wait_for_notices(1).await;
    let Some(Notice::TechnicianAssignment(notice)) = sent.first() else {
        panic!("expected an assignment notice, got {sent:?}");
    };
    assert_eq!(notice.to_email, "ali@sejuk.my");
    assert_eq!(notice.order_id, order.id);
    assert_eq!(notice.customer, "Aminah");
}

#[tokio::test]
async fn test_submit_without_technician_email_skips_notice() {
    let app = staffed_app().await;
    let mut admin = app.signed_in("boss@sejuk.my").await;

    let response = admin
        .post_form("/admin", &order_fields("stranger", "0123456789"))
        .await;

    assert!(body_text(response).await.contains("Order submitted!"));
    assert_eq!(app.orders.all().len(), 1);
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(app.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_submit_with_missing_field_keeps_input() {
    let app = staffed_app().await;
    let mut admin = app.signed_in("boss@sejuk.my").await;

    let response = admin.post_form("/admin", &order_fields("ali", "  ")).await;

    let body = body_text(response).await;
    assert!(body.contains("Phone is required."));
    assert!(body.contains("value=\"Aminah\""));
    assert!(app.orders.all().is_empty());
}

#[tokio::test]
async fn test_submit_with_unusable_price_keeps_input() {
    let app = staffed_app().await;
    let mut admin = app.signed_in("boss@sejuk.my").await;

    let mut fields = order_fields("ali", "0123456789");
    fields.retain(|(name, _)| *name != "price");
    fields.push(("price", "79228162514264337593543950335"));
    let response = admin.post_form("/admin", &fields).await;

    let body = body_text(response).await;
    assert!(body.contains("Price must be a number from 0 to 9999999999.99."));
    assert!(body.contains("value=\"Aminah\""));
    assert!(app.orders.all().is_empty());
    assert!(app.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_notifier_failure_keeps_order() {
    let app = staffed_app().await;
    app.notifier.set_failing(true);
    let mut admin = app.signed_in("boss@sejuk.my").await;

    let response = admin
        .post_form("/admin", &order_fields("ali", "0123456789"))
        .await;

    assert!(body_text(response).await.contains("Order submitted!"));
    assert_eq!(app.orders.all().len(), 1);
}

#[tokio::test]
async fn test_store_failure_reports_and_keeps_input() {
    let app = staffed_app().await;
    let mut admin = app.signed_in("boss@sejuk.my").await;
    app.orders.set_failing(true);

    let response = admin
        .post_form("/admin", &order_fields("ali", "0123456789"))
        .await;

    let body = body_text(response).await;
    assert!(body.contains("Failed to submit order"));
    assert!(body.contains("value=\"Aminah\""));
}

// =============================================================================
// Completion
// =============================================================================

#[tokio::test]
async fn test_technician_completes_job() {
    let app = staffed_app().await;
    let id = seed_order(&app, PhoneField::Single("0123456789".into())).await;
    let mut technician = app.signed_in("ali@sejuk.my").await;

    let response = technician.get("/technician").await;
    assert!(
        body_text(response)
            .await
            .contains("Aminah | 12 Jalan Ampang | RM 100.00")
    );

    let order_id = id.to_string();
    let response = technician
        .post_form("/technician/select", &[("order_id", order_id.as_str())])
        .await;
    let body = body_text(response).await;
    assert!(body.contains(&format!("Order #{id}")));

    let response = technician
        .post_form(
            "/technician/complete",
            &[
                ("work_done", "Topped up gas"),
                ("extra_charges", "25.50"),
                ("remarks", ""),
            ],
        )
        .await;

    let body = body_text(response).await;
    assert!(body.contains(COMPLETED));
    assert!(body.contains("rel=\"noopener\" data-autopen>"));
    assert!(body.contains("+60123456789"));

    let stored = app.orders.get(id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::JobDone);
    assert_eq!(stored.final_amount, Some(Decimal::from_str("125.50").unwrap()));
    assert_eq!(stored.completed_by_technician.as_deref(), Some("ali"));

    let sent = app.wait_for_notices(1).await;
    let Some(Notice::JobCompleted(notice)) = sent.first() else {
        panic!("expected a completion notice, got {sent:?}");
    };
    assert_eq!(notice.to_email, OVERSIGHT_EMAIL);
    assert_eq!(notice.order_id, id);

    let response = technician.get("/technician").await;
    assert!(body_text(response).await.contains("No pending jobs assigned to you."));
}

#[tokio::test]
async fn test_completion_requires_work_done() {
    let app = staffed_app().await;
    let id = seed_order(&app, PhoneField::default()).await;
    let mut technician = app.signed_in("ali@sejuk.my").await;
    technician.get("/technician").await;
    let order_id = id.to_string();
    technician
        .post_form("/technician/select", &[("order_id", order_id.as_str())])
        .await;

    let response = technician
        .post_form(
            "/technician/complete",
            &[("work_done", ""), ("extra_charges", "10"), ("remarks", "")],
        )
        .await;

    let body = body_text(response).await;
    assert!(body.contains("Please describe the work done."));
    assert!(body.contains("value=\"10\""));
    assert_eq!(
        app.orders.get(id).await.unwrap().unwrap().status,
        OrderStatus::Pending
    );
}

#[tokio::test]
async fn test_out_of_range_extra_charge_leaves_order_pending() {
    let app = staffed_app().await;
    let id = seed_order(&app, PhoneField::Single("0123456789".into())).await;
    let mut technician = app.signed_in("ali@sejuk.my").await;
    technician.get("/technician").await;
    let order_id = id.to_string();
    technician
        .post_form("/technician/select", &[("order_id", order_id.as_str())])
        .await;

    let response = technician
        .post_form(
            "/technician/complete",
            &[
                ("work_done", "Topped up gas"),
                ("extra_charges", "1e10"),
                ("remarks", ""),
            ],
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("The final amount is too large to record."));
    assert!(!body.contains("rel=\"noopener\" data-autopen>"));
    assert_eq!(
        app.orders.get(id).await.unwrap().unwrap().status,
        OrderStatus::Pending
    );
    assert!(app.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_complete_without_open_board_redirects() {
    let app = staffed_app().await;
    seed_order(&app, PhoneField::default()).await;
    let mut technician = app.signed_in("ali@sejuk.my").await;

    let response = technician
        .post_form("/technician/complete", &[("work_done", "Fixed")])
        .await;

    assert_eq!(location(&response), Some("/technician"));
}

#[tokio::test]
async fn test_other_technicians_orders_are_hidden() {
    let app = staffed_app().await;
    app.add_account("chong@sejuk.my", Some(("chong", Role::Technician)))
        .await;
    seed_order(&app, PhoneField::default()).await;

    let mut technician = app.signed_in("chong@sejuk.my").await;
    let response = technician.get("/technician").await;

    let body = body_text(response).await;
    assert!(body.contains("No pending jobs assigned to you."));
    assert!(!body.contains("Aminah"));
}
