//! Technician job board route handlers.
//!
//! Opening the board fetches the active orders once and keeps the board in
//! the session; selecting and completing work on that copy.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;

use sejuk_core::OrderId;

use super::{FlashView, Nav};
use crate::config::NotificationConfig;
use crate::error::add_breadcrumb;
use crate::middleware::{Principal, RequireTechnician};
use crate::models::{CompletionForm, JobBoard, Order, session_keys};
use crate::services::completion;
use crate::services::whatsapp::DeepLink;
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// One entry in the active order list.
#[derive(Debug, Clone)]
pub struct OrderOption {
    pub id: OrderId,
    pub customer: String,
    pub address: String,
    /// Quoted price, e.g. `RM 150.00`.
    pub price: String,
    pub service: String,
    pub selected: bool,
}

/// Detail view of the selected order.
#[derive(Debug, Clone)]
pub struct SelectedOrder {
    pub id: OrderId,
    pub customer: String,
    pub phone: String,
    pub address: String,
    pub problem: String,
    pub service: String,
    pub price: String,
    pub notes: String,
    pub created_at: String,
    /// Quoted price as a plain number for the live preview script.
    pub base_amount: String,
    pub final_amount: String,
}

impl SelectedOrder {
    fn new(order: &Order, board: &JobBoard, settings: &NotificationConfig) -> Self {
        let price = order.price_amount();
        Self {
            id: order.id,
            customer: order.customer.clone(),
            phone: order.phone.display(),
            address: order.address.clone(),
            problem: order.problem.clone(),
            service: order.service.clone(),
            price: price.display_rm(),
            notes: order.notes.clone(),
            created_at: settings.local_time(order.created_at),
            base_amount: format!("{:.2}", price.value()),
            final_amount: board
                .final_amount_preview()
                .unwrap_or(price)
                .display_rm(),
        }
    }
}

/// Job board page template.
#[derive(Template, WebTemplate)]
#[template(path = "technician/board.html")]
pub struct BoardTemplate {
    pub nav: Nav,
    pub technician: String,
    pub orders: Vec<OrderOption>,
    pub selected: Option<SelectedOrder>,
    pub form: CompletionForm,
    pub message: Option<FlashView>,
    /// Customer follow-up links opened by the browser after a completion.
    pub deep_links: Vec<DeepLink>,
}

impl BoardTemplate {
    fn new(
        principal: &Principal,
        board: &JobBoard,
        settings: &NotificationConfig,
        deep_links: Vec<DeepLink>,
    ) -> Self {
        Self {
            nav: Nav::from_principal(principal),
            technician: board.technician.as_str().to_string(),
            orders: board
                .orders
                .iter()
                .map(|order| OrderOption {
                    id: order.id,
                    customer: order.customer.clone(),
                    address: order.address.clone(),
                    price: order.price_amount().display_rm(),
                    service: order.service.clone(),
                    selected: board.selected == Some(order.id),
                })
                .collect(),
            selected: board
                .selected_order()
                .map(|order| SelectedOrder::new(order, board, settings)),
            form: board.form.clone(),
            message: board.message.as_ref().map(FlashView::from),
            deep_links,
        }
    }
}

/// Selection form data.
#[derive(Debug, Deserialize)]
pub struct SelectForm {
    #[serde(default)]
    pub order_id: String,
}

// =============================================================================
// Session Helpers
// =============================================================================

async fn store_board(session: &Session, board: &JobBoard) {
    if let Err(e) = session.insert(session_keys::JOB_BOARD, board).await {
        tracing::warn!(error = %e, "Failed to store job board in session");
    }
}

/// The board opened by this technician, if it is still in the session.
async fn session_board(session: &Session, principal: &Principal) -> Option<JobBoard> {
    let board = match session.get::<JobBoard>(session_keys::JOB_BOARD).await {
        Ok(board) => board?,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read job board from session");
            return None;
        }
    };
    (board.technician == principal.technician_key()).then_some(board)
}

// =============================================================================
// Routes
// =============================================================================

/// Display the job board, fetching the technician's active orders.
pub async fn board(
    RequireTechnician(technician): RequireTechnician,
    State(state): State<AppState>,
    session: Session,
) -> impl IntoResponse {
    let board = completion::load_board(state.orders(), technician.technician_key()).await;
    store_board(&session, &board).await;

    BoardTemplate::new(&technician, &board, state.notifications(), Vec::new())
}

/// Select an order on the board.
pub async fn select(
    RequireTechnician(technician): RequireTechnician,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SelectForm>,
) -> Response {
    let Some(mut board) = session_board(&session, &technician).await else {
        return Redirect::to("/technician").into_response();
    };

    board.select(form.order_id.trim().parse::<OrderId>().ok());
    store_board(&session, &board).await;

    BoardTemplate::new(&technician, &board, state.notifications(), Vec::new()).into_response()
}

/// Complete the selected order.
pub async fn complete(
    RequireTechnician(technician): RequireTechnician,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CompletionForm>,
) -> Response {
    let Some(mut board) = session_board(&session, &technician).await else {
        return Redirect::to("/technician").into_response();
    };

    let result = completion::complete_selected(
        &mut board,
        form,
        state.orders(),
        state.notifier(),
        state.notifications(),
        Utc::now(),
    )
    .await;
    store_board(&session, &board).await;

    let deep_links = match result {
        Ok(outcome) => {
            let order_id = outcome.order_id.to_string();
            add_breadcrumb("order", "Job completed", Some(&[("order_id", order_id.as_str())]));
            outcome.deep_links
        }
        Err(e) => {
            if matches!(e, completion::CompletionError::Repository(_)) {
                tracing::error!(error = %e, "Failed to complete job");
            }
            Vec::new()
        }
    };

    BoardTemplate::new(&technician, &board, state.notifications(), deep_links).into_response()
}
