//! Admin order intake route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tower_sessions::Session;

use super::{FlashView, Nav};
use crate::error::add_breadcrumb;
use crate::middleware::RequireAdmin;
use crate::models::{Flash, session_keys};
use crate::services::intake::{self, OrderForm, TechnicianDirectory};
use crate::state::AppState;

const ORDER_SUBMITTED: &str = "Order submitted!";

/// Order form page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/order_form.html")]
pub struct OrderFormTemplate {
    pub nav: Nav,
    pub form: OrderForm,
    /// Technician usernames for the select, sorted.
    pub technicians: Vec<String>,
    pub message: Option<FlashView>,
}

impl OrderFormTemplate {
    fn new(
        nav: Nav,
        form: OrderForm,
        technicians: &TechnicianDirectory,
        message: Option<Flash>,
    ) -> Self {
        Self {
            nav,
            form,
            technicians: technicians.keys().cloned().collect(),
            message: message.as_ref().map(FlashView::from),
        }
    }
}

/// Fetch the technician list, empty when the directory is unavailable.
async fn load_technicians(state: &AppState) -> TechnicianDirectory {
    match intake::fetch_technicians(state.directory()).await {
        Ok(technicians) => technicians,
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch technicians");
            TechnicianDirectory::new()
        }
    }
}

/// Technician list held in the session, fetched once when absent.
async fn session_technicians(state: &AppState, session: &Session) -> TechnicianDirectory {
    match session
        .get::<TechnicianDirectory>(session_keys::TECHNICIAN_DIRECTORY)
        .await
    {
        Ok(Some(technicians)) => return technicians,
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "Failed to read technician list from session"),
    }

    let technicians = load_technicians(state).await;
    remember_technicians(session, &technicians).await;
    technicians
}

async fn remember_technicians(session: &Session, technicians: &TechnicianDirectory) {
    if let Err(e) = session
        .insert(session_keys::TECHNICIAN_DIRECTORY, technicians)
        .await
    {
        tracing::warn!(error = %e, "Failed to store technician list in session");
    }
}

/// Display the order form.
///
/// Opening the form refreshes the technician list.
pub async fn order_form(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
) -> impl IntoResponse {
    let technicians = load_technicians(&state).await;
    remember_technicians(&session, &technicians).await;

    OrderFormTemplate::new(
        Nav::from_principal(&admin),
        OrderForm::default(),
        &technicians,
        None,
    )
}

/// Handle order form submission.
pub async fn submit(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<OrderForm>,
) -> Response {
    let technicians = session_technicians(&state, &session).await;
    let nav = Nav::from_principal(&admin);

    let result = intake::submit_order(
        state.orders(),
        state.notifier(),
        state.notifications(),
        &technicians,
        &form,
        Some(admin.user.id),
        Utc::now(),
    )
    .await;

    match result {
        // The notice task runs on without the request.
        Ok(outcome) => {
            let order_id = outcome.order_id.to_string();
            add_breadcrumb(
                "order",
                "Order submitted",
                Some(&[
                    ("order_id", order_id.as_str()),
                    ("technician", form.technician.as_str()),
                ]),
            );
            OrderFormTemplate::new(
                nav,
                OrderForm::default(),
                &technicians,
                Some(Flash::success(ORDER_SUBMITTED)),
            )
            .into_response()
        }
        Err(e) => {
            if matches!(e, intake::IntakeError::Repository(_)) {
                tracing::error!(error = %e, "Failed to submit order");
            }
            OrderFormTemplate::new(nav, form, &technicians, Some(Flash::error(e.to_string())))
                .into_response()
        }
    }
}
