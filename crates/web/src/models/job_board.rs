//! Technician job board.
//!
//! The board is the technician's working view: the active orders fetched when
//! the page was opened, the order being closed out, the completion form, and
//! the last message shown. It lives in the session between the select and
//! complete actions so neither of them re-fetches the list.

use serde::{Deserialize, Serialize};

use sejuk_core::{Amount, OrderId, Username};

use super::Order;

/// Message shown above the board or form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub text: String,
}

/// Flash message tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlashKind {
    Success,
    Error,
    Info,
}

impl Flash {
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Info,
            text: text.into(),
        }
    }

    /// CSS modifier used by the templates.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self.kind {
            FlashKind::Success => "flash-success",
            FlashKind::Error => "flash-error",
            FlashKind::Info => "flash-info",
        }
    }
}

/// Completion form fields as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionForm {
    #[serde(default)]
    pub work_done: String,
    #[serde(default)]
    pub extra_charges: String,
    #[serde(default)]
    pub remarks: String,
}

/// Session-held technician view state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobBoard {
    /// Username the orders were fetched for.
    pub technician: Username,
    /// Active orders, in the order the store returned them.
    pub orders: Vec<Order>,
    pub selected: Option<OrderId>,
    pub form: CompletionForm,
    pub message: Option<Flash>,
}

impl JobBoard {
    /// Board for a freshly fetched list of active orders.
    #[must_use]
    pub fn new(technician: Username, orders: Vec<Order>) -> Self {
        let message = orders
            .is_empty()
            .then(|| Flash::info("No pending jobs assigned to you."));
        Self {
            technician,
            orders,
            selected: None,
            form: CompletionForm::default(),
            message,
        }
    }

    /// Empty board shown when the order fetch failed.
    #[must_use]
    pub fn fetch_failed(technician: Username) -> Self {
        Self {
            technician,
            orders: Vec::new(),
            selected: None,
            form: CompletionForm::default(),
            message: Some(Flash::error("Failed to fetch orders.")),
        }
    }

    /// Select an order to close out, resetting the form and message.
    ///
    /// An id that is not on the board clears the selection.
    pub fn select(&mut self, id: Option<OrderId>) {
        self.selected = id.filter(|id| self.orders.iter().any(|o| o.id == *id));
        self.form = CompletionForm::default();
        self.message = None;
    }

    /// The selected order, if it is still on the board.
    #[must_use]
    pub fn selected_order(&self) -> Option<&Order> {
        let id = self.selected?;
        self.orders.iter().find(|o| o.id == id)
    }

    /// Final amount the current form would produce for the selected order.
    ///
    /// `None` without a selection or when the sum is out of range.
    #[must_use]
    pub fn final_amount_preview(&self) -> Option<Amount> {
        self.selected_order().and_then(|order| {
            order
                .price_amount()
                .checked_add(Amount::coerce_non_negative(&self.form.extra_charges))
        })
    }

    /// Drop a completed order and reset the form.
    pub fn finish(&mut self, id: OrderId, message: Flash) {
        self.orders.retain(|o| o.id != id);
        self.selected = None;
        self.form = CompletionForm::default();
        self.message = Some(message);
    }
}
