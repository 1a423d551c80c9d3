//! Order assembly and the checkout submission state machine.
//!
//! `Draft -> Submitting -> {Confirmed | Failed}`. One submission per
//! user-initiated checkout action, no implicit retries. `Confirmed` clears
//! the cart as its single side effect; `Failed` leaves all client state
//! untouched so the user can fix input and try again.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::client::CatalogBackend;
use crate::domain::cart::Cart;
use crate::domain::catalog::MetaEntry;
use crate::domain::value_objects::round_display;
use crate::tax::TaxSummary;
use crate::{CheckoutError, Result};

/// Pass-through provenance attached to the order as opaque metadata;
/// nothing in this pipeline interprets these fields.
#[derive(Clone, Debug, Default)]
pub struct LocationContext {
    pub location_id: String,
    pub terminal: Option<String>,
    pub device: Option<String>,
    pub cashier: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: u64,
    pub variation_id: Option<u64>,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total: Decimal,
}

/// Immutable once submitted. Line totals are `unit_price * quantity` using
/// the cart's frozen prices — never re-resolved from the catalog.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderPayload {
    /// Client-generated reference; gives a future server-side idempotency
    /// check a key, since submission is never auto-retried here.
    pub client_reference: Uuid,
    pub customer_id: Option<u64>,
    pub currency: String,
    pub line_items: Vec<OrderLine>,
    pub subtotal: Decimal,
    pub tax_total: Decimal,
    pub total: Decimal,
    pub meta_data: Vec<MetaEntry>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct OrderConfirmation {
    /// Remote-assigned order identifier.
    pub id: u64,
    pub status: String,
}

/// Builds the submission payload from the cart, provenance, and computed tax.
pub fn build_order(
    cart: &Cart,
    customer_id: Option<u64>,
    location: &LocationContext,
    tax: &TaxSummary,
) -> Result<OrderPayload> {
    if cart.is_empty() {
        return Err(CheckoutError::Validation("cart is empty".into()));
    }

    let line_items: Vec<OrderLine> = cart
        .lines()
        .iter()
        .map(|l| OrderLine {
            product_id: l.product_id(),
            variation_id: l.variation_id(),
            name: l.name().to_string(),
            quantity: l.quantity(),
            unit_price: round_display(l.unit_price().amount()),
            total: round_display(l.line_total().amount()),
        })
        .collect();

    let subtotal = cart.subtotal().amount();

    let mut meta_data = vec![MetaEntry {
        key: "pos_location_id".into(),
        value: location.location_id.clone().into(),
    }];
    if let Some(terminal) = &location.terminal {
        meta_data.push(MetaEntry { key: "pos_terminal".into(), value: terminal.clone().into() });
    }
    if let Some(device) = &location.device {
        meta_data.push(MetaEntry { key: "pos_device".into(), value: device.clone().into() });
    }
    if let Some(cashier) = &location.cashier {
        meta_data.push(MetaEntry { key: "pos_cashier".into(), value: cashier.clone().into() });
    }
    // Full breakdown travels with the order for downstream reconciliation.
    meta_data.push(MetaEntry {
        key: "tax_breakdown".into(),
        value: serde_json::to_value(&tax.breakdown).unwrap_or_default(),
    });

    Ok(OrderPayload {
        client_reference: Uuid::new_v4(),
        customer_id,
        currency: cart.currency().to_string(),
        line_items,
        subtotal: round_display(subtotal),
        tax_total: tax.rounded_total(),
        total: round_display(subtotal + tax.total_tax),
        meta_data,
        created_at: Utc::now(),
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OrderState {
    Draft,
    Submitting,
    Confirmed { order_id: u64 },
    Failed { message: String },
}

/// Tracks one checkout attempt. Submission is allowed from `Draft` and
/// (retrying after an error) `Failed`; callers must disable the checkout
/// action while `Submitting` — there is no engine-level lock against firing
/// the same cart twice concurrently.
#[derive(Debug)]
pub struct CheckoutSession {
    state: OrderState,
}

impl Default for CheckoutSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckoutSession {
    pub fn new() -> Self {
        Self { state: OrderState::Draft }
    }

    pub fn state(&self) -> &OrderState {
        &self.state
    }

    pub fn can_submit(&self) -> bool {
        matches!(self.state, OrderState::Draft | OrderState::Failed { .. })
    }

    /// Submits exactly once. Success clears the cart; failure preserves it
    /// and records the remote message.
    pub async fn submit(
        &mut self,
        backend: &dyn CatalogBackend,
        cart: &mut Cart,
        payload: OrderPayload,
    ) -> Result<OrderConfirmation> {
        match self.state {
            OrderState::Submitting => {
                return Err(CheckoutError::Validation("submission already in progress".into()));
            }
            OrderState::Confirmed { .. } => {
                return Err(CheckoutError::Validation("order already confirmed".into()));
            }
            _ => {}
        }

        self.state = OrderState::Submitting;
        match backend.submit_order(&payload).await {
            Ok(confirmation) => {
                info!(order_id = confirmation.id, total = %payload.total, "order confirmed");
                self.state = OrderState::Confirmed { order_id: confirmation.id };
                cart.clear();
                Ok(confirmation)
            }
            Err(err) => {
                let err = match err {
                    e @ CheckoutError::Submission(_) => e,
                    other => CheckoutError::Submission(other.to_string()),
                };
                warn!(error = %err, "order submission failed; cart preserved");
                self.state = OrderState::Failed { message: err.to_string() };
                Err(err)
            }
        }
    }
}
