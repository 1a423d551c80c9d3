//! Point-of-Sale Checkout Resolution Engine
//!
//! Reconciles three independently sourced datasets — the remote product
//! catalog, per-location inventory, and a location's ordered tax-rate table —
//! into one consistent order submission.
//!
//! ## Pipeline
//! - Remote catalog fetch with bounded retry ([`client`])
//! - Short-TTL catalog cache ([`cache`])
//! - Batched per-location inventory join ([`inventory`])
//! - Deterministic variation pricing ([`variation`])
//! - Compound location tax ([`tax`])
//! - Order assembly and single-shot submission ([`domain::order`], [`engine`])
//!
//! The UI layer consumes everything through [`engine::Storefront`]; the remote
//! commerce backend is reached only through the [`client::CatalogBackend`]
//! trait so tests can substitute an in-memory fake.

pub mod cache;
pub mod client;
pub mod domain;
pub mod engine;
pub mod inventory;
pub mod tax;
pub mod variation;

use thiserror::Error;

// =============================================================================
// Error Taxonomy
// =============================================================================

#[derive(Error, Debug)]
pub enum CheckoutError {
    /// 5xx, timeout, connection reset. Retried internally up to the policy
    /// ceiling, then surfaced as a degraded-result signal.
    #[error("transient network failure after {attempts} attempt(s): {message}")]
    TransientNetwork { attempts: u32, message: String },

    /// 4xx or a malformed request/response. Never retried.
    #[error("request rejected (HTTP {status}): {message}")]
    ClientRequest { status: u16, message: String },

    /// Bulk inventory or tax lookup unavailable; the pipeline degrades
    /// instead of failing the whole request.
    #[error("partial data: {0}")]
    PartialData(String),

    /// Caught before submission: empty cart, insufficient cash tendered,
    /// invalid quantity or selection.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Remote rejected the order; the cart is preserved for retry.
    #[error("order submission failed: {0}")]
    Submission(String),
}

impl CheckoutError {
    /// Only transient network failures are safe to retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientNetwork { .. })
    }
}

pub type Result<T> = std::result::Result<T, CheckoutError>;

pub use cache::{CacheLookup, CatalogCache};
pub use client::{CatalogBackend, ClientConfig, HttpCatalogClient, RetryPolicy};
pub use domain::cart::{Cart, CartLine};
pub use domain::catalog::{CatalogProduct, ProductFilter, ProductKind, StockStatus, Variation};
pub use domain::order::{
    CheckoutSession, LocationContext, OrderConfirmation, OrderPayload, OrderState,
};
pub use domain::value_objects::{Money, Selection};
pub use engine::{CheckoutRequest, QuotedPrice, Storefront};
pub use inventory::LocationInventoryRecord;
pub use tax::{RateKind, TaxRate, TaxSummary};
