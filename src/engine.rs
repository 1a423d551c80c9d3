//! Storefront facade — the API the UI layer consumes.
//!
//! Wires cache, client, inventory join, variation pricing, tax, and order
//! assembly. Each call is an independent async operation on its own copy of
//! the data; the only cross-call state is the catalog cache.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::warn;

use crate::cache::{CacheLookup, CatalogCache};
use crate::client::CatalogBackend;
use crate::domain::cart::Cart;
use crate::domain::catalog::{CatalogProduct, ProductFilter, ProductKind};
use crate::domain::order::{build_order, CheckoutSession, LocationContext, OrderConfirmation};
use crate::domain::value_objects::Selection;
use crate::inventory;
use crate::tax::{compute_tax, TaxSummary};
use crate::variation;
use crate::{CheckoutError, Result};

/// A price the UI may show: resolved once, then frozen into the cart line.
#[derive(Clone, Debug, PartialEq)]
pub struct QuotedPrice {
    pub price: Decimal,
    pub variation_id: Option<u64>,
}

#[derive(Clone, Debug, Default)]
pub struct CheckoutRequest {
    pub customer_id: Option<u64>,
    pub location: LocationContext,
    /// Cash received, when paying cash; validated against the order total
    /// before submission.
    pub tendered: Option<Decimal>,
}

pub struct Storefront {
    backend: Arc<dyn CatalogBackend>,
    cache: CatalogCache,
}

impl Storefront {
    pub fn new(backend: Arc<dyn CatalogBackend>) -> Self {
        Self { backend, cache: CatalogCache::with_default_ttl() }
    }

    pub fn with_cache(backend: Arc<dyn CatalogBackend>, cache: CatalogCache) -> Self {
        Self { backend, cache }
    }

    /// Cache → client → location join.
    ///
    /// A fresh cache entry short-circuits the network entirely. When the
    /// remote refresh fails transiently and an expired snapshot exists, the
    /// stale snapshot is served with a warning — reduced fidelity over an
    /// outage. The inventory join applies only when a location is given and
    /// degrades independently (see [`inventory::resolve_for_location`]).
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
        location_id: Option<&str>,
    ) -> Result<Vec<CatalogProduct>> {
        let key = filter.cache_key();
        let products = match self.cache.get(&key) {
            CacheLookup::Fresh(products) => products,
            CacheLookup::Stale(stale) => match self.refresh(filter, &key).await {
                Ok(products) => products,
                Err(err) if err.is_retryable() => {
                    warn!(%key, error = %err, "catalog refresh failed; serving stale snapshot");
                    stale
                }
                Err(err) => return Err(err),
            },
            CacheLookup::Miss => self.refresh(filter, &key).await?,
        };

        match location_id {
            Some(location_id) => {
                Ok(inventory::resolve_for_location(self.backend.as_ref(), products, location_id)
                    .await)
            }
            None => Ok(products),
        }
    }

    async fn refresh(&self, filter: &ProductFilter, key: &str) -> Result<Vec<CatalogProduct>> {
        let products = self.backend.fetch_products(filter).await?;
        self.cache.put(key, products.clone());
        Ok(products)
    }

    /// `None` until every required facet is chosen (spec'd UI contract:
    /// no price shown for an incomplete selection).
    pub async fn price_for(
        &self,
        product: &CatalogProduct,
        selection: &Selection,
    ) -> Result<Option<QuotedPrice>> {
        if product.kind == ProductKind::Simple {
            return Ok(Some(QuotedPrice { price: product.price, variation_id: None }));
        }
        let variations = self.backend.fetch_variations(product.id).await?;
        let filled = variation::fill_implicit_defaults(product, selection);
        Ok(variation::resolve(product, &variations, &filled)
            .map(|r| QuotedPrice { price: r.price, variation_id: Some(r.variation_id) }))
    }

    /// Tax for `subtotal` at a location. Infallible by design: when the rate
    /// lookup is unavailable the engine charges zero tax and logs the
    /// degradation rather than blocking checkout.
    pub async fn tax_for(&self, location_id: &str, subtotal: Decimal) -> TaxSummary {
        match self.backend.fetch_tax_rates(location_id).await {
            Ok(rates) => compute_tax(subtotal, &rates),
            Err(err) => {
                warn!(location_id, error = %err, "tax rate lookup failed; charging zero tax");
                TaxSummary::default()
            }
        }
    }

    /// Validates, computes tax, assembles the payload from the cart's frozen
    /// prices, and submits exactly once. Success clears the cart; any failure
    /// leaves it intact for the user to retry.
    pub async fn checkout(
        &self,
        cart: &mut Cart,
        request: &CheckoutRequest,
    ) -> Result<OrderConfirmation> {
        if cart.is_empty() {
            return Err(CheckoutError::Validation("cart is empty".into()));
        }

        let subtotal = cart.subtotal().amount();
        let tax = self.tax_for(&request.location.location_id, subtotal).await;
        let payload = build_order(cart, request.customer_id, &request.location, &tax)?;

        if let Some(tendered) = request.tendered {
            if tendered < payload.total {
                return Err(CheckoutError::Validation(format!(
                    "cash tendered {tendered} is less than order total {}",
                    payload.total
                )));
            }
        }

        let mut session = CheckoutSession::new();
        session.submit(self.backend.as_ref(), cart, payload).await
    }
}
