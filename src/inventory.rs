//! Per-location inventory join.
//!
//! One batched lookup for the whole product set, overlay-or-drop semantics,
//! and fallback to the location-agnostic list when the lookup fails: a stock
//! outage must degrade the catalog, never block it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::client::CatalogBackend;
use crate::domain::catalog::{CatalogProduct, StockStatus};

/// Stock and pricing override for one (product, location) pair. Ephemeral:
/// recomputed on every location change, never stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationInventoryRecord {
    pub product_id: u64,
    pub location_id: String,
    pub quantity: u32,
    pub price: Option<Decimal>,
}

/// Scopes `products` to `location_id`.
///
/// A product with a record for the location gets its quantity and any price
/// override applied; a product without one is dropped from the result — it is
/// not carried at that location, which is different from being out of stock.
/// If the bulk lookup itself fails, the unmodified input is returned.
pub async fn resolve_for_location(
    backend: &dyn CatalogBackend,
    products: Vec<CatalogProduct>,
    location_id: &str,
) -> Vec<CatalogProduct> {
    if products.is_empty() {
        return products;
    }

    let ids: Vec<u64> = products.iter().map(|p| p.id).collect();
    let by_product = match backend.fetch_inventory(&ids, location_id).await {
        Ok(map) => map,
        Err(err) => {
            warn!(
                location_id,
                error = %err,
                "bulk inventory lookup failed; serving location-agnostic catalog"
            );
            return products;
        }
    };

    let mut scoped = Vec::with_capacity(products.len());
    for mut product in products {
        let record = by_product
            .get(&product.id)
            .and_then(|records| records.iter().find(|r| r.location_id == location_id));
        match record {
            Some(record) => {
                product.stock_quantity = Some(record.quantity);
                product.stock_status = if record.quantity > 0 {
                    StockStatus::InStock
                } else {
                    StockStatus::OutOfStock
                };
                if let Some(price) = record.price {
                    product.price = price;
                }
                scoped.push(product);
            }
            None => {
                debug!(product_id = product.id, location_id, "product not carried at location");
            }
        }
    }
    scoped
}
