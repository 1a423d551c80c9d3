//! Short-TTL catalog cache.
//!
//! Keyed by [`ProductFilter::cache_key`]; the handful of distinct filter
//! combinations in practice keeps the map small, so TTL is the only eviction
//! policy. Entries are idempotent snapshots, so a racing put that overwrites
//! a fresher entry with a staler one is acceptable (last write wins).
//!
//! [`ProductFilter::cache_key`]: crate::domain::catalog::ProductFilter::cache_key

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::domain::catalog::CatalogProduct;

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Expired entries are kept (not purged on read) so the engine can serve
/// them stale, with a warning, when a refresh fails transiently.
#[derive(Clone, Debug)]
pub enum CacheLookup {
    Fresh(Vec<CatalogProduct>),
    Stale(Vec<CatalogProduct>),
    Miss,
}

struct Entry {
    stored_at: Instant,
    products: Vec<CatalogProduct>,
}

pub struct CatalogCache {
    ttl: Duration,
    // Never held across an await point.
    entries: Mutex<HashMap<String, Entry>>,
}

impl CatalogCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: Mutex::new(HashMap::new()) }
    }

    pub fn with_default_ttl() -> Self {
        Self::new(DEFAULT_TTL)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &str) -> CacheLookup {
        let entries = self.entries.lock().expect("cache mutex poisoned");
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                debug!(key, "catalog cache hit");
                CacheLookup::Fresh(entry.products.clone())
            }
            Some(entry) => {
                debug!(key, "catalog cache entry expired");
                CacheLookup::Stale(entry.products.clone())
            }
            None => {
                debug!(key, "catalog cache miss");
                CacheLookup::Miss
            }
        }
    }

    pub fn put(&self, key: &str, products: Vec<CatalogProduct>) {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.insert(key.to_string(), Entry { stored_at: Instant::now(), products });
    }
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::with_default_ttl()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{ProductKind, StockStatus};
    use rust_decimal::Decimal;

    fn product(id: u64) -> CatalogProduct {
        CatalogProduct {
            id,
            name: format!("P{id}"),
            description: String::new(),
            price: Decimal::new(1000, 2),
            regular_price: None,
            sale_price: None,
            stock_status: StockStatus::InStock,
            stock_quantity: None,
            categories: vec![],
            images: vec![],
            attributes: vec![],
            meta_data: vec![],
            kind: ProductKind::Simple,
            variation_ids: vec![],
        }
    }

    #[test]
    fn test_fresh_hit_within_ttl() {
        let cache = CatalogCache::new(Duration::from_secs(60));
        cache.put("k", vec![product(1)]);
        match cache.get("k") {
            CacheLookup::Fresh(products) => assert_eq!(products[0].id, 1),
            other => panic!("expected fresh hit, got {other:?}"),
        }
    }

    #[test]
    fn test_expired_entry_reported_stale() {
        let cache = CatalogCache::new(Duration::ZERO);
        cache.put("k", vec![product(2)]);
        match cache.get("k") {
            CacheLookup::Stale(products) => assert_eq!(products[0].id, 2),
            other => panic!("expected stale, got {other:?}"),
        }
    }

    #[test]
    fn test_miss_for_unknown_key() {
        let cache = CatalogCache::with_default_ttl();
        assert!(matches!(cache.get("nope"), CacheLookup::Miss));
    }

    #[test]
    fn test_last_write_wins() {
        let cache = CatalogCache::new(Duration::from_secs(60));
        cache.put("k", vec![product(1)]);
        cache.put("k", vec![product(9)]);
        match cache.get("k") {
            CacheLookup::Fresh(products) => assert_eq!(products[0].id, 9),
            other => panic!("expected fresh hit, got {other:?}"),
        }
    }
}
