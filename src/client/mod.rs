//! Remote commerce backend access.
//!
//! All network traffic goes through the [`CatalogBackend`] trait so the rest
//! of the pipeline (and every test) can run against an in-memory fake;
//! [`http::HttpCatalogClient`] is the single production implementation.

pub mod http;

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::catalog::{CatalogProduct, ProductFilter, Variation};
use crate::domain::order::{OrderConfirmation, OrderPayload};
use crate::inventory::LocationInventoryRecord;
use crate::tax::TaxRate;
use crate::{CheckoutError, Result};

pub use http::HttpCatalogClient;

/// The remote catalog/order store, consumed as opaque HTTP/JSON.
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    async fn fetch_products(&self, filter: &ProductFilter) -> Result<Vec<CatalogProduct>>;

    async fn fetch_variations(&self, product_id: u64) -> Result<Vec<Variation>>;

    /// One batched lookup for the whole id set — never per-product calls.
    /// Returns product id -> per-location records.
    async fn fetch_inventory(
        &self,
        product_ids: &[u64],
        location_id: &str,
    ) -> Result<HashMap<u64, Vec<LocationInventoryRecord>>>;

    /// The location's ordered rate pipeline.
    async fn fetch_tax_rates(&self, location_id: &str) -> Result<Vec<TaxRate>>;

    /// Single attempt; the checkout state machine owns retry policy here.
    async fn submit_order(&self, payload: &OrderPayload) -> Result<OrderConfirmation>;
}

/// Bounded exponential backoff: the base delay doubles after each failed
/// attempt, up to `max_attempts` total tries.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay: Duration::from_millis(250) }
    }
}

impl RetryPolicy {
    /// Delay before the attempt following `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// Runs `op` until success, a non-retryable error, or the attempt ceiling.
///
/// 4xx (`ClientRequest`) surfaces immediately; 5xx/transport failures retry
/// with doubling delay; after exhaustion the last transient error is raised
/// with its final attempt count.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                debug!(
                    label,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient failure; retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(CheckoutError::TransientNetwork { message, .. }) => {
                return Err(CheckoutError::TransientNetwork { attempts: attempt, message });
            }
            Err(err) => return Err(err),
        }
    }
}

/// Connection settings for the production HTTP client. Credentials, when
/// present, are sent as query parameters on every request.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            consumer_key: None,
            consumer_secret: None,
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_credentials(mut self, key: impl Into<String>, secret: impl Into<String>) -> Self {
        self.consumer_key = Some(key.into());
        self.consumer_secret = Some(secret.into());
        self
    }

    /// Reads `POS_BACKEND_URL` (required), `POS_CONSUMER_KEY`, and
    /// `POS_CONSUMER_SECRET`. Do not log the credentials.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("POS_BACKEND_URL")
            .map_err(|_| CheckoutError::Validation("POS_BACKEND_URL is not set".into()))?;
        let mut config = Self::new(base_url);
        config.consumer_key = std::env::var("POS_CONSUMER_KEY").ok();
        config.consumer_secret = std::env::var("POS_CONSUMER_SECRET").ok();
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy { max_attempts, base_delay: Duration::ZERO }
    }

    fn transient(message: &str) -> CheckoutError {
        CheckoutError::TransientNetwork { attempts: 1, message: message.into() }
    }

    #[tokio::test]
    async fn test_retry_hits_exact_ceiling_on_persistent_503() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry(&instant_policy(4), "products", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(transient("HTTP 503: unavailable")) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        match result {
            Err(CheckoutError::TransientNetwork { attempts, .. }) => assert_eq!(attempts, 4),
            other => panic!("expected TransientNetwork, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_404_is_never_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry(&instant_policy(5), "products", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(CheckoutError::ClientRequest { status: 404, message: "not found".into() })
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(CheckoutError::ClientRequest { status: 404, .. })));
    }

    #[tokio::test]
    async fn test_success_after_transient_failure() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&instant_policy(3), "products", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(transient("reset"))
                } else {
                    Ok(7u32)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let policy = RetryPolicy { max_attempts: 4, base_delay: Duration::from_millis(250) };
        assert_eq!(policy.delay_for(1), Duration::from_millis(250));
        assert_eq!(policy.delay_for(2), Duration::from_millis(500));
        assert_eq!(policy.delay_for(3), Duration::from_millis(1000));
    }
}
