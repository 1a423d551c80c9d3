//! reqwest-backed implementation of [`CatalogBackend`].
//!
//! Wire DTOs keep prices as decimal strings (the backend's format) and are
//! normalized into domain types at this boundary — no floats anywhere.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{with_retry, CatalogBackend, ClientConfig};
use crate::domain::catalog::{
    AttributeDef, CatalogProduct, CategoryRef, ImageRef, MetaEntry, ProductFilter, ProductKind,
    StockStatus, Variation, VariationOption,
};
use crate::domain::order::{OrderConfirmation, OrderPayload};
use crate::inventory::LocationInventoryRecord;
use crate::tax::{RateKind, TaxRate};
use crate::{CheckoutError, Result};

pub struct HttpCatalogClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl HttpCatalogClient {
    pub fn new(config: ClientConfig) -> Self {
        Self { http: reqwest::Client::new(), config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn auth_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(key) = &self.config.consumer_key {
            pairs.push(("consumer_key", key.clone()));
        }
        if let Some(secret) = &self.config.consumer_secret {
            pairs.push(("consumer_secret", secret.clone()));
        }
        pairs
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let resp = self
            .http
            .get(self.url(path))
            .timeout(self.config.timeout)
            .query(query)
            .query(&self.auth_pairs())
            .send()
            .await
            .map_err(map_transport)?;
        decode(resp).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let resp = self
            .http
            .post(self.url(path))
            .timeout(self.config.timeout)
            .query(&self.auth_pairs())
            .json(body)
            .send()
            .await
            .map_err(map_transport)?;
        decode(resp).await
    }
}

#[async_trait]
impl CatalogBackend for HttpCatalogClient {
    async fn fetch_products(&self, filter: &ProductFilter) -> Result<Vec<CatalogProduct>> {
        let query = filter.query_pairs();
        let dtos: Vec<ProductDto> = with_retry(&self.config.retry, "fetch_products", || {
            self.get_json("/products", &query)
        })
        .await?;
        dtos.into_iter().map(ProductDto::into_domain).collect()
    }

    async fn fetch_variations(&self, product_id: u64) -> Result<Vec<Variation>> {
        let path = format!("/products/{product_id}/variations");
        let dtos: Vec<VariationDto> = with_retry(&self.config.retry, "fetch_variations", || {
            self.get_json(&path, &[])
        })
        .await?;
        dtos.into_iter().map(|d| d.into_domain(product_id)).collect()
    }

    async fn fetch_inventory(
        &self,
        product_ids: &[u64],
        location_id: &str,
    ) -> Result<HashMap<u64, Vec<LocationInventoryRecord>>> {
        let body = BulkInventoryRequest { product_ids, location_id };
        // POST in shape, idempotent read in behavior; safe to retry.
        let raw: HashMap<String, Vec<InventoryDto>> =
            with_retry(&self.config.retry, "fetch_inventory", || {
                self.post_json("/inventory/bulk", &body)
            })
            .await?;

        let mut out = HashMap::with_capacity(raw.len());
        for (product_id, records) in raw {
            let product_id: u64 = product_id
                .parse()
                .map_err(|_| malformed(format!("non-numeric product id '{product_id}'")))?;
            let records = records
                .into_iter()
                .map(|d| d.into_domain(product_id))
                .collect::<Result<Vec<_>>>()?;
            out.insert(product_id, records);
        }
        Ok(out)
    }

    async fn fetch_tax_rates(&self, location_id: &str) -> Result<Vec<TaxRate>> {
        let path = format!("/location/{location_id}/tax-rates");
        let dto: TaxRatesResponse = with_retry(&self.config.retry, "fetch_tax_rates", || {
            self.get_json(&path, &[])
        })
        .await?;
        dto.tax_rates.into_iter().map(TaxRateDto::into_domain).collect()
    }

    async fn submit_order(&self, payload: &OrderPayload) -> Result<OrderConfirmation> {
        // Exactly one attempt: an automatic retry could duplicate the order.
        self.post_json("/orders", payload).await.map_err(|err| match err {
            CheckoutError::ClientRequest { status, message } => {
                CheckoutError::Submission(format!("rejected (HTTP {status}): {message}"))
            }
            other => CheckoutError::Submission(other.to_string()),
        })
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status().as_u16();
    if (200..300).contains(&status) {
        resp.json()
            .await
            .map_err(|e| malformed(format!("response decode failed: {e}")))
    } else {
        let body = resp.text().await.unwrap_or_default();
        let message: String = body.trim().chars().take(200).collect();
        Err(classify_status(status, message))
    }
}

/// 4xx is terminal; everything else (5xx, odd 1xx/3xx leftovers) is treated
/// as transient and retried by the caller.
fn classify_status(status: u16, message: String) -> CheckoutError {
    if (400..500).contains(&status) {
        CheckoutError::ClientRequest { status, message }
    } else {
        CheckoutError::TransientNetwork { attempts: 1, message: format!("HTTP {status}: {message}") }
    }
}

fn map_transport(err: reqwest::Error) -> CheckoutError {
    CheckoutError::TransientNetwork { attempts: 1, message: err.to_string() }
}

fn malformed(message: String) -> CheckoutError {
    // Body didn't match the contract; not retryable, so it rides the 4xx arm.
    CheckoutError::ClientRequest { status: 200, message: format!("malformed response: {message}") }
}

fn parse_price(raw: &str) -> Result<Decimal> {
    if raw.is_empty() {
        return Ok(Decimal::ZERO);
    }
    raw.parse()
        .map_err(|_| malformed(format!("unparseable price '{raw}'")))
}

fn parse_optional_price(raw: Option<String>) -> Result<Option<Decimal>> {
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => Ok(Some(parse_price(s)?)),
    }
}

// =============================================================================
// Wire DTOs
// =============================================================================

#[derive(Serialize)]
struct BulkInventoryRequest<'a> {
    product_ids: &'a [u64],
    location_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ProductDto {
    id: u64,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    price: String,
    #[serde(default)]
    regular_price: Option<String>,
    #[serde(default)]
    sale_price: Option<String>,
    #[serde(default)]
    stock_status: String,
    #[serde(default)]
    stock_quantity: Option<i64>,
    #[serde(default)]
    categories: Vec<CategoryDto>,
    #[serde(default)]
    images: Vec<ImageDto>,
    #[serde(default)]
    attributes: Vec<AttributeDto>,
    #[serde(default)]
    meta_data: Vec<MetaDto>,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    variations: Vec<u64>,
}

impl ProductDto {
    fn into_domain(self) -> Result<CatalogProduct> {
        Ok(CatalogProduct {
            id: self.id,
            name: self.name,
            description: self.description,
            price: parse_price(&self.price)?,
            regular_price: parse_optional_price(self.regular_price)?,
            sale_price: parse_optional_price(self.sale_price)?,
            stock_status: match self.stock_status.as_str() {
                "instock" => StockStatus::InStock,
                "onbackorder" => StockStatus::OnBackorder,
                _ => StockStatus::OutOfStock,
            },
            stock_quantity: self.stock_quantity.map(|q| q.max(0) as u32),
            categories: self
                .categories
                .into_iter()
                .map(|c| CategoryRef { id: c.id, name: c.name })
                .collect(),
            images: self
                .images
                .into_iter()
                .map(|i| ImageRef { src: i.src, alt: i.alt })
                .collect(),
            attributes: self
                .attributes
                .into_iter()
                .map(|a| AttributeDef { name: a.name, options: a.options })
                .collect(),
            meta_data: self
                .meta_data
                .into_iter()
                .map(|m| MetaEntry { key: m.key, value: m.value })
                .collect(),
            kind: match self.kind.as_str() {
                "variable" => ProductKind::Variable,
                _ => ProductKind::Simple,
            },
            variation_ids: self.variations,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CategoryDto {
    id: u64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ImageDto {
    src: String,
    #[serde(default)]
    alt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AttributeDto {
    name: String,
    #[serde(default)]
    options: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MetaDto {
    key: String,
    #[serde(default)]
    value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct VariationDto {
    id: u64,
    #[serde(default)]
    attributes: Vec<VariationAttributeDto>,
    #[serde(default)]
    price: String,
}

#[derive(Debug, Deserialize)]
struct VariationAttributeDto {
    name: String,
    #[serde(default)]
    option: String,
}

impl VariationDto {
    fn into_domain(self, product_id: u64) -> Result<Variation> {
        Ok(Variation {
            id: self.id,
            product_id,
            options: self
                .attributes
                .into_iter()
                .map(|a| VariationOption { name: a.name, option: a.option })
                .collect(),
            price: parse_price(&self.price)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct InventoryDto {
    location_id: String,
    quantity: i64,
    #[serde(default)]
    price: Option<String>,
}

impl InventoryDto {
    fn into_domain(self, product_id: u64) -> Result<LocationInventoryRecord> {
        Ok(LocationInventoryRecord {
            product_id,
            location_id: self.location_id,
            quantity: self.quantity.max(0) as u32,
            price: parse_optional_price(self.price)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TaxRatesResponse {
    #[serde(default)]
    tax_rates: Vec<TaxRateDto>,
}

#[derive(Debug, Deserialize)]
struct TaxRateDto {
    #[serde(default)]
    name: String,
    rate: String,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    compound: bool,
}

impl TaxRateDto {
    fn into_domain(self) -> Result<TaxRate> {
        Ok(TaxRate {
            name: if self.name.is_empty() { "Tax".into() } else { self.name },
            rate: self
                .rate
                .parse()
                .map_err(|_| malformed(format!("unparseable tax rate '{}'", self.rate)))?,
            kind: match self.kind.as_str() {
                "fixed" => RateKind::Fixed,
                _ => RateKind::Percentage,
            },
            compound: self.compound,
        })
    }
}

// -----------------
// Tests (no network)
// -----------------
