//! Catalog snapshot types fetched from the remote commerce backend.
//!
//! Products are read-only snapshots: never mutated locally (the location
//! inventory join produces new copies) and superseded by the next fetch.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    OutOfStock,
    OnBackorder,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    #[default]
    Simple,
    Variable,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: u64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub src: String,
    pub alt: Option<String>,
}

/// A variable attribute: name plus its ordered option list. An empty option
/// list means the attribute carries the implicit `"default"` option.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDef {
    pub name: String,
    pub options: Vec<String>,
}

/// Arbitrary key/value extensibility channel (potency, strain type, ...).
/// Passed through opaquely; never interpreted by the pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetaEntry {
    pub key: String,
    pub value: serde_json::Value,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub regular_price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
    pub stock_status: StockStatus,
    pub stock_quantity: Option<u32>,
    /// Ordered; the first entry is the primary category.
    pub categories: Vec<CategoryRef>,
    pub images: Vec<ImageRef>,
    pub attributes: Vec<AttributeDef>,
    pub meta_data: Vec<MetaEntry>,
    pub kind: ProductKind,
    pub variation_ids: Vec<u64>,
}

impl CatalogProduct {
    pub fn primary_category(&self) -> Option<&CategoryRef> {
        self.categories.first()
    }

    pub fn is_variable(&self) -> bool {
        self.kind == ProductKind::Variable
    }

    pub fn is_in_stock(&self) -> bool {
        self.stock_status == StockStatus::InStock
    }

    /// Attribute names a full selection must cover, in catalog order.
    pub fn variable_attribute_names(&self) -> Vec<&str> {
        self.attributes.iter().map(|a| a.name.as_str()).collect()
    }
}

/// One attribute-option pair on a variation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationOption {
    pub name: String,
    pub option: String,
}

/// Belongs to a [`CatalogProduct`] (weak reference by product id); carries
/// exactly one option per variable attribute, plus its own price.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Variation {
    pub id: u64,
    pub product_id: u64,
    pub options: Vec<VariationOption>,
    pub price: Decimal,
}

impl Variation {
    pub fn option_for(&self, attribute: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.name == attribute)
            .map(|o| o.option.as_str())
    }
}

/// Catalog query filter. [`ProductFilter::cache_key`] is its stable
/// serialization and the cache's key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub per_page: Option<u32>,
    pub category: Option<u64>,
    pub search: Option<String>,
    /// Publish-status constraint, e.g. `publish`.
    pub status: Option<String>,
}

impl ProductFilter {
    /// Field order is fixed so equal filters always produce equal keys.
    pub fn cache_key(&self) -> String {
        format!(
            "per_page={}&category={}&search={}&status={}",
            self.per_page.map_or(String::from("-"), |v| v.to_string()),
            self.category.map_or(String::from("-"), |v| v.to_string()),
            self.search.as_deref().unwrap_or("-"),
            self.status.as_deref().unwrap_or("-"),
        )
    }

    /// Query parameters for the remote `GET /products` call.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(per_page) = self.per_page {
            pairs.push(("per_page", per_page.to_string()));
        }
        if let Some(category) = self.category {
            pairs.push(("category", category.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(status) = &self.status {
            pairs.push(("status", status.clone()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> CatalogProduct {
        CatalogProduct {
            id: 7,
            name: "Gummies".into(),
            description: String::new(),
            price: Decimal::new(1500, 2),
            regular_price: None,
            sale_price: None,
            stock_status: StockStatus::InStock,
            stock_quantity: None,
            categories: vec![
                CategoryRef { id: 1, name: "Edibles".into() },
                CategoryRef { id: 2, name: "Specials".into() },
            ],
            images: vec![],
            attributes: vec![AttributeDef { name: "flavor".into(), options: vec!["og".into()] }],
            meta_data: vec![],
            kind: ProductKind::Variable,
            variation_ids: vec![70, 71],
        }
    }

    #[test]
    fn test_primary_category_is_first() {
        assert_eq!(product().primary_category().unwrap().name, "Edibles");
    }

    #[test]
    fn test_cache_key_stable_and_distinct() {
        let a = ProductFilter { per_page: Some(20), search: Some("gum".into()), ..Default::default() };
        let b = ProductFilter { per_page: Some(20), search: Some("gum".into()), ..Default::default() };
        let c = ProductFilter { per_page: Some(20), ..Default::default() };
        assert_eq!(a.cache_key(), b.cache_key());
        assert_ne!(a.cache_key(), c.cache_key());
    }

    #[test]
    fn test_query_pairs_skip_unset_fields() {
        let f = ProductFilter { category: Some(9), ..Default::default() };
        assert_eq!(f.query_pairs(), vec![("category", "9".to_string())]);
    }
}
