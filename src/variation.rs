//! Deterministic variation and price resolution.
//!
//! No price is shown until the customer has chosen every variable attribute;
//! a partial selection never matches. When malformed data lets several
//! variations satisfy the selection, the first in catalog order wins — a
//! documented deterministic fallback, not silent corruption.

use rust_decimal::Decimal;
use tracing::debug;

use crate::domain::catalog::{CatalogProduct, Variation};
use crate::domain::value_objects::Selection;

/// Implicit option synthesized for attributes with no explicit option list
/// (e.g. a flavorless product), so one matching algorithm covers everything.
pub const DEFAULT_OPTION: &str = "default";

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedVariation {
    pub variation_id: u64,
    pub price: Decimal,
}

/// Fills in [`DEFAULT_OPTION`] for every attribute the product defines
/// without explicit options, leaving chosen facets untouched.
pub fn fill_implicit_defaults(product: &CatalogProduct, selection: &Selection) -> Selection {
    let mut filled = selection.clone();
    for attr in &product.attributes {
        if attr.options.is_empty() && filled.get(&attr.name).is_none() {
            filled.set(attr.name.clone(), DEFAULT_OPTION);
        }
    }
    filled
}

/// Resolves `selection` against the product's variation set.
///
/// Returns `None` unless the selection names exactly the product's variable
/// attributes and some variation matches every chosen option.
pub fn resolve(
    product: &CatalogProduct,
    variations: &[Variation],
    selection: &Selection,
) -> Option<ResolvedVariation> {
    let required = product.variable_attribute_names();
    if required.is_empty() || selection.len() != required.len() {
        return None;
    }
    if required.iter().any(|name| selection.get(name).is_none()) {
        return None;
    }

    let matched: Vec<&Variation> = variations
        .iter()
        .filter(|v| matches_selection(product, v, &required, selection))
        .collect();
    if matched.len() > 1 {
        debug!(
            product_id = product.id,
            candidates = matched.len(),
            "multiple variations match selection; using first in catalog order"
        );
    }
    matched.first().map(|v| ResolvedVariation { variation_id: v.id, price: v.price })
}

fn matches_selection(
    product: &CatalogProduct,
    variation: &Variation,
    required: &[&str],
    selection: &Selection,
) -> bool {
    required.iter().all(|name| {
        let chosen = match selection.get(name) {
            Some(chosen) => chosen,
            None => return false,
        };
        match effective_option(product, variation, name) {
            Some(offered) => offered == chosen,
            None => false,
        }
    })
}

/// The option a variation offers for `name`, synthesizing the implicit
/// default when the product's attribute has no explicit options.
fn effective_option<'a>(
    product: &'a CatalogProduct,
    variation: &'a Variation,
    name: &str,
) -> Option<&'a str> {
    match variation.option_for(name) {
        Some(option) if !option.is_empty() => Some(option),
        _ => {
            let def = product.attributes.iter().find(|a| a.name == name)?;
            if def.options.is_empty() {
                Some(DEFAULT_OPTION)
            } else {
                None
            }
        }
    }
}
