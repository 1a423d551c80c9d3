//! Domain model for the checkout pipeline.

pub mod cart;
pub mod catalog;
pub mod order;
pub mod value_objects;

pub use cart::{Cart, CartError, CartLine};
pub use catalog::{CatalogProduct, ProductFilter, ProductKind, StockStatus, Variation};
pub use order::{CheckoutSession, LocationContext, OrderConfirmation, OrderPayload, OrderState};
pub use value_objects::{Money, MoneyError, Selection};
