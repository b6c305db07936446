//! Storefront domain model: accounts, catalog products and carts.
pub mod aggregates;
pub mod value_objects;

pub use aggregates::*;
pub use value_objects::{ImageRef, Price, PriceError, Role};
