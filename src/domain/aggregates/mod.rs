//! Aggregates module
pub mod cart;
pub mod product;
pub mod user;

pub use cart::{Cart, CartError, CartItem};
pub use product::{Creator, NewProduct, Product, ProductError, ProductPatch, ProductWithCreator};
pub use user::{normalize_email, User};
