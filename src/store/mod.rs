//! Persistence for users, products and carts.
//!
//! Services talk to a [`Store`] handle constructed once at startup and shared
//! behind an `Arc`. [`PgStore`] is the production backend; [`MemoryStore`]
//! keeps everything in process and backs the test-suite and local demos.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Cart, Product, ProductWithCreator, User};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email is already registered")]
    DuplicateEmail,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Catalog filter. A flag set to `true` keeps only products with that flag set;
/// `false` does not filter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub featured: bool,
    pub trending: bool,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        (!self.featured || product.featured) && (!self.trending || product.trending)
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Whether the backing database currently answers.
    async fn ping(&self) -> bool;

    /// Releases connections. The handle must not be used afterwards.
    async fn close(&self);

    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Products matching `filter`, creators joined in, newest first.
    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<ProductWithCreator>, StoreError>;
    async fn find_product(&self, id: Uuid) -> Result<Option<ProductWithCreator>, StoreError>;
    /// Fetches whichever of `ids` still exist. Missing ids are skipped.
    async fn find_products(&self, ids: &[Uuid]) -> Result<Vec<Product>, StoreError>;
    async fn count_products(&self) -> Result<i64, StoreError>;
    async fn insert_product(&self, product: &Product) -> Result<(), StoreError>;
    /// Returns `false` when the product no longer exists.
    async fn update_product(&self, product: &Product) -> Result<bool, StoreError>;
    /// Returns `false` when there was nothing to delete.
    async fn delete_product(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn find_cart(&self, user_id: Uuid) -> Result<Option<Cart>, StoreError>;
    /// Stores `cart` unless the user already owns one, then returns the user's cart.
    async fn create_cart(&self, cart: &Cart) -> Result<Cart, StoreError>;
    /// Writes the whole cart document, creating it if needed.
    async fn save_cart(&self, cart: &Cart) -> Result<(), StoreError>;
}
