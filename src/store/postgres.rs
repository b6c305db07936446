//! PostgreSQL backend.
//!
//! Carts are stored one row per user with the line items in a JSONB column, so
//! every cart mutation is a single document write.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use uuid::Uuid;

use super::{ProductFilter, Store, StoreError};
use crate::domain::{Cart, CartItem, Creator, ImageRef, Price, Product, ProductWithCreator, Role, User};

const PRODUCT_COLUMNS: &str = "p.id, p.name, p.price, p.description, p.category, p.image, p.stock, \
     p.featured, p.trending, p.created_by, p.created_at, p.updated_at, \
     u.name AS creator_name, u.email AS creator_email";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connects, applies pending migrations and checks the connection answers.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        tracing::info!("connected to postgres");
        Ok(Self { pool })
    }
}

#[derive(sqlx::FromRow)]
struct UserRow { id: Uuid, name: String, email: String, password_hash: String, role: String, created_at: DateTime<Utc> }

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let role: Role = r.role.parse().map_err(|e| StoreError::Corrupt(format!("user {}: {e}", r.id)))?;
        Ok(User { id: r.id, name: r.name, email: r.email, password_hash: r.password_hash, role, created_at: r.created_at })
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    price: Decimal,
    description: String,
    category: String,
    image: String,
    stock: i32,
    featured: bool,
    trending: bool,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    creator_name: Option<String>,
    creator_email: Option<String>,
}

impl TryFrom<ProductRow> for ProductWithCreator {
    type Error = StoreError;

    fn try_from(r: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(r.price).map_err(|e| StoreError::Corrupt(format!("product {}: {e}", r.id)))?;
        let creator = match (r.creator_name, r.creator_email) {
            (Some(name), Some(email)) => Some(Creator { id: r.created_by, name, email }),
            _ => None,
        };
        let product = Product {
            id: r.id, name: r.name, price, description: r.description, category: r.category,
            image: ImageRef::new(r.image), stock: r.stock, featured: r.featured, trending: r.trending,
            created_by: r.created_by, created_at: r.created_at, updated_at: r.updated_at,
        };
        Ok(ProductWithCreator { product, creator })
    }
}

#[derive(sqlx::FromRow)]
struct CartRow { id: Uuid, user_id: Uuid, items: Json<Vec<CartItem>>, created_at: DateTime<Utc>, updated_at: DateTime<Utc> }

impl From<CartRow> for Cart {
    fn from(r: CartRow) -> Self { Cart::restore(r.id, r.user_id, r.items.0, r.created_at, r.updated_at) }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error().map(|db| db.is_unique_violation()).unwrap_or(false)
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO users (id, name, email, password_hash, role, created_at) VALUES ($1, $2, $3, $4, $5, $6)")
            .bind(user.id).bind(&user.name).bind(&user.email).bind(&user.password_hash)
            .bind(user.role.as_str()).bind(user.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| if is_unique_violation(&e) { StoreError::DuplicateEmail } else { e.into() })?;
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
            .bind(email).fetch_optional(&self.pool).await?
            .map(User::try_from).transpose()
    }

    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<ProductWithCreator>, StoreError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p LEFT JOIN users u ON u.id = p.created_by \
             WHERE ($1 = FALSE OR p.featured) AND ($2 = FALSE OR p.trending) \
             ORDER BY p.created_at DESC"
        );
        sqlx::query_as::<_, ProductRow>(&sql)
            .bind(filter.featured).bind(filter.trending)
            .fetch_all(&self.pool).await?
            .into_iter().map(ProductWithCreator::try_from).collect()
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<ProductWithCreator>, StoreError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products p LEFT JOIN users u ON u.id = p.created_by WHERE p.id = $1");
        sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id).fetch_optional(&self.pool).await?
            .map(ProductWithCreator::try_from).transpose()
    }

    async fn find_products(&self, ids: &[Uuid]) -> Result<Vec<Product>, StoreError> {
        if ids.is_empty() { return Ok(vec![]); }
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products p LEFT JOIN users u ON u.id = p.created_by WHERE p.id = ANY($1)");
        sqlx::query_as::<_, ProductRow>(&sql)
            .bind(ids.to_vec()).fetch_all(&self.pool).await?
            .into_iter()
            .map(|row| ProductWithCreator::try_from(row).map(|p| p.product))
            .collect()
    }

    async fn count_products(&self) -> Result<i64, StoreError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products").fetch_one(&self.pool).await?;
        Ok(count.0)
    }

    async fn insert_product(&self, p: &Product) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO products (id, name, price, description, category, image, stock, featured, trending, created_by, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)")
            .bind(p.id).bind(&p.name).bind(p.price.amount()).bind(&p.description).bind(&p.category)
            .bind(p.image.as_str()).bind(p.stock).bind(p.featured).bind(p.trending)
            .bind(p.created_by).bind(p.created_at).bind(p.updated_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn update_product(&self, p: &Product) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE products SET name = $2, price = $3, description = $4, category = $5, image = $6, stock = $7, featured = $8, trending = $9, updated_at = $10 WHERE id = $1")
            .bind(p.id).bind(&p.name).bind(p.price.amount()).bind(&p.description).bind(&p.category)
            .bind(p.image.as_str()).bind(p.stock).bind(p.featured).bind(p.trending).bind(p.updated_at)
            .execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_cart(&self, user_id: Uuid) -> Result<Option<Cart>, StoreError> {
        let row = sqlx::query_as::<_, CartRow>("SELECT * FROM carts WHERE user_id = $1")
            .bind(user_id).fetch_optional(&self.pool).await?;
        Ok(row.map(Cart::from))
    }

    async fn create_cart(&self, cart: &Cart) -> Result<Cart, StoreError> {
        sqlx::query("INSERT INTO carts (id, user_id, items, created_at, updated_at) VALUES ($1, $2, $3, $4, $5) ON CONFLICT (user_id) DO NOTHING")
            .bind(cart.id()).bind(cart.user_id()).bind(Json(cart.items()))
            .bind(cart.created_at()).bind(cart.updated_at())
            .execute(&self.pool).await?;
        self.find_cart(cart.user_id()).await?
            .ok_or_else(|| StoreError::Corrupt(format!("cart for user {} vanished after insert", cart.user_id())))
    }

    async fn save_cart(&self, cart: &Cart) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO carts (id, user_id, items, created_at, updated_at) VALUES ($1, $2, $3, $4, $5) ON CONFLICT (user_id) DO UPDATE SET items = EXCLUDED.items, updated_at = EXCLUDED.updated_at")
            .bind(cart.id()).bind(cart.user_id()).bind(Json(cart.items()))
            .bind(cart.created_at()).bind(cart.updated_at())
            .execute(&self.pool).await?;
        Ok(())
    }
}
