//! Response bodies. Image references are resolved to absolute URLs here and
//! nowhere else.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Creator, Product, ProductWithCreator};
use crate::services::{ResolvedCart, ResolvedLine};

#[derive(Debug, Clone, Serialize)]
pub struct CreatorView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&Creator> for CreatorView {
    fn from(c: &Creator) -> Self { Self { id: c.id, name: c.name.clone(), email: c.email.clone() } }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub description: String,
    pub category: String,
    pub image: String,
    pub stock: i32,
    pub featured: bool,
    pub trending: bool,
    pub created_by: Uuid,
    /// Joined creator profile; absent on cart lines and for unknown accounts.
    pub creator: Option<CreatorView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductView {
    pub fn new(p: &Product, creator: Option<&Creator>, base_url: &str) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            price: p.price.amount(),
            description: p.description.clone(),
            category: p.category.clone(),
            image: p.image.resolve(base_url),
            stock: p.stock,
            featured: p.featured,
            trending: p.trending,
            created_by: p.created_by,
            creator: creator.map(CreatorView::from),
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }

    pub fn joined(p: &ProductWithCreator, base_url: &str) -> Self {
        Self::new(&p.product, p.creator.as_ref(), base_url)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    pub product_id: Uuid,
    /// `null` when the product has been deleted since it was added.
    pub product: Option<ProductView>,
    pub quantity: u32,
}

impl CartLineView {
    fn new(line: &ResolvedLine, base_url: &str) -> Self {
        Self {
            product_id: line.item.product_id,
            product: line.product.as_ref().map(|p| ProductView::new(p, None, base_url)),
            quantity: line.item.quantity,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub id: Uuid,
    pub user: Uuid,
    pub items: Vec<CartLineView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartView {
    pub fn new(resolved: &ResolvedCart, base_url: &str) -> Self {
        Self {
            id: resolved.cart.id(),
            user: resolved.cart.user_id(),
            items: resolved.lines.iter().map(|l| CartLineView::new(l, base_url)).collect(),
            created_at: resolved.cart.created_at(),
            updated_at: resolved.cart.updated_at(),
        }
    }
}
