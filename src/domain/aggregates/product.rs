//! Product Aggregate

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::value_objects::{ImageRef, Price, Role};

#[derive(Clone, Debug, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: Price,
    pub description: String,
    pub category: String,
    pub image: ImageRef,
    pub stock: i32,
    pub featured: bool,
    pub trending: bool,
    /// Owning user. Set once at creation.
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated fields for a new product.
#[derive(Clone, Debug, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub price: Price,
    pub description: String,
    pub category: String,
    pub stock: i32,
    pub featured: bool,
    pub trending: bool,
}

/// Partial update. `None` leaves the field untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<Price>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub stock: Option<i32>,
    pub featured: Option<bool>,
    pub trending: Option<bool>,
}

/// Public profile of the user who created a product.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Creator {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// A product together with its creator, as returned by catalog reads.
/// `creator` is `None` when the owning account cannot be found.
#[derive(Clone, Debug, PartialEq)]
pub struct ProductWithCreator {
    pub product: Product,
    pub creator: Option<Creator>,
}

impl Product {
    pub fn create(new: NewProduct, image: ImageRef, created_by: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(), name: new.name, price: new.price, description: new.description,
            category: new.category, image, stock: new.stock, featured: new.featured,
            trending: new.trending, created_by, created_at: now, updated_at: now,
        }
    }

    /// Applies the supplied fields. The image is replaced only when a new one was uploaded.
    pub fn apply(&mut self, patch: ProductPatch, image: Option<ImageRef>) {
        if let Some(name) = patch.name { self.name = name; }
        if let Some(price) = patch.price { self.price = price; }
        if let Some(description) = patch.description { self.description = description; }
        if let Some(category) = patch.category { self.category = category; }
        if let Some(stock) = patch.stock { self.stock = stock; }
        if let Some(featured) = patch.featured { self.featured = featured; }
        if let Some(trending) = patch.trending { self.trending = trending; }
        if let Some(image) = image { self.image = image; }
        self.touch();
    }

    /// Admins may modify any product; everyone else only the products they created.
    pub fn can_be_modified_by(&self, user_id: Uuid, role: Role) -> bool {
        match role {
            Role::Admin => true,
            Role::User => self.created_by == user_id,
        }
    }

    pub fn ensure_modifiable_by(&self, user_id: Uuid, role: Role) -> Result<(), ProductError> {
        if self.can_be_modified_by(user_id, role) { Ok(()) } else { Err(ProductError::NotOwner) }
    }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum ProductError { NotOwner }
impl std::error::Error for ProductError {}
impl std::fmt::Display for ProductError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self { Self::NotOwner => write!(f, "You can only modify your own products") }
    }
}
