//! In-process backend. Nothing survives a restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ProductFilter, Store, StoreError};
use crate::domain::{Cart, Creator, Product, ProductWithCreator, User};

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    /// Insertion order, oldest first.
    products: Vec<Product>,
    /// Keyed by owning user.
    carts: HashMap<Uuid, Cart>,
}

impl Inner {
    fn with_creator(&self, product: &Product) -> ProductWithCreator {
        let creator = self.users.get(&product.created_by).map(|u| Creator {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
        });
        ProductWithCreator { product: product.clone(), creator }
    }
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> bool { true }

    async fn close(&self) {}

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<ProductWithCreator>, StoreError> {
        let inner = self.inner.read().await;
        // Walk newest-inserted first so equal timestamps still come out newest first after the stable sort.
        let mut found: Vec<ProductWithCreator> = inner.products.iter().rev()
            .filter(|p| filter.matches(p))
            .map(|p| inner.with_creator(p))
            .collect();
        found.sort_by(|a, b| b.product.created_at.cmp(&a.product.created_at));
        Ok(found)
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<ProductWithCreator>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.products.iter().find(|p| p.id == id).map(|p| inner.with_creator(p)))
    }

    async fn find_products(&self, ids: &[Uuid]) -> Result<Vec<Product>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.products.iter().filter(|p| ids.contains(&p.id)).cloned().collect())
    }

    async fn count_products(&self) -> Result<i64, StoreError> {
        Ok(self.inner.read().await.products.len() as i64)
    }

    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        self.inner.write().await.products.push(product.clone());
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.products.iter_mut().find(|p| p.id == product.id) {
            Some(slot) => {
                *slot = product.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.products.len();
        inner.products.retain(|p| p.id != id);
        Ok(inner.products.len() != before)
    }

    async fn find_cart(&self, user_id: Uuid) -> Result<Option<Cart>, StoreError> {
        Ok(self.inner.read().await.carts.get(&user_id).cloned())
    }

    async fn create_cart(&self, cart: &Cart) -> Result<Cart, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.carts.entry(cart.user_id()).or_insert_with(|| cart.clone()).clone())
    }

    async fn save_cart(&self, cart: &Cart) -> Result<(), StoreError> {
        self.inner.write().await.carts.insert(cart.user_id(), cart.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ImageRef, NewProduct, Price};
    use rust_decimal::Decimal;

    fn product(owner: Uuid, featured: bool) -> Product {
        Product::create(
            NewProduct {
                name: "Mug".into(), price: Price::new(Decimal::new(900, 2)).unwrap(), description: String::new(),
                category: "Kitchen".into(), stock: 3, featured, trending: false,
            },
            ImageRef::placeholder(),
            owner,
        )
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        store.insert_user(&User::register("A", "a@x.io", "h".into())).await.unwrap();
        let err = store.insert_user(&User::register("B", "a@x.io", "h".into())).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_filtered() {
        let store = MemoryStore::new();
        let owner = User::register("Owner", "o@x.io", "h".into());
        store.insert_user(&owner).await.unwrap();
        let first = product(owner.id, true);
        let second = product(owner.id, false);
        let third = product(owner.id, true);
        for p in [&first, &second, &third] {
            store.insert_product(p).await.unwrap();
        }

        let all = store.list_products(ProductFilter::default()).await.unwrap();
        let ids: Vec<Uuid> = all.iter().map(|p| p.product.id).collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);
        assert_eq!(all[0].creator.as_ref().map(|c| c.email.as_str()), Some("o@x.io"));

        let featured = store.list_products(ProductFilter { featured: true, trending: false }).await.unwrap();
        let ids: Vec<Uuid> = featured.iter().map(|p| p.product.id).collect();
        assert_eq!(ids, vec![third.id, first.id]);
    }

    #[tokio::test]
    async fn test_create_cart_keeps_existing() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let first = store.create_cart(&Cart::for_user(user)).await.unwrap();
        let second = store.create_cart(&Cart::for_user(user)).await.unwrap();
        assert_eq!(first.id(), second.id());
    }
}
