//! Product catalog: reads are public; writes are gated on role and ownership.

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::Identity;
use crate::domain::{ImageRef, NewProduct, Product, ProductPatch, ProductWithCreator};
use crate::error::{AppError, Result};
use crate::store::{ProductFilter, Store};
use crate::uploads::{ImageUpload, UploadStore};

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn Store>,
    uploads: UploadStore,
}

fn not_found() -> AppError { AppError::NotFound("Product not found".to_string()) }

impl CatalogService {
    pub fn new(store: Arc<dyn Store>, uploads: UploadStore) -> Self { Self { store, uploads } }

    pub async fn list(&self, filter: ProductFilter) -> Result<Vec<ProductWithCreator>> {
        Ok(self.store.list_products(filter).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<ProductWithCreator> {
        self.store.find_product(id).await?.ok_or_else(not_found)
    }

    /// Callers must have passed the admin gate. The product is owned by `actor`.
    pub async fn create(&self, new: NewProduct, image: Option<ImageUpload>, actor: &Identity) -> Result<ProductWithCreator> {
        let (image, uploaded) = match image {
            Some(upload) => {
                let saved = self.uploads.save(&upload).await?;
                (saved.clone(), Some(saved))
            }
            None => (ImageRef::placeholder(), None),
        };
        let product = Product::create(new, image, actor.user_id);
        if let Err(e) = self.store.insert_product(&product).await {
            self.discard(uploaded.as_ref()).await;
            return Err(e.into());
        }
        tracing::info!(product_id = %product.id, created_by = %actor.user_id, "product created");
        self.store.find_product(product.id).await?
            .ok_or_else(|| AppError::Internal(format!("product {} missing right after insert", product.id)))
    }

    /// The product, if it exists and `actor` may modify it. Admins may modify
    /// anything; other callers only products they created. Existence is checked first.
    pub async fn editable(&self, id: Uuid, actor: &Identity) -> Result<Product> {
        let product = self.get(id).await?.product;
        product.ensure_modifiable_by(actor.user_id, actor.role)?;
        Ok(product)
    }

    pub async fn update(&self, id: Uuid, patch: ProductPatch, image: Option<ImageUpload>, actor: &Identity) -> Result<ProductWithCreator> {
        let mut product = self.editable(id, actor).await?;

        let uploaded = match image {
            Some(upload) => Some(self.uploads.save(&upload).await?),
            None => None,
        };
        product.apply(patch, uploaded.clone());
        match self.store.update_product(&product).await {
            Ok(true) => {}
            // Deleted between the lookup and the write.
            Ok(false) => {
                self.discard(uploaded.as_ref()).await;
                return Err(not_found());
            }
            Err(e) => {
                self.discard(uploaded.as_ref()).await;
                return Err(e.into());
            }
        }
        tracing::info!(product_id = %id, actor = %actor.user_id, "product updated");
        self.get(id).await
    }

    /// Same authorization rule as [`update`](Self::update). Cart lines pointing at the
    /// product are left in place.
    pub async fn delete(&self, id: Uuid, actor: &Identity) -> Result<()> {
        self.editable(id, actor).await?;
        if !self.store.delete_product(id).await? {
            return Err(not_found());
        }
        tracing::info!(product_id = %id, actor = %actor.user_id, "product deleted");
        Ok(())
    }

    async fn discard(&self, uploaded: Option<&ImageRef>) {
        if let Some(image) = uploaded {
            self.uploads.discard(image).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Cart, Price, Role, User};
    use crate::store::{MemoryStore, StoreError};
    use axum::body::Bytes;
    use axum::http::StatusCode;
    use rust_decimal::Decimal;

    struct Fixture {
        catalog: CatalogService,
        admin: Identity,
        owner: Identity,
        stranger: Identity,
    }

    async fn identity(store: &Arc<dyn Store>, name: &str, role: Role) -> Identity {
        let user = User::with_role(name, format!("{name}@example.com"), "h".into(), role);
        store.insert_user(&user).await.unwrap();
        Identity { user_id: user.id, email: user.email, role }
    }

    async fn fixture() -> Fixture {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let uploads = UploadStore::new(std::env::temp_dir().join(format!("catalog-test-{}", Uuid::new_v4())));
        Fixture {
            admin: identity(&store, "admin", Role::Admin).await,
            owner: identity(&store, "owner", Role::User).await,
            stranger: identity(&store, "stranger", Role::User).await,
            catalog: CatalogService::new(store, uploads),
        }
    }

    fn new_product(featured: bool) -> NewProduct {
        NewProduct {
            name: "Headphones".into(), price: Price::new(Decimal::new(7999, 2)).unwrap(),
            description: "Noise cancelling".into(), category: "Electronics".into(),
            stock: 5, featured, trending: false,
        }
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let f = fixture().await;
        let created = f.catalog.create(new_product(true), None, &f.owner).await.unwrap();
        let fetched = f.catalog.get(created.product.id).await.unwrap();
        assert_eq!(created, fetched);
        assert_eq!(fetched.product.image, ImageRef::placeholder());
        assert_eq!(fetched.creator.map(|c| c.email), Some("owner@example.com".to_string()));
    }

    #[tokio::test]
    async fn test_create_with_upload_stores_image_path() {
        let f = fixture().await;
        let upload = ImageUpload::new("a.png", Some("image/png"), Bytes::from_static(b"png")).unwrap();
        let created = f.catalog.create(new_product(false), Some(upload), &f.admin).await.unwrap();
        assert!(created.product.image.as_str().starts_with("/uploads/image-"));
    }

    #[tokio::test]
    async fn test_update_requires_admin_or_creator() {
        let f = fixture().await;
        let id = f.catalog.create(new_product(false), None, &f.owner).await.unwrap().product.id;
        let patch = ProductPatch { stock: Some(1), ..Default::default() };

        let err = f.catalog.update(id, patch.clone(), None, &f.stranger).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        let updated = f.catalog.update(id, patch.clone(), None, &f.owner).await.unwrap();
        assert_eq!(updated.product.stock, 1);
        assert_eq!(updated.product.created_by, f.owner.user_id);

        let updated = f.catalog.update(id, ProductPatch { featured: Some(true), ..Default::default() }, None, &f.admin).await.unwrap();
        assert!(updated.product.featured);
        assert_eq!(updated.product.stock, 1);
    }

    #[tokio::test]
    async fn test_delete_rules() {
        let f = fixture().await;
        let id = f.catalog.create(new_product(false), None, &f.owner).await.unwrap().product.id;

        assert_eq!(f.catalog.delete(id, &f.stranger).await.unwrap_err().status(), StatusCode::FORBIDDEN);
        f.catalog.delete(id, &f.admin).await.unwrap();
        assert_eq!(f.catalog.delete(id, &f.admin).await.unwrap_err().status(), StatusCode::NOT_FOUND);
        assert_eq!(f.catalog.get(id).await.unwrap_err().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_product_is_not_found_before_ownership() {
        let f = fixture().await;
        let err = f.catalog.update(Uuid::new_v4(), ProductPatch::default(), None, &f.stranger).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_filters_featured() {
        let f = fixture().await;
        let plain = f.catalog.create(new_product(false), None, &f.admin).await.unwrap();
        let featured = f.catalog.create(new_product(true), None, &f.admin).await.unwrap();

        let listed = f.catalog.list(ProductFilter { featured: true, trending: false }).await.unwrap();
        let ids: Vec<Uuid> = listed.iter().map(|p| p.product.id).collect();
        assert_eq!(ids, vec![featured.product.id]);

        let all = f.catalog.list(ProductFilter::default()).await.unwrap();
        let ids: Vec<Uuid> = all.iter().map(|p| p.product.id).collect();
        assert_eq!(ids, vec![featured.product.id, plain.product.id]);
    }

    /// Loses every product between the ownership check and the write.
    struct VanishingStore(MemoryStore);

    #[async_trait::async_trait]
    impl Store for VanishingStore {
        async fn ping(&self) -> bool { self.0.ping().await }
        async fn close(&self) { self.0.close().await }
        async fn insert_user(&self, user: &User) -> std::result::Result<(), StoreError> { self.0.insert_user(user).await }
        async fn find_user_by_email(&self, email: &str) -> std::result::Result<Option<User>, StoreError> {
            self.0.find_user_by_email(email).await
        }
        async fn list_products(&self, filter: ProductFilter) -> std::result::Result<Vec<ProductWithCreator>, StoreError> {
            self.0.list_products(filter).await
        }
        async fn find_product(&self, id: Uuid) -> std::result::Result<Option<ProductWithCreator>, StoreError> {
            self.0.find_product(id).await
        }
        async fn find_products(&self, ids: &[Uuid]) -> std::result::Result<Vec<Product>, StoreError> { self.0.find_products(ids).await }
        async fn count_products(&self) -> std::result::Result<i64, StoreError> { self.0.count_products().await }
        async fn insert_product(&self, product: &Product) -> std::result::Result<(), StoreError> { self.0.insert_product(product).await }
        async fn update_product(&self, product: &Product) -> std::result::Result<bool, StoreError> {
            self.0.delete_product(product.id).await?;
            self.0.update_product(product).await
        }
        async fn delete_product(&self, id: Uuid) -> std::result::Result<bool, StoreError> { self.0.delete_product(id).await }
        async fn find_cart(&self, user_id: Uuid) -> std::result::Result<Option<Cart>, StoreError> { self.0.find_cart(user_id).await }
        async fn create_cart(&self, cart: &Cart) -> std::result::Result<Cart, StoreError> { self.0.create_cart(cart).await }
        async fn save_cart(&self, cart: &Cart) -> std::result::Result<(), StoreError> { self.0.save_cart(cart).await }
    }

    #[tokio::test]
    async fn test_update_of_vanished_product_leaves_no_upload_behind() {
        let store: Arc<dyn Store> = Arc::new(VanishingStore(MemoryStore::new()));
        let dir = std::env::temp_dir().join(format!("catalog-test-{}", Uuid::new_v4()));
        let catalog = CatalogService::new(store.clone(), UploadStore::new(&dir));
        let admin = identity(&store, "admin", Role::Admin).await;
        let id = catalog.create(new_product(false), None, &admin).await.unwrap().product.id;

        let upload = ImageUpload::new("b.png", Some("image/png"), Bytes::from_static(b"png")).unwrap();
        let err = catalog.update(id, ProductPatch::default(), Some(upload), &admin).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
