//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::auth::TokenKeys;
use crate::config::Config;
use crate::services::{AccountService, CartService, CatalogService};
use crate::store::Store;
use crate::uploads::UploadStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn Store>,
    pub tokens: Arc<TokenKeys>,
    pub uploads: UploadStore,
    pub accounts: AccountService,
    pub catalog: CatalogService,
    pub carts: CartService,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Store>) -> Self {
        let tokens = Arc::new(TokenKeys::new(config.jwt_secret.as_bytes(), config.jwt_ttl_hours));
        let uploads = UploadStore::new(config.upload_dir.clone());
        Self {
            accounts: AccountService::new(store.clone(), tokens.clone()),
            catalog: CatalogService::new(store.clone(), uploads.clone()),
            carts: CartService::new(store.clone()),
            config: Arc::new(config),
            store,
            tokens,
            uploads,
        }
    }
}
