//! Per-user cart operations.
//!
//! Each mutation is a read-modify-write of the user's cart document. Two
//! concurrent requests from the same user can interleave; the last write wins.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Cart, CartError, CartItem, Product};
use crate::error::{AppError, Result};
use crate::store::Store;

/// A cart with each line's product looked up. `product` is `None` when the
/// product was deleted after it was added.
#[derive(Debug, Clone)]
pub struct ResolvedCart {
    pub cart: Cart,
    pub lines: Vec<ResolvedLine>,
}

#[derive(Debug, Clone)]
pub struct ResolvedLine {
    pub item: CartItem,
    pub product: Option<Product>,
}

#[derive(Clone)]
pub struct CartService {
    store: Arc<dyn Store>,
}

impl CartService {
    pub fn new(store: Arc<dyn Store>) -> Self { Self { store } }

    /// Returns the user's cart, creating an empty one the first time.
    pub async fn get(&self, user_id: Uuid) -> Result<ResolvedCart> {
        let cart = match self.store.find_cart(user_id).await? {
            Some(cart) => cart,
            None => {
                let cart = self.store.create_cart(&Cart::for_user(user_id)).await?;
                tracing::debug!(user_id = %user_id, cart_id = %cart.id(), "created cart on first read");
                cart
            }
        };
        self.resolve(cart).await
    }

    pub async fn add(&self, user_id: Uuid, product_id: Uuid, quantity: u32) -> Result<ResolvedCart> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity.into());
        }
        // Only new additions are checked; lines for since-deleted products stay put.
        if self.store.find_product(product_id).await?.is_none() {
            return Err(AppError::NotFound("Product not found".to_string()));
        }
        let mut cart = self.store.find_cart(user_id).await?.unwrap_or_else(|| Cart::for_user(user_id));
        cart.add_item(product_id, quantity)?;
        self.store.save_cart(&cart).await?;
        tracing::info!(user_id = %user_id, product_id = %product_id, quantity, "added to cart");
        self.resolve(cart).await
    }

    /// Sets a line's quantity; zero removes the line.
    pub async fn set_quantity(&self, user_id: Uuid, product_id: Uuid, quantity: u32) -> Result<ResolvedCart> {
        let mut cart = self.existing(user_id).await?;
        cart.set_quantity(product_id, quantity)?;
        self.store.save_cart(&cart).await?;
        self.resolve(cart).await
    }

    /// Removing a product that is not in the cart is not an error.
    pub async fn remove(&self, user_id: Uuid, product_id: Uuid) -> Result<ResolvedCart> {
        let mut cart = self.existing(user_id).await?;
        if cart.remove_item(product_id) {
            self.store.save_cart(&cart).await?;
        }
        self.resolve(cart).await
    }

    /// Empties the cart. Fails only when the user has no cart at all.
    pub async fn clear(&self, user_id: Uuid) -> Result<()> {
        let mut cart = self.existing(user_id).await?;
        cart.clear();
        self.store.save_cart(&cart).await?;
        Ok(())
    }

    async fn existing(&self, user_id: Uuid) -> Result<Cart> {
        self.store.find_cart(user_id).await?.ok_or_else(|| AppError::NotFound("Cart not found".to_string()))
    }

    async fn resolve(&self, cart: Cart) -> Result<ResolvedCart> {
        let ids: Vec<Uuid> = cart.items().iter().map(|i| i.product_id).collect();
        let products = self.store.find_products(&ids).await?;
        let lines = cart.items().iter()
            .map(|item| ResolvedLine {
                item: *item,
                product: products.iter().find(|p| p.id == item.product_id).cloned(),
            })
            .collect();
        Ok(ResolvedCart { cart, lines })
    }
}
