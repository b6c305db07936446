//! Cart Aggregate
//!
//! One cart per user. Line items are keyed by product: adding a product that is
//! already present merges quantities instead of appending a second line.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq)]
pub struct Cart {
    id: Uuid,
    user_id: Uuid,
    items: Vec<CartItem>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: Uuid,
    pub quantity: u32,
}

impl Cart {
    pub fn for_user(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self { id: Uuid::new_v4(), user_id, items: vec![], created_at: now, updated_at: now }
    }

    /// Rebuilds a cart loaded from storage.
    pub fn restore(id: Uuid, user_id: Uuid, items: Vec<CartItem>, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        Self { id, user_id, items, created_at, updated_at }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn user_id(&self) -> Uuid { self.user_id }
    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    pub fn quantity_of(&self, product_id: Uuid) -> Option<u32> {
        self.items.iter().find(|i| i.product_id == product_id).map(|i| i.quantity)
    }

    /// Adds `quantity` units of a product, merging into an existing line if there is one.
    /// There is no stock check and no upper bound beyond `u32`.
    pub fn add_item(&mut self, product_id: Uuid, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 { return Err(CartError::InvalidQuantity); }
        if let Some(existing) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            existing.quantity = existing.quantity.checked_add(quantity).ok_or(CartError::QuantityOverflow)?;
        } else {
            self.items.push(CartItem { product_id, quantity });
        }
        self.touch();
        Ok(())
    }

    /// Sets (not increments) the quantity of an existing line. Zero removes the line.
    pub fn set_quantity(&mut self, product_id: Uuid, quantity: u32) -> Result<(), CartError> {
        let item = self.items.iter_mut().find(|i| i.product_id == product_id).ok_or(CartError::ItemNotFound)?;
        if quantity == 0 { self.items.retain(|i| i.product_id != product_id); }
        else { item.quantity = quantity; }
        self.touch();
        Ok(())
    }

    /// Removes the line for a product. Returns whether anything was removed.
    pub fn remove_item(&mut self, product_id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        self.touch();
        self.items.len() != before
    }

    pub fn clear(&mut self) { self.items.clear(); self.touch(); }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartError { ItemNotFound, InvalidQuantity, QuantityOverflow }
impl std::error::Error for CartError {}
impl std::fmt::Display for CartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ItemNotFound => write!(f, "Item not found in cart"),
            Self::InvalidQuantity => write!(f, "Quantity must be a positive integer"),
            Self::QuantityOverflow => write!(f, "Quantity is too large"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_merges_quantities() {
        let p = Uuid::new_v4();
        let mut cart = Cart::for_user(Uuid::new_v4());
        cart.add_item(p, 1).unwrap();
        cart.add_item(p, 2).unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.quantity_of(p), Some(3));
    }

    #[test]
    fn test_add_rejects_zero_and_overflow() {
        let p = Uuid::new_v4();
        let mut cart = Cart::for_user(Uuid::new_v4());
        assert_eq!(cart.add_item(p, 0), Err(CartError::InvalidQuantity));
        cart.add_item(p, u32::MAX).unwrap();
        assert_eq!(cart.add_item(p, 1), Err(CartError::QuantityOverflow));
        assert_eq!(cart.quantity_of(p), Some(u32::MAX));
    }

    #[test]
    fn test_set_quantity() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut cart = Cart::for_user(Uuid::new_v4());
        cart.add_item(a, 4).unwrap();
        cart.add_item(b, 1).unwrap();

        cart.set_quantity(a, 2).unwrap();
        assert_eq!(cart.quantity_of(a), Some(2));

        cart.set_quantity(a, 0).unwrap();
        assert_eq!(cart.quantity_of(a), None);
        assert_eq!(cart.items().len(), 1);

        assert_eq!(cart.set_quantity(a, 3), Err(CartError::ItemNotFound));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let p = Uuid::new_v4();
        let mut cart = Cart::for_user(Uuid::new_v4());
        cart.add_item(p, 1).unwrap();
        assert!(cart.remove_item(p));
        assert!(!cart.remove_item(p));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::for_user(Uuid::new_v4());
        cart.add_item(Uuid::new_v4(), 2).unwrap();
        cart.add_item(Uuid::new_v4(), 5).unwrap();
        cart.clear();
        assert!(cart.is_empty());
    }
}
