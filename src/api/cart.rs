use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_id, views::CartView, ApiJson, BaseUrl};
use crate::auth::AuthUser;
use crate::error::{AppError, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: String,
    /// Defaults to one.
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: i64,
}

fn quantity_to_add(raw: Option<i64>) -> Result<u32> {
    let quantity = raw.unwrap_or(1);
    if quantity < 1 {
        return Err(AppError::Validation("Quantity must be at least 1".to_string()));
    }
    u32::try_from(quantity).map_err(|_| AppError::Validation("Quantity is too large".to_string()))
}

fn quantity_to_set(raw: i64) -> Result<u32> {
    if raw < 0 {
        return Err(AppError::Validation("Quantity must not be negative".to_string()));
    }
    u32::try_from(raw).map_err(|_| AppError::Validation("Quantity is too large".to_string()))
}

pub async fn get(State(state): State<AppState>, AuthUser(user): AuthUser, BaseUrl(base): BaseUrl) -> Result<Json<CartView>> {
    let cart = state.carts.get(user.user_id).await?;
    Ok(Json(CartView::new(&cart, &base)))
}

pub async fn add(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    BaseUrl(base): BaseUrl,
    ApiJson(req): ApiJson<AddItemRequest>,
) -> Result<Json<CartView>> {
    let quantity = quantity_to_add(req.quantity)?;
    let product_id = parse_id(&req.product_id, "Product not found")?;
    let cart = state.carts.add(user.user_id, product_id, quantity).await?;
    Ok(Json(CartView::new(&cart, &base)))
}

pub async fn set_quantity(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    BaseUrl(base): BaseUrl,
    Path(product_id): Path<String>,
    ApiJson(req): ApiJson<SetQuantityRequest>,
) -> Result<Json<CartView>> {
    let quantity = quantity_to_set(req.quantity)?;
    let product_id = parse_id(&product_id, "Item not found in cart")?;
    let cart = state.carts.set_quantity(user.user_id, product_id, quantity).await?;
    Ok(Json(CartView::new(&cart, &base)))
}

pub async fn remove(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    BaseUrl(base): BaseUrl,
    Path(product_id): Path<String>,
) -> Result<Json<CartView>> {
    let product_id = parse_id(&product_id, "Item not found in cart")?;
    let cart = state.carts.remove(user.user_id, product_id).await?;
    Ok(Json(CartView::new(&cart, &base)))
}

pub async fn clear(State(state): State<AppState>, AuthUser(user): AuthUser) -> Result<Json<Value>> {
    state.carts.clear(user.user_id).await?;
    Ok(Json(json!({ "message": "Cart cleared successfully", "items": [] })))
}
