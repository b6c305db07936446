use axum::{extract::State, Json};

use super::ApiJson;
use crate::error::Result;
use crate::services::{AuthSession, LoginRequest, RegisterRequest};
use crate::state::AppState;

pub async fn register(State(state): State<AppState>, ApiJson(req): ApiJson<RegisterRequest>) -> Result<Json<AuthSession>> {
    Ok(Json(state.accounts.register(req).await?))
}

pub async fn login(State(state): State<AppState>, ApiJson(req): ApiJson<LoginRequest>) -> Result<Json<AuthSession>> {
    Ok(Json(state.accounts.login(req).await?))
}
