//! HTTP surface. Everything is mounted under `/api`; uploaded images are served
//! from `/uploads`.

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{DefaultBodyLimit, FromRef, FromRequest, FromRequestParts},
    http::{header::HOST, request::Parts},
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, services::ServeDir, trace::TraceLayer};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::uploads::MAX_IMAGE_BYTES;

mod auth;
mod cart;
mod health;
mod products;
pub mod views;

/// Room for one maximum-size image plus the other form fields.
const MAX_REQUEST_BYTES: usize = MAX_IMAGE_BYTES + 512 * 1024;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/health", get(health::health))
        .route("/products", get(products::list).post(products::create))
        .route("/products/:id", get(products::get).put(products::update).delete(products::delete))
        .route("/cart", get(cart::get).post(cart::add).delete(cart::clear))
        .route("/cart/:product_id", put(cart::set_quantity).delete(cart::remove));

    Router::new()
        .nest("/api", api)
        .nest_service("/uploads", ServeDir::new(state.uploads.dir()))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// JSON body whose rejections come back as `{"message": ...}` like every other error.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string whose rejections come back as `{"message": ...}`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Absolute URL prefix of this server, used to turn stored image paths into links.
#[derive(Debug, Clone)]
pub struct BaseUrl(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BaseUrl
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        if let Some(base) = &state.config.public_base_url {
            return Ok(Self(base.trim_end_matches('/').to_string()));
        }
        let host = parts.headers.get(HOST)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string)
            .or_else(|| parts.uri.authority().map(|a| a.to_string()))
            .unwrap_or_else(|| state.config.socket_addr().to_string());
        let scheme = parts.headers.get("x-forwarded-proto").and_then(|h| h.to_str().ok()).unwrap_or("http");
        Ok(Self(format!("{scheme}://{host}")))
    }
}

/// Ids that are not UUIDs cannot name anything, so they are reported as missing.
fn parse_id(raw: &str, missing: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(missing.to_string()))
}
