//! Storefront API
//!
//! REST backend for a small online shop.
//!
//! ## Features
//! - Registration and login with bearer tokens
//! - Product catalog with image uploads; admins create, creators and admins edit
//! - One persistent cart per user
//! - PostgreSQL or in-memory storage

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod seed;
pub mod services;
pub mod state;
pub mod store;
pub mod uploads;

pub use api::router as app;
pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
