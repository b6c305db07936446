//! Registration, login and the seeded admin account.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{hash_password, verify_password, TokenKeys};
use crate::domain::{normalize_email, Cart, Role, User};
use crate::error::{AppError, Result};
use crate::store::{Store, StoreError};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for UserSummary {
    fn from(u: &User) -> Self { Self { id: u.id, name: u.name.clone(), email: u.email.clone(), role: u.role } }
}

/// What register and login hand back: a bearer token plus who it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: UserSummary,
}

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
    tokens: Arc<TokenKeys>,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>, tokens: Arc<TokenKeys>) -> Self { Self { store, tokens } }

    /// Creates a regular account together with its empty cart.
    pub async fn register(&self, req: RegisterRequest) -> Result<AuthSession> {
        req.validate()?;
        let email = normalize_email(&req.email);
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict);
        }
        let user = User::register(req.name.trim(), email, hash_password(&req.password)?);
        self.store.insert_user(&user).await?;
        self.store.create_cart(&Cart::for_user(user.id)).await?;
        tracing::info!(user_id = %user.id, "user registered");
        self.session_for(&user)
    }

    pub async fn login(&self, req: LoginRequest) -> Result<AuthSession> {
        req.validate()?;
        let user = self.store.find_user_by_email(&normalize_email(&req.email)).await?
            .ok_or(AppError::InvalidCredentials)?;
        if !verify_password(&req.password, &user.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }
        self.session_for(&user)
    }

    /// Creates the admin account unless one with this email already exists.
    /// Returns the account either way.
    pub async fn ensure_admin(&self, name: &str, email: &str, password: &str) -> Result<User> {
        let email = normalize_email(email);
        if let Some(existing) = self.store.find_user_by_email(&email).await? {
            return Ok(existing);
        }
        let admin = User::with_role(name, email, hash_password(password)?, Role::Admin);
        match self.store.insert_user(&admin).await {
            Ok(()) => {
                tracing::info!(email = %admin.email, "admin account created");
                Ok(admin)
            }
            // Lost a race with another instance seeding the same account.
            Err(StoreError::DuplicateEmail) => self.store.find_user_by_email(&admin.email).await?
                .ok_or_else(|| AppError::Internal("admin account vanished".to_string())),
            Err(e) => Err(e.into()),
        }
    }

    fn session_for(&self, user: &User) -> Result<AuthSession> {
        Ok(AuthSession { token: self.tokens.issue(user)?, user: UserSummary::from(user) })
    }
}
