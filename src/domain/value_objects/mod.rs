//! Value Objects for the storefront

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role. Closed set, matched exhaustively wherever privileges are checked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(RoleError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown role `{0}`")]
pub struct RoleError(String);

const MAX_PRICE_SCALE: u32 = 2;
const MAX_PRICE_CENTS: i64 = 999_999_999_999;

/// Non-negative product price
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Amounts are stored as `NUMERIC(12, 2)`: at most two decimal places and
    /// ten integer digits.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() { return Err(PriceError::Negative); }
        if amount.normalize().scale() > MAX_PRICE_SCALE { return Err(PriceError::TooPrecise); }
        if amount > Decimal::new(MAX_PRICE_CENTS, MAX_PRICE_SCALE) { return Err(PriceError::TooLarge); }
        Ok(Self(amount))
    }

    /// Parses a form value such as `"79.99"`.
    pub fn parse(raw: &str) -> Result<Self, PriceError> {
        let amount = Decimal::from_str(raw.trim()).map_err(|_| PriceError::NotANumber(raw.to_string()))?;
        Self::new(amount)
    }

    pub fn amount(&self) -> Decimal { self.0 }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    #[error("price must not be negative")]
    Negative,
    #[error("price `{0}` is not a number")]
    NotANumber(String),
    #[error("price must have at most two decimal places")]
    TooPrecise,
    #[error("price must be less than 10000000000")]
    TooLarge,
}

/// Where uploaded images are served from.
pub const UPLOADS_PREFIX: &str = "/uploads";

/// Image used when a product is created without an upload.
pub const DEFAULT_PRODUCT_IMAGE: &str = "/uploads/default-product.jpg";

/// Stored image reference: an absolute URL, a path under `/uploads`, or a bare file name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(value: impl Into<String>) -> Self { Self(value.into()) }

    /// Reference for a file written into the upload directory.
    pub fn uploaded(file_name: &str) -> Self { Self(format!("{UPLOADS_PREFIX}/{file_name}")) }

    pub fn placeholder() -> Self { Self(DEFAULT_PRODUCT_IMAGE.to_string()) }

    pub fn as_str(&self) -> &str { &self.0 }

    pub fn is_absolute(&self) -> bool {
        self.0.starts_with("http://") || self.0.starts_with("https://")
    }

    /// Turns the stored reference into a URL clients can load directly.
    ///
    /// Every read path goes through here, so the stored layout never leaks to callers.
    pub fn resolve(&self, base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');
        let stored = self.0.as_str();
        if self.is_absolute() {
            stored.to_string()
        } else if stored.starts_with('/') {
            format!("{base}{stored}")
        } else if stored.starts_with("uploads/") {
            format!("{base}/{stored}")
        } else {
            format!("{base}{UPLOADS_PREFIX}/{stored}")
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}
