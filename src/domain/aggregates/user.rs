//! User Aggregate

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::value_objects::Role;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn register(name: impl Into<String>, email: impl Into<String>, password_hash: String) -> Self {
        Self::with_role(name, email, password_hash, Role::User)
    }

    pub fn with_role(name: impl Into<String>, email: impl Into<String>, password_hash: String, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(), name: name.into(), email: normalize_email(&email.into()),
            password_hash, role, created_at: Utc::now(),
        }
    }
}

/// Emails are compared case-insensitively and without surrounding whitespace.
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_defaults_to_user_role() {
        let u = User::register("Ann", "  Ann@Example.COM ", "hash".into());
        assert_eq!(u.role, Role::User);
        assert_eq!(u.email, "ann@example.com");
    }
}
