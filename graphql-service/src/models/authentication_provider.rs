//! Authentication provider model - one login method of a user.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Supported provider type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    Email,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::Email => "email",
        }
    }
}

/// Login credentials plus contact fields. Unique per `(provider_type, provider_username)`.
#[derive(Debug, Clone, FromRow)]
pub struct AuthenticationProvider {
    pub id: i64,
    pub user_id: i64,
    pub provider_type: String,
    pub provider_username: String,
    /// Argon2 PHC string; never leaves the service.
    pub provider_password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
