//! User model - the account root that providers, profile and roles hang off.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// User entity.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything needed to register an email account in one transaction.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
}
