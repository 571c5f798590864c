//! Auth token model - revocation bookkeeping for issued session JWTs.
//!
//! Deleting a row marks the session as logged out for clients that check it.
//! The JWT itself stays valid until `expires_at`.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct AuthToken {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
