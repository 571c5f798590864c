//! Password reset model - a single-use reset request and its lifecycle.

use async_graphql::Enum;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Reset lifecycle: `Sent -> Verified -> Completed`. No other transitions exist.
#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq)]
#[graphql(rename_items = "SCREAMING_SNAKE_CASE")]
pub enum PasswordResetStatus {
    Sent,
    Verified,
    Completed,
}

impl PasswordResetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PasswordResetStatus::Sent => "sent",
            PasswordResetStatus::Verified => "verified",
            PasswordResetStatus::Completed => "completed",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "sent" => Some(PasswordResetStatus::Sent),
            "verified" => Some(PasswordResetStatus::Verified),
            "completed" => Some(PasswordResetStatus::Completed),
            _ => None,
        }
    }
}

/// Password reset entity. Rows are never deleted.
#[derive(Debug, Clone, FromRow)]
pub struct PasswordReset {
    pub id: i64,
    pub authentication_provider_id: i64,
    pub status: String,
    pub password_reset_token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PasswordReset {
    pub fn status(&self) -> Option<PasswordResetStatus> {
        PasswordResetStatus::parse(&self.status)
    }
}
