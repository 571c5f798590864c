//! Data access for accounts, sessions and password resets.
//!
//! Workflows depend on [`AccountStore`] only. [`PgStore`] is the production
//! backend; [`MockStore`] keeps the same semantics in memory for tests.

mod mock;
mod postgres;

pub use mock::MockStore;
pub use postgres::PgStore;

use crate::models::{
    AuthToken, AuthenticationProvider, NewAccount, PasswordReset, Profile, RoleType, User,
};
use crate::services::error::ServiceError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn health_check(&self) -> Result<(), ServiceError>;

    /// Email login method whose provider username is `email`.
    async fn find_email_provider(
        &self,
        email: &str,
    ) -> Result<Option<AuthenticationProvider>, ServiceError>;

    /// Atomically create the user, its email provider, profile and `USER` role.
    ///
    /// Fails with `EmailAlreadyExists` when the provider username is taken.
    async fn create_account(&self, account: NewAccount) -> Result<User, ServiceError>;

    async fn find_user(&self, user_id: i64) -> Result<Option<User>, ServiceError>;

    async fn list_users(&self, limit: i64) -> Result<Vec<User>, ServiceError>;

    /// Providers of every user in `user_ids`, in one round trip.
    async fn providers_for_users(
        &self,
        user_ids: &[i64],
    ) -> Result<Vec<AuthenticationProvider>, ServiceError>;

    async fn profiles_for_users(&self, user_ids: &[i64]) -> Result<Vec<Profile>, ServiceError>;

    /// `(user_id, role)` pairs for every user in `user_ids`.
    async fn roles_for_users(&self, user_ids: &[i64])
        -> Result<Vec<(i64, RoleType)>, ServiceError>;

    async fn roles_for_user(&self, user_id: i64) -> Result<Vec<RoleType>, ServiceError> {
        Ok(self
            .roles_for_users(&[user_id])
            .await?
            .into_iter()
            .map(|(_, role)| role)
            .collect())
    }

    /// Idempotent.
    async fn grant_role(&self, user_id: i64, role: RoleType) -> Result<(), ServiceError>;

    async fn insert_auth_token(
        &self,
        user_id: i64,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<AuthToken, ServiceError>;

    /// Returns whether a row was removed.
    async fn delete_auth_token(&self, token: &str) -> Result<bool, ServiceError>;

    /// Insert a reset in `sent` status.
    async fn insert_password_reset(
        &self,
        authentication_provider_id: i64,
        token: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordReset, ServiceError>;

    /// Move the `sent`, unexpired reset holding `token` to `verified`.
    ///
    /// `None` when no row qualifies. At most one concurrent caller wins.
    async fn verify_password_reset(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PasswordReset>, ServiceError>;

    /// Move the `verified` reset holding `token` to `completed` and store
    /// `password_hash` on its provider, in one unit of work.
    async fn complete_password_reset(
        &self,
        token: &str,
        password_hash: &str,
    ) -> Result<Option<(PasswordReset, AuthenticationProvider)>, ServiceError>;
}
