//! In-memory [`AccountStore`] for tests.

use super::AccountStore;
use crate::models::{
    AuthToken, AuthenticationProvider, NewAccount, PasswordReset, PasswordResetStatus, Profile,
    ProviderType, RoleType, User,
};
use crate::services::error::ServiceError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct MockState {
    next_id: i64,
    users: Vec<User>,
    providers: Vec<AuthenticationProvider>,
    profiles: Vec<Profile>,
    user_roles: Vec<(i64, RoleType)>,
    auth_tokens: Vec<AuthToken>,
    password_resets: Vec<PasswordReset>,
    batches: Vec<(&'static str, Vec<i64>)>,
}

impl MockState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn record_batch(&mut self, kind: &'static str, user_ids: &[i64]) {
        let mut ids = user_ids.to_vec();
        ids.sort_unstable();
        self.batches.push((kind, ids));
    }
}

#[derive(Default)]
pub struct MockStore {
    state: Mutex<MockState>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MockState>, ServiceError> {
        self.state
            .lock()
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Mock store mutex poisoned: {}", e)))
    }

    /// Snapshot of every password reset row.
    pub fn password_resets(&self) -> Vec<PasswordReset> {
        self.state()
            .map(|s| s.password_resets.clone())
            .unwrap_or_default()
    }

    /// Snapshot of every auth token row.
    pub fn auth_tokens(&self) -> Vec<AuthToken> {
        self.state()
            .map(|s| s.auth_tokens.clone())
            .unwrap_or_default()
    }

    /// Sorted user ids of each batched read of `kind` (`providers`,
    /// `profiles` or `roles`), oldest first.
    pub fn batches(&self, kind: &str) -> Vec<Vec<i64>> {
        self.state()
            .map(|s| {
                s.batches
                    .iter()
                    .filter(|(k, _)| *k == kind)
                    .map(|(_, ids)| ids.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl AccountStore for MockStore {
    async fn health_check(&self) -> Result<(), ServiceError> {
        Ok(())
    }

    async fn find_email_provider(
        &self,
        email: &str,
    ) -> Result<Option<AuthenticationProvider>, ServiceError> {
        Ok(self
            .state()?
            .providers
            .iter()
            .find(|p| p.provider_type == ProviderType::Email.as_str() && p.provider_username == email)
            .cloned())
    }

    async fn create_account(&self, account: NewAccount) -> Result<User, ServiceError> {
        let mut state = self.state()?;

        if state.providers.iter().any(|p| {
            p.provider_type == ProviderType::Email.as_str() && p.provider_username == account.email
        }) {
            return Err(ServiceError::EmailAlreadyExists);
        }

        let now = Utc::now();
        let user = User {
            id: state.next_id(),
            username: Some(account.email.clone()),
            created_at: now,
            updated_at: now,
        };

        let provider = AuthenticationProvider {
            id: state.next_id(),
            user_id: user.id,
            provider_type: ProviderType::Email.as_str().to_string(),
            provider_username: account.email.clone(),
            provider_password: account.password_hash,
            email: account.email,
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            created_at: now,
            updated_at: now,
        };

        let profile = Profile {
            id: state.next_id(),
            user_id: user.id,
            first_name: account.first_name,
            last_name: account.last_name,
            phone_number: account.phone_number,
            created_at: now,
            updated_at: now,
        };

        state.users.push(user.clone());
        state.providers.push(provider);
        state.profiles.push(profile);
        state.user_roles.push((user.id, RoleType::User));

        Ok(user)
    }

    async fn find_user(&self, user_id: i64) -> Result<Option<User>, ServiceError> {
        Ok(self
            .state()?
            .users
            .iter()
            .find(|u| u.id == user_id)
            .cloned())
    }

    async fn list_users(&self, limit: i64) -> Result<Vec<User>, ServiceError> {
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self.state()?.users.iter().take(limit).cloned().collect())
    }

    async fn providers_for_users(
        &self,
        user_ids: &[i64],
    ) -> Result<Vec<AuthenticationProvider>, ServiceError> {
        let mut state = self.state()?;
        state.record_batch("providers", user_ids);
        Ok(state
            .providers
            .iter()
            .filter(|p| user_ids.contains(&p.user_id))
            .cloned()
            .collect())
    }

    async fn profiles_for_users(&self, user_ids: &[i64]) -> Result<Vec<Profile>, ServiceError> {
        let mut state = self.state()?;
        state.record_batch("profiles", user_ids);
        Ok(state
            .profiles
            .iter()
            .filter(|p| user_ids.contains(&p.user_id))
            .cloned()
            .collect())
    }

    async fn roles_for_users(
        &self,
        user_ids: &[i64],
    ) -> Result<Vec<(i64, RoleType)>, ServiceError> {
        let mut state = self.state()?;
        state.record_batch("roles", user_ids);
        Ok(state
            .user_roles
            .iter()
            .filter(|(id, _)| user_ids.contains(id))
            .copied()
            .collect())
    }

    async fn grant_role(&self, user_id: i64, role: RoleType) -> Result<(), ServiceError> {
        let mut state = self.state()?;
        if !state.user_roles.contains(&(user_id, role)) {
            state.user_roles.push((user_id, role));
        }
        Ok(())
    }

    async fn insert_auth_token(
        &self,
        user_id: i64,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<AuthToken, ServiceError> {
        let mut state = self.state()?;
        let row = AuthToken {
            id: state.next_id(),
            user_id,
            token: token.to_string(),
            expires_at,
            created_at: Utc::now(),
        };
        state.auth_tokens.push(row.clone());
        Ok(row)
    }

    async fn delete_auth_token(&self, token: &str) -> Result<bool, ServiceError> {
        let mut state = self.state()?;
        let before = state.auth_tokens.len();
        state.auth_tokens.retain(|t| t.token != token);
        Ok(state.auth_tokens.len() < before)
    }

    async fn insert_password_reset(
        &self,
        authentication_provider_id: i64,
        token: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordReset, ServiceError> {
        let mut state = self.state()?;
        let reset = PasswordReset {
            id: state.next_id(),
            authentication_provider_id,
            status: PasswordResetStatus::Sent.as_str().to_string(),
            password_reset_token: token.to_string(),
            expires_at,
            created_at,
            updated_at: created_at,
        };
        state.password_resets.push(reset.clone());
        Ok(reset)
    }

    async fn verify_password_reset(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PasswordReset>, ServiceError> {
        let mut state = self.state()?;
        let row = state.password_resets.iter_mut().find(|r| {
            r.password_reset_token == token
                && r.status() == Some(PasswordResetStatus::Sent)
                && r.expires_at > now
        });

        Ok(row.map(|r| {
            r.status = PasswordResetStatus::Verified.as_str().to_string();
            r.updated_at = now;
            r.clone()
        }))
    }

    async fn complete_password_reset(
        &self,
        token: &str,
        password_hash: &str,
    ) -> Result<Option<(PasswordReset, AuthenticationProvider)>, ServiceError> {
        let mut guard = self.state()?;
        let state = &mut *guard;
        let now = Utc::now();

        let Some(index) = state.password_resets.iter().position(|r| {
            r.password_reset_token == token && r.status() == Some(PasswordResetStatus::Verified)
        }) else {
            return Ok(None);
        };

        let reset = &mut state.password_resets[index];
        let Some(provider) = state
            .providers
            .iter_mut()
            .find(|p| p.id == reset.authentication_provider_id)
        else {
            return Err(ServiceError::Internal(anyhow::anyhow!(
                "Password reset {} references missing provider {}",
                reset.id,
                reset.authentication_provider_id
            )));
        };
        provider.provider_password = password_hash.to_string();
        provider.updated_at = now;
        reset.status = PasswordResetStatus::Completed.as_str().to_string();
        reset.updated_at = now;

        Ok(Some((reset.clone(), provider.clone())))
    }
}
