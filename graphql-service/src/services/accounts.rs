use std::sync::Arc;

use crate::dtos::{AuthUserInput, AuthenticatedUser, CreateUserInput};
use crate::models::{rank_of, NewAccount, RoleType, User};
use crate::services::authz::DirectiveError;
use crate::services::error::ServiceError;
use crate::services::jwt::{Claims, JwtService};
use crate::services::store::AccountStore;
use crate::utils::{
    hash_password, validate_input, verify_password, verify_without_account, Password,
    PasswordHashString,
};

/// Registration, sign-in and role management.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn AccountStore>,
    jwt: Arc<JwtService>,
}

impl AccountService {
    pub fn new(store: Arc<dyn AccountStore>, jwt: Arc<JwtService>) -> Self {
        Self { store, jwt }
    }

    /// Create the account and sign the new user in.
    pub async fn register(&self, input: CreateUserInput) -> Result<AuthenticatedUser, ServiceError> {
        validate_input(&input)?;

        if self.store.find_email_provider(&input.email).await?.is_some() {
            return Err(ServiceError::EmailAlreadyExists);
        }

        let password_hash = hash_password(&Password::new(input.password))?;

        let user = self
            .store
            .create_account(NewAccount {
                email: input.email,
                password_hash: password_hash.into_string(),
                first_name: input.first_name,
                last_name: input.last_name,
                phone_number: input.phone_number,
            })
            .await?;

        tracing::info!(user_id = user.id, "User registered");

        self.start_session(user.id).await
    }

    /// Sign in with email and password.
    ///
    /// `current_token` is the bearer token the request carried, if any; its
    /// session row is dropped before the new one is recorded.
    pub async fn login(
        &self,
        input: AuthUserInput,
        current_token: Option<&str>,
    ) -> Result<AuthenticatedUser, ServiceError> {
        validate_input(&input)?;

        let password = Password::new(input.password);
        let Some(provider) = self.store.find_email_provider(&input.email).await? else {
            let _ = verify_without_account(&password);
            return Err(ServiceError::InvalidCredentials);
        };

        let stored = PasswordHashString::new(provider.provider_password.clone());
        if verify_password(&password, &stored).is_err() {
            tracing::warn!(user_id = provider.user_id, "Failed sign-in attempt");
            return Err(ServiceError::InvalidCredentials);
        }

        if let Some(token) = current_token {
            self.store.delete_auth_token(token).await?;
        }

        tracing::info!(user_id = provider.user_id, "User signed in");

        self.start_session(provider.user_id).await
    }

    /// Drop the session row of `token`. Returns whether one existed.
    pub async fn logout(&self, token: &str) -> Result<bool, ServiceError> {
        self.store.delete_auth_token(token).await
    }

    pub async fn user(&self, user_id: i64) -> Result<User, ServiceError> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)
    }

    pub async fn users(&self, limit: i64) -> Result<Vec<User>, ServiceError> {
        self.store.list_users(limit).await
    }

    /// Grant `role` to `user_id` on behalf of `caller`.
    ///
    /// Callers may not hand out a role that outranks their own.
    pub async fn grant_role(
        &self,
        caller: &Claims,
        user_id: i64,
        role: RoleType,
    ) -> Result<Vec<RoleType>, ServiceError> {
        if role.rank() > rank_of(caller.effective_role()) {
            return Err(DirectiveError::InsufficientRole.into());
        }

        let user = self.user(user_id).await?;
        self.store.grant_role(user.id, role).await?;

        tracing::info!(
            user_id = user.id,
            granted_by = caller.user_id,
            role = role.as_str(),
            "Role granted"
        );

        self.store.roles_for_user(user.id).await
    }

    async fn start_session(&self, user_id: i64) -> Result<AuthenticatedUser, ServiceError> {
        let roles = self.store.roles_for_user(user_id).await?;
        let issued = self.jwt.issue(user_id, &roles)?;

        self.store
            .insert_auth_token(user_id, &issued.token, issued.claims.expires_at())
            .await?;

        Ok(AuthenticatedUser {
            id: user_id,
            token: issued.token,
        })
    }
}
