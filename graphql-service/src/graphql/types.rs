//! Output object types. Each wraps a model row and guards the fields that
//! need it with the row as the parent resource.

use async_graphql::{Context, Object, Result};
use chrono::{DateTime, Utc};

use crate::graphql::RequestContext;
use crate::models::{
    AuthenticationProvider, PasswordReset, PasswordResetStatus, Profile, Resource, RoleType, User,
};
use crate::services::authz::Requirement;
use crate::services::error::ServiceError;

pub struct UserNode(pub User);

impl UserNode {
    fn resource(&self) -> Resource {
        Resource::User { id: self.0.id }
    }
}

#[Object(name = "User")]
impl UserNode {
    async fn id(&self) -> i64 {
        self.0.id
    }

    async fn username(&self) -> Option<&str> {
        self.0.username.as_deref()
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.0.updated_at
    }

    /// Login methods. Visible to the user and to organization admins.
    async fn authentication_providers(
        &self,
        ctx: &Context<'_>,
    ) -> Result<Vec<AuthenticationProviderNode>> {
        let rc = RequestContext::from_ctx(ctx)?;
        rc.authorize(Requirement::ResourceOwnerOrElevated, &self.resource())?;

        let providers = rc.loaders.providers.load_one(self.0.id).await?;
        Ok(providers
            .unwrap_or_default()
            .into_iter()
            .map(AuthenticationProviderNode)
            .collect())
    }

    /// Only the user may read their own profile.
    async fn profile(&self, ctx: &Context<'_>) -> Result<Option<ProfileNode>> {
        let rc = RequestContext::from_ctx(ctx)?;
        rc.authorize(Requirement::Role(RoleType::ResourceOwner), &self.resource())?;

        let profile = rc.loaders.profiles.load_one(self.0.id).await?;
        Ok(profile.map(ProfileNode))
    }

    async fn roles(&self, ctx: &Context<'_>) -> Result<Vec<RoleType>> {
        let rc = RequestContext::from_ctx(ctx)?;
        rc.authorize(Requirement::Authenticated, &self.resource())?;

        let roles = rc.loaders.roles.load_one(self.0.id).await?;
        Ok(roles.unwrap_or_default())
    }
}

/// A login method. The password hash is never exposed.
pub struct AuthenticationProviderNode(pub AuthenticationProvider);

#[Object(name = "AuthenticationProvider")]
impl AuthenticationProviderNode {
    async fn id(&self) -> i64 {
        self.0.id
    }

    async fn user_id(&self) -> i64 {
        self.0.user_id
    }

    async fn provider_type(&self) -> &str {
        &self.0.provider_type
    }

    async fn provider_username(&self) -> &str {
        &self.0.provider_username
    }

    async fn email(&self) -> &str {
        &self.0.email
    }

    async fn first_name(&self) -> &str {
        &self.0.first_name
    }

    async fn last_name(&self) -> &str {
        &self.0.last_name
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.0.updated_at
    }
}

pub struct ProfileNode(pub Profile);

#[Object(name = "Profile")]
impl ProfileNode {
    async fn id(&self) -> i64 {
        self.0.id
    }

    async fn user_id(&self) -> i64 {
        self.0.user_id
    }

    async fn first_name(&self) -> &str {
        &self.0.first_name
    }

    async fn last_name(&self) -> &str {
        &self.0.last_name
    }

    async fn phone_number(&self, ctx: &Context<'_>) -> Result<&str> {
        let rc = RequestContext::from_ctx(ctx)?;
        rc.authorize(
            Requirement::Role(RoleType::ResourceOwner),
            &Resource::Profile {
                user_id: self.0.user_id,
            },
        )?;
        Ok(&self.0.phone_number)
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.0.updated_at
    }
}

/// A reset request as the caller sees it. The token stays server side.
pub struct PasswordResetNode(pub PasswordReset);

#[Object(name = "PasswordReset")]
impl PasswordResetNode {
    async fn id(&self) -> i64 {
        self.0.id
    }

    async fn status(&self, ctx: &Context<'_>) -> Result<PasswordResetStatus> {
        let rc = RequestContext::from_ctx(ctx)?;
        self.0.status().ok_or_else(|| {
            rc.error(ServiceError::Internal(anyhow::anyhow!(
                "Password reset {} has unknown status {:?}",
                self.0.id,
                self.0.status
            )))
        })
    }

    async fn expires_at(&self) -> DateTime<Utc> {
        self.0.expires_at
    }
}
