use async_graphql::{Context, EmptySubscription, Object, Result, Schema, Value};

use crate::dtos::{
    AuthUserInput, AuthenticatedUser, CompletePasswordResetInput, CreateUserInput,
    RequestPasswordResetInput, ValidatePasswordResetInput,
};
use crate::graphql::types::{AuthenticationProviderNode, PasswordResetNode, UserNode};
use crate::graphql::RequestContext;
use crate::models::{Resource, RoleType};
use crate::services::authz::{validate_length, Requirement};
use crate::services::{AccountService, PasswordResetService};

pub type AppSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Build the schema with the workflow services as shared data.
pub fn build_schema(accounts: AccountService, password_resets: PasswordResetService) -> AppSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(accounts)
        .data(password_resets)
        .finish()
}

const USERS_LIMIT_MIN: i64 = 1;
const USERS_LIMIT_MAX: i64 = 100;

#[derive(Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// The caller, or the user with `userId` when given.
    async fn user(&self, ctx: &Context<'_>, user_id: Option<i64>) -> Result<UserNode> {
        let rc = RequestContext::from_ctx(ctx)?;
        let caller = rc.caller()?;
        let accounts = ctx.data::<AccountService>()?;

        let user = accounts
            .user(user_id.unwrap_or(caller.user_id))
            .await
            .map_err(|e| rc.error(e))?;
        Ok(UserNode(user))
    }

    /// First `limit` users by id.
    async fn users(
        &self,
        ctx: &Context<'_>,
        #[graphql(default = 20)] limit: i64,
    ) -> Result<Vec<UserNode>> {
        let rc = RequestContext::from_ctx(ctx)?;
        rc.authorize(
            Requirement::MinimumRole(RoleType::OrganizationMember),
            &Resource::Root,
        )?;
        validate_length(USERS_LIMIT_MIN, USERS_LIMIT_MAX, &Value::from(limit))
            .map_err(|e| rc.error(e))?;

        let accounts = ctx.data::<AccountService>()?;
        let users = accounts.users(limit).await.map_err(|e| rc.error(e))?;
        Ok(users.into_iter().map(UserNode).collect())
    }
}

#[derive(Default)]
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_user(
        &self,
        ctx: &Context<'_>,
        input: CreateUserInput,
    ) -> Result<AuthenticatedUser> {
        let rc = RequestContext::from_ctx(ctx)?;
        let accounts = ctx.data::<AccountService>()?;
        accounts.register(input).await.map_err(|e| rc.error(e))
    }

    async fn auth_user(&self, ctx: &Context<'_>, input: AuthUserInput) -> Result<AuthenticatedUser> {
        let rc = RequestContext::from_ctx(ctx)?;
        let accounts = ctx.data::<AccountService>()?;
        accounts
            .login(input, rc.bearer_token.as_deref())
            .await
            .map_err(|e| rc.error(e))
    }

    /// Revoke the session of the presented token.
    async fn logout(&self, ctx: &Context<'_>) -> Result<bool> {
        let rc = RequestContext::from_ctx(ctx)?;
        rc.authorize(Requirement::Authenticated, &Resource::Root)?;

        let Some(token) = rc.bearer_token.as_deref() else {
            return Ok(false);
        };
        let accounts = ctx.data::<AccountService>()?;
        accounts.logout(token).await.map_err(|e| rc.error(e))
    }

    async fn request_password_reset(
        &self,
        ctx: &Context<'_>,
        input: RequestPasswordResetInput,
    ) -> Result<PasswordResetNode> {
        let rc = RequestContext::from_ctx(ctx)?;
        let resets = ctx.data::<PasswordResetService>()?;
        resets
            .request(input, &rc.localizer)
            .await
            .map(PasswordResetNode)
            .map_err(|e| rc.error(e))
    }

    async fn validate_password_reset(
        &self,
        ctx: &Context<'_>,
        input: ValidatePasswordResetInput,
    ) -> Result<PasswordResetNode> {
        let rc = RequestContext::from_ctx(ctx)?;
        let resets = ctx.data::<PasswordResetService>()?;
        resets
            .verify(input)
            .await
            .map(PasswordResetNode)
            .map_err(|e| rc.error(e))
    }

    async fn complete_password_reset(
        &self,
        ctx: &Context<'_>,
        input: CompletePasswordResetInput,
    ) -> Result<AuthenticationProviderNode> {
        let rc = RequestContext::from_ctx(ctx)?;
        let resets = ctx.data::<PasswordResetService>()?;
        resets
            .complete(input, &rc.localizer)
            .await
            .map(AuthenticationProviderNode)
            .map_err(|e| rc.error(e))
    }

    /// Grant `role` to a user. Returns the user's roles afterwards.
    async fn grant_role(
        &self,
        ctx: &Context<'_>,
        user_id: i64,
        role: RoleType,
    ) -> Result<Vec<RoleType>> {
        let rc = RequestContext::from_ctx(ctx)?;
        rc.authorize(
            Requirement::MinimumRole(RoleType::OrganizationAdmin),
            &Resource::Root,
        )?;
        let caller = rc.caller()?;

        let accounts = ctx.data::<AccountService>()?;
        accounts
            .grant_role(caller, user_id, role)
            .await
            .map_err(|e| rc.error(e))
    }
}
