use async_graphql::Context;

use crate::graphql::loaders::Loaders;
use crate::models::Resource;
use crate::services::authz::{evaluate, Requirement};
use crate::services::error::ServiceError;
use crate::services::i18n::Localizer;
use crate::services::jwt::Claims;

/// Everything a resolver may know about the request it serves.
///
/// Built by the HTTP handler and attached to each execution as request data.
pub struct RequestContext {
    pub claims: Option<Claims>,
    /// Raw bearer token the claims were decoded from.
    pub bearer_token: Option<String>,
    pub localizer: Localizer,
    pub loaders: Loaders,
}

impl RequestContext {
    pub fn from_ctx<'a>(ctx: &'a Context<'_>) -> async_graphql::Result<&'a RequestContext> {
        ctx.data::<RequestContext>()
    }

    /// Run the authorization evaluator for a field resolved on `resource`.
    pub fn authorize(
        &self,
        requirement: Requirement,
        resource: &Resource,
    ) -> async_graphql::Result<()> {
        evaluate(requirement, self.claims.as_ref(), resource).map_err(|e| self.error(e))
    }

    /// Claims of an authenticated caller.
    pub fn caller(&self) -> async_graphql::Result<&Claims> {
        self.authorize(Requirement::Authenticated, &Resource::Root)?;
        self.claims
            .as_ref()
            .ok_or_else(|| self.error(ServiceError::Internal(anyhow::anyhow!("claims vanished"))))
    }

    pub fn error(&self, err: impl Into<ServiceError>) -> async_graphql::Error {
        err.into().into_graphql(&self.localizer)
    }
}
