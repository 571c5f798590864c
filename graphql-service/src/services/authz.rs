//! Field-level authorization and argument guards.
//!
//! [`evaluate`] is pure: it decides from the caller's claims and the parent
//! resource alone, and never touches the database.

use crate::models::{rank_of, Resource, RoleType};
use crate::services::i18n::Localizer;
use crate::services::jwt::Claims;
use thiserror::Error;

/// What a guarded field demands of its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Authenticated,
    /// Caller's role must rank at least as high as this one.
    MinimumRole(RoleType),
    /// `RESOURCE_OWNER` means "owns the parent resource"; any other role
    /// must match the caller's role exactly.
    Role(RoleType),
    /// Super and organization admins pass; everyone else must own the resource.
    ResourceOwnerOrElevated,
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum DirectiveError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Insufficient role")]
    InsufficientRole,

    #[error("Resource cannot be owned")]
    NotOwnable,

    #[error("Caller does not own the resource")]
    NotOwner,

    #[error("Argument must be between {min} and {max}")]
    LengthOutOfRange { min: i64, max: i64 },
}

impl DirectiveError {
    pub fn code(&self) -> &'static str {
        match self {
            DirectiveError::Unauthenticated => "UNAUTHENTICATED",
            DirectiveError::InsufficientRole => "INSUFFICIENT_ROLE",
            DirectiveError::NotOwnable => "NOT_OWNABLE",
            DirectiveError::NotOwner => "NOT_OWNER",
            DirectiveError::LengthOutOfRange { .. } => "VALIDATION_FAILED",
        }
    }

    pub fn localize(&self, localizer: &Localizer) -> String {
        match self {
            DirectiveError::Unauthenticated => localizer.t("unauthenticated"),
            DirectiveError::InsufficientRole => localizer.t("insufficient_role"),
            DirectiveError::NotOwnable => localizer.t("not_ownable"),
            DirectiveError::NotOwner => localizer.t("not_owner"),
            DirectiveError::LengthOutOfRange { min, max } => localizer.t_with(
                "argument_length_validation",
                &[("min", min.to_string()), ("max", max.to_string())],
            ),
        }
    }
}

/// Decide whether `claims` satisfy `requirement` on `resource`.
pub fn evaluate(
    requirement: Requirement,
    claims: Option<&Claims>,
    resource: &Resource,
) -> Result<(), DirectiveError> {
    match requirement {
        Requirement::Authenticated => authenticated(claims).map(|_| ()),

        Requirement::MinimumRole(required) => {
            let claims = authenticated(claims)?;
            if rank_of(claims.effective_role()) < required.rank() {
                return Err(DirectiveError::InsufficientRole);
            }
            Ok(())
        }

        Requirement::Role(RoleType::ResourceOwner) => {
            let owner_id = resource.owner_id().ok_or(DirectiveError::NotOwnable)?;
            let claims = authenticated(claims)?;
            owns(claims, owner_id)
        }

        Requirement::Role(required) => {
            let claims = authenticated(claims)?;
            if claims.effective_role() != Some(required.as_str()) {
                return Err(DirectiveError::InsufficientRole);
            }
            Ok(())
        }

        Requirement::ResourceOwnerOrElevated => {
            let claims = authenticated(claims)?;
            if claims.role.is_none() && claims.roles.is_empty() {
                return Err(DirectiveError::InsufficientRole);
            }
            if claims.has_role(RoleType::SuperAdmin) || claims.has_role(RoleType::OrganizationAdmin)
            {
                return Ok(());
            }
            let owner_id = resource.owner_id().ok_or(DirectiveError::NotOwnable)?;
            owns(claims, owner_id)
        }
    }
}

/// Range check for integer arguments. Other values pass through unchecked.
pub fn validate_length(
    min: i64,
    max: i64,
    value: &async_graphql::Value,
) -> Result<(), DirectiveError> {
    let async_graphql::Value::Number(number) = value else {
        return Ok(());
    };
    let Some(n) = number.as_i64() else {
        return Ok(());
    };
    if n < min || n > max {
        return Err(DirectiveError::LengthOutOfRange { min, max });
    }
    Ok(())
}

fn authenticated(claims: Option<&Claims>) -> Result<&Claims, DirectiveError> {
    claims.ok_or(DirectiveError::Unauthenticated)
}

fn owns(claims: &Claims, owner_id: i64) -> Result<(), DirectiveError> {
    if claims.user_id != owner_id {
        return Err(DirectiveError::NotOwner);
    }
    Ok(())
}
