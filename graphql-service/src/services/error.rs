use crate::services::authz::DirectiveError;
use crate::services::i18n::Localizer;
use async_graphql::ErrorExtensions;
use thiserror::Error;

/// One failing input field, identified by its message keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Input field name, also the i18n key of its display noun
    pub field: String,
    /// i18n key of the message, e.g. `required` or `length_validation`
    pub code: String,
    pub min: Option<u64>,
    pub max: Option<u64>,
}

impl FieldError {
    pub fn new(field: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            min: None,
            max: None,
        }
    }

    pub fn with_bounds(mut self, min: Option<u64>, max: Option<u64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn localize(&self, localizer: &Localizer) -> String {
        let vars: Vec<(&str, String)> = [("min", self.min), ("max", self.max)]
            .into_iter()
            .filter_map(|(name, v)| v.map(|v| (name, v.to_string())))
            .collect();
        format!(
            "{}: {}",
            localizer.t(&self.field),
            localizer.t_with(&self.code, &vars)
        )
    }
}

/// Every failing field of one input, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(pub Vec<FieldError>);

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&FieldError> {
        self.0.iter().find(|e| e.field == field)
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.code))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Email not found")]
    EmailNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired password reset token")]
    InvalidOrExpiredToken,

    #[error("Verified password reset token not found")]
    VerifiedTokenNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error(transparent)]
    Directive(#[from] DirectiveError),

    #[error("Database error: {0}")]
    Database(anyhow::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Database(anyhow::Error::new(err))
    }
}

impl ServiceError {
    /// Stable machine-readable code placed in the GraphQL error extensions.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "VALIDATION_FAILED",
            ServiceError::EmailAlreadyExists => "CONFLICT",
            ServiceError::EmailNotFound | ServiceError::UserNotFound => "NOT_FOUND",
            ServiceError::InvalidCredentials => "INVALID_CREDENTIALS",
            ServiceError::InvalidOrExpiredToken => "INVALID_OR_EXPIRED_TOKEN",
            ServiceError::VerifiedTokenNotFound => "VERIFIED_TOKEN_NOT_FOUND",
            ServiceError::Directive(e) => e.code(),
            ServiceError::Database(_) | ServiceError::Internal(_) => "INTERNAL",
        }
    }

    /// Convert into a localized GraphQL field error.
    ///
    /// Database and internal failures are logged here and reported generically.
    pub fn into_graphql(self, localizer: &Localizer) -> async_graphql::Error {
        let code = self.code();
        let message = match &self {
            ServiceError::Validation(errors) => errors
                .0
                .iter()
                .map(|e| e.localize(localizer))
                .collect::<Vec<_>>()
                .join("; "),
            ServiceError::EmailAlreadyExists => localizer.t("email_already_exists"),
            ServiceError::EmailNotFound => localizer.t("email_not_found"),
            ServiceError::InvalidCredentials => localizer.t("email_or_password_is_incorrect"),
            ServiceError::InvalidOrExpiredToken => localizer.t("invalid_password_reset_token"),
            ServiceError::VerifiedTokenNotFound => localizer.t("verified_token_not_found"),
            ServiceError::UserNotFound => localizer.t("user_not_found"),
            ServiceError::Directive(e) => e.localize(localizer),
            ServiceError::Database(e) | ServiceError::Internal(e) => {
                tracing::error!(error = %e, "Request failed");
                localizer.t("internal_error")
            }
        };

        let mut err = async_graphql::Error::new(message);
        err = err.extend_with(|_, ext| ext.set("code", code));

        if let ServiceError::Validation(errors) = &self {
            let fields = async_graphql::Value::Object(
                errors
                    .0
                    .iter()
                    .map(|e| {
                        (
                            async_graphql::Name::new(&e.field),
                            async_graphql::Value::String(e.localize(localizer)),
                        )
                    })
                    .collect(),
            );
            err = err.extend_with(|_, ext| ext.set("fields", fields));
        }

        err
    }
}
