//! Three-step password reset: request, verify, complete.
//!
//! All state lives in the `password_resets` row, so each step may be served
//! by a different instance.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::{rngs::OsRng, RngCore};

use crate::config::PasswordResetConfig;
use crate::dtos::{
    CompletePasswordResetInput, RequestPasswordResetInput, ValidatePasswordResetInput,
};
use crate::models::{AuthenticationProvider, PasswordReset};
use crate::services::email::{EmailProvider, Mail};
use crate::services::error::ServiceError;
use crate::services::i18n::Localizer;
use crate::services::store::AccountStore;
use crate::utils::{hash_password, validate_input, Password};

#[derive(Clone)]
pub struct PasswordResetService {
    store: Arc<dyn AccountStore>,
    mailer: Arc<dyn EmailProvider>,
    token_ttl_hours: i64,
    reset_url: String,
}

impl PasswordResetService {
    pub fn new(
        store: Arc<dyn AccountStore>,
        mailer: Arc<dyn EmailProvider>,
        config: &PasswordResetConfig,
    ) -> Self {
        Self {
            store,
            mailer,
            token_ttl_hours: config.token_ttl_hours,
            reset_url: config.reset_url.clone(),
        }
    }

    /// Create a `sent` reset for the email provider and mail its link.
    pub async fn request(
        &self,
        input: RequestPasswordResetInput,
        localizer: &Localizer,
    ) -> Result<PasswordReset, ServiceError> {
        validate_input(&input)?;

        let provider = self
            .store
            .find_email_provider(&input.email)
            .await?
            .ok_or(ServiceError::EmailNotFound)?;

        let token = generate_reset_token();
        let created_at = Utc::now();
        let expires_at = Duration::try_hours(self.token_ttl_hours)
            .and_then(|ttl| created_at.checked_add_signed(ttl))
            .ok_or_else(|| {
                ServiceError::Internal(anyhow::anyhow!(
                    "Reset token TTL of {} hours is out of range",
                    self.token_ttl_hours
                ))
            })?;

        let reset = self
            .store
            .insert_password_reset(provider.id, &token, created_at, expires_at)
            .await?;

        tracing::info!(
            password_reset_id = reset.id,
            user_id = provider.user_id,
            "Password reset requested"
        );
        metrics::counter!("password_reset_transitions_total", "status" => "sent").increment(1);

        let reset_link = self.reset_link(&token);
        let vars = [
            ("reset_link", reset_link),
            ("hours", self.token_ttl_hours.to_string()),
        ];
        let mail = Mail {
            recipient: provider.email.clone(),
            subject: localizer.t("subject_password_reset"),
            html_body: localizer.t_with("email_password_reset", &vars),
            text_body: localizer.t_with("email_password_reset_text", &vars),
        };
        self.deliver(mail);

        Ok(reset)
    }

    /// Advance a live `sent` reset to `verified`.
    ///
    /// Unknown, expired and already verified tokens all fail the same way.
    pub async fn verify(
        &self,
        input: ValidatePasswordResetInput,
    ) -> Result<PasswordReset, ServiceError> {
        validate_input(&input)?;

        let reset = self
            .store
            .verify_password_reset(&input.token, Utc::now())
            .await?
            .ok_or(ServiceError::InvalidOrExpiredToken)?;

        tracing::info!(password_reset_id = reset.id, "Password reset token verified");
        metrics::counter!("password_reset_transitions_total", "status" => "verified").increment(1);

        Ok(reset)
    }

    /// Store the new password hash and close a `verified` reset.
    pub async fn complete(
        &self,
        input: CompletePasswordResetInput,
        localizer: &Localizer,
    ) -> Result<AuthenticationProvider, ServiceError> {
        validate_input(&input)?;

        let password_hash = hash_password(&Password::new(input.new_password))?;

        let (reset, provider) = self
            .store
            .complete_password_reset(&input.token, password_hash.as_str())
            .await?
            .ok_or(ServiceError::VerifiedTokenNotFound)?;

        tracing::info!(
            password_reset_id = reset.id,
            user_id = provider.user_id,
            "Password reset completed"
        );
        metrics::counter!("password_reset_transitions_total", "status" => "completed").increment(1);

        let mail = Mail {
            recipient: provider.email.clone(),
            subject: localizer.t("subject_password_reset_complete"),
            html_body: localizer.t("email_password_reset_complete"),
            text_body: localizer.t("email_password_reset_complete_text"),
        };
        self.deliver(mail);

        Ok(provider)
    }

    fn reset_link(&self, token: &str) -> String {
        let separator = if self.reset_url.contains('?') { '&' } else { '?' };
        format!("{}{}token={}", self.reset_url, separator, token)
    }

    /// Send in the background; a failed send never fails the mutation.
    fn deliver(&self, mail: Mail) {
        let mailer = Arc::clone(&self.mailer);
        tokio::spawn(async move {
            if let Err(e) = mailer.send(&mail).await {
                metrics::counter!("mail_send_failures_total").increment(1);
                tracing::error!(
                    error = %e,
                    email = %mail.recipient,
                    subject = %mail.subject,
                    "Failed to send mail"
                );
            }
        });
    }
}

/// 32 bytes from the OS CSPRNG, hex encoded.
fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
