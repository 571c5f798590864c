use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use std::sync::Mutex;
use std::time::Duration;

use crate::config::MailConfig;

/// A fully rendered transactional mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

impl Mail {
    pub fn validate(&self) -> Result<(), AppError> {
        let missing: Vec<&str> = [
            ("recipient", &self.recipient),
            ("subject", &self.subject),
            ("html_body", &self.html_body),
            ("text_body", &self.text_body),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::EmailError(format!(
                "Mail is missing {}",
                missing.join(", ")
            )))
        }
    }
}

#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send(&self, mail: &Mail) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct SmtpEmailService {
    mailer: SmtpTransport,
    from_email: String,
}

impl SmtpEmailService {
    pub fn new(config: &MailConfig) -> Result<Self, AppError> {
        let creds = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().clone(),
        );

        let mailer = SmtpTransport::starttls_relay(&config.smtp_host)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!(e.to_string())))?
            .credentials(creds)
            .port(config.smtp_port)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        tracing::info!(host = %config.smtp_host, port = config.smtp_port, "SMTP mail service initialized");

        Ok(Self {
            mailer,
            from_email: config.from.clone(),
        })
    }
}

#[async_trait]
impl EmailProvider for SmtpEmailService {
    async fn send(&self, mail: &Mail) -> Result<(), AppError> {
        mail.validate()?;

        let email = Message::builder()
            .from(
                self.from_email
                    .parse()
                    .map_err(|e: lettre::address::AddressError| AppError::InternalError(e.into()))?,
            )
            .to(mail
                .recipient
                .parse()
                .map_err(|e: lettre::address::AddressError| AppError::EmailError(e.to_string()))?)
            .subject(mail.subject.as_str())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(mail.text_body.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(mail.html_body.clone()),
                    ),
            )?;

        // SmtpTransport is blocking
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::InternalError(e.into()))?;

        match result {
            Ok(_) => {
                tracing::info!(to = %mail.recipient, subject = %mail.subject, "Email sent");
                Ok(())
            }
            Err(e) => Err(AppError::EmailError(e.to_string())),
        }
    }
}

/// Logs mail instead of delivering it. Used when `MAIL_ENABLED=false`.
#[derive(Clone, Default)]
pub struct LogEmailService;

#[async_trait]
impl EmailProvider for LogEmailService {
    async fn send(&self, mail: &Mail) -> Result<(), AppError> {
        mail.validate()?;
        tracing::info!(
            to = %mail.recipient,
            subject = %mail.subject,
            body = %mail.text_body,
            "Mail delivery disabled, logging instead"
        );
        Ok(())
    }
}

/// Records every mail; can be switched to fail to exercise error paths.
#[derive(Default)]
pub struct MockEmailService {
    sent: Mutex<Vec<Mail>>,
    fail: bool,
}

impl MockEmailService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<Mail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Polls until `count` mails were delivered or half a second passes.
    pub async fn wait_for(&self, count: usize) -> Vec<Mail> {
        for _ in 0..100 {
            let sent = self.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        self.sent()
    }
}

#[async_trait]
impl EmailProvider for MockEmailService {
    async fn send(&self, mail: &Mail) -> Result<(), AppError> {
        mail.validate()?;
        if self.fail {
            return Err(AppError::EmailError("SMTP connection refused".to_string()));
        }
        self.sent
            .lock()
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Mock mailer mutex poisoned: {}", e)))?
            .push(mail.clone());
        Ok(())
    }
}
