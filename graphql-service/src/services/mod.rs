//! Business logic: account and password-reset workflows, the authorization
//! evaluator, and their collaborators (store, mail, i18n, JWT).

pub mod accounts;
pub mod authz;
pub mod email;
pub mod error;
pub mod i18n;
pub mod jwt;
pub mod password_reset;
pub mod store;

pub use accounts::AccountService;
pub use authz::{evaluate, validate_length, DirectiveError, Requirement};
pub use email::{EmailProvider, LogEmailService, Mail, MockEmailService, SmtpEmailService};
pub use error::ServiceError;
pub use i18n::{Catalog, Locale, Localizer};
pub use jwt::{Claims, JwtService};
pub use password_reset::PasswordResetService;
pub use store::{AccountStore, MockStore, PgStore};
