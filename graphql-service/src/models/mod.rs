pub mod auth_token;
pub mod authentication_provider;
pub mod password_reset;
pub mod profile;
pub mod resource;
pub mod role;
pub mod user;

pub use auth_token::AuthToken;
pub use authentication_provider::{AuthenticationProvider, ProviderType};
pub use password_reset::{PasswordReset, PasswordResetStatus};
pub use profile::Profile;
pub use resource::Resource;
pub use role::{rank_of, RoleType};
pub use user::{NewAccount, User};
