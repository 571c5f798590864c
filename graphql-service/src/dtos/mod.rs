pub mod auth;
pub mod password_reset;

pub use auth::{AuthUserInput, AuthenticatedUser, CreateUserInput};
pub use password_reset::{
    CompletePasswordResetInput, RequestPasswordResetInput, ValidatePasswordResetInput,
};
