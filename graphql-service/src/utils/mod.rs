pub mod password;
pub mod validation;

pub use password::{
    hash_password, verify_password, verify_without_account, Password, PasswordHashString,
};
pub use validation::{validate_input, RequiredFields};
