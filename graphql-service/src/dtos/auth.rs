use crate::utils::RequiredFields;
use async_graphql::{InputObject, SimpleObject};
use validator::Validate;

#[derive(Debug, Clone, InputObject, Validate)]
pub struct CreateUserInput {
    #[validate(email(code = "email_validation"))]
    pub email: String,

    #[validate(length(min = 6, max = 1024, code = "length_validation"))]
    pub password: String,

    #[validate(length(min = 1, max = 255, code = "length_validation"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 255, code = "length_validation"))]
    pub last_name: String,

    #[validate(length(min = 1, max = 15, code = "length_validation"))]
    pub phone_number: String,
}

impl RequiredFields for CreateUserInput {
    fn required_fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("email", self.email.as_str()),
            ("password", self.password.as_str()),
            ("first_name", self.first_name.as_str()),
            ("last_name", self.last_name.as_str()),
            ("phone_number", self.phone_number.as_str()),
        ]
    }
}

#[derive(Debug, Clone, InputObject, Validate)]
pub struct AuthUserInput {
    #[validate(email(code = "email_validation"))]
    pub email: String,

    #[validate(length(min = 6, max = 1024, code = "length_validation"))]
    pub password: String,
}

impl RequiredFields for AuthUserInput {
    fn required_fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("email", self.email.as_str()),
            ("password", self.password.as_str()),
        ]
    }
}

/// Session token returned by `createUser` and `authUser`.
#[derive(Debug, Clone, SimpleObject)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub token: String,
}
