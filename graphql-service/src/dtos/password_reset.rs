use crate::utils::RequiredFields;
use async_graphql::InputObject;
use validator::Validate;

#[derive(Debug, Clone, InputObject, Validate)]
pub struct RequestPasswordResetInput {
    #[validate(email(code = "email_validation"))]
    pub email: String,
}

impl RequiredFields for RequestPasswordResetInput {
    fn required_fields(&self) -> Vec<(&'static str, &str)> {
        vec![("email", self.email.as_str())]
    }
}

#[derive(Debug, Clone, InputObject, Validate)]
pub struct ValidatePasswordResetInput {
    #[validate(length(min = 10, max = 100, code = "length_validation"))]
    pub token: String,
}

impl RequiredFields for ValidatePasswordResetInput {
    fn required_fields(&self) -> Vec<(&'static str, &str)> {
        vec![("token", self.token.as_str())]
    }
}

#[derive(Debug, Clone, InputObject, Validate)]
pub struct CompletePasswordResetInput {
    #[validate(length(min = 10, max = 100, code = "length_validation"))]
    pub token: String,

    #[validate(length(min = 6, max = 1024, code = "length_validation"))]
    pub new_password: String,
}

impl RequiredFields for CompletePasswordResetInput {
    fn required_fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("token", self.token.as_str()),
            ("new_password", self.new_password.as_str()),
        ]
    }
}
