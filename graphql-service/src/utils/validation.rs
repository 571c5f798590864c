use crate::services::error::{FieldError, FieldErrors, ServiceError};
use validator::{Validate, ValidationError};

/// Inputs whose string fields are all mandatory.
///
/// Blank fields report `required` instead of their format or length errors.
pub trait RequiredFields {
    /// `(field, value)` pairs in declaration order.
    fn required_fields(&self) -> Vec<(&'static str, &str)>;
}

/// Validate every field of `input`, keeping the first failure per field.
pub fn validate_input<T>(input: &T) -> Result<(), ServiceError>
where
    T: Validate + RequiredFields,
{
    let fields = input.required_fields();
    let mut errors: Vec<FieldError> = fields
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| FieldError::new(*field, "required"))
        .collect();

    if let Err(validation) = input.validate() {
        for (field, failures) in validation.field_errors() {
            let field = field.to_string();
            if errors.iter().any(|e| e.field == field) {
                continue;
            }
            if let Some(first) = failures.first() {
                errors.push(to_field_error(field, first));
            }
        }
    }

    if errors.is_empty() {
        return Ok(());
    }

    let position = |name: &str| {
        fields
            .iter()
            .position(|(field, _)| *field == name)
            .unwrap_or(usize::MAX)
    };
    errors.sort_by_key(|e| position(&e.field));

    Err(ServiceError::Validation(FieldErrors(errors)))
}

fn to_field_error(field: String, error: &ValidationError) -> FieldError {
    let bound = |name: &str| error.params.get(name).and_then(|v| v.as_u64());
    FieldError::new(field, error.code.to_string()).with_bounds(bound("min"), bound("max"))
}
