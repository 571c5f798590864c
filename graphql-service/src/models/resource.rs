//! The parent object a guarded field is resolved on.
//!
//! Ownership is a property of the variant: kinds that belong to one user carry
//! that user's id, everything else has no owner.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// Query/Mutation root fields
    Root,
    User { id: i64 },
    AuthenticationProvider { user_id: i64 },
    Profile { user_id: i64 },
    PasswordReset,
}

impl Resource {
    pub fn owner_id(&self) -> Option<i64> {
        match self {
            Resource::User { id } => Some(*id),
            Resource::AuthenticationProvider { user_id } | Resource::Profile { user_id } => {
                Some(*user_id)
            }
            Resource::Root | Resource::PasswordReset => None,
        }
    }
}
