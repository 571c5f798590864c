//! Role model - a fixed, totally ordered privilege ladder.

use async_graphql::Enum;
use std::str::FromStr;

/// Role types, highest privilege first.
#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[graphql(rename_items = "SCREAMING_SNAKE_CASE")]
pub enum RoleType {
    SuperAdmin,
    OrganizationAdmin,
    OrganizationMember,
    ResourceOwner,
    User,
}

impl RoleType {
    pub const ALL: [RoleType; 5] = [
        RoleType::SuperAdmin,
        RoleType::OrganizationAdmin,
        RoleType::OrganizationMember,
        RoleType::ResourceOwner,
        RoleType::User,
    ];

    /// Privilege rank; higher outranks lower.
    pub fn rank(&self) -> u8 {
        match self {
            RoleType::SuperAdmin => 50,
            RoleType::OrganizationAdmin => 40,
            RoleType::OrganizationMember => 30,
            RoleType::ResourceOwner => 20,
            RoleType::User => 10,
        }
    }

    /// Wire name as stored in `roles.role_type` and in token claims.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleType::SuperAdmin => "SUPER_ADMIN",
            RoleType::OrganizationAdmin => "ORGANIZATION_ADMIN",
            RoleType::OrganizationMember => "ORGANIZATION_MEMBER",
            RoleType::ResourceOwner => "RESOURCE_OWNER",
            RoleType::User => "USER",
        }
    }

    /// Highest-ranked role among `roles`, if any.
    pub fn highest<'a, I>(roles: I) -> Option<RoleType>
    where
        I: IntoIterator<Item = &'a RoleType>,
    {
        roles.into_iter().copied().max_by_key(RoleType::rank)
    }
}

impl FromStr for RoleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoleType::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("Unknown role type: {}", s))
    }
}

impl std::fmt::Display for RoleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rank of a role claim string. Unknown or missing claims rank 0.
pub fn rank_of(claim: Option<&str>) -> u8 {
    claim
        .and_then(|c| c.parse::<RoleType>().ok())
        .map(|r| r.rank())
        .unwrap_or(0)
}
