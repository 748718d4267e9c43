use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{auth::AuthUser, error::AppError};

/// Role
///
/// The closed set of roles a profile can hold. Variants are declared from the least to the
/// most privileged, so the derived `Ord` is the privilege order:
/// `User < Moderator < Manager < Admin`.
///
/// Roles travel as lowercase strings (`"user"`, `"moderator"`, ...). Any other string stored
/// against a profile does not parse, and the identity is then treated as having no role at all.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    User,
    Moderator,
    Manager,
    Admin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::User, Role::Moderator, Role::Manager, Role::Admin];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }

    /// Parses the wire/database representation. Exact match only: `"Admin"` or `" admin"`
    /// are not roles.
    pub fn parse(value: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|role| role.as_str() == value)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requirement
///
/// How a capability constrains the caller's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// The role must be this level or higher.
    AtLeast(Role),
    /// The role must be exactly this one.
    Exactly(Role),
}

impl Requirement {
    pub fn admits(self, role: Role) -> bool {
        match self {
            Requirement::AtLeast(min) => role >= min,
            Requirement::Exactly(only) => role == only,
        }
    }
}

/// Capability
///
/// A named permission level attached to an operation. Handlers never compare roles directly;
/// they ask for a capability and the evaluator decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Any signed-in profile with a recognised role.
    Member,
    /// Review queue and review moderation.
    ModerateReviews,
    /// Providers, tariffs and logo uploads.
    ManageCatalog,
    /// The lead inbox.
    ManageLeads,
    /// Stats, user administration and data migrations.
    AdminOnly,
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::Member,
        Capability::ModerateReviews,
        Capability::ManageCatalog,
        Capability::ManageLeads,
        Capability::AdminOnly,
    ];

    pub const fn requirement(self) -> Requirement {
        match self {
            Capability::Member => Requirement::AtLeast(Role::User),
            Capability::ModerateReviews => Requirement::AtLeast(Role::Moderator),
            Capability::ManageCatalog | Capability::ManageLeads => {
                Requirement::AtLeast(Role::Manager)
            }
            Capability::AdminOnly => Requirement::Exactly(Role::Admin),
        }
    }
}

/// is_authorized
///
/// The single access-policy predicate. Total over every input: an absent (or unrecognised)
/// role is denied everything.
pub fn is_authorized(role: Option<Role>, capability: Capability) -> bool {
    match role {
        Some(role) => capability.requirement().admits(role),
        None => false,
    }
}

/// require
///
/// Handler-facing guard around [`is_authorized`]. The caller is already authenticated at this
/// point, so a denial is always `403 Forbidden`, never `401`.
pub fn require(user: &AuthUser, capability: Capability) -> Result<(), AppError> {
    if is_authorized(user.role, capability) {
        return Ok(());
    }
    tracing::warn!(
        user_id = %user.id,
        role = ?user.role,
        capability = ?capability,
        "access denied"
    );
    Err(AppError::Forbidden)
}
