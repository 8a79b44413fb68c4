//! Role-based authorization
//!
//! HTTP handlers consult this module before privileged operations. The
//! judging pipeline itself never looks at roles.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{
    constants::roles,
    error::{AppError, AppResult},
};

/// Role carried in the bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Author,
    Participant,
}

/// Privileged operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Publish new challenges
    AuthorChallenge,
    DeleteChallenge,
    /// Read submissions and verdicts of other users
    ViewAllSubmissions,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => roles::ADMIN,
            Self::Author => roles::AUTHOR,
            Self::Participant => roles::PARTICIPANT,
        }
    }

    /// Whether this role grants the permission
    pub fn can(&self, permission: Permission) -> bool {
        match (self, permission) {
            (Self::Admin, _) => true,
            (Self::Author, Permission::AuthorChallenge) => true,
            _ => false,
        }
    }

    /// Fail with `Forbidden` unless this role grants the permission
    pub fn require(&self, permission: Permission) -> AppResult<()> {
        if self.can(permission) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Role '{}' is not allowed to {}",
                self.as_str(),
                permission.describe()
            )))
        }
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            roles::ADMIN => Ok(Self::Admin),
            roles::AUTHOR => Ok(Self::Author),
            roles::PARTICIPANT => Ok(Self::Participant),
            _ => Err(AppError::InvalidToken),
        }
    }
}

impl Permission {
    fn describe(&self) -> &'static str {
        match self {
            Self::AuthorChallenge => "author challenges",
            Self::DeleteChallenge => "delete challenges",
            Self::ViewAllSubmissions => "view other users' submissions",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_permissions() {
        assert!(Role::Admin.can(Permission::DeleteChallenge));
        assert!(Role::Admin.can(Permission::ViewAllSubmissions));
        assert!(Role::Author.can(Permission::AuthorChallenge));
        assert!(!Role::Author.can(Permission::DeleteChallenge));
        assert!(!Role::Participant.can(Permission::AuthorChallenge));
    }

    #[test]
    fn test_require_returns_forbidden() {
        let err = Role::Participant
            .require(Permission::ViewAllSubmissions)
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(Role::Author.require(Permission::AuthorChallenge).is_ok());
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        assert!("organizer".parse::<Role>().is_err());
        assert_eq!("author".parse::<Role>().unwrap(), Role::Author);
    }
}
