//! User roles and role gates
//!
//! Every protected endpoint resolves the bearer token to a User record and
//! checks the record's role against the endpoint's allowed set. Employees
//! never gain manager surface by manipulating request filters; list
//! endpoints re-scope server-side (see routes::tasks).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::HomefrontError;

/// User role stored on the User document and embedded in JWT claims
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Manager,
    #[default]
    Employee,
    Guest,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Manager => write!(f, "manager"),
            Role::Employee => write!(f, "employee"),
            Role::Guest => write!(f, "guest"),
        }
    }
}

impl Role {
    /// Parse a role from its wire representation
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "manager" => Some(Role::Manager),
            "employee" => Some(Role::Employee),
            "guest" => Some(Role::Guest),
            _ => None,
        }
    }
}

/// Reject callers whose role is not in the allowed set
pub fn require_role(role: Role, allowed: &[Role]) -> Result<(), HomefrontError> {
    if allowed.contains(&role) {
        Ok(())
    } else {
        Err(HomefrontError::Authorization(
            "Access denied: Insufficient permissions".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manager_only_gate() {
        assert!(require_role(Role::Manager, &[Role::Manager]).is_ok());
        assert!(require_role(Role::Employee, &[Role::Manager]).is_err());
        assert!(require_role(Role::Guest, &[Role::Manager]).is_err());
    }

    #[test]
    fn test_shared_gate() {
        let allowed = [Role::Manager, Role::Employee];
        assert!(require_role(Role::Manager, &allowed).is_ok());
        assert!(require_role(Role::Employee, &allowed).is_ok());
        assert!(require_role(Role::Guest, &allowed).is_err());
    }

    #[test]
    fn test_parse_roundtrip() {
        for role in [Role::Manager, Role::Employee, Role::Guest] {
            assert_eq!(Role::parse(&role.to_string()), Some(role));
        }
        assert_eq!(Role::parse("admin"), None);
    }

    #[test]
    fn test_serde_wire_format() {
        assert_eq!(serde_json::to_string(&Role::Manager).unwrap(), "\"manager\"");
        let parsed: Role = serde_json::from_str("\"employee\"").unwrap();
        assert_eq!(parsed, Role::Employee);
    }
}
