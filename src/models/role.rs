use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Permission level on a vault
///
/// Variants are declared in ascending order so the derived `Ord` gives the
/// lattice `owner ⊇ edit ⊇ view`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    View,
    Edit,
    Owner,
}

impl Role {
    /// Whether this role grants at least `required`
    pub fn allows(self, required: Role) -> bool {
        self >= required
    }

    /// Roles that may be handed out through invitations and role changes
    pub fn is_grantable(self) -> bool {
        matches!(self, Role::Edit | Role::View)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::View => "view",
            Role::Edit => "edit",
            Role::Owner => "owner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(Role::View),
            "edit" => Ok(Role::Edit),
            "owner" => Ok(Role::Owner),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_lattice() {
        assert!(Role::Owner.allows(Role::Edit));
        assert!(Role::Owner.allows(Role::View));
        assert!(Role::Edit.allows(Role::View));
        assert!(Role::Edit.allows(Role::Edit));
        assert!(!Role::Edit.allows(Role::Owner));
        assert!(!Role::View.allows(Role::Edit));
    }

    #[test]
    fn test_grantable_roles() {
        assert!(Role::Edit.is_grantable());
        assert!(Role::View.is_grantable());
        assert!(!Role::Owner.is_grantable());
    }

    #[test]
    fn test_parse_role() {
        assert_eq!("edit".parse::<Role>(), Ok(Role::Edit));
        assert_eq!("owner".parse::<Role>(), Ok(Role::Owner));
        assert!("admin".parse::<Role>().is_err());
        assert!("Edit".parse::<Role>().is_err());
    }
}
