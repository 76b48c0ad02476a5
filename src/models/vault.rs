use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Role;

/// Kind of vault; personal vaults can never have members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VaultType {
    Personal,
    Family,
    Team,
}

impl VaultType {
    pub fn as_str(self) -> &'static str {
        match self {
            VaultType::Personal => "personal",
            VaultType::Family => "family",
            VaultType::Team => "team",
        }
    }
}

impl fmt::Display for VaultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VaultType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "personal" => Ok(VaultType::Personal),
            "family" => Ok(VaultType::Family),
            "team" => Ok(VaultType::Team),
            other => Err(format!("Unknown vault type: {}", other)),
        }
    }
}

/// Vault record stored in redb
/// Timestamps are Unix milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vault {
    pub id: String,
    pub name: String,
    pub vault_type: VaultType,
    pub owner_id: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Vault {
    pub fn is_personal(&self) -> bool {
        self.vault_type == VaultType::Personal
    }
}

/// A vault as seen by one of its users
#[derive(Debug, Clone, PartialEq)]
pub struct VaultListing {
    pub vault: Vault,
    pub user_role: Role,
    pub member_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vault_type() {
        assert_eq!("personal".parse::<VaultType>(), Ok(VaultType::Personal));
        assert_eq!("team".parse::<VaultType>(), Ok(VaultType::Team));
        assert!("shared".parse::<VaultType>().is_err());
    }
}
