use serde::{Deserialize, Serialize};

use super::Role;

/// Explicit (vault, user) grant for family and team vaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultMember {
    pub vault_id: String,
    pub user_id: String,
    pub role: Role,
    pub joined_at: i64,
}
