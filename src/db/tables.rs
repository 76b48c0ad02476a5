use redb::TableDefinition;

/// Vaults table: vault_id -> Vault (serialized)
pub const VAULTS: TableDefinition<&str, &[u8]> = TableDefinition::new("vaults");

/// Vault members table: "{vault_id}/{user_id}" -> VaultMember (serialized)
pub const VAULT_MEMBERS: TableDefinition<&str, &[u8]> = TableDefinition::new("vault_members");

/// User vaults index: "{user_id}/{vault_id}" -> vault_id
/// Covers owned vaults as well as memberships
pub const USER_VAULTS: TableDefinition<&str, &str> = TableDefinition::new("user_vaults");

/// Vault items table: "{vault_id}/{item_id}" -> VaultItem (serialized)
pub const VAULT_ITEMS: TableDefinition<&str, &[u8]> = TableDefinition::new("vault_items");

/// Invitations table: invitation_id -> Invitation (serialized)
pub const INVITATIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("vault_invitations");

/// Invitation token index: token -> invitation_id
pub const INVITATION_TOKENS: TableDefinition<&str, &str> =
    TableDefinition::new("invitation_tokens");

/// Vault invitations index: "{vault_id}/{invitation_id}" -> invitation_id
/// Used for listing and cascade delete
pub const VAULT_INVITATIONS: TableDefinition<&str, &str> =
    TableDefinition::new("vault_invitation_index");

/// Email invitations index: "{email}/{invitation_id}" -> invitation_id
pub const EMAIL_INVITATIONS: TableDefinition<&str, &str> =
    TableDefinition::new("email_invitation_index");

/// Share links table: token -> ShareLink (serialized)
pub const SHARE_LINKS: TableDefinition<&str, &[u8]> = TableDefinition::new("shared_links");

/// Vault share links index: "{vault_id}/{token}" -> token
/// Used for listing and cascade delete
pub const VAULT_SHARE_LINKS: TableDefinition<&str, &str> =
    TableDefinition::new("vault_share_link_index");
