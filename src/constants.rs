/// Invitations stay actionable for 7 days after creation
pub const INVITATION_TTL_MILLIS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Random bytes behind every invitation and share-link token
/// 32 bytes encode to 43 URL-safe base64 characters
pub const TOKEN_BYTES: usize = 32;

/// Maximum length of a vault display name
pub const MAX_VAULT_NAME_LEN: usize = 100;

/// Maximum length of a vault item title
pub const MAX_ITEM_TITLE_LEN: usize = 200;

/// Maximum length of an identity forwarded by the identity provider
pub const MAX_ACTOR_ID_LEN: usize = 128;

/// Header carrying the authenticated caller's user id
pub const ACTOR_HEADER: &str = "x-user-id";

/// Header carrying the authenticated caller's email address
pub const ACTOR_EMAIL_HEADER: &str = "x-user-email";

/// Separator for composite `{vault_id}/{child_id}` keys
pub const KEY_SEPARATOR: char = '/';

// =============================================================================
// Error Messages
// =============================================================================

/// Error message for a missing or malformed identity header
pub const ERR_INVALID_ACTOR_ID: &str = "Invalid user identity";

/// Error message for malformed email addresses
pub const ERR_INVALID_EMAIL: &str = "Invalid email address";

/// Error message for invitation roles other than edit/view
pub const ERR_INVALID_INVITATION_ROLE: &str = "Invitation role must be 'edit' or 'view'";

/// Error message for inviting into a personal vault
pub const ERR_PERSONAL_VAULT_SHARING: &str = "Personal vaults cannot have members";

/// Error message for timestamps that are not RFC 3339
pub const ERR_INVALID_TIMESTAMP: &str = "Timestamp must be an RFC 3339 date-time";
