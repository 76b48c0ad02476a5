pub mod invitation;
pub mod item;
pub mod member;
pub mod role;
pub mod share_link;
pub mod vault;

pub use invitation::{Invitation, InvitationStatus, PendingInvitation};
pub use item::{NewVaultItem, SharedItem, VaultItem, VaultItemUpdate};
pub use member::VaultMember;
pub use role::Role;
pub use share_link::{ShareLink, ShareLinkOptions, ShareLinkStatus, ShareLinkSummary, SharedView};
pub use vault::{Vault, VaultListing, VaultType};
