pub mod invitations;
pub mod items;
pub mod members;
pub mod roles;
pub mod share_links;
pub mod vaults;
