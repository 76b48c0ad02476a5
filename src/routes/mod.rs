pub mod health;
pub mod invitations;
pub mod items;
pub mod members;
pub mod share_links;
pub mod validation;
pub mod vaults;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::AppState;

pub use health::health_check;
pub use validation::{now_millis, timestamp_to_rfc3339, Actor, ActorEmail};

/// Every HTTP route of the server, bound to `state`
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/vaults",
            get(vaults::list_vaults).post(vaults::create_vault),
        )
        .route(
            "/api/vaults/:vault_id",
            get(vaults::get_vault)
                .patch(vaults::rename_vault)
                .delete(vaults::delete_vault),
        )
        .route(
            "/api/vaults/:vault_id/items",
            get(items::list_items).post(items::create_item),
        )
        .route(
            "/api/vaults/:vault_id/items/:item_id",
            patch(items::update_item).delete(items::delete_item),
        )
        .route("/api/vaults/:vault_id/members", get(members::list_members))
        .route(
            "/api/vaults/:vault_id/members/:user_id",
            patch(members::update_member).delete(members::remove_member),
        )
        .route(
            "/api/vaults/:vault_id/invitations",
            get(invitations::list_invitations).post(invitations::create_invitation),
        )
        .route(
            "/api/invitations/:invitation_id",
            delete(invitations::revoke_invitation),
        )
        .route("/api/me/invitations", get(invitations::my_invitations))
        .route("/api/invite/:token", get(invitations::lookup_invitation))
        .route(
            "/api/invite/:token/accept",
            post(invitations::accept_invitation),
        )
        .route(
            "/api/vaults/:vault_id/share-links",
            get(share_links::list_share_links).post(share_links::create_share_link),
        )
        .route(
            "/api/share-links/:token",
            delete(share_links::revoke_share_link),
        )
        .route("/api/share/:token", post(share_links::open_share_link))
        .with_state(state)
}
