use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Role, Vault, VaultListing, VaultType};
use crate::routes::validation::{now_millis, timestamp_to_rfc3339, Actor};
use crate::services::vaults;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateVaultRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub vault_type: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameVaultRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct VaultResponse {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub vault_type: VaultType,
    pub owner_id: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_count: Option<u64>,
}

impl From<Vault> for VaultResponse {
    fn from(vault: Vault) -> Self {
        Self {
            id: vault.id,
            name: vault.name,
            vault_type: vault.vault_type,
            owner_id: vault.owner_id,
            created_at: timestamp_to_rfc3339(vault.created_at),
            updated_at: timestamp_to_rfc3339(vault.updated_at),
            user_role: None,
            member_count: None,
        }
    }
}

impl From<VaultListing> for VaultResponse {
    fn from(listing: VaultListing) -> Self {
        Self {
            user_role: Some(listing.user_role),
            member_count: Some(listing.member_count),
            ..VaultResponse::from(listing.vault)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub success: bool,
}

/// List every vault the caller owns or belongs to
///
/// GET /api/vaults
pub async fn list_vaults(
    State(state): State<AppState>,
    Actor(actor): Actor,
) -> Result<Json<Vec<VaultResponse>>> {
    let db = state.db.clone();
    let listings = tokio::task::spawn_blocking(move || vaults::list_vaults(&db, &actor)).await??;

    Ok(Json(listings.into_iter().map(VaultResponse::from).collect()))
}

/// Create a vault owned by the caller
///
/// POST /api/vaults
pub async fn create_vault(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(payload): Json<CreateVaultRequest>,
) -> Result<Json<VaultResponse>> {
    let vault_type: VaultType = payload.vault_type.parse().map_err(AppError::Validation)?;

    let db = state.db.clone();
    let vault = tokio::task::spawn_blocking(move || {
        vaults::create_vault(&db, &actor, &payload.name, vault_type, now_millis())
    })
    .await??;

    Ok(Json(VaultResponse {
        user_role: Some(Role::Owner),
        member_count: Some(1),
        ..VaultResponse::from(vault)
    }))
}

/// GET /api/vaults/:vault_id
pub async fn get_vault(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(vault_id): Path<String>,
) -> Result<Json<VaultResponse>> {
    let db = state.db.clone();
    let (vault, role) =
        tokio::task::spawn_blocking(move || vaults::get_vault(&db, &vault_id, &actor)).await??;

    Ok(Json(VaultResponse {
        user_role: Some(role),
        ..VaultResponse::from(vault)
    }))
}

/// PATCH /api/vaults/:vault_id
pub async fn rename_vault(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(vault_id): Path<String>,
    Json(payload): Json<RenameVaultRequest>,
) -> Result<Json<VaultResponse>> {
    let db = state.db.clone();
    let vault = tokio::task::spawn_blocking(move || {
        vaults::rename_vault(&db, &vault_id, &actor, &payload.name, now_millis())
    })
    .await??;

    Ok(Json(VaultResponse::from(vault)))
}

/// Delete a vault with all of its members, items, invitations and share links
///
/// DELETE /api/vaults/:vault_id
pub async fn delete_vault(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(vault_id): Path<String>,
) -> Result<Json<DeletedResponse>> {
    let db = state.db.clone();
    tokio::task::spawn_blocking(move || vaults::delete_vault(&db, &vault_id, &actor)).await??;

    Ok(Json(DeletedResponse { success: true }))
}
