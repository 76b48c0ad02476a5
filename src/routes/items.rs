use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::error::Result;
use crate::models::{NewVaultItem, VaultItem, VaultItemUpdate};
use crate::routes::validation::{now_millis, timestamp_to_rfc3339, Actor};
use crate::routes::vaults::DeletedResponse;
use crate::services::items;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: String,
    pub vault_id: String,
    pub title: String,
    pub username: Option<String>,
    pub password: String,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
    pub created_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<VaultItem> for ItemResponse {
    fn from(item: VaultItem) -> Self {
        Self {
            id: item.id,
            vault_id: item.vault_id,
            title: item.title,
            username: item.username,
            password: item.password,
            notes: item.notes,
            tags: item.tags,
            created_by: item.created_by,
            created_at: timestamp_to_rfc3339(item.created_at),
            updated_at: timestamp_to_rfc3339(item.updated_at),
        }
    }
}

/// GET /api/vaults/:vault_id/items
pub async fn list_items(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(vault_id): Path<String>,
) -> Result<Json<Vec<ItemResponse>>> {
    let db = state.db.clone();
    let rows =
        tokio::task::spawn_blocking(move || items::list_items(&db, &vault_id, &actor)).await??;

    Ok(Json(rows.into_iter().map(ItemResponse::from).collect()))
}

/// POST /api/vaults/:vault_id/items
pub async fn create_item(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(vault_id): Path<String>,
    Json(payload): Json<NewVaultItem>,
) -> Result<Json<ItemResponse>> {
    let db = state.db.clone();
    let item = tokio::task::spawn_blocking(move || {
        items::create_item(&db, &vault_id, &actor, payload, now_millis())
    })
    .await??;

    Ok(Json(ItemResponse::from(item)))
}

/// PATCH /api/vaults/:vault_id/items/:item_id
pub async fn update_item(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path((vault_id, item_id)): Path<(String, String)>,
    Json(payload): Json<VaultItemUpdate>,
) -> Result<Json<ItemResponse>> {
    let db = state.db.clone();
    let item = tokio::task::spawn_blocking(move || {
        items::update_item(&db, &vault_id, &item_id, &actor, payload, now_millis())
    })
    .await??;

    Ok(Json(ItemResponse::from(item)))
}

/// DELETE /api/vaults/:vault_id/items/:item_id
pub async fn delete_item(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path((vault_id, item_id)): Path<(String, String)>,
) -> Result<Json<DeletedResponse>> {
    let db = state.db.clone();
    tokio::task::spawn_blocking(move || items::delete_item(&db, &vault_id, &item_id, &actor))
        .await??;

    Ok(Json(DeletedResponse { success: true }))
}
