use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Role, VaultMember};
use crate::routes::validation::{timestamp_to_rfc3339, Actor};
use crate::routes::vaults::DeletedResponse;
use crate::services::members;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub vault_id: String,
    pub user_id: String,
    pub role: Role,
    pub joined_at: String,
}

impl From<VaultMember> for MemberResponse {
    fn from(member: VaultMember) -> Self {
        Self {
            vault_id: member.vault_id,
            user_id: member.user_id,
            role: member.role,
            joined_at: timestamp_to_rfc3339(member.joined_at),
        }
    }
}

/// GET /api/vaults/:vault_id/members
pub async fn list_members(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(vault_id): Path<String>,
) -> Result<Json<Vec<MemberResponse>>> {
    let db = state.db.clone();
    let rows = tokio::task::spawn_blocking(move || members::list_members(&db, &vault_id, &actor))
        .await??;

    Ok(Json(rows.into_iter().map(MemberResponse::from).collect()))
}

/// PATCH /api/vaults/:vault_id/members/:user_id
pub async fn update_member(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path((vault_id, user_id)): Path<(String, String)>,
    Json(payload): Json<UpdateMemberRequest>,
) -> Result<Json<MemberResponse>> {
    let role: Role = payload.role.parse().map_err(AppError::Validation)?;

    let db = state.db.clone();
    let member = tokio::task::spawn_blocking(move || {
        members::update_member_role(&db, &vault_id, &actor, &user_id, role)
    })
    .await??;

    Ok(Json(MemberResponse::from(member)))
}

/// DELETE /api/vaults/:vault_id/members/:user_id
pub async fn remove_member(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path((vault_id, user_id)): Path<(String, String)>,
) -> Result<Json<DeletedResponse>> {
    let db = state.db.clone();
    tokio::task::spawn_blocking(move || members::remove_member(&db, &vault_id, &actor, &user_id))
        .await??;

    Ok(Json(DeletedResponse { success: true }))
}
