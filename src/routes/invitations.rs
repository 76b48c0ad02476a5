use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Invitation, InvitationStatus, PendingInvitation, Role, VaultType};
use crate::routes::members::MemberResponse;
use crate::routes::validation::{now_millis, timestamp_to_rfc3339, Actor, ActorEmail};
use crate::routes::vaults::DeletedResponse;
use crate::services::invitations;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateInvitationRequest {
    pub email: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct InvitationResponse {
    pub id: String,
    pub vault_id: String,
    pub email: String,
    pub role: Role,
    pub token: String,
    pub accepted: bool,
    pub status: InvitationStatus,
    pub expires_at: String,
    pub created_at: String,
}

impl InvitationResponse {
    fn new(invitation: Invitation, now: i64) -> Self {
        Self {
            status: invitation.status(now),
            id: invitation.id,
            vault_id: invitation.vault_id,
            email: invitation.email,
            role: invitation.role,
            token: invitation.token,
            accepted: invitation.accepted,
            expires_at: timestamp_to_rfc3339(invitation.expires_at),
            created_at: timestamp_to_rfc3339(invitation.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VaultSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub vault_type: VaultType,
}

#[derive(Debug, Serialize)]
pub struct PendingInvitationResponse {
    #[serde(flatten)]
    pub invitation: InvitationResponse,
    pub vault: VaultSummary,
}

impl PendingInvitationResponse {
    fn new(pending: PendingInvitation, now: i64) -> Self {
        Self {
            invitation: InvitationResponse::new(pending.invitation, now),
            vault: VaultSummary {
                name: pending.vault_name,
                vault_type: pending.vault_type,
            },
        }
    }
}

/// Invite an email address into a vault
///
/// POST /api/vaults/:vault_id/invitations
pub async fn create_invitation(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(vault_id): Path<String>,
    Json(payload): Json<CreateInvitationRequest>,
) -> Result<Json<InvitationResponse>> {
    let role: Role = payload.role.parse().map_err(AppError::Validation)?;

    let db = state.db.clone();
    let now = now_millis();
    let invitation = tokio::task::spawn_blocking(move || {
        invitations::create_invitation(&db, &vault_id, &payload.email, role, &actor, now)
    })
    .await??;

    Ok(Json(InvitationResponse::new(invitation, now)))
}

/// GET /api/vaults/:vault_id/invitations
pub async fn list_invitations(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(vault_id): Path<String>,
) -> Result<Json<Vec<InvitationResponse>>> {
    let db = state.db.clone();
    let rows = tokio::task::spawn_blocking(move || {
        invitations::list_invitations(&db, &vault_id, &actor)
    })
    .await??;

    let now = now_millis();
    Ok(Json(
        rows.into_iter()
            .map(|invitation| InvitationResponse::new(invitation, now))
            .collect(),
    ))
}

/// DELETE /api/invitations/:invitation_id
pub async fn revoke_invitation(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(invitation_id): Path<String>,
) -> Result<Json<DeletedResponse>> {
    let db = state.db.clone();
    tokio::task::spawn_blocking(move || {
        invitations::revoke_invitation(&db, &invitation_id, &actor)
    })
    .await??;

    Ok(Json(DeletedResponse { success: true }))
}

/// Pending invitations addressed to the caller's email
///
/// GET /api/me/invitations
pub async fn my_invitations(
    State(state): State<AppState>,
    ActorEmail(email): ActorEmail,
) -> Result<Json<Vec<PendingInvitationResponse>>> {
    let db = state.db.clone();
    let now = now_millis();
    let rows = tokio::task::spawn_blocking(move || {
        invitations::pending_invitations_for_email(&db, &email, now)
    })
    .await??;

    Ok(Json(
        rows.into_iter()
            .map(|pending| PendingInvitationResponse::new(pending, now))
            .collect(),
    ))
}

/// Look up an invitation by token before accepting it
///
/// GET /api/invite/:token
pub async fn lookup_invitation(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<PendingInvitationResponse>> {
    let db = state.db.clone();
    let now = now_millis();
    let pending = tokio::task::spawn_blocking(move || {
        invitations::describe_invitation(&db, &token, now)
    })
    .await??;

    Ok(Json(PendingInvitationResponse::new(pending, now)))
}

/// Accept an invitation as the caller
///
/// POST /api/invite/:token/accept
pub async fn accept_invitation(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(token): Path<String>,
) -> Result<Json<MemberResponse>> {
    let db = state.db.clone();
    let member = tokio::task::spawn_blocking(move || {
        invitations::accept_invitation(&db, &token, &actor, now_millis())
    })
    .await??;

    Ok(Json(MemberResponse::from(member)))
}
