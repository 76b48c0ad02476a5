use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{ShareLinkOptions, ShareLinkStatus, ShareLinkSummary, SharedItem, SharedView, VaultType};
use crate::routes::validation::{now_millis, rfc3339_to_timestamp, timestamp_to_rfc3339, Actor};
use crate::routes::vaults::DeletedResponse;
use crate::services::share_links;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CreateShareLinkRequest {
    /// RFC3339 instant after which the link stops working
    pub expires_at: Option<String>,
    pub max_views: Option<u64>,
    pub passcode: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OpenShareLinkRequest {
    pub passcode: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ShareLinkResponse {
    pub token: String,
    pub vault_id: String,
    pub has_passcode: bool,
    pub max_views: Option<u64>,
    pub views_used: u64,
    pub expires_at: Option<String>,
    pub created_at: String,
    pub status: ShareLinkStatus,
}

impl From<ShareLinkSummary> for ShareLinkResponse {
    fn from(link: ShareLinkSummary) -> Self {
        Self {
            token: link.token,
            vault_id: link.vault_id,
            has_passcode: link.has_passcode,
            max_views: link.max_views,
            views_used: link.views_used,
            expires_at: link.expires_at.map(timestamp_to_rfc3339),
            created_at: timestamp_to_rfc3339(link.created_at),
            status: link.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SharedVaultResponse {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub vault_type: VaultType,
}

#[derive(Debug, Serialize)]
pub struct SharedItemResponse {
    pub title: String,
    pub username: Option<String>,
    pub password: String,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
    pub created_at: String,
}

impl From<SharedItem> for SharedItemResponse {
    fn from(item: SharedItem) -> Self {
        Self {
            title: item.title,
            username: item.username,
            password: item.password,
            notes: item.notes,
            tags: item.tags,
            created_at: timestamp_to_rfc3339(item.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SharedViewResponse {
    pub vault: SharedVaultResponse,
    pub items: Vec<SharedItemResponse>,
}

impl From<SharedView> for SharedViewResponse {
    fn from(view: SharedView) -> Self {
        Self {
            vault: SharedVaultResponse {
                id: view.vault_id,
                name: view.vault_name,
                vault_type: view.vault_type,
            },
            items: view.items.into_iter().map(SharedItemResponse::from).collect(),
        }
    }
}

/// An empty body means no passcode; anything else must parse
fn parse_open_request(body: &[u8]) -> Result<OpenShareLinkRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(OpenShareLinkRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Invalid request body: {}", e)))
}

/// Mint a share link for a vault
///
/// POST /api/vaults/:vault_id/share-links
pub async fn create_share_link(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(vault_id): Path<String>,
    Json(payload): Json<CreateShareLinkRequest>,
) -> Result<Json<ShareLinkResponse>> {
    let options = ShareLinkOptions {
        expires_at: payload
            .expires_at
            .as_deref()
            .map(rfc3339_to_timestamp)
            .transpose()?,
        max_views: payload.max_views,
        passcode: payload.passcode,
    };

    let db = state.db.clone();
    let hasher = state.hasher.clone();
    let link = tokio::task::spawn_blocking(move || {
        share_links::create_share_link(&db, &hasher, &vault_id, &actor, options, now_millis())
    })
    .await??;

    Ok(Json(ShareLinkResponse::from(link)))
}

/// GET /api/vaults/:vault_id/share-links
pub async fn list_share_links(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(vault_id): Path<String>,
) -> Result<Json<Vec<ShareLinkResponse>>> {
    let db = state.db.clone();
    let links = tokio::task::spawn_blocking(move || {
        share_links::list_share_links(&db, &vault_id, &actor, now_millis())
    })
    .await??;

    Ok(Json(links.into_iter().map(ShareLinkResponse::from).collect()))
}

/// DELETE /api/share-links/:token
pub async fn revoke_share_link(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(token): Path<String>,
) -> Result<Json<DeletedResponse>> {
    let db = state.db.clone();
    tokio::task::spawn_blocking(move || share_links::revoke_share_link(&db, &token, &actor))
        .await??;

    Ok(Json(DeletedResponse { success: true }))
}

/// Open a share link anonymously and consume one view
///
/// POST /api/share/:token
///
/// The body is optional; when present it must be a JSON object and may
/// carry the link's passcode. Denials come back with a machine-readable
/// `reason`.
pub async fn open_share_link(
    State(state): State<AppState>,
    Path(token): Path<String>,
    body: Bytes,
) -> Result<Json<SharedViewResponse>> {
    let passcode = parse_open_request(&body)?.passcode;

    let db = state.db.clone();
    let hasher = state.hasher.clone();
    let view = tokio::task::spawn_blocking(move || {
        share_links::verify_share_link(&db, &hasher, &token, passcode.as_deref(), now_millis())
    })
    .await??;

    Ok(Json(SharedViewResponse::from(view)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_open_request() {
        assert_eq!(parse_open_request(b"").unwrap().passcode, None);
        assert_eq!(parse_open_request(b" \n").unwrap().passcode, None);
        assert_eq!(parse_open_request(b"{}").unwrap().passcode, None);
        assert_eq!(
            parse_open_request(br#"{"passcode":"1234"}"#).unwrap().passcode.as_deref(),
            Some("1234")
        );
        assert!(matches!(
            parse_open_request(b"passcode=1234"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            parse_open_request(br#"{"passcode":12"#),
            Err(AppError::Validation(_))
        ));
    }
}
