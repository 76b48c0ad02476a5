use serde::{Deserialize, Serialize};

use super::{SharedItem, VaultType};
use crate::error::DenialReason;

/// Derived state of a share link; never persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareLinkStatus {
    Active,
    Expired,
    Exhausted,
}

/// Share link record stored in redb, keyed by its token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareLink {
    pub token: String,
    pub vault_id: String,
    pub passcode_hash: Option<String>,
    pub max_views: Option<u64>,
    pub views_used: u64,
    pub expires_at: Option<i64>,
    pub created_at: i64,
}

impl ShareLink {
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    pub fn is_exhausted(&self) -> bool {
        self.max_views
            .is_some_and(|max_views| self.views_used >= max_views)
    }

    pub fn status(&self, now: i64) -> ShareLinkStatus {
        if self.is_expired(now) {
            ShareLinkStatus::Expired
        } else if self.is_exhausted() {
            ShareLinkStatus::Exhausted
        } else {
            ShareLinkStatus::Active
        }
    }

    /// Quota checks that must hold both before and at the moment of increment
    pub fn check_quota(&self, now: i64) -> Result<(), DenialReason> {
        if self.is_expired(now) {
            return Err(DenialReason::Expired);
        }
        if self.is_exhausted() {
            return Err(DenialReason::Exhausted);
        }
        Ok(())
    }

    /// Listing view that never carries the passcode digest
    pub fn summary(&self, now: i64) -> ShareLinkSummary {
        ShareLinkSummary {
            token: self.token.clone(),
            vault_id: self.vault_id.clone(),
            has_passcode: self.passcode_hash.is_some(),
            max_views: self.max_views,
            views_used: self.views_used,
            expires_at: self.expires_at,
            created_at: self.created_at,
            status: self.status(now),
        }
    }
}

/// Share link as exposed outside the access engine
#[derive(Debug, Clone, PartialEq)]
pub struct ShareLinkSummary {
    pub token: String,
    pub vault_id: String,
    pub has_passcode: bool,
    pub max_views: Option<u64>,
    pub views_used: u64,
    pub expires_at: Option<i64>,
    pub created_at: i64,
    pub status: ShareLinkStatus,
}

/// Optional limits applied when minting a share link
#[derive(Debug, Clone, Default)]
pub struct ShareLinkOptions {
    pub expires_at: Option<i64>,
    pub max_views: Option<u64>,
    pub passcode: Option<String>,
}

/// Read-only snapshot of a vault handed to a share-link holder
///
/// Plain data only: a share link carries no identity, so nothing reachable
/// from here can mutate the vault.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharedView {
    pub vault_id: String,
    pub vault_name: String,
    pub vault_type: VaultType,
    pub items: Vec<SharedItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(max_views: Option<u64>, views_used: u64, expires_at: Option<i64>) -> ShareLink {
        ShareLink {
            token: "token".to_string(),
            vault_id: "vault".to_string(),
            passcode_hash: Some("digest".to_string()),
            max_views,
            views_used,
            expires_at,
            created_at: 0,
        }
    }

    #[test]
    fn test_unlimited_link_is_active() {
        let link = link(None, 10_000, None);

        assert_eq!(link.status(i64::MAX), ShareLinkStatus::Active);
        assert!(link.check_quota(i64::MAX).is_ok());
    }

    #[test]
    fn test_expiry_boundary() {
        let link = link(None, 0, Some(1000));

        assert!(link.check_quota(999).is_ok());
        assert_eq!(link.check_quota(1000), Err(DenialReason::Expired));
        assert_eq!(link.status(1000), ShareLinkStatus::Expired);
    }

    #[test]
    fn test_view_quota() {
        assert!(link(Some(2), 1, None).check_quota(0).is_ok());
        assert_eq!(
            link(Some(2), 2, None).check_quota(0),
            Err(DenialReason::Exhausted)
        );
        assert_eq!(link(Some(2), 3, None).status(0), ShareLinkStatus::Exhausted);
    }

    #[test]
    fn test_expiry_reported_before_exhaustion() {
        let link = link(Some(1), 1, Some(10));

        assert_eq!(link.check_quota(20), Err(DenialReason::Expired));
    }

    #[test]
    fn test_summary_hides_passcode_hash() {
        let summary = link(Some(5), 1, None).summary(0);

        assert!(summary.has_passcode);
        assert_eq!(summary.views_used, 1);
        assert_eq!(summary.status, ShareLinkStatus::Active);
    }
}
