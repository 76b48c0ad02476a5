use serde::{Deserialize, Serialize};

use super::{Role, VaultType};

/// Display status of an invitation, derived from `accepted` and `expires_at`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Expired,
}

/// Membership invitation record stored in redb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: String,
    pub vault_id: String,
    pub email: String,
    pub role: Role,
    pub token: String,
    pub accepted: bool,
    pub expires_at: i64,
    pub created_at: i64,
}

impl Invitation {
    /// The only gate deciding whether the token can still be used
    pub fn is_actionable(&self, now: i64) -> bool {
        !self.accepted && now < self.expires_at
    }

    pub fn status(&self, now: i64) -> InvitationStatus {
        if self.accepted {
            InvitationStatus::Accepted
        } else if now >= self.expires_at {
            InvitationStatus::Expired
        } else {
            InvitationStatus::Pending
        }
    }
}

/// Pending invitation together with the vault it grants access to
#[derive(Debug, Clone, PartialEq)]
pub struct PendingInvitation {
    pub invitation: Invitation,
    pub vault_name: String,
    pub vault_type: VaultType,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invitation(accepted: bool, expires_at: i64) -> Invitation {
        Invitation {
            id: "inv".to_string(),
            vault_id: "vault".to_string(),
            email: "a@example.com".to_string(),
            role: Role::View,
            token: "token".to_string(),
            accepted,
            expires_at,
            created_at: 0,
        }
    }

    #[test]
    fn test_actionable_until_expiry() {
        let inv = invitation(false, 1000);

        assert!(inv.is_actionable(0));
        assert!(inv.is_actionable(999));
        assert!(!inv.is_actionable(1000));
        assert!(!inv.is_actionable(5000));
    }

    #[test]
    fn test_accepted_never_actionable() {
        let inv = invitation(true, 1000);

        assert!(!inv.is_actionable(0));
        assert_eq!(inv.status(0), InvitationStatus::Accepted);
        assert_eq!(inv.status(2000), InvitationStatus::Accepted);
    }

    #[test]
    fn test_derived_status() {
        let inv = invitation(false, 1000);

        assert_eq!(inv.status(500), InvitationStatus::Pending);
        assert_eq!(inv.status(1000), InvitationStatus::Expired);
    }
}
