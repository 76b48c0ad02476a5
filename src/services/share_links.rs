//! Share-link access engine.
//!
//! A share link is an anonymous read-only capability over a vault's items.
//! Verification runs in two phases: every check is made against a read
//! snapshot first, then the view counter is bumped inside a write
//! transaction that re-checks the quota. redb serializes write transactions,
//! so the conditional increment is the single point that decides whether a
//! view is granted.

use redb::{Database, ReadableDatabase};

use crate::db::{child_key, store, tables};
use crate::error::{AppError, DenialReason, Result};
use crate::models::{Role, ShareLink, ShareLinkOptions, ShareLinkSummary, SharedView};
use crate::security::{new_token, token_fingerprint, SecretHasher};
use crate::services::roles;

fn validate_options(options: &ShareLinkOptions, now: i64) -> Result<()> {
    if options.max_views == Some(0) {
        return Err(AppError::Validation(
            "max_views must be at least 1".to_string(),
        ));
    }
    if let Some(expires_at) = options.expires_at {
        if expires_at <= now {
            return Err(AppError::Validation(
                "expires_at must be in the future".to_string(),
            ));
        }
    }
    if options.passcode.as_deref() == Some("") {
        return Err(AppError::Validation(
            "passcode must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Mint a share link for a vault; owner only
///
/// Expiry, view quota and passcode are independent and all optional. Only
/// the passcode's digest is stored.
pub fn create_share_link(
    db: &Database,
    hasher: &SecretHasher,
    vault_id: &str,
    issuer_id: &str,
    options: ShareLinkOptions,
    now: i64,
) -> Result<ShareLinkSummary> {
    validate_options(&options, now)?;

    let link = ShareLink {
        token: new_token(),
        vault_id: vault_id.to_string(),
        passcode_hash: options.passcode.as_deref().map(|p| hasher.hash(p)),
        max_views: options.max_views,
        views_used: 0,
        expires_at: options.expires_at,
        created_at: now,
    };

    let write_txn = db.begin_write()?;
    {
        let vaults = write_txn.open_table(tables::VAULTS)?;
        let members = write_txn.open_table(tables::VAULT_MEMBERS)?;
        roles::authorize(&vaults, &members, vault_id, issuer_id, Role::Owner)?;

        let mut links = write_txn.open_table(tables::SHARE_LINKS)?;
        store::put_record(&mut links, &link.token, &link)?;

        let mut by_vault = write_txn.open_table(tables::VAULT_SHARE_LINKS)?;
        by_vault.insert(child_key(vault_id, &link.token).as_str(), link.token.as_str())?;
    }
    write_txn.commit()?;

    tracing::info!(
        "Share link {}… for vault {} created by {} (max_views: {:?}, expires_at: {:?}, passcode: {})",
        token_fingerprint(&link.token),
        vault_id,
        issuer_id,
        link.max_views,
        link.expires_at,
        link.passcode_hash.is_some()
    );

    Ok(link.summary(now))
}

/// Verify a share link and consume one view
///
/// Checks, in order: the link exists, has not expired, has views left, and
/// the passcode (if one is set) matches. Only then is `views_used`
/// incremented, conditioned on the same quota still holding; losing that
/// race is reported as `Exhausted`. The item snapshot is read in the same
/// transaction as the increment.
pub fn verify_share_link(
    db: &Database,
    hasher: &SecretHasher,
    token: &str,
    passcode: Option<&str>,
    now: i64,
) -> Result<SharedView> {
    // Phase 1: checks against a read snapshot
    let link: ShareLink = {
        let read_txn = db.begin_read()?;
        let links = read_txn.open_table(tables::SHARE_LINKS)?;
        store::get_record(&links, token)?.ok_or_else(|| deny(token, DenialReason::Invalid))?
    };

    link.check_quota(now).map_err(|reason| deny(token, reason))?;

    if let Some(digest) = &link.passcode_hash {
        match passcode {
            None => return Err(deny(token, DenialReason::PasscodeRequired)),
            Some(passcode) if !hasher.verify(passcode, digest) => {
                return Err(deny(token, DenialReason::InvalidPasscode));
            }
            Some(_) => {}
        }
    }

    // Phase 2: conditional increment
    let write_txn = db.begin_write()?;
    let view = {
        let mut links = write_txn.open_table(tables::SHARE_LINKS)?;
        // A link revoked since phase 1 stays revoked
        let mut current: ShareLink = store::get_record(&links, token)?
            .ok_or_else(|| deny(token, DenialReason::Invalid))?;

        current.check_quota(now).map_err(|reason| {
            if reason == DenialReason::Exhausted {
                tracing::info!(
                    "Share link {}… lost the race for its last view",
                    token_fingerprint(token)
                );
            }
            deny(token, reason)
        })?;

        current.views_used += 1;
        store::put_record(&mut links, token, &current)?;

        let vaults = write_txn.open_table(tables::VAULTS)?;
        let vault = store::get_vault(&vaults, &current.vault_id)?
            .ok_or_else(|| deny(token, DenialReason::Invalid))?;

        let items = write_txn.open_table(tables::VAULT_ITEMS)?;
        let snapshot = store::list_items(&items, &vault.id)?
            .iter()
            .map(|item| item.to_shared())
            .collect();

        tracing::info!(
            "Share link {}… granted view {} of {:?} for vault {}",
            token_fingerprint(token),
            current.views_used,
            current.max_views,
            vault.id
        );

        SharedView {
            vault_id: vault.id,
            vault_name: vault.name,
            vault_type: vault.vault_type,
            items: snapshot,
        }
    };
    write_txn.commit()?;

    Ok(view)
}

fn deny(token: &str, reason: DenialReason) -> AppError {
    tracing::warn!(
        "Share link {}… denied: {}",
        token_fingerprint(token),
        reason
    );
    AppError::Denied(reason)
}

/// Delete a share link; the issuer must own its vault
///
/// A link that is already gone counts as revoked.
pub fn revoke_share_link(db: &Database, token: &str, issuer_id: &str) -> Result<()> {
    let write_txn = db.begin_write()?;
    {
        let mut links = write_txn.open_table(tables::SHARE_LINKS)?;
        let Some(link) = store::get_record::<ShareLink, _>(&links, token)? else {
            tracing::debug!("Share link {}… already revoked", token_fingerprint(token));
            return Ok(());
        };

        let vaults = write_txn.open_table(tables::VAULTS)?;
        let members = write_txn.open_table(tables::VAULT_MEMBERS)?;
        roles::authorize(&vaults, &members, &link.vault_id, issuer_id, Role::Owner)?;

        links.remove(token)?;

        let mut by_vault = write_txn.open_table(tables::VAULT_SHARE_LINKS)?;
        by_vault.remove(child_key(&link.vault_id, token).as_str())?;
    }
    write_txn.commit()?;

    tracing::info!(
        "Share link {}… revoked by {}",
        token_fingerprint(token),
        issuer_id
    );
    Ok(())
}

/// Share links of a vault, newest first; owner only
pub fn list_share_links(
    db: &Database,
    vault_id: &str,
    actor_id: &str,
    now: i64,
) -> Result<Vec<ShareLinkSummary>> {
    let read_txn = db.begin_read()?;
    let vaults = read_txn.open_table(tables::VAULTS)?;
    let members = read_txn.open_table(tables::VAULT_MEMBERS)?;
    roles::authorize(&vaults, &members, vault_id, actor_id, Role::Owner)?;

    let by_vault = read_txn.open_table(tables::VAULT_SHARE_LINKS)?;
    let links = read_txn.open_table(tables::SHARE_LINKS)?;

    let mut summaries = Vec::new();
    for token in store::index_entries(&by_vault, vault_id)? {
        if let Some(link) = store::get_record::<ShareLink, _>(&links, &token)? {
            summaries.push(link.summary(now));
        }
    }
    summaries.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.token.cmp(&b.token))
    });
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_options() {
        let ok = ShareLinkOptions {
            expires_at: Some(100),
            max_views: Some(1),
            passcode: Some("1234".to_string()),
        };
        assert!(validate_options(&ok, 50).is_ok());
        assert!(validate_options(&ShareLinkOptions::default(), 50).is_ok());

        let zero_views = ShareLinkOptions {
            max_views: Some(0),
            ..Default::default()
        };
        assert!(validate_options(&zero_views, 0).is_err());

        let past = ShareLinkOptions {
            expires_at: Some(10),
            ..Default::default()
        };
        assert!(validate_options(&past, 10).is_err());

        let empty_passcode = ShareLinkOptions {
            passcode: Some(String::new()),
            ..Default::default()
        };
        assert!(validate_options(&empty_passcode, 0).is_err());
    }
}
