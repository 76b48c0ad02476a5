//! Invitation lifecycle: create, lookup, accept, revoke and list.
//!
//! Status is never stored. An invitation is usable exactly while
//! `accepted == false && now < expires_at`, evaluated on every lookup.

use redb::{Database, ReadableDatabase, ReadableTable};
use uuid::Uuid;
use validator::ValidateEmail;

use crate::constants::{
    ERR_INVALID_EMAIL, ERR_INVALID_INVITATION_ROLE, ERR_PERSONAL_VAULT_SHARING,
    INVITATION_TTL_MILLIS, KEY_SEPARATOR,
};
use crate::db::{child_key, store, tables};
use crate::error::{AppError, Result};
use crate::models::{Invitation, PendingInvitation, Role, VaultMember};
use crate::security::{new_token, token_fingerprint};
use crate::services::roles;

/// Trim and lower-case an email, rejecting anything that is not an address
pub fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    if email.contains(KEY_SEPARATOR) || !email.validate_email() {
        return Err(AppError::Validation(ERR_INVALID_EMAIL.to_string()));
    }
    Ok(email)
}

/// Invite `email` into a shared vault with an edit or view role
///
/// The issuer must resolve to `owner`. Personal vaults cannot be invited
/// into. The invitation expires seven days after `now`.
pub fn create_invitation(
    db: &Database,
    vault_id: &str,
    email: &str,
    role: Role,
    issuer_id: &str,
    now: i64,
) -> Result<Invitation> {
    if !role.is_grantable() {
        return Err(AppError::Validation(ERR_INVALID_INVITATION_ROLE.to_string()));
    }
    let email = normalize_email(email)?;

    let write_txn = db.begin_write()?;
    let invitation = {
        let vaults = write_txn.open_table(tables::VAULTS)?;
        let members = write_txn.open_table(tables::VAULT_MEMBERS)?;
        let (vault, _) = roles::authorize(&vaults, &members, vault_id, issuer_id, Role::Owner)?;
        if vault.is_personal() {
            return Err(AppError::Validation(ERR_PERSONAL_VAULT_SHARING.to_string()));
        }

        let invitation = Invitation {
            id: Uuid::new_v4().to_string(),
            vault_id: vault_id.to_string(),
            email,
            role,
            token: new_token(),
            accepted: false,
            expires_at: now + INVITATION_TTL_MILLIS,
            created_at: now,
        };

        let mut invitations = write_txn.open_table(tables::INVITATIONS)?;
        store::put_record(&mut invitations, &invitation.id, &invitation)?;

        let mut tokens = write_txn.open_table(tables::INVITATION_TOKENS)?;
        tokens.insert(invitation.token.as_str(), invitation.id.as_str())?;

        let mut by_vault = write_txn.open_table(tables::VAULT_INVITATIONS)?;
        by_vault.insert(
            child_key(vault_id, &invitation.id).as_str(),
            invitation.id.as_str(),
        )?;

        let mut by_email = write_txn.open_table(tables::EMAIL_INVITATIONS)?;
        by_email.insert(
            child_key(&invitation.email, &invitation.id).as_str(),
            invitation.id.as_str(),
        )?;

        invitation
    };
    write_txn.commit()?;

    tracing::info!(
        "Invitation {} to vault {} created by {} (role: {})",
        invitation.id,
        vault_id,
        issuer_id,
        invitation.role
    );

    Ok(invitation)
}

/// Find a still-actionable invitation by token
///
/// Unknown, accepted and expired tokens all fail with `NotFound`.
pub fn lookup_invitation(db: &Database, token: &str, now: i64) -> Result<Invitation> {
    let read_txn = db.begin_read()?;
    let tokens = read_txn.open_table(tables::INVITATION_TOKENS)?;
    let invitations = read_txn.open_table(tables::INVITATIONS)?;

    let invitation_id = match tokens.get(token)? {
        Some(id) => id.value().to_string(),
        None => return Err(AppError::NotFound("Invitation")),
    };

    store::get_record::<Invitation, _>(&invitations, &invitation_id)?
        .filter(|invitation| invitation.is_actionable(now))
        .ok_or(AppError::NotFound("Invitation"))
}

/// Actionable invitation together with its vault's name and type
pub fn describe_invitation(db: &Database, token: &str, now: i64) -> Result<PendingInvitation> {
    let invitation = lookup_invitation(db, token, now)?;

    let read_txn = db.begin_read()?;
    let vaults = read_txn.open_table(tables::VAULTS)?;
    let vault = store::get_vault(&vaults, &invitation.vault_id)?
        .ok_or(AppError::NotFound("Invitation"))?;

    Ok(PendingInvitation {
        invitation,
        vault_name: vault.name,
        vault_type: vault.vault_type,
    })
}

fn membership_conflict(err: AppError) -> AppError {
    tracing::error!("Membership write failed during invitation accept: {}", err);
    AppError::Conflict("Could not record vault membership".to_string())
}

/// Accept an invitation on behalf of `user_id`
///
/// The membership upsert and the `accepted` flip happen in one write
/// transaction: if the membership cannot be written the transaction is
/// dropped uncommitted and the invitation stays pending.
pub fn accept_invitation(
    db: &Database,
    token: &str,
    user_id: &str,
    now: i64,
) -> Result<VaultMember> {
    let write_txn = db.begin_write()?;
    let (invitation, member) = {
        let tokens = write_txn.open_table(tables::INVITATION_TOKENS)?;
        let mut invitations = write_txn.open_table(tables::INVITATIONS)?;

        // 1. Re-run the lookup predicate inside the transaction
        let invitation_id = match tokens.get(token)? {
            Some(id) => id.value().to_string(),
            None => return Err(AppError::NotFound("Invitation")),
        };
        let mut invitation = store::get_record::<Invitation, _>(&invitations, &invitation_id)?
            .filter(|invitation| invitation.is_actionable(now))
            .ok_or(AppError::NotFound("Invitation"))?;

        let vaults = write_txn.open_table(tables::VAULTS)?;
        let vault = store::get_vault(&vaults, &invitation.vault_id)?
            .ok_or(AppError::NotFound("Vault"))?;
        if vault.is_personal() {
            return Err(AppError::Conflict(ERR_PERSONAL_VAULT_SHARING.to_string()));
        }

        // 2. Membership upsert
        let member = {
            let mut members = write_txn
                .open_table(tables::VAULT_MEMBERS)
                .map_err(|e| membership_conflict(e.into()))?;
            let mut user_vaults = write_txn
                .open_table(tables::USER_VAULTS)
                .map_err(|e| membership_conflict(e.into()))?;
            store::upsert_membership(
                &mut members,
                &mut user_vaults,
                &vault.id,
                user_id,
                invitation.role,
                now,
            )
            .map_err(membership_conflict)?
        };

        // 3. Flip the accepted flag
        invitation.accepted = true;
        store::put_record(&mut invitations, &invitation.id, &invitation)?;

        (invitation, member)
    };
    write_txn.commit().map_err(|e| membership_conflict(e.into()))?;

    tracing::info!(
        "Invitation {} accepted by {} (token {}…): vault {} role {}",
        invitation.id,
        user_id,
        token_fingerprint(token),
        member.vault_id,
        member.role
    );

    Ok(member)
}

/// Delete an invitation; the issuer must own its vault
///
/// An invitation that is already gone counts as revoked.
pub fn revoke_invitation(db: &Database, invitation_id: &str, issuer_id: &str) -> Result<()> {
    let write_txn = db.begin_write()?;
    {
        let mut invitations = write_txn.open_table(tables::INVITATIONS)?;
        let Some(invitation) = store::get_record::<Invitation, _>(&invitations, invitation_id)? else {
            tracing::debug!("Invitation {} already revoked", invitation_id);
            return Ok(());
        };

        let vaults = write_txn.open_table(tables::VAULTS)?;
        let members = write_txn.open_table(tables::VAULT_MEMBERS)?;
        roles::authorize(&vaults, &members, &invitation.vault_id, issuer_id, Role::Owner)?;

        invitations.remove(invitation_id)?;

        let mut tokens = write_txn.open_table(tables::INVITATION_TOKENS)?;
        tokens.remove(invitation.token.as_str())?;

        let mut by_vault = write_txn.open_table(tables::VAULT_INVITATIONS)?;
        by_vault.remove(child_key(&invitation.vault_id, invitation_id).as_str())?;

        let mut by_email = write_txn.open_table(tables::EMAIL_INVITATIONS)?;
        by_email.remove(child_key(&invitation.email, invitation_id).as_str())?;
    }
    write_txn.commit()?;

    tracing::info!("Invitation {} revoked by {}", invitation_id, issuer_id);
    Ok(())
}

fn newest_first(invitations: &mut [Invitation]) {
    invitations.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
}

/// Every invitation of a vault, newest first; owner only
///
/// Accepted, pending and expired records are all returned; callers derive
/// the display status from `accepted` and `expires_at`.
pub fn list_invitations(db: &Database, vault_id: &str, actor_id: &str) -> Result<Vec<Invitation>> {
    let read_txn = db.begin_read()?;
    let vaults = read_txn.open_table(tables::VAULTS)?;
    let members = read_txn.open_table(tables::VAULT_MEMBERS)?;
    roles::authorize(&vaults, &members, vault_id, actor_id, Role::Owner)?;

    let by_vault = read_txn.open_table(tables::VAULT_INVITATIONS)?;
    let invitations = read_txn.open_table(tables::INVITATIONS)?;

    let mut records = Vec::new();
    for invitation_id in store::index_entries(&by_vault, vault_id)? {
        if let Some(invitation) = store::get_record::<Invitation, _>(&invitations, &invitation_id)? {
            records.push(invitation);
        }
    }
    newest_first(&mut records);
    Ok(records)
}

/// Actionable invitations addressed to `email`, newest first
pub fn pending_invitations_for_email(
    db: &Database,
    email: &str,
    now: i64,
) -> Result<Vec<PendingInvitation>> {
    let email = normalize_email(email)?;

    let read_txn = db.begin_read()?;
    let by_email = read_txn.open_table(tables::EMAIL_INVITATIONS)?;
    let invitations = read_txn.open_table(tables::INVITATIONS)?;
    let vaults = read_txn.open_table(tables::VAULTS)?;

    let mut records = Vec::new();
    for invitation_id in store::index_entries(&by_email, &email)? {
        if let Some(invitation) = store::get_record::<Invitation, _>(&invitations, &invitation_id)? {
            if invitation.is_actionable(now) {
                records.push(invitation);
            }
        }
    }
    newest_first(&mut records);

    let mut pending = Vec::with_capacity(records.len());
    for invitation in records {
        if let Some(vault) = store::get_vault(&vaults, &invitation.vault_id)? {
            pending.push(PendingInvitation {
                invitation,
                vault_name: vault.name,
                vault_type: vault.vault_type,
            });
        }
    }
    Ok(pending)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            normalize_email("  Alice@Example.COM ").unwrap(),
            "alice@example.com"
        );
        assert!(normalize_email("not-an-email").is_err());
        assert!(normalize_email("").is_err());
        assert!(normalize_email("a/b@example.com").is_err());
    }
}
