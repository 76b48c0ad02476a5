//! Vault directory: creation, lookup, listing, rename and cascade delete.

use redb::{Database, ReadableDatabase};
use uuid::Uuid;

use crate::constants::MAX_VAULT_NAME_LEN;
use crate::db::{child_key, store, tables};
use crate::error::{AppError, Result};
use crate::models::{Invitation, Role, Vault, VaultListing, VaultMember, VaultType};
use crate::services::roles;

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_VAULT_NAME_LEN {
        return Err(AppError::Validation(format!(
            "Vault name must be between 1 and {} characters",
            MAX_VAULT_NAME_LEN
        )));
    }
    Ok(name.to_string())
}

/// Create a vault owned by `actor_id`
///
/// Family and team vaults also get an explicit `owner` membership row;
/// personal vaults rely on `owner_id` alone.
pub fn create_vault(
    db: &Database,
    actor_id: &str,
    name: &str,
    vault_type: VaultType,
    now: i64,
) -> Result<Vault> {
    let name = validate_name(name)?;
    let vault = Vault {
        id: Uuid::new_v4().to_string(),
        name,
        vault_type,
        owner_id: actor_id.to_string(),
        created_at: now,
        updated_at: now,
    };

    let write_txn = db.begin_write()?;
    {
        let mut vaults = write_txn.open_table(tables::VAULTS)?;
        store::put_record(&mut vaults, &vault.id, &vault)?;

        let mut user_vaults = write_txn.open_table(tables::USER_VAULTS)?;
        user_vaults.insert(child_key(actor_id, &vault.id).as_str(), vault.id.as_str())?;

        if !vault.is_personal() {
            let mut members = write_txn.open_table(tables::VAULT_MEMBERS)?;
            store::upsert_membership(
                &mut members,
                &mut user_vaults,
                &vault.id,
                actor_id,
                Role::Owner,
                now,
            )?;
        }
    }
    write_txn.commit()?;

    tracing::info!(
        "Vault {} ({}) created by {}",
        vault.id,
        vault.vault_type,
        actor_id
    );

    Ok(vault)
}

/// Fetch a vault the actor can read, with the actor's role
pub fn get_vault(db: &Database, vault_id: &str, actor_id: &str) -> Result<(Vault, Role)> {
    let read_txn = db.begin_read()?;
    let vaults = read_txn.open_table(tables::VAULTS)?;
    let members = read_txn.open_table(tables::VAULT_MEMBERS)?;

    roles::authorize(&vaults, &members, vault_id, actor_id, Role::View)
}

/// Every vault the actor owns or belongs to, newest first
pub fn list_vaults(db: &Database, actor_id: &str) -> Result<Vec<VaultListing>> {
    let read_txn = db.begin_read()?;
    let vaults = read_txn.open_table(tables::VAULTS)?;
    let members = read_txn.open_table(tables::VAULT_MEMBERS)?;
    let user_vaults = read_txn.open_table(tables::USER_VAULTS)?;

    let mut listings = Vec::new();
    for vault_id in store::index_entries(&user_vaults, actor_id)? {
        let Some(vault) = store::get_vault(&vaults, &vault_id)? else {
            continue;
        };
        let Some(user_role) = roles::resolve(&members, &vault, actor_id)? else {
            continue;
        };
        let member_count = if vault.is_personal() {
            1
        } else {
            store::list_members(&members, &vault.id)?.len() as u64
        };
        listings.push(VaultListing {
            vault,
            user_role,
            member_count,
        });
    }

    listings.sort_by(|a, b| {
        b.vault
            .created_at
            .cmp(&a.vault.created_at)
            .then_with(|| a.vault.id.cmp(&b.vault.id))
    });
    Ok(listings)
}

/// Rename a vault; owner only
pub fn rename_vault(
    db: &Database,
    vault_id: &str,
    actor_id: &str,
    name: &str,
    now: i64,
) -> Result<Vault> {
    let name = validate_name(name)?;

    let write_txn = db.begin_write()?;
    let vault = {
        let mut vaults = write_txn.open_table(tables::VAULTS)?;
        let members = write_txn.open_table(tables::VAULT_MEMBERS)?;
        let (vault, _) = roles::authorize(&vaults, &members, vault_id, actor_id, Role::Owner)?;

        let vault = Vault {
            name,
            updated_at: now,
            ..vault
        };
        store::put_record(&mut vaults, &vault.id, &vault)?;
        vault
    };
    write_txn.commit()?;

    tracing::info!("Vault {} renamed by {}", vault_id, actor_id);
    Ok(vault)
}

/// Delete a vault and everything hanging off it; owner only
///
/// Members, items, invitations, share links and all index entries go in the
/// same transaction as the vault record.
pub fn delete_vault(db: &Database, vault_id: &str, actor_id: &str) -> Result<()> {
    let write_txn = db.begin_write()?;
    {
        let mut vaults = write_txn.open_table(tables::VAULTS)?;
        let mut members = write_txn.open_table(tables::VAULT_MEMBERS)?;
        let (vault, _) = roles::authorize(&vaults, &members, vault_id, actor_id, Role::Owner)?;

        // 1. Memberships and the user-vault index
        let rows: Vec<VaultMember> = store::list_members(&members, vault_id)?;
        store::drain_children(&mut members, vault_id)?;
        let mut user_vaults = write_txn.open_table(tables::USER_VAULTS)?;
        for row in &rows {
            user_vaults.remove(child_key(&row.user_id, vault_id).as_str())?;
        }
        user_vaults.remove(child_key(&vault.owner_id, vault_id).as_str())?;
        drop(user_vaults);
        drop(members);

        // 2. Items
        let mut items = write_txn.open_table(tables::VAULT_ITEMS)?;
        let removed_items = store::drain_children(&mut items, vault_id)?;
        drop(items);

        // 3. Invitations with their token and email index entries
        let mut vault_invitations = write_txn.open_table(tables::VAULT_INVITATIONS)?;
        let invitation_ids = store::drain_index(&mut vault_invitations, vault_id)?;
        drop(vault_invitations);

        let mut invitations = write_txn.open_table(tables::INVITATIONS)?;
        let mut tokens = write_txn.open_table(tables::INVITATION_TOKENS)?;
        let mut emails = write_txn.open_table(tables::EMAIL_INVITATIONS)?;
        for invitation_id in &invitation_ids {
            let invitation: Option<Invitation> =
                store::get_record(&invitations, invitation_id)?;
            if let Some(invitation) = invitation {
                tokens.remove(invitation.token.as_str())?;
                emails.remove(child_key(&invitation.email, &invitation.id).as_str())?;
            }
            invitations.remove(invitation_id.as_str())?;
        }
        drop(emails);
        drop(tokens);
        drop(invitations);

        // 4. Share links
        let mut vault_links = write_txn.open_table(tables::VAULT_SHARE_LINKS)?;
        let link_tokens = store::drain_index(&mut vault_links, vault_id)?;
        drop(vault_links);

        let mut links = write_txn.open_table(tables::SHARE_LINKS)?;
        for token in &link_tokens {
            links.remove(token.as_str())?;
        }
        drop(links);

        // 5. The vault itself
        vaults.remove(vault_id)?;

        tracing::info!(
            "Vault {} deleted by {}: {} members, {} items, {} invitations, {} share links",
            vault_id,
            actor_id,
            rows.len(),
            removed_items,
            invitation_ids.len(),
            link_tokens.len()
        );
    }
    write_txn.commit()?;

    Ok(())
}
