//! Member administration for family and team vaults.

use redb::{Database, ReadableDatabase};

use crate::db::{child_key, store, tables};
use crate::error::{AppError, Result};
use crate::models::{Role, VaultMember};
use crate::services::roles;

/// Explicit members of a vault in join order; any role may read
pub fn list_members(db: &Database, vault_id: &str, actor_id: &str) -> Result<Vec<VaultMember>> {
    let read_txn = db.begin_read()?;
    let vaults = read_txn.open_table(tables::VAULTS)?;
    let members = read_txn.open_table(tables::VAULT_MEMBERS)?;

    let (vault, _) = roles::authorize(&vaults, &members, vault_id, actor_id, Role::View)?;
    if vault.is_personal() {
        return Ok(Vec::new());
    }

    store::list_members(&members, vault_id)
}

/// Change a member's role to edit or view; owner only
pub fn update_member_role(
    db: &Database,
    vault_id: &str,
    actor_id: &str,
    user_id: &str,
    role: Role,
) -> Result<VaultMember> {
    if !role.is_grantable() {
        return Err(AppError::Validation(
            "Member role must be 'edit' or 'view'".to_string(),
        ));
    }

    let write_txn = db.begin_write()?;
    let member = {
        let vaults = write_txn.open_table(tables::VAULTS)?;
        let mut members = write_txn.open_table(tables::VAULT_MEMBERS)?;
        let (vault, _) = roles::authorize(&vaults, &members, vault_id, actor_id, Role::Owner)?;

        if user_id == vault.owner_id {
            return Err(AppError::Validation(
                "The vault owner's role cannot be changed".to_string(),
            ));
        }

        let current = store::get_membership(&members, vault_id, user_id)?
            .ok_or(AppError::NotFound("Member"))?;
        let member = VaultMember { role, ..current };
        store::put_record(&mut members, &child_key(vault_id, user_id), &member)?;
        member
    };
    write_txn.commit()?;

    tracing::info!(
        "Member {} of vault {} set to {} by {}",
        user_id,
        vault_id,
        role,
        actor_id
    );
    Ok(member)
}

/// Remove a member from a vault; owner only
///
/// The vault owner cannot be removed. Removing someone who is not a member
/// succeeds so retries stay safe.
pub fn remove_member(db: &Database, vault_id: &str, actor_id: &str, user_id: &str) -> Result<()> {
    let write_txn = db.begin_write()?;
    {
        let vaults = write_txn.open_table(tables::VAULTS)?;
        let mut members = write_txn.open_table(tables::VAULT_MEMBERS)?;
        let (vault, _) = roles::authorize(&vaults, &members, vault_id, actor_id, Role::Owner)?;

        if user_id == vault.owner_id {
            return Err(AppError::Validation(
                "The vault owner cannot be removed".to_string(),
            ));
        }

        let mut user_vaults = write_txn.open_table(tables::USER_VAULTS)?;
        let existed = store::delete_membership(&mut members, &mut user_vaults, &vault, user_id)?;
        if existed {
            tracing::info!("Member {} removed from vault {} by {}", user_id, vault_id, actor_id);
        }
    }
    write_txn.commit()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_tables;
    use crate::models::VaultType;
    use crate::services::vaults;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Database, String) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::create(temp_dir.path().join("members.db")).unwrap();
        init_tables(&db).unwrap();

        let vault = vaults::create_vault(&db, "alice", "Team", VaultType::Team, 0).unwrap();

        let write_txn = db.begin_write().unwrap();
        {
            let mut members = write_txn.open_table(tables::VAULT_MEMBERS).unwrap();
            let mut user_vaults = write_txn.open_table(tables::USER_VAULTS).unwrap();
            store::upsert_membership(&mut members, &mut user_vaults, &vault.id, "bob", Role::View, 10)
                .unwrap();
        }
        write_txn.commit().unwrap();

        (temp_dir, db, vault.id)
    }

    #[test]
    fn test_list_members_any_role() {
        let (_dir, db, vault_id) = setup();

        let rows = list_members(&db, &vault_id, "bob").unwrap();
        let users: Vec<&str> = rows.iter().map(|m| m.user_id.as_str()).collect();

        assert_eq!(users, vec!["alice", "bob"]);
        assert!(matches!(
            list_members(&db, &vault_id, "mallory"),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn test_update_member_role() {
        let (_dir, db, vault_id) = setup();

        let member = update_member_role(&db, &vault_id, "alice", "bob", Role::Edit).unwrap();
        assert_eq!(member.role, Role::Edit);
        assert_eq!(member.joined_at, 10);

        let (_, role) = vaults::get_vault(&db, &vault_id, "bob").unwrap();
        assert_eq!(role, Role::Edit);
    }

    #[test]
    fn test_update_member_role_rules() {
        let (_dir, db, vault_id) = setup();

        assert!(matches!(
            update_member_role(&db, &vault_id, "alice", "bob", Role::Owner),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            update_member_role(&db, &vault_id, "alice", "alice", Role::View),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            update_member_role(&db, &vault_id, "alice", "nobody", Role::View),
            Err(AppError::NotFound("Member"))
        ));
        assert!(matches!(
            update_member_role(&db, &vault_id, "bob", "bob", Role::Edit),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn test_remove_member() {
        let (_dir, db, vault_id) = setup();

        remove_member(&db, &vault_id, "alice", "bob").unwrap();
        // Second removal is a no-op
        remove_member(&db, &vault_id, "alice", "bob").unwrap();

        assert!(matches!(
            vaults::get_vault(&db, &vault_id, "bob"),
            Err(AppError::Forbidden)
        ));
        assert!(vaults::list_vaults(&db, "bob").unwrap().is_empty());
    }

    #[test]
    fn test_owner_cannot_be_removed() {
        let (_dir, db, vault_id) = setup();

        assert!(matches!(
            remove_member(&db, &vault_id, "alice", "alice"),
            Err(AppError::Validation(_))
        ));
        assert_eq!(vaults::list_vaults(&db, "alice").unwrap().len(), 1);
    }
}
