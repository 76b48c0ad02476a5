//! Record-level access to the vault, membership and content tables.
//!
//! Every function works on tables already opened by the caller, so several
//! of them can take part in one write transaction.

use redb::{ReadableTable, Table};
use serde::{de::DeserializeOwned, Serialize};

use super::{child_key, decode, encode, prefix_range};
use crate::error::Result;
use crate::models::{Role, Vault, VaultItem, VaultMember};

/// Table of serialized records keyed by string id
pub type RecordTable<'txn> = Table<'txn, &'static str, &'static [u8]>;

/// Table of string ids keyed by string id
pub type IndexTable<'txn> = Table<'txn, &'static str, &'static str>;

// =============================================================================
// Generic Helpers
// =============================================================================

/// Fetch and decode one record
pub fn get_record<R, T>(table: &T, key: &str) -> Result<Option<R>>
where
    R: DeserializeOwned,
    T: ReadableTable<&'static str, &'static [u8]>,
{
    table
        .get(key)?
        .map(|guard| decode(guard.value()))
        .transpose()
}

/// Encode and store one record, replacing any previous value
pub fn put_record<R: Serialize>(table: &mut RecordTable<'_>, key: &str, value: &R) -> Result<()> {
    let bytes = encode(value)?;
    table.insert(key, bytes.as_slice())?;
    Ok(())
}

/// Decode every record stored under `{parent}/...`
pub fn children<R, T>(table: &T, parent: &str) -> Result<Vec<R>>
where
    R: DeserializeOwned,
    T: ReadableTable<&'static str, &'static [u8]>,
{
    let (start, end) = prefix_range(parent);
    let mut records = Vec::new();
    for entry in table.range(start.as_str()..end.as_str())? {
        let (_, value) = entry?;
        records.push(decode(value.value())?);
    }
    Ok(records)
}

/// Values of every index entry stored under `{parent}/...`
pub fn index_entries<T>(table: &T, parent: &str) -> Result<Vec<String>>
where
    T: ReadableTable<&'static str, &'static str>,
{
    let (start, end) = prefix_range(parent);
    let mut values = Vec::new();
    for entry in table.range(start.as_str()..end.as_str())? {
        let (_, value) = entry?;
        values.push(value.value().to_string());
    }
    Ok(values)
}

/// Remove every `{parent}/...` entry from an index, returning the values
pub fn drain_index(table: &mut IndexTable<'_>, parent: &str) -> Result<Vec<String>> {
    let (start, end) = prefix_range(parent);
    let mut entries = Vec::new();
    for entry in table.range(start.as_str()..end.as_str())? {
        let (key, value) = entry?;
        entries.push((key.value().to_string(), value.value().to_string()));
    }
    for (key, _) in &entries {
        table.remove(key.as_str())?;
    }
    Ok(entries.into_iter().map(|(_, value)| value).collect())
}

/// Remove every `{parent}/...` record, returning how many were removed
pub fn drain_children(table: &mut RecordTable<'_>, parent: &str) -> Result<usize> {
    let (start, end) = prefix_range(parent);
    let mut keys = Vec::new();
    for entry in table.range(start.as_str()..end.as_str())? {
        let (key, _) = entry?;
        keys.push(key.value().to_string());
    }
    for key in &keys {
        table.remove(key.as_str())?;
    }
    Ok(keys.len())
}

// =============================================================================
// Vaults
// =============================================================================

pub fn get_vault<T>(vaults: &T, vault_id: &str) -> Result<Option<Vault>>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    get_record(vaults, vault_id)
}

// =============================================================================
// Memberships
// =============================================================================

pub fn get_membership<T>(members: &T, vault_id: &str, user_id: &str) -> Result<Option<VaultMember>>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    get_record(members, &child_key(vault_id, user_id))
}

/// Insert or update the (vault, user) membership row
///
/// An existing `owner` row is never downgraded. Returns the row as stored.
pub fn upsert_membership(
    members: &mut RecordTable<'_>,
    user_vaults: &mut IndexTable<'_>,
    vault_id: &str,
    user_id: &str,
    role: Role,
    now: i64,
) -> Result<VaultMember> {
    let key = child_key(vault_id, user_id);
    let existing: Option<VaultMember> = get_record(members, &key)?;

    let member = match existing {
        Some(current) if current.role == Role::Owner || current.role == role => return Ok(current),
        Some(current) => VaultMember { role, ..current },
        None => VaultMember {
            vault_id: vault_id.to_string(),
            user_id: user_id.to_string(),
            role,
            joined_at: now,
        },
    };

    put_record(members, &key, &member)?;
    user_vaults.insert(child_key(user_id, vault_id).as_str(), vault_id)?;
    Ok(member)
}

/// Delete the (vault, user) membership row, returning whether it existed
///
/// The user-vault index entry survives when the user is the vault owner,
/// since the owner keeps access through `owner_id`.
pub fn delete_membership(
    members: &mut RecordTable<'_>,
    user_vaults: &mut IndexTable<'_>,
    vault: &Vault,
    user_id: &str,
) -> Result<bool> {
    let existed = members
        .remove(child_key(&vault.id, user_id).as_str())?
        .is_some();
    if user_id != vault.owner_id {
        user_vaults.remove(child_key(user_id, &vault.id).as_str())?;
    }
    Ok(existed)
}

/// Explicit membership rows of a vault, ordered by join time
pub fn list_members<T>(members: &T, vault_id: &str) -> Result<Vec<VaultMember>>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    let mut rows: Vec<VaultMember> = children(members, vault_id)?;
    rows.sort_by(|a, b| {
        a.joined_at
            .cmp(&b.joined_at)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    Ok(rows)
}

// =============================================================================
// Items
// =============================================================================

/// Items of a vault, newest first
pub fn list_items<T>(items: &T, vault_id: &str) -> Result<Vec<VaultItem>>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    let mut rows: Vec<VaultItem> = children(items, vault_id)?;
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_tables, tables};
    use crate::models::VaultType;
    use redb::Database;
    use tempfile::TempDir;

    fn test_db(temp_dir: &TempDir) -> Database {
        let db = Database::create(temp_dir.path().join("store.db")).unwrap();
        init_tables(&db).unwrap();
        db
    }

    fn team_vault() -> Vault {
        Vault {
            id: "vault-1".to_string(),
            name: "Team".to_string(),
            vault_type: VaultType::Team,
            owner_id: "owner".to_string(),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_upsert_membership_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let db = test_db(&temp_dir);

        let write_txn = db.begin_write().unwrap();
        {
            let mut members = write_txn.open_table(tables::VAULT_MEMBERS).unwrap();
            let mut user_vaults = write_txn.open_table(tables::USER_VAULTS).unwrap();

            let first = upsert_membership(&mut members, &mut user_vaults, "vault-1", "bob", Role::View, 10)
                .unwrap();
            let second = upsert_membership(&mut members, &mut user_vaults, "vault-1", "bob", Role::View, 20)
                .unwrap();

            assert_eq!(first, second);
            assert_eq!(second.joined_at, 10);
            assert_eq!(list_members(&members, "vault-1").unwrap().len(), 1);
        }
        write_txn.commit().unwrap();
    }

    #[test]
    fn test_upsert_membership_changes_role_but_keeps_owner() {
        let temp_dir = TempDir::new().unwrap();
        let db = test_db(&temp_dir);

        let write_txn = db.begin_write().unwrap();
        {
            let mut members = write_txn.open_table(tables::VAULT_MEMBERS).unwrap();
            let mut user_vaults = write_txn.open_table(tables::USER_VAULTS).unwrap();

            upsert_membership(&mut members, &mut user_vaults, "vault-1", "bob", Role::View, 10).unwrap();
            let upgraded =
                upsert_membership(&mut members, &mut user_vaults, "vault-1", "bob", Role::Edit, 20).unwrap();
            assert_eq!(upgraded.role, Role::Edit);
            assert_eq!(upgraded.joined_at, 10);

            upsert_membership(&mut members, &mut user_vaults, "vault-1", "owner", Role::Owner, 0).unwrap();
            let kept =
                upsert_membership(&mut members, &mut user_vaults, "vault-1", "owner", Role::View, 30).unwrap();
            assert_eq!(kept.role, Role::Owner);
        }
        write_txn.commit().unwrap();
    }

    #[test]
    fn test_delete_membership_keeps_owner_index() {
        let temp_dir = TempDir::new().unwrap();
        let db = test_db(&temp_dir);
        let vault = team_vault();

        let write_txn = db.begin_write().unwrap();
        {
            let mut members = write_txn.open_table(tables::VAULT_MEMBERS).unwrap();
            let mut user_vaults = write_txn.open_table(tables::USER_VAULTS).unwrap();

            upsert_membership(&mut members, &mut user_vaults, &vault.id, "owner", Role::Owner, 0).unwrap();
            upsert_membership(&mut members, &mut user_vaults, &vault.id, "bob", Role::View, 1).unwrap();

            assert!(delete_membership(&mut members, &mut user_vaults, &vault, "bob").unwrap());
            assert!(!delete_membership(&mut members, &mut user_vaults, &vault, "bob").unwrap());
            assert!(delete_membership(&mut members, &mut user_vaults, &vault, "owner").unwrap());

            assert!(index_entries(&user_vaults, "bob").unwrap().is_empty());
            assert_eq!(index_entries(&user_vaults, "owner").unwrap(), vec![vault.id.clone()]);
        }
        write_txn.commit().unwrap();
    }

    #[test]
    fn test_list_members_scoped_to_vault() {
        let temp_dir = TempDir::new().unwrap();
        let db = test_db(&temp_dir);

        let write_txn = db.begin_write().unwrap();
        {
            let mut members = write_txn.open_table(tables::VAULT_MEMBERS).unwrap();
            let mut user_vaults = write_txn.open_table(tables::USER_VAULTS).unwrap();

            upsert_membership(&mut members, &mut user_vaults, "vault-1", "carol", Role::View, 30).unwrap();
            upsert_membership(&mut members, &mut user_vaults, "vault-1", "bob", Role::Edit, 20).unwrap();
            upsert_membership(&mut members, &mut user_vaults, "vault-10", "dave", Role::View, 10).unwrap();

            let rows = list_members(&members, "vault-1").unwrap();
            let users: Vec<&str> = rows.iter().map(|m| m.user_id.as_str()).collect();
            assert_eq!(users, vec!["bob", "carol"]);
        }
        write_txn.commit().unwrap();
    }
}
