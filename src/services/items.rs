//! Role-gated access to vault items.

use redb::{Database, ReadableDatabase};
use uuid::Uuid;

use crate::constants::MAX_ITEM_TITLE_LEN;
use crate::db::{child_key, store, tables};
use crate::error::{AppError, Result};
use crate::models::{NewVaultItem, Role, VaultItem, VaultItemUpdate};
use crate::services::roles;

fn validate_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > MAX_ITEM_TITLE_LEN {
        return Err(AppError::Validation(format!(
            "Item title must be between 1 and {} characters",
            MAX_ITEM_TITLE_LEN
        )));
    }
    Ok(title.to_string())
}

fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(AppError::Validation("Item password is required".to_string()));
    }
    Ok(())
}

fn clean_tags(tags: Option<Vec<String>>) -> Option<Vec<String>> {
    tags.map(|tags| {
        tags.into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect()
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Items of a vault, newest first; any role may read
pub fn list_items(db: &Database, vault_id: &str, actor_id: &str) -> Result<Vec<VaultItem>> {
    let read_txn = db.begin_read()?;
    let vaults = read_txn.open_table(tables::VAULTS)?;
    let members = read_txn.open_table(tables::VAULT_MEMBERS)?;
    roles::authorize(&vaults, &members, vault_id, actor_id, Role::View)?;

    let items = read_txn.open_table(tables::VAULT_ITEMS)?;
    store::list_items(&items, vault_id)
}

/// Add an item to a vault; edit or owner
pub fn create_item(
    db: &Database,
    vault_id: &str,
    actor_id: &str,
    data: NewVaultItem,
    now: i64,
) -> Result<VaultItem> {
    let title = validate_title(&data.title)?;
    validate_password(&data.password)?;

    let item = VaultItem {
        id: Uuid::new_v4().to_string(),
        vault_id: vault_id.to_string(),
        title,
        username: non_empty(data.username),
        password: data.password,
        notes: non_empty(data.notes),
        tags: clean_tags(data.tags),
        created_by: Some(actor_id.to_string()),
        created_at: now,
        updated_at: now,
    };

    let write_txn = db.begin_write()?;
    {
        let vaults = write_txn.open_table(tables::VAULTS)?;
        let members = write_txn.open_table(tables::VAULT_MEMBERS)?;
        roles::authorize(&vaults, &members, vault_id, actor_id, Role::Edit)?;

        let mut items = write_txn.open_table(tables::VAULT_ITEMS)?;
        store::put_record(&mut items, &child_key(vault_id, &item.id), &item)?;
    }
    write_txn.commit()?;

    tracing::info!("Item {} added to vault {} by {}", item.id, vault_id, actor_id);
    Ok(item)
}

/// Apply a partial update to an item; edit or owner
pub fn update_item(
    db: &Database,
    vault_id: &str,
    item_id: &str,
    actor_id: &str,
    update: VaultItemUpdate,
    now: i64,
) -> Result<VaultItem> {
    let title = update.title.as_deref().map(validate_title).transpose()?;
    if let Some(password) = &update.password {
        validate_password(password)?;
    }

    let write_txn = db.begin_write()?;
    let item = {
        let vaults = write_txn.open_table(tables::VAULTS)?;
        let members = write_txn.open_table(tables::VAULT_MEMBERS)?;
        roles::authorize(&vaults, &members, vault_id, actor_id, Role::Edit)?;

        let mut items = write_txn.open_table(tables::VAULT_ITEMS)?;
        let key = child_key(vault_id, item_id);
        let mut item: VaultItem =
            store::get_record(&items, &key)?.ok_or(AppError::NotFound("Item"))?;

        if let Some(title) = title {
            item.title = title;
        }
        if let Some(username) = update.username {
            item.username = non_empty(Some(username));
        }
        if let Some(password) = update.password {
            item.password = password;
        }
        if let Some(notes) = update.notes {
            item.notes = non_empty(Some(notes));
        }
        if update.tags.is_some() {
            item.tags = clean_tags(update.tags);
        }
        item.updated_at = now;

        store::put_record(&mut items, &key, &item)?;
        item
    };
    write_txn.commit()?;

    tracing::info!("Item {} in vault {} updated by {}", item_id, vault_id, actor_id);
    Ok(item)
}

/// Delete an item; edit or owner
pub fn delete_item(db: &Database, vault_id: &str, item_id: &str, actor_id: &str) -> Result<()> {
    let write_txn = db.begin_write()?;
    {
        let vaults = write_txn.open_table(tables::VAULTS)?;
        let members = write_txn.open_table(tables::VAULT_MEMBERS)?;
        roles::authorize(&vaults, &members, vault_id, actor_id, Role::Edit)?;

        let mut items = write_txn.open_table(tables::VAULT_ITEMS)?;
        let removed = items.remove(child_key(vault_id, item_id).as_str())?.is_some();
        if !removed {
            return Err(AppError::NotFound("Item"));
        }
    }
    write_txn.commit()?;

    tracing::info!("Item {} deleted from vault {} by {}", item_id, vault_id, actor_id);
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
        let db = Database::create(temp_dir.path().join("items.db")).unwrap();
        init_tables(&db).unwrap();

        let vault = vaults::create_vault(&db, "alice", "Team", VaultType::Team, 0).unwrap();

        let write_txn = db.begin_write().unwrap();
        {
            let mut members = write_txn.open_table(tables::VAULT_MEMBERS).unwrap();
            let mut user_vaults = write_txn.open_table(tables::USER_VAULTS).unwrap();
            store::upsert_membership(&mut members, &mut user_vaults, &vault.id, "editor", Role::Edit, 1)
                .unwrap();
            store::upsert_membership(&mut members, &mut user_vaults, &vault.id, "viewer", Role::View, 2)
                .unwrap();
        }
        write_txn.commit().unwrap();

        (temp_dir, db, vault.id)
    }

    fn new_item(title: &str) -> NewVaultItem {
        NewVaultItem {
            title: title.to_string(),
            username: Some("user@example.com".to_string()),
            password: "hunter2".to_string(),
            notes: None,
            tags: Some(vec![" work ".to_string(), "".to_string()]),
        }
    }

    #[test]
    fn test_editor_can_create_and_viewer_cannot() {
        let (_dir, db, vault_id) = setup();

        let item = create_item(&db, &vault_id, "editor", new_item("Email"), 10).unwrap();
        assert_eq!(item.tags, Some(vec!["work".to_string()]));
        assert_eq!(item.created_by.as_deref(), Some("editor"));

        assert!(matches!(
            create_item(&db, &vault_id, "viewer", new_item("Nope"), 11),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            create_item(&db, &vault_id, "stranger", new_item("Nope"), 11),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn test_list_items_newest_first() {
        let (_dir, db, vault_id) = setup();
        create_item(&db, &vault_id, "alice", new_item("First"), 10).unwrap();
        create_item(&db, &vault_id, "alice", new_item("Second"), 20).unwrap();

        let items = list_items(&db, &vault_id, "viewer").unwrap();
        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();

        assert_eq!(titles, vec!["Second", "First"]);
    }

    #[test]
    fn test_update_item_partial() {
        let (_dir, db, vault_id) = setup();
        let item = create_item(&db, &vault_id, "alice", new_item("Email"), 10).unwrap();

        let updated = update_item(
            &db,
            &vault_id,
            &item.id,
            "editor",
            VaultItemUpdate {
                password: Some("correct horse".to_string()),
                ..Default::default()
            },
            20,
        )
        .unwrap();

        assert_eq!(updated.title, "Email");
        assert_eq!(updated.password, "correct horse");
        assert_eq!(updated.username, item.username);
        assert_eq!(updated.updated_at, 20);
    }

    #[test]
    fn test_item_validation() {
        let (_dir, db, vault_id) = setup();

        let mut blank_password = new_item("Email");
        blank_password.password = String::new();
        assert!(matches!(
            create_item(&db, &vault_id, "alice", blank_password, 0),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            create_item(&db, &vault_id, "alice", new_item("  "), 0),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_delete_item() {
        let (_dir, db, vault_id) = setup();
        let item = create_item(&db, &vault_id, "alice", new_item("Email"), 10).unwrap();

        assert!(matches!(
            delete_item(&db, &vault_id, &item.id, "viewer"),
            Err(AppError::Forbidden)
        ));
        delete_item(&db, &vault_id, &item.id, "editor").unwrap();
        assert!(matches!(
            delete_item(&db, &vault_id, &item.id, "editor"),
            Err(AppError::NotFound("Item"))
        ));
        assert!(list_items(&db, &vault_id, "alice").unwrap().is_empty());
    }
}
