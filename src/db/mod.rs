pub mod store;
pub mod tables;

use redb::{Database, Error as RedbError};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::constants::KEY_SEPARATOR;
use crate::error::Result;

const BINCODE_CONFIG: bincode::config::Configuration = bincode::config::standard();

/// Database handle type (Arc-wrapped for sharing across handlers)
pub type Db = Arc<Database>;

/// Open or create the redb database at the given path
///
/// Creates all required tables on first run.
#[allow(clippy::result_large_err)]
pub fn open_database(path: impl AsRef<Path>) -> std::result::Result<Db, RedbError> {
    tracing::info!("Opening database at: {:?}", path.as_ref());

    // Create parent directory if it doesn't exist
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                tracing::error!("Failed to create database directory: {}", e);
                RedbError::Io(e)
            })?;
        }
    }

    let db = Database::create(path)?;
    init_tables(&db)?;

    tracing::info!("Database initialized successfully");

    Ok(Arc::new(db))
}

/// Create every table so read transactions never hit a missing table
#[allow(clippy::result_large_err)]
pub fn init_tables(db: &Database) -> std::result::Result<(), RedbError> {
    let write_txn = db.begin_write()?;
    {
        let _ = write_txn.open_table(tables::VAULTS)?;
        let _ = write_txn.open_table(tables::VAULT_MEMBERS)?;
        let _ = write_txn.open_table(tables::USER_VAULTS)?;
        let _ = write_txn.open_table(tables::VAULT_ITEMS)?;
        let _ = write_txn.open_table(tables::INVITATIONS)?;
        let _ = write_txn.open_table(tables::INVITATION_TOKENS)?;
        let _ = write_txn.open_table(tables::VAULT_INVITATIONS)?;
        let _ = write_txn.open_table(tables::EMAIL_INVITATIONS)?;
        let _ = write_txn.open_table(tables::SHARE_LINKS)?;
        let _ = write_txn.open_table(tables::VAULT_SHARE_LINKS)?;
    }
    write_txn.commit()?;
    Ok(())
}

/// Serialize a record for storage
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(bincode::serde::encode_to_vec(value, BINCODE_CONFIG)?)
}

/// Deserialize a stored record
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let (value, _) = bincode::serde::decode_from_slice(bytes, BINCODE_CONFIG)?;
    Ok(value)
}

/// Composite key `{parent}/{child}`
pub fn child_key(parent: &str, child: &str) -> String {
    format!("{}{}{}", parent, KEY_SEPARATOR, child)
}

/// Half-open key range covering every `{parent}/...` key
///
/// The upper bound swaps the trailing separator for the next code point, so
/// `"{parent}0"` sorts after every `"{parent}/..."` key.
pub fn prefix_range(parent: &str) -> (String, String) {
    let start = format!("{}{}", parent, KEY_SEPARATOR);
    let end = format!("{}{}", parent, char::from(KEY_SEPARATOR as u8 + 1));
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, VaultMember};

    #[test]
    fn test_prefix_range_bounds() {
        let (start, end) = prefix_range("vault-1");

        assert_eq!(start, "vault-1/");
        assert_eq!(end, "vault-10");
        assert!(child_key("vault-1", "zzz").as_str() < end.as_str());
        assert!(child_key("vault-1", "").as_str() >= start.as_str());
        // Sibling ids that share a prefix fall outside the range
        assert!(child_key("vault-10", "a").as_str() >= end.as_str());
    }

    #[test]
    fn test_record_roundtrip() {
        let member = VaultMember {
            vault_id: "v".to_string(),
            user_id: "u".to_string(),
            role: Role::Edit,
            joined_at: 1_733_788_800_000,
        };

        let bytes = encode(&member).unwrap();
        let decoded: VaultMember = decode(&bytes).unwrap();

        assert_eq!(decoded, member);
    }
}
