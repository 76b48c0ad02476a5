use serde::{Deserialize, Serialize};

/// Credential entry stored in a vault
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultItem {
    pub id: String,
    pub vault_id: String,
    pub title: String,
    pub username: Option<String>,
    pub password: String,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
    pub created_by: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl VaultItem {
    /// Copy of the fields a share-link holder may read
    pub fn to_shared(&self) -> SharedItem {
        SharedItem {
            title: self.title.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            notes: self.notes.clone(),
            tags: self.tags.clone(),
            created_at: self.created_at,
        }
    }
}

/// Fields supplied when creating an item
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewVaultItem {
    pub title: String,
    pub username: Option<String>,
    pub password: String,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Partial update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VaultItemUpdate {
    pub title: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Item as exposed through a share link
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharedItem {
    pub title: String,
    pub username: Option<String>,
    pub password: String,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
    pub created_at: i64,
}
