//! Effective-role resolution for vault actors.

use redb::ReadableTable;

use crate::db::store;
use crate::error::{AppError, Result};
use crate::models::{Role, Vault};

/// Compute `actor_id`'s effective role on `vault`
///
/// - Personal vaults: only the owner resolves, to `owner`.
/// - Shared vaults: the owner always resolves to `owner`, whatever the
///   membership table says; everyone else gets their membership row's role.
///
/// `None` means no access at all and must be treated as forbidden.
pub fn resolve<T>(members: &T, vault: &Vault, actor_id: &str) -> Result<Option<Role>>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    if actor_id == vault.owner_id {
        return Ok(Some(Role::Owner));
    }
    if vault.is_personal() {
        return Ok(None);
    }

    Ok(store::get_membership(members, &vault.id, actor_id)?.map(|member| member.role))
}

/// Load a vault and check that `actor_id` holds at least `required` on it
///
/// Fails with `NotFound` if the vault does not exist and `Forbidden` if the
/// actor's role is missing or too weak. Returns the vault and the role.
pub fn authorize<V, M>(
    vaults: &V,
    members: &M,
    vault_id: &str,
    actor_id: &str,
    required: Role,
) -> Result<(Vault, Role)>
where
    V: ReadableTable<&'static str, &'static [u8]>,
    M: ReadableTable<&'static str, &'static [u8]>,
{
    let vault = store::get_vault(vaults, vault_id)?.ok_or(AppError::NotFound("Vault"))?;

    match resolve(members, &vault, actor_id)? {
        Some(role) if role.allows(required) => Ok((vault, role)),
        Some(role) => {
            tracing::warn!(
                "Actor {} with role {} attempted {} operation on vault {}",
                actor_id,
                role,
                required,
                vault_id
            );
            Err(AppError::Forbidden)
        }
        None => {
            tracing::warn!("Actor {} has no access to vault {}", actor_id, vault_id);
            Err(AppError::Forbidden)
        }
    }
}
