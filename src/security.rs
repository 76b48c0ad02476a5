use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::constants::TOKEN_BYTES;

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// Opaque Tokens
// =============================================================================

/// Generate an opaque bearer token for invitations and share links
///
/// The token is `TOKEN_BYTES` bytes from the OS CSPRNG encoded as URL-safe
/// base64 without padding, so it can be embedded in a path segment or a
/// query parameter as-is. It carries no vault identity and no sequence.
pub fn new_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Shorten a token for log output
pub fn token_fingerprint(token: &str) -> &str {
    let end = token
        .char_indices()
        .nth(6)
        .map(|(i, _)| i)
        .unwrap_or(token.len());
    &token[..end]
}

// =============================================================================
// Passcode Hashing
// =============================================================================

/// One-way hasher for share-link passcodes
///
/// Digests are `HMAC-SHA256(pepper, secret)` encoded as lowercase hex. The
/// pepper comes from the environment and is never stored.
#[derive(Clone)]
pub struct SecretHasher {
    pepper: Vec<u8>,
}

impl std::fmt::Debug for SecretHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretHasher").finish_non_exhaustive()
    }
}

impl SecretHasher {
    pub fn new(pepper: impl AsRef<[u8]>) -> Self {
        Self {
            pepper: pepper.as_ref().to_vec(),
        }
    }

    fn digest(&self, secret: &str) -> Vec<u8> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.pepper)
            .unwrap_or_else(|_| unreachable!("HMAC-SHA256 accepts any key length"));
        mac.update(secret.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }

    /// Hash a secret into its stored hex digest
    pub fn hash(&self, secret: &str) -> String {
        hex::encode(self.digest(secret))
    }

    /// Check a secret against a stored digest
    ///
    /// The comparison runs in constant time over the digest bytes. A stored
    /// digest that is not valid hex never verifies.
    pub fn verify(&self, secret: &str, digest: &str) -> bool {
        let expected = match hex::decode(digest) {
            Ok(bytes) => bytes,
            Err(_) => {
                tracing::warn!("Stored passcode digest is not valid hex");
                return false;
            }
        };

        let actual = self.digest(secret);
        actual.ct_eq(&expected).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Token Tests
    // =========================================================================

    #[test]
    fn test_new_token_is_url_safe() {
        let token = new_token();

        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_new_token_is_unique() {
        let tokens: std::collections::HashSet<String> = (0..1000).map(|_| new_token()).collect();
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn test_token_fingerprint() {
        assert_eq!(token_fingerprint("abcdefghijkl"), "abcdef");
        assert_eq!(token_fingerprint("abc"), "abc");
    }

    // =========================================================================
    // Passcode Hashing Tests
    // =========================================================================

    #[test]
    fn test_hash_deterministic() {
        let hasher = SecretHasher::new("pepper");

        assert_eq!(hasher.hash("1234"), hasher.hash("1234"));
    }

    #[test]
    fn test_hash_format() {
        let hasher = SecretHasher::new("pepper");
        let digest = hasher.hash("1234");

        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(!digest.contains("1234"));
    }

    #[test]
    fn test_hash_different_inputs() {
        let hasher = SecretHasher::new("pepper");

        assert_ne!(hasher.hash("1234"), hasher.hash("1235"));
    }

    #[test]
    fn test_hash_different_peppers() {
        let a = SecretHasher::new("pepper1");
        let b = SecretHasher::new("pepper2");

        assert_ne!(a.hash("1234"), b.hash("1234"));
    }

    #[test]
    fn test_verify_matching_secret() {
        let hasher = SecretHasher::new("pepper");
        let digest = hasher.hash("1234");

        assert!(hasher.verify("1234", &digest));
    }

    #[test]
    fn test_verify_wrong_secret() {
        let hasher = SecretHasher::new("pepper");
        let digest = hasher.hash("1234");

        assert!(!hasher.verify("wrong", &digest));
        assert!(!hasher.verify("", &digest));
    }

    #[test]
    fn test_verify_malformed_digest() {
        let hasher = SecretHasher::new("pepper");

        assert!(!hasher.verify("1234", "not-hex"));
        assert!(!hasher.verify("1234", ""));
        assert!(!hasher.verify("1234", "abcd"));
    }

    #[test]
    fn test_debug_hides_pepper() {
        let hasher = SecretHasher::new("super-secret-pepper");
        assert!(!format!("{:?}", hasher).contains("super-secret-pepper"));
    }
}
