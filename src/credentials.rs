// 🔐 Credential Provisioner - salt + SHA-256 digest for stored passwords
//
// digest = SHA-256(salt ‖ UTF-8 password), both stored as base64 text.
//
// NOTE: a single SHA-256 pass is cheap to brute-force offline. Kept for
// compatibility with existing rows; a KDF such as argon2 would need a
// format change in `users.password_hash`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::error::{CatalogError, CatalogResult};

pub const SALT_LEN: usize = 16;
pub const DIGEST_LEN: usize = 32;

/// 16 bytes from the operating system's CSPRNG
pub fn generate_salt() -> CatalogResult<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| CatalogError::Credential(format!("random source unavailable: {}", e)))?;
    Ok(salt)
}

/// SHA-256 over the salt followed by the password bytes
pub fn hash_password(password: &str, salt: &[u8]) -> [u8; DIGEST_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode(text: &str) -> CatalogResult<Vec<u8>> {
    Ok(STANDARD.decode(text)?)
}

/// Base64-encoded salt and digest, ready to be stored on a `User`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub salt: String,
    pub hash: String,
}

impl Credentials {
    /// Fresh salt, digest of `password` under it
    pub fn provision(password: &str) -> CatalogResult<Self> {
        let salt = generate_salt()?;
        let hash = hash_password(password, &salt);

        Ok(Credentials {
            salt: encode(&salt),
            hash: encode(&hash),
        })
    }
}
