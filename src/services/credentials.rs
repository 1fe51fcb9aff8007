//! Salted password hashing.
//!
//! Stored credentials have the form `salt$digest`, where `salt` is 16 random
//! bytes hex-encoded and `digest` is the hex SHA-256 of `salt ‖ password`.

use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const SALT_BYTES: usize = 16;
const SEPARATOR: char = '$';

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_BYTES];
    OsRng.fill_bytes(&mut salt);
    let salt = hex::encode(salt);
    let digest = digest(&salt, password);
    format!("{}{}{}", salt, SEPARATOR, digest)
}

/// Verify a candidate password against a stored `salt$digest` value.
///
/// Malformed stored values never match.
pub fn verify_password(stored: &str, candidate: &str) -> bool {
    let Some((salt, expected)) = stored.split_once(SEPARATOR) else {
        return false;
    };
    if salt.is_empty() || expected.is_empty() {
        return false;
    }

    let computed = digest(salt, candidate);
    computed.as_bytes().ct_eq(expected.as_bytes()).into()
}
