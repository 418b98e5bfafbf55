//! Password digesting, verification and generation.
//!
//! The store schema fixes the password column to a one-way digest (hex
//! sha-256), so verification recomputes the digest and compares in constant
//! time. Plaintext passwords exist only transiently: at creation (relayed to
//! the administrator once) and at login.

use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Length of generated passwords, letters and digits.
const GENERATED_PASSWORD_LEN: usize = 15;

const PASSWORD_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Compute the stored digest of a password (lowercase hex, 64 chars).
pub fn digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Verify a password against a stored digest in constant time.
///
/// A naive `==` on digests leaks how many leading bytes matched; the
/// comparison must not depend on the data.
pub fn verify(password: &str, stored_digest: &str) -> bool {
    let computed = digest(password);
    if computed.len() != stored_digest.len() {
        return false;
    }
    computed.as_bytes().ct_eq(stored_digest.as_bytes()).into()
}

/// Generate a random password of fixed length drawn from letters and digits.
/// Returned in plaintext exactly once so it can be relayed out-of-band; only
/// the digest persists.
pub fn generate_password() -> String {
    let mut rng = rand::rng();
    (0..GENERATED_PASSWORD_LEN)
        .map(|_| {
            let idx = rng.random_range(0..PASSWORD_ALPHABET.len());
            PASSWORD_ALPHABET[idx] as char
        })
        .collect()
}
