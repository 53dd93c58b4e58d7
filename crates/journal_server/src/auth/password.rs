//! Password hashing with Argon2id.

use argon2::{Config, Variant, Version};
use rand::RngCore;

/// Hash a password with a fresh random salt. The result is a PHC string that
/// carries its own parameters.
pub fn hash_password(password: &str) -> Result<String, argon2::Error> {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);

    let config = Config {
        variant: Variant::Argon2id,
        version: Version::Version13,
        ..Default::default()
    };
    argon2::hash_encoded(password.as_bytes(), &salt, &config)
}

/// Check a password against a stored hash. Malformed hashes never verify.
pub fn verify_password(hash: &str, password: &str) -> bool {
    argon2::verify_encoded(hash, password.as_bytes()).unwrap_or(false)
}
