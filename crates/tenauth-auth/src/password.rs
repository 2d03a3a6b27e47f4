//! Password hashing and verification using Argon2id.
//!
//! Hashing uses the `argon2` crate defaults (Argon2id v19, m=19456 KiB,
//! t=2, p=1) with a fresh random salt per hash. An optional pepper is
//! prepended to the password in both directions.

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use tracing::warn;

use crate::error::AuthError;

fn peppered<'a>(password: &'a str, pepper: Option<&str>, buf: &'a mut String) -> &'a [u8] {
    match pepper {
        Some(p) => {
            *buf = format!("{p}{password}");
            buf.as_bytes()
        }
        None => password.as_bytes(),
    }
}

/// Hash a plaintext password into a PHC-format Argon2id string.
pub fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, AuthError> {
    let mut buf = String::new();
    let input = peppered(password, pepper, &mut buf);

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(input, &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Crypto(format!("password hash error: {e}")))
}

/// Verify a plaintext password against a stored PHC hash.
///
/// The comparison is constant-time. A malformed hash yields `false`
/// rather than an error.
pub fn verify_password(password: &str, hash: &str, pepper: Option<&str>) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(e) => {
            warn!(error = %e, "stored password hash is malformed");
            return false;
        }
    };

    let mut buf = String::new();
    let input = peppered(password, pepper, &mut buf);

    Argon2::default()
        .verify_password(input, &parsed_hash)
        .is_ok()
}
