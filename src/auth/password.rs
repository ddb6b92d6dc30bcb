use bcrypt::BcryptError;

use crate::config;

/// Hash a password with the configured bcrypt cost
pub fn hash_password(password: &str) -> Result<String, BcryptError> {
    bcrypt::hash(password, config::config().security.bcrypt_cost)
}

/// Compare a plain password with a stored bcrypt hash.
/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match bcrypt::verify(password, hash) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!("Stored password hash could not be verified: {}", e);
            false
        }
    }
}
