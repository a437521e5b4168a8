// web-server/src/utils/token.rs
use rand::{thread_rng, Rng};
use rand::distributions::Alphanumeric;
use sha2::{Sha256, Digest};
use std::time::{SystemTime, UNIX_EPOCH};

/// Generate a cryptographically secure random token of specified length
pub fn generate_secure_token(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Login payload nonce. Alphanumeric only, so it survives the signed message
/// layout untouched.
pub fn generate_nonce() -> String {
    generate_secure_token(17)
}

/// OAuth `state` value binding the Discord redirect to this browser
pub fn generate_oauth_state() -> String {
    generate_secure_token(32)
}

/// Hash a string using SHA-256
pub fn hash_string(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let result = hasher.finalize();
    format!("{:x}", result)
}

/// Create a browser session token with more entropy
pub fn create_session_token() -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();

    let random_part = generate_secure_token(32);
    let input = format!("{}-{}", timestamp, random_part);

    hash_string(&input)
}
