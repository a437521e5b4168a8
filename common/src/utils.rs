// common/src/utils.rs
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use jsonwebtoken::{encode, decode, Header, Algorithm, Validation, EncodingKey, DecodingKey};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::session::SessionToken;

/// Setup tracing for consistent logging; RUST_LOG overrides the INFO default
pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Seconds since the unix epoch
pub fn unix_now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or_default()
}

/// Sign a Discord session token. `iat` and `exp` are filled in here.
pub fn issue_session_token(
    mut token: SessionToken,
    max_age_seconds: i64,
    secret: &[u8],
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = unix_now();
    token.iat = now;
    token.exp = now + max_age_seconds.max(0) as usize;

    encode(
        &Header::default(),
        &token,
        &EncodingKey::from_secret(secret)
    )
}

/// Validate a Discord session token and return its claims
pub fn validate_session_token(token: &str, secret: &[u8]) -> Result<SessionToken, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let token_data = decode::<SessionToken>(
        token,
        &DecodingKey::from_secret(secret),
        &validation
    )?;

    if token_data.claims.sub.is_empty() {
        return Err(jsonwebtoken::errors::ErrorKind::InvalidSubject.into());
    }

    Ok(token_data.claims)
}
