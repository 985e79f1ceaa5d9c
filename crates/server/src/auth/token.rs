//! Access token minting.

use crate::auth::middleware::Claims;
use jsonwebtoken::{encode, EncodingKey, Header};
use std::time::{SystemTime, UNIX_EPOCH};

/// Mints a signed, time-bounded access token for a user id.
pub fn create_token(user_id: i64, secret: &str, expires_in_secs: u64) -> anyhow::Result<String> {
    let expiration = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() + expires_in_secs;
    let claims = Claims {
        sub: user_id.to_string(),
        exp: expiration as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?;
    Ok(token)
}
