//! Password sign-in and bearer-token verification.
//!
//! A token is `<expiry>.<password-hash>.<signature>`: the expiry unix
//! timestamp, the SHA-256 hash of the configured password, and an
//! HMAC-SHA256 signature over the first two parts. Binding the password hash
//! into the token invalidates every outstanding session when the password
//! changes; the expiry bounds the session to eight hours.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::app::AppState;
use crate::error::ApiError;

type HmacSha256 = Hmac<Sha256>;

/// Session lifetime in seconds (8 hours).
pub const TOKEN_TTL_SECS: i64 = 8 * 60 * 60;

/// Hex-encoded SHA-256 of the password. Stored inside tokens so a password
/// change invalidates them.
pub fn password_hash(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

fn sign(secret: &str, payload: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Mints a signed session token for a successful sign-in.
pub fn issue_token(secret: &str, password: &str, now_unix: i64) -> String {
    let payload = format!("{}.{}", now_unix + TOKEN_TTL_SECS, password_hash(password));
    let signature = sign(secret, &payload);
    format!("{payload}.{signature}")
}

/// Checks signature, expiry, and that the token was minted for the current
/// password. Returns the client-facing rejection on failure.
pub fn verify_token(
    secret: &str,
    password: &str,
    token: &str,
    now_unix: i64,
) -> Result<(), ApiError> {
    let invalid = || ApiError::Unauthorized("invalid token".to_string());

    let mut parts = token.splitn(3, '.');
    let (Some(expiry), Some(hash), Some(signature)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(format!("{expiry}.{hash}").as_bytes());
    let decoded = hex::decode(signature).map_err(|_| invalid())?;
    mac.verify_slice(&decoded).map_err(|_| invalid())?;

    let expiry: i64 = expiry.parse().map_err(|_| invalid())?;
    if expiry <= now_unix {
        return Err(ApiError::Unauthorized("token expired".to_string()));
    }

    if hash != password_hash(password) {
        // Minted before a password change.
        return Err(ApiError::Unauthorized("token expired".to_string()));
    }

    Ok(())
}

/// Middleware guarding the task routes. Passes everything through when no
/// password is configured.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(password) = state.config.password.as_deref() else {
        return Ok(next.run(request).await);
    };

    let token = token_from_headers(request.headers()).ok_or_else(|| {
        ApiError::Unauthorized("authentication required".to_string())
    })?;

    verify_token(
        &state.config.token_secret,
        password,
        &token,
        chrono::Utc::now().timestamp(),
    )?;

    Ok(next.run(request).await)
}

/// Token from the `Authorization: Bearer` header, falling back to the
/// `token` cookie set at sign-in.
fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())?
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix("token="))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";
    const PASSWORD: &str = "hunter2";

    #[test]
    fn issued_tokens_verify() {
        let token = issue_token(SECRET, PASSWORD, 1_700_000_000);
        assert!(verify_token(SECRET, PASSWORD, &token, 1_700_000_000).is_ok());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let token = issue_token(SECRET, PASSWORD, 1_700_000_000);
        let later = 1_700_000_000 + TOKEN_TTL_SECS + 1;
        assert!(verify_token(SECRET, PASSWORD, &token, later).is_err());
    }

    #[test]
    fn password_change_invalidates_tokens() {
        let token = issue_token(SECRET, PASSWORD, 1_700_000_000);
        assert!(verify_token(SECRET, "new-password", &token, 1_700_000_000).is_err());
    }

    #[test]
    fn tampered_tokens_are_rejected() {
        let token = issue_token(SECRET, PASSWORD, 1_700_000_000);
        let tampered = token.replacen('.', "0.", 1);
        assert!(verify_token(SECRET, PASSWORD, &tampered, 1_700_000_000).is_err());
        assert!(verify_token(SECRET, PASSWORD, "garbage", 1_700_000_000).is_err());
    }
}
