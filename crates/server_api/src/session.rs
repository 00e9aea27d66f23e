use anyhow::anyhow;
use chrono::{TimeDelta, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::domain::UserId;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub issuer: String,
    pub secret: String,
    pub ttl_seconds: i64,
}

/// Proof that a request carries an authenticated identity.
///
/// Only constructible with a non-empty user id, so holding one is enough to
/// read that user's data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    user_id: UserId,
}

impl AuthSession {
    pub fn new(user_id: UserId) -> Option<Self> {
        if user_id.is_empty() {
            return None;
        }
        Some(Self { user_id })
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,
    sub: String,
    iat: i64,
    exp: i64,
}

pub fn mint_session_token(cfg: &SessionConfig, user_id: &UserId) -> anyhow::Result<String> {
    let now = Utc::now();
    let expires_at = TimeDelta::try_seconds(cfg.ttl_seconds)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| anyhow!("session ttl out of range: {}", cfg.ttl_seconds))?;
    let claims = Claims {
        iss: cfg.issuer.clone(),
        sub: user_id.0.clone(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(cfg.secret.as_bytes()),
    )?;
    Ok(token)
}

/// Resolves a bearer token to a session; anything unverifiable means "no session".
pub fn verify_session_token(cfg: &SessionConfig, token: &str) -> Option<AuthSession> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[cfg.issuer.as_str()]);
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(cfg.secret.as_bytes()),
        &validation,
    )
    .ok()?;
    AuthSession::new(UserId(data.claims.sub))
}
