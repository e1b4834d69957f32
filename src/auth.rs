//! Bearer-token auth: bcrypt password hashes, HS256 JWTs, and axum
//! extractors for the three access tiers (logged in / subscriber / admin).

use anyhow::Context;
use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::api::AppState;
use crate::error::ApiError;
use crate::models::{Role, User};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: usize,
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).context("hash password")
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

pub fn issue_token(secret: &str, ttl_days: i64, user: &User) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user.id,
        role: user.role,
        exp: (Utc::now() + Duration::days(ttl_days)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .context("sign token")
}

pub fn decode_token(secret: &str, token: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))
}

/// Fresh password-reset token plus the SHA-256 digest that gets persisted.
/// Only the digest is stored; the raw token travels by email.
pub fn make_reset_token() -> (String, String) {
    let token = Uuid::new_v4().simple().to_string();
    let digest = reset_digest(&token);
    (token, digest)
}

pub fn reset_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Any logged-in user.
pub struct AuthUser(pub User);

/// Admin-only routes.
pub struct AdminUser(pub User);

/// Active subscribers (admins pass too).
pub struct Subscriber(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Please log in to access this resource".to_string()))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("Malformed authorization header".to_string()))?;

        let claims = decode_token(&state.config.jwt_secret, token)?;
        let user = state
            .store
            .user_by_id(claims.sub)?
            .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))?;
        Ok(AuthUser(user))
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            return Err(ApiError::Forbidden(
                "Only admins are allowed to access this resource".to_string(),
            ));
        }
        Ok(AdminUser(user))
    }
}

impl FromRequestParts<AppState> for Subscriber {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin && !user.subscription.is_active() {
            return Err(ApiError::Forbidden(
                "Only subscribers can access this resource".to_string(),
            ));
        }
        Ok(Subscriber(user))
    }
}
