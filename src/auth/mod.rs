//! Session handling for the Meteo server
//!
//! Requests to account-scoped endpoints carry a bearer JWT issued by the
//! auth backend. The token is verified here and turned into an explicit
//! [`Session`] value that handlers receive as an extractor argument, so
//! nothing downstream depends on ambient user state.

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::error::{AppError, AuthError};
use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,   // Account ID
    pub email: String,
    pub exp: i64,      // Expiration time
    pub iat: i64,      // Issued at
}

/// The authenticated caller of the current request.
#[derive(Debug, Clone)]
pub struct Session {
    pub account_id: Uuid,
    pub email: String,
}

pub fn issue_token(
    account_id: Uuid,
    email: &str,
    secret: &str,
    expiry_hours: i64,
) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: account_id.to_string(),
        email: email.to_string(),
        exp: (now + Duration::hours(expiry_hours)).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalError(e.to_string()))
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::AuthError(AuthError::TokenExpired),
        _ => AppError::AuthError(AuthError::InvalidToken),
    })?;

    Ok(data.claims)
}

fn session_from_request(req: &HttpRequest) -> Result<Session, AppError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::InternalError("Application state is not configured".into()))?;

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AppError::AuthError(AuthError::MissingToken))?;

    let claims = decode_token(token, &state.config.auth.jwt_secret)?;

    let account_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::AuthError(AuthError::InvalidToken))?;

    Ok(Session {
        account_id,
        email: claims.email,
    })
}

impl FromRequest for Session {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(session_from_request(req))
    }
}
