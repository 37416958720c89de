//! Bearer-token identity.
//!
//! Every `/api` route identifies its user from an `Authorization: Bearer <token>` header. Tokens are HS256 JWTs whose
//! `sub` claim is the user id. Registration and login live outside this service. [`TokenIssuer`] is only here so that
//! operators and tests can mint tokens with the configured secret.
use std::time::Duration;

use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use chrono::Utc;
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use loyalty_engine::db_types::UserId;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

impl JwtClaims {
    pub fn user_id(&self) -> UserId {
        UserId::from(self.sub.as_str())
    }
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_from_request(req))
    }
}

fn claims_from_request(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    let authority = req
        .app_data::<web::Data<TokenAuthority>>()
        .ok_or_else(|| ServerError::ConfigurationError("No token authority has been configured".into()))?;
    let header = req.headers().get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let value = header.to_str().map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .ok_or_else(|| AuthError::PoorlyFormattedToken("Expected a Bearer token".into()))?;
    let claims = authority.validate(token.trim())?;
    trace!("💻️ Request authenticated for {}", claims.sub);
    Ok(claims)
}

/// Checks access tokens against the configured secret.
#[derive(Clone)]
pub struct TokenAuthority {
    key: DecodingKey,
    validation: Validation,
}

impl TokenAuthority {
    pub fn new(config: &AuthConfig) -> Self {
        let key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        let validation = Validation::new(Algorithm::HS256);
        Self { key, validation }
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation).map_err(|e| {
            debug!("💻️ Rejected access token. {e}");
            AuthError::ValidationError(e.to_string())
        })?;
        if data.claims.sub.trim().is_empty() {
            return Err(AuthError::ValidationError("The token does not name a user".into()));
        }
        Ok(data.claims)
    }
}

pub struct TokenIssuer {
    key: EncodingKey,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let key = EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        Self { key, lifetime: config.token_lifetime }
    }

    /// Issue a new access token for `user_id`, valid for `duration`, or the configured lifetime if `None`.
    /// This method DOES NOT check that the user exists. That is up to whoever authenticated them.
    pub fn issue_token(&self, user_id: &UserId, duration: Option<Duration>) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let lifetime = i64::try_from(duration.unwrap_or(self.lifetime).as_secs()).unwrap_or(i64::MAX);
        let claims = JwtClaims { sub: user_id.to_string(), iat: now, exp: now.saturating_add(lifetime) };
        encode(&Header::new(Algorithm::HS256), &claims, &self.key).map_err(|e| AuthError::ValidationError(e.to_string()))
    }
}
