use std::time::Duration;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{
    claims::{Claims, TokenKind},
    policy::Subject,
};
use crate::{
    config::JwtConfig,
    error::AppError,
    state::AppState,
    users::User,
};

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub temp_ttl: Duration,
}

impl From<&JwtConfig> for JwtKeys {
    fn from(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            access_ttl: Duration::from_secs((cfg.ttl_minutes.max(1) as u64) * 60),
            temp_ttl: Duration::from_secs((cfg.temp_ttl_minutes.max(1) as u64) * 60),
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::from(&state.config.jwt)
    }
}

impl JwtKeys {
    fn claims(&self, user_id: Uuid, kind: TokenKind) -> Claims {
        let now = OffsetDateTime::now_utc();
        let ttl = match kind {
            TokenKind::Temp => self.temp_ttl,
            TokenKind::Access => self.access_ttl,
        };
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
            email: None,
            role: None,
        }
    }

    fn sign(&self, claims: &Claims) -> anyhow::Result<String> {
        let token = encode(&Header::default(), claims, &self.encoding)?;
        debug!(user_id = %claims.sub, kind = ?claims.kind, "jwt signed");
        Ok(token)
    }

    /// Token proving a passed password check. Only good for submitting a 2FA code.
    pub fn sign_temp(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.sign(&self.claims(user_id, TokenKind::Temp))
    }

    pub fn sign_access(&self, user: &User) -> anyhow::Result<String> {
        let mut claims = self.claims(user.id, TokenKind::Access);
        claims.email = Some(user.email.clone());
        claims.role = Some(user.role);
        self.sign(&claims)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims)
    }

    pub fn verify_temp(&self, token: &str) -> Result<Claims, AppError> {
        let claims = self.verify(token).map_err(|e| {
            warn!(error = %e, "temp token rejected");
            AppError::Unauthorized("Invalid or expired token".into())
        })?;
        if claims.kind != TokenKind::Temp {
            warn!(user_id = %claims.sub, kind = ?claims.kind, "wrong token type for 2fa");
            return Err(AppError::Unauthorized("Invalid token type".into()));
        }
        Ok(claims)
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims, AppError> {
        let claims = self.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            AppError::Unauthorized("Invalid or expired token".into())
        })?;
        if claims.kind != TokenKind::Access {
            return Err(AppError::Unauthorized("Access token required".into()));
        }
        Ok(claims)
    }
}

/// The authenticated caller, re-loaded from the store so the role is current.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn subject(&self) -> Subject {
        Subject {
            id: self.0.id,
            role: self.0.role,
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let claims = JwtKeys::from_ref(state).verify_access(token)?;

        let user = state.users.find_by_id(claims.sub).await?.ok_or_else(|| {
            warn!(user_id = %claims.sub, "token subject no longer exists");
            AppError::Unauthorized("User not found".into())
        })?;

        Ok(AuthUser(user))
    }
}
