use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use super::model::{Role, TwoFactorCode, User};

/// User record in the database.
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String, // Argon2 PHC string
    pub role: Role,
    pub is_email_verified: bool,
    pub email_verification_token: Option<String>,
    pub two_factor_code: Option<String>,
    pub two_factor_code_expiry: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        // a half-written pair is treated as no pending code
        let two_factor = match (r.two_factor_code, r.two_factor_code_expiry) {
            (Some(code), Some(expires_at)) => Some(TwoFactorCode { code, expires_at }),
            _ => None,
        };
        Self {
            id: r.id,
            email: r.email,
            name: r.name,
            password_hash: r.password_hash,
            role: r.role,
            is_email_verified: r.is_email_verified,
            email_verification_token: r.email_verification_token,
            two_factor,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}
