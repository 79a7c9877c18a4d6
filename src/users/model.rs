use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// Account role. Assigned at creation; no public path changes it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// A pending two-factor code and the instant it stops being accepted.
/// Code and expiry only ever exist together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwoFactorCode {
    pub code: String,
    pub expires_at: OffsetDateTime,
}

impl TwoFactorCode {
    pub fn new(code: String, issued_at: OffsetDateTime, ttl: Duration) -> Self {
        Self {
            code,
            expires_at: issued_at + ttl,
        }
    }

    /// Exact match on the code, strictly before expiry.
    pub fn accepts(&self, submitted: &str, now: OffsetDateTime) -> bool {
        self.code == submitted && now < self.expires_at
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: Role,
    pub is_email_verified: bool,
    pub email_verification_token: Option<String>,
    pub two_factor: Option<TwoFactorCode>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Fields supplied when creating an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub email_verification_token: String,
}

/// Partial update of the mutable auth state of a user.
///
/// The outer `Option` means "leave untouched"; the inner one sets or clears.
/// Role and credentials are deliberately not part of it.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub email_verified: Option<bool>,
    pub email_verification_token: Option<Option<String>>,
    pub two_factor: Option<Option<TwoFactorCode>>,
}

impl UserPatch {
    pub fn two_factor(code: Option<TwoFactorCode>) -> Self {
        Self {
            two_factor: Some(code),
            ..Self::default()
        }
    }

    pub fn email_verified() -> Self {
        Self {
            email_verified: Some(true),
            email_verification_token: Some(None),
            ..Self::default()
        }
    }

    pub(crate) fn apply(self, user: &mut User) {
        if let Some(v) = self.email_verified {
            user.is_email_verified = v;
        }
        if let Some(token) = self.email_verification_token {
            user.email_verification_token = token;
        }
        if let Some(code) = self.two_factor {
            user.two_factor = code;
        }
    }
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl From<&User> for PublicUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            email: u.email.clone(),
            name: u.name.clone(),
            role: u.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_accepted_only_before_expiry() {
        let issued = OffsetDateTime::now_utc();
        let code = TwoFactorCode::new("123456".into(), issued, Duration::minutes(10));
        assert_eq!(code.expires_at - issued, Duration::minutes(10));
        assert!(code.accepts("123456", issued + Duration::minutes(9)));
        assert!(!code.accepts("123456", issued + Duration::minutes(10)));
        assert!(!code.accepts("654321", issued));
    }

    #[test]
    fn public_user_never_serializes_secrets() {
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            name: "A".into(),
            password_hash: "$argon2id$secret".into(),
            role: Role::User,
            is_email_verified: true,
            email_verification_token: Some("tok".into()),
            two_factor: Some(TwoFactorCode::new("111111".into(), now, Duration::minutes(10))),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_string(&PublicUser::from(&user)).unwrap();
        assert!(json.contains("\"role\":\"USER\""));
        assert!(!json.contains("argon2"));
        assert!(!json.contains("111111"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn email_verified_patch_clears_token() {
        let now = OffsetDateTime::now_utc();
        let mut user = User {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            name: "A".into(),
            password_hash: String::new(),
            role: Role::User,
            is_email_verified: false,
            email_verification_token: Some("tok".into()),
            two_factor: None,
            created_at: now,
            updated_at: now,
        };
        UserPatch::email_verified().apply(&mut user);
        assert!(user.is_email_verified);
        assert!(user.email_verification_token.is_none());
    }
}
