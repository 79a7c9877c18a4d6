use anyhow::Context;
use axum::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    model::{NewUser, User, UserPatch},
    repo_types::UserRow,
    store::{StoreError, UserStore},
};

const USER_COLUMNS: &str = "id, email, name, password_hash, role, is_email_verified, \
     email_verification_token, two_factor_code, two_factor_code_expiry, created_at, updated_at";

/// Postgres-backed [`UserStore`].
#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(row.map(User::from))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(row.map(User::from))
    }

    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let res = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (email, name, password_hash, email_verification_token)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.email)
        .bind(&new.name)
        .bind(&new.password_hash)
        .bind(&new.email_verification_token)
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(row) => Ok(row.into()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(StoreError::Conflict(
                "User with this email already exists".into(),
            )),
            Err(e) => Err(anyhow::Error::new(e).context("insert user").into()),
        }
    }

    async fn update(&self, id: Uuid, patch: UserPatch) -> Result<User, StoreError> {
        let (set_token, token) = match patch.email_verification_token {
            Some(t) => (true, t),
            None => (false, None),
        };
        let (set_code, code, expiry) = match patch.two_factor {
            Some(Some(c)) => (true, Some(c.code), Some(c.expires_at)),
            Some(None) => (true, None, None),
            None => (false, None, None),
        };

        // code and expiry are always written by the same branch
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users SET
                is_email_verified = COALESCE($2, is_email_verified),
                email_verification_token =
                    CASE WHEN $3 THEN $4 ELSE email_verification_token END,
                two_factor_code = CASE WHEN $5 THEN $6 ELSE two_factor_code END,
                two_factor_code_expiry = CASE WHEN $5 THEN $7 ELSE two_factor_code_expiry END,
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.email_verified)
        .bind(set_token)
        .bind(token)
        .bind(set_code)
        .bind(code)
        .bind(expiry)
        .fetch_optional(&self.db)
        .await
        .context("update user")?;

        row.map(User::from).ok_or(StoreError::NotFound)
    }

    async fn consume_two_factor(
        &self,
        id: Uuid,
        code: &str,
        now: OffsetDateTime,
    ) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users SET
                two_factor_code = NULL,
                two_factor_code_expiry = NULL,
                updated_at = now()
            WHERE id = $1 AND two_factor_code = $2 AND two_factor_code_expiry > $3
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(code)
        .bind(now)
        .fetch_optional(&self.db)
        .await
        .context("consume two-factor code")?;
        Ok(row.map(User::from))
    }
}
