use std::collections::HashMap;

use axum::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::model::{NewUser, Role, User, UserPatch};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Conflict(String),
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Persistence of user accounts and their auth state.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    /// Fails with `Conflict` when the email is taken.
    async fn create(&self, new: NewUser) -> Result<User, StoreError>;
    async fn update(&self, id: Uuid, patch: UserPatch) -> Result<User, StoreError>;
    /// Clears the pending code in one step if it matches and is still valid at `now`.
    /// `None` means nothing was consumed.
    async fn consume_two_factor(
        &self,
        id: Uuid,
        code: &str,
        now: OffsetDateTime,
    ) -> Result<Option<User>, StoreError>;
}

/// Process-local store used in tests and when no database is configured.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fully formed user, bypassing registration.
    #[cfg(test)]
    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == new.email) {
            return Err(StoreError::Conflict(
                "User with this email already exists".into(),
            ));
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            email: new.email,
            name: new.name,
            password_hash: new.password_hash,
            role: Role::User,
            is_email_verified: false,
            email_verification_token: Some(new.email_verification_token),
            two_factor: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: Uuid, patch: UserPatch) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(StoreError::NotFound)?;
        patch.apply(user);
        user.updated_at = OffsetDateTime::now_utc();
        Ok(user.clone())
    }

    async fn consume_two_factor(
        &self,
        id: Uuid,
        code: &str,
        now: OffsetDateTime,
    ) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        if !user.two_factor.as_ref().is_some_and(|p| p.accepts(code, now)) {
            return Ok(None);
        }
        user.two_factor = None;
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::model::TwoFactorCode;
    use time::Duration;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            name: "Test".into(),
            password_hash: "hash".into(),
            email_verification_token: "token".into(),
        }
    }

    #[tokio::test]
    async fn create_sets_defaults_and_rejects_duplicates() {
        let store = InMemoryUserStore::new();
        let user = store.create(new_user("a@x.com")).await.unwrap();
        assert_eq!(user.role, Role::User);
        assert!(!user.is_email_verified);
        assert_eq!(user.email_verification_token.as_deref(), Some("token"));

        let err = store.create(new_user("a@x.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn finds_by_email_and_id() {
        let store = InMemoryUserStore::new();
        let user = store.create(new_user("a@x.com")).await.unwrap();
        assert_eq!(store.find_by_email("a@x.com").await.unwrap().unwrap().id, user.id);
        assert!(store.find_by_email("b@x.com").await.unwrap().is_none());
        assert!(store.find_by_id(user.id).await.unwrap().is_some());
        assert!(store.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_sets_and_clears_two_factor_code() {
        let store = InMemoryUserStore::new();
        let user = store.create(new_user("a@x.com")).await.unwrap();
        let code = TwoFactorCode::new("123456".into(), OffsetDateTime::now_utc(), Duration::minutes(10));

        let updated = store
            .update(user.id, UserPatch::two_factor(Some(code.clone())))
            .await
            .unwrap();
        assert_eq!(updated.two_factor, Some(code));

        let cleared = store.update(user.id, UserPatch::two_factor(None)).await.unwrap();
        assert!(cleared.two_factor.is_none());
        assert_eq!(cleared.email_verification_token.as_deref(), Some("token"));
    }

    #[tokio::test]
    async fn consume_two_factor_succeeds_once() {
        let store = InMemoryUserStore::new();
        let user = store.create(new_user("a@x.com")).await.unwrap();
        let now = OffsetDateTime::now_utc();
        let code = TwoFactorCode::new("123456".into(), now, Duration::minutes(10));
        store
            .update(user.id, UserPatch::two_factor(Some(code)))
            .await
            .unwrap();

        assert!(store.consume_two_factor(user.id, "654321", now).await.unwrap().is_none());
        assert!(store
            .consume_two_factor(user.id, "123456", now + Duration::minutes(10))
            .await
            .unwrap()
            .is_none());

        let consumed = store.consume_two_factor(user.id, "123456", now).await.unwrap();
        assert!(consumed.unwrap().two_factor.is_none());
        assert!(store.consume_two_factor(user.id, "123456", now).await.unwrap().is_none());
        assert!(store
            .consume_two_factor(Uuid::new_v4(), "123456", now)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn update_unknown_user_is_not_found() {
        let store = InMemoryUserStore::new();
        let err = store
            .update(Uuid::new_v4(), UserPatch::email_verified())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }
}
