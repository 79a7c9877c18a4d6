//! Who may touch which movie records.
//!
//! Item operations (read, update, delete, mark as watched) go through
//! [`authorize`]. Collection operations (list, statistics) never deny;
//! they narrow what is visible through [`Scope`].

use uuid::Uuid;

use crate::{error::AppError, users::Role};

/// The authenticated caller as seen by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subject {
    pub id: Uuid,
    pub role: Role,
}

impl Subject {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Rows visible to a subject in collection queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Owner(Uuid),
}

impl Scope {
    pub fn for_subject(subject: &Subject) -> Self {
        if subject.is_admin() {
            Scope::All
        } else {
            Scope::Owner(subject.id)
        }
    }

    pub fn owner_id(&self) -> Option<Uuid> {
        match self {
            Scope::All => None,
            Scope::Owner(id) => Some(*id),
        }
    }

    pub fn includes(&self, owner: Uuid) -> bool {
        match self {
            Scope::All => true,
            Scope::Owner(id) => *id == owner,
        }
    }
}

/// Admins may access everything; everyone else only what they own.
pub fn authorize(subject: &Subject, owner: Uuid) -> Result<(), AppError> {
    if subject.is_admin() || subject.id == owner {
        Ok(())
    } else {
        Err(AppError::Forbidden("You can only access your own movies".into()))
    }
}

pub fn require_admin(subject: &Subject) -> Result<(), AppError> {
    if subject.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admin role required".into()))
    }
}
