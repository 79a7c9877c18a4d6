pub mod model;
mod repo;
mod repo_types;
pub mod store;

pub use model::{NewUser, PublicUser, Role, TwoFactorCode, User, UserPatch};
pub use repo::PgUserStore;
pub use store::{InMemoryUserStore, StoreError, UserStore};
