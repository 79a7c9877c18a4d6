mod dto;
pub mod handlers;
pub mod model;
mod repo;
mod repo_types;
pub mod store;

use crate::state::AppState;
use axum::Router;

pub use repo::PgMovieStore;
pub use store::{InMemoryMovieStore, MovieStore};

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::movie_routes())
        .merge(handlers::admin_routes())
}
