use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use super::model::{Movie, MovieOwner};

/// Movie row joined with its owner's public columns.
#[derive(Debug, FromRow)]
pub struct MovieRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub director: Option<String>,
    pub release_year: Option<i32>,
    pub rating: Option<f64>,
    pub is_watched: bool,
    pub review: Option<String>,
    pub watched_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub owner_email: String,
    pub owner_name: String,
}

impl From<MovieRow> for Movie {
    fn from(r: MovieRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            title: r.title,
            description: r.description,
            genre: r.genre,
            director: r.director,
            release_year: r.release_year,
            rating: r.rating,
            is_watched: r.is_watched,
            review: r.review,
            watched_at: r.watched_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
            owner: Some(MovieOwner {
                id: r.user_id,
                email: r.owner_email,
                name: r.owner_name,
            }),
        }
    }
}
