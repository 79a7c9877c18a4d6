use anyhow::Context;
use axum::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    model::{Movie, MovieChanges, MovieStats, NewMovie},
    repo_types::MovieRow,
    store::MovieStore,
};
use crate::{auth::policy::Scope, users::StoreError};

/// Columns of `movies m` joined with `users u`, matching [`MovieRow`].
const MOVIE_COLUMNS: &str = "m.id, m.user_id, m.title, m.description, m.genre, m.director, \
     m.release_year, m.rating, m.is_watched, m.review, m.watched_at, m.created_at, m.updated_at, \
     u.email AS owner_email, u.name AS owner_name";

#[derive(Clone)]
pub struct PgMovieStore {
    db: PgPool,
}

impl PgMovieStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MovieStore for PgMovieStore {
    async fn create(&self, owner: Uuid, new: NewMovie) -> Result<Movie, StoreError> {
        let row = sqlx::query_as::<_, MovieRow>(&format!(
            r#"
            WITH m AS (
                INSERT INTO movies
                    (user_id, title, description, genre, director, release_year, rating, is_watched, review)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING *
            )
            SELECT {MOVIE_COLUMNS}
            FROM m JOIN users u ON u.id = m.user_id
            "#
        ))
        .bind(owner)
        .bind(new.title)
        .bind(new.description)
        .bind(new.genre)
        .bind(new.director)
        .bind(new.release_year)
        .bind(new.rating)
        .bind(new.is_watched)
        .bind(new.review)
        .fetch_one(&self.db)
        .await
        .context("insert movie")?;
        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Movie>, StoreError> {
        let row = sqlx::query_as::<_, MovieRow>(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies m JOIN users u ON u.id = m.user_id WHERE m.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find movie")?;
        Ok(row.map(Movie::from))
    }

    async fn list(&self, scope: Scope, watched_only: bool) -> Result<Vec<Movie>, StoreError> {
        let rows = sqlx::query_as::<_, MovieRow>(&format!(
            r#"
            SELECT {MOVIE_COLUMNS}
            FROM movies m JOIN users u ON u.id = m.user_id
            WHERE ($1::uuid IS NULL OR m.user_id = $1)
              AND (NOT $2 OR m.is_watched)
            ORDER BY m.created_at DESC
            "#
        ))
        .bind(scope.owner_id())
        .bind(watched_only)
        .fetch_all(&self.db)
        .await
        .context("list movies")?;
        Ok(rows.into_iter().map(Movie::from).collect())
    }

    async fn update(&self, id: Uuid, c: MovieChanges) -> Result<Movie, StoreError> {
        let row = sqlx::query_as::<_, MovieRow>(&format!(
            r#"
            WITH m AS (
                UPDATE movies SET
                    title = COALESCE($2, title),
                    description = COALESCE($3, description),
                    genre = COALESCE($4, genre),
                    director = COALESCE($5, director),
                    release_year = COALESCE($6, release_year),
                    rating = COALESCE($7, rating),
                    is_watched = COALESCE($8, is_watched),
                    review = COALESCE($9, review),
                    watched_at = COALESCE($10, watched_at),
                    updated_at = now()
                WHERE id = $1
                RETURNING *
            )
            SELECT {MOVIE_COLUMNS}
            FROM m JOIN users u ON u.id = m.user_id
            "#
        ))
        .bind(id)
        .bind(c.title)
        .bind(c.description)
        .bind(c.genre)
        .bind(c.director)
        .bind(c.release_year)
        .bind(c.rating)
        .bind(c.is_watched)
        .bind(c.review)
        .bind(c.watched_at)
        .fetch_optional(&self.db)
        .await
        .context("update movie")?;
        row.map(Movie::from).ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let res = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete movie")?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn statistics(&self, scope: Scope) -> Result<MovieStats, StoreError> {
        let (total, watched, average_rating) = sqlx::query_as::<_, (i64, i64, Option<f64>)>(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE is_watched),
                   AVG(rating)
            FROM movies
            WHERE ($1::uuid IS NULL OR user_id = $1)
            "#,
        )
        .bind(scope.owner_id())
        .fetch_one(&self.db)
        .await
        .context("movie statistics")?;
        Ok(MovieStats {
            total,
            watched,
            average_rating,
        })
    }
}
