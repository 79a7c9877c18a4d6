use std::{sync::Arc, time::Instant};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::warn;

use crate::{
    config::AppConfig,
    movies::{InMemoryMovieStore, MovieStore, PgMovieStore},
    notify::{LogNotifier, Notifier, Templates},
    users::{InMemoryUserStore, PgUserStore, UserStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub movies: Arc<dyn MovieStore>,
    pub notifier: Arc<dyn Notifier>,
    pub started_at: Instant,
}

impl AppState {
    /// Builds the state and returns the pool (if any) so the caller can run migrations.
    pub async fn init() -> anyhow::Result<(Self, Option<PgPool>)> {
        let config = Arc::new(AppConfig::from_env()?);

        let notifier = Arc::new(LogNotifier::new(Templates::new(
            config.public_base_url.clone(),
            config.two_factor_ttl_minutes,
        ))) as Arc<dyn Notifier>;

        let Some(url) = config.database_url.clone() else {
            warn!("DATABASE_URL not set; using in-memory stores, data is lost on restart");
            let users = Arc::new(InMemoryUserStore::new()) as Arc<dyn UserStore>;
            let movies = Arc::new(InMemoryMovieStore::new(users.clone()));
            let state = Self::from_parts(config, users, movies, notifier);
            return Ok((state, None));
        };

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&url)
            .await
            .context("connect to database")?;

        let state = Self::from_parts(
            config,
            Arc::new(PgUserStore::new(db.clone())),
            Arc::new(PgMovieStore::new(db.clone())),
            notifier,
        );
        Ok((state, Some(db)))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        movies: Arc<dyn MovieStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            users,
            movies,
            notifier,
            started_at: Instant::now(),
        }
    }
}
