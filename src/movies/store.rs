use std::{collections::HashMap, sync::Arc};

use axum::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::model::{Movie, MovieChanges, MovieOwner, MovieStats, NewMovie};
use crate::{
    auth::policy::Scope,
    users::{StoreError, UserStore},
};

#[async_trait]
pub trait MovieStore: Send + Sync {
    async fn create(&self, owner: Uuid, new: NewMovie) -> Result<Movie, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Movie>, StoreError>;
    /// Newest first.
    async fn list(&self, scope: Scope, watched_only: bool) -> Result<Vec<Movie>, StoreError>;
    async fn update(&self, id: Uuid, changes: MovieChanges) -> Result<Movie, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
    async fn statistics(&self, scope: Scope) -> Result<MovieStats, StoreError>;
}

/// Process-local store. Owners are resolved through the user store on read.
pub struct InMemoryMovieStore {
    movies: RwLock<HashMap<Uuid, Movie>>,
    users: Arc<dyn UserStore>,
}

impl InMemoryMovieStore {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self {
            movies: RwLock::default(),
            users,
        }
    }

    async fn with_owner(&self, mut movie: Movie) -> Result<Movie, StoreError> {
        movie.owner = self.users.find_by_id(movie.user_id).await?.map(|u| MovieOwner {
            id: u.id,
            email: u.email,
            name: u.name,
        });
        Ok(movie)
    }
}

#[async_trait]
impl MovieStore for InMemoryMovieStore {
    async fn create(&self, owner: Uuid, new: NewMovie) -> Result<Movie, StoreError> {
        let now = OffsetDateTime::now_utc();
        let movie = Movie {
            id: Uuid::new_v4(),
            user_id: owner,
            title: new.title,
            description: new.description,
            genre: new.genre,
            director: new.director,
            release_year: new.release_year,
            rating: new.rating,
            is_watched: new.is_watched,
            review: new.review,
            watched_at: None,
            created_at: now,
            updated_at: now,
            owner: None,
        };
        self.movies.write().await.insert(movie.id, movie.clone());
        self.with_owner(movie).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Movie>, StoreError> {
        let found = self.movies.read().await.get(&id).cloned();
        match found {
            Some(m) => Ok(Some(self.with_owner(m).await?)),
            None => Ok(None),
        }
    }

    async fn list(&self, scope: Scope, watched_only: bool) -> Result<Vec<Movie>, StoreError> {
        let mut selected: Vec<Movie> = self
            .movies
            .read()
            .await
            .values()
            .filter(|m| scope.includes(m.user_id) && (!watched_only || m.is_watched))
            .cloned()
            .collect();
        selected.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut out = Vec::with_capacity(selected.len());
        for m in selected {
            out.push(self.with_owner(m).await?);
        }
        Ok(out)
    }

    async fn update(&self, id: Uuid, changes: MovieChanges) -> Result<Movie, StoreError> {
        let updated = {
            let mut movies = self.movies.write().await;
            let movie = movies.get_mut(&id).ok_or(StoreError::NotFound)?;
            changes.apply(movie);
            movie.updated_at = OffsetDateTime::now_utc();
            movie.clone()
        };
        self.with_owner(updated).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.movies
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn statistics(&self, scope: Scope) -> Result<MovieStats, StoreError> {
        let movies = self.movies.read().await;
        let visible: Vec<&Movie> = movies.values().filter(|m| scope.includes(m.user_id)).collect();
        let ratings: Vec<f64> = visible.iter().filter_map(|m| m.rating).collect();
        let average_rating = if ratings.is_empty() {
            None
        } else {
            Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
        };
        Ok(MovieStats {
            total: visible.len() as i64,
            watched: visible.iter().filter(|m| m.is_watched).count() as i64,
            average_rating,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::{InMemoryUserStore, NewUser};

    fn empty_store() -> InMemoryMovieStore {
        InMemoryMovieStore::new(Arc::new(InMemoryUserStore::new()))
    }

    fn movie(title: &str, rating: Option<f64>, watched: bool) -> NewMovie {
        NewMovie {
            title: title.into(),
            rating,
            is_watched: watched,
            ..NewMovie::default()
        }
    }

    #[tokio::test]
    async fn list_applies_scope_and_watched_filter() {
        let store = empty_store();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        store.create(alice, movie("Alien", None, true)).await.unwrap();
        store.create(alice, movie("Heat", None, false)).await.unwrap();
        store.create(bob, movie("Ran", None, true)).await.unwrap();

        assert_eq!(store.list(Scope::Owner(alice), false).await.unwrap().len(), 2);
        assert_eq!(store.list(Scope::Owner(alice), true).await.unwrap().len(), 1);
        assert_eq!(store.list(Scope::All, false).await.unwrap().len(), 3);
        assert_eq!(store.list(Scope::All, true).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn statistics_per_scope() {
        let store = empty_store();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        store.create(alice, movie("Alien", Some(8.0), true)).await.unwrap();
        store.create(alice, movie("Heat", Some(7.0), false)).await.unwrap();
        store.create(alice, movie("Up", None, false)).await.unwrap();
        store.create(bob, movie("Ran", Some(9.0), true)).await.unwrap();

        let mine = store.statistics(Scope::Owner(alice)).await.unwrap();
        assert_eq!(mine.total, 3);
        assert_eq!(mine.watched, 1);
        assert_eq!(mine.average_rating, Some(7.5));

        let all = store.statistics(Scope::All).await.unwrap();
        assert_eq!(all.total, 4);
        assert_eq!(all.watched, 2);
        assert_eq!(all.average_rating, Some(8.0));

        let empty = store.statistics(Scope::Owner(Uuid::new_v4())).await.unwrap();
        assert_eq!(empty.total, 0);
        assert_eq!(empty.average_rating, None);
    }

    #[tokio::test]
    async fn movies_carry_their_owner() {
        let users = Arc::new(InMemoryUserStore::new());
        let alice = users
            .create(NewUser {
                email: "alice@x.com".into(),
                name: "Alice".into(),
                password_hash: "h".into(),
                email_verification_token: "t".into(),
            })
            .await
            .unwrap();
        let store = InMemoryMovieStore::new(users);

        let created = store.create(alice.id, movie("Alien", None, false)).await.unwrap();
        let expected = MovieOwner {
            id: alice.id,
            email: "alice@x.com".into(),
            name: "Alice".into(),
        };
        assert_eq!(created.owner.as_ref(), Some(&expected));

        let found = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found.owner.as_ref(), Some(&expected));
        let listed = store.list(Scope::All, false).await.unwrap();
        assert_eq!(listed[0].owner.as_ref(), Some(&expected));
    }

    #[tokio::test]
    async fn update_and_delete() {
        let store = empty_store();
        let m = store.create(Uuid::new_v4(), movie("Alien", None, false)).await.unwrap();
        let now = OffsetDateTime::now_utc();

        let watched = store
            .update(m.id, MovieChanges::watched(now, Some("great".into())))
            .await
            .unwrap();
        assert!(watched.is_watched);
        assert_eq!(watched.watched_at, Some(now));
        assert_eq!(watched.review.as_deref(), Some("great"));

        store.delete(m.id).await.unwrap();
        assert!(store.find_by_id(m.id).await.unwrap().is_none());
        assert!(matches!(store.delete(m.id).await, Err(StoreError::NotFound)));
    }
}
