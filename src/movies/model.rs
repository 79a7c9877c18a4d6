use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

/// Public part of the owning account, returned alongside each movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovieOwner {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: Uuid,
    pub user_id: Uuid, // owner
    pub title: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub director: Option<String>,
    pub release_year: Option<i32>,
    pub rating: Option<f64>,
    pub is_watched: bool,
    pub review: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub watched_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(rename = "user", skip_serializing_if = "Option::is_none")]
    pub owner: Option<MovieOwner>,
}

#[derive(Debug, Clone, Default)]
pub struct NewMovie {
    pub title: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub director: Option<String>,
    pub release_year: Option<i32>,
    pub rating: Option<f64>,
    pub is_watched: bool,
    pub review: Option<String>,
}

/// Fields to overwrite; `None` leaves the column as is.
#[derive(Debug, Clone, Default)]
pub struct MovieChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub director: Option<String>,
    pub release_year: Option<i32>,
    pub rating: Option<f64>,
    pub is_watched: Option<bool>,
    pub review: Option<String>,
    pub watched_at: Option<OffsetDateTime>,
}

impl MovieChanges {
    pub fn watched(at: OffsetDateTime, review: Option<String>) -> Self {
        Self {
            is_watched: Some(true),
            watched_at: Some(at),
            review,
            ..Self::default()
        }
    }

    pub(crate) fn apply(self, m: &mut Movie) {
        if let Some(v) = self.title {
            m.title = v;
        }
        if let Some(v) = self.description {
            m.description = Some(v);
        }
        if let Some(v) = self.genre {
            m.genre = Some(v);
        }
        if let Some(v) = self.director {
            m.director = Some(v);
        }
        if let Some(v) = self.release_year {
            m.release_year = Some(v);
        }
        if let Some(v) = self.rating {
            m.rating = Some(v);
        }
        if let Some(v) = self.is_watched {
            m.is_watched = v;
        }
        if let Some(v) = self.review {
            m.review = Some(v);
        }
        if let Some(v) = self.watched_at {
            m.watched_at = Some(v);
        }
    }
}

/// Raw aggregate over the movies visible in a scope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovieStats {
    pub total: i64,
    pub watched: i64,
    pub average_rating: Option<f64>,
}
