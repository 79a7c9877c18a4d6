use serde::{Deserialize, Serialize};

use super::model::{MovieChanges, MovieStats, NewMovie};
use crate::{auth::validation::non_empty, error::AppError};

const RATING_RANGE: std::ops::RangeInclusive<f64> = 0.0..=10.0;
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1870..=2100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateMovieRequest {
    pub title: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub director: Option<String>,
    pub release_year: Option<i32>,
    pub rating: Option<f64>,
    #[serde(default)]
    pub is_watched: bool,
    pub review: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateMovieRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub director: Option<String>,
    pub release_year: Option<i32>,
    pub rating: Option<f64>,
    pub is_watched: Option<bool>,
    pub review: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WatchRequest {
    pub review: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsResponse {
    pub total_movies: i64,
    pub watched_movies: i64,
    pub unwatched_movies: i64,
    /// One decimal, as a string; null when nothing is rated.
    pub average_rating: Option<String>,
}

impl From<MovieStats> for StatisticsResponse {
    fn from(s: MovieStats) -> Self {
        Self {
            total_movies: s.total,
            watched_movies: s.watched,
            unwatched_movies: s.total - s.watched,
            average_rating: s.average_rating.map(|r| format!("{r:.1}")),
        }
    }
}

fn check_rating(rating: Option<f64>) -> Result<(), AppError> {
    match rating {
        Some(r) if !RATING_RANGE.contains(&r) => Err(AppError::BadRequest(
            "rating must be between 0 and 10".into(),
        )),
        _ => Ok(()),
    }
}

fn check_year(year: Option<i32>) -> Result<(), AppError> {
    match year {
        Some(y) if !YEAR_RANGE.contains(&y) => {
            Err(AppError::BadRequest("releaseYear is out of range".into()))
        }
        _ => Ok(()),
    }
}

impl CreateMovieRequest {
    pub fn validate(self) -> Result<NewMovie, AppError> {
        non_empty("title", &self.title)?;
        check_rating(self.rating)?;
        check_year(self.release_year)?;
        Ok(NewMovie {
            title: self.title.trim().to_string(),
            description: self.description,
            genre: self.genre,
            director: self.director,
            release_year: self.release_year,
            rating: self.rating,
            is_watched: self.is_watched,
            review: self.review,
        })
    }
}

impl UpdateMovieRequest {
    pub fn validate(self) -> Result<MovieChanges, AppError> {
        if let Some(title) = &self.title {
            non_empty("title", title)?;
        }
        check_rating(self.rating)?;
        check_year(self.release_year)?;
        Ok(MovieChanges {
            title: self.title.map(|t| t.trim().to_string()),
            description: self.description,
            genre: self.genre,
            director: self.director,
            release_year: self.release_year,
            rating: self.rating,
            is_watched: self.is_watched,
            review: self.review,
            watched_at: None,
        })
    }
}
