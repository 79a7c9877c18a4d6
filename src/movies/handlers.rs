use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{CreateMovieRequest, StatisticsResponse, UpdateMovieRequest, WatchRequest},
    model::{Movie, MovieChanges},
};
use crate::{
    auth::{
        dto::MessageResponse,
        jwt::AuthUser,
        policy::{authorize, require_admin, Scope, Subject},
    },
    error::{AppError, AppResult},
    state::AppState,
};

pub fn movie_routes() -> Router<AppState> {
    Router::new()
        .route("/movies", get(list_movies).post(create_movie))
        .route("/movies/watched", get(list_watched))
        .route("/movies/statistics", get(statistics))
        .route(
            "/movies/:id",
            get(get_movie).patch(update_movie).delete(delete_movie),
        )
        .route("/movies/:id/watch", patch(mark_watched))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/movies", get(admin_list_movies))
        .route("/admin/statistics", get(admin_statistics))
}

/// Loads a movie and applies the ownership check.
async fn load_authorized(state: &AppState, subject: &Subject, id: Uuid) -> AppResult<Movie> {
    let movie = state
        .movies
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Movie not found".into()))?;
    authorize(subject, movie.user_id)?;
    Ok(movie)
}

#[instrument(skip(state, auth, body), fields(user_id = %auth.0.id))]
pub async fn create_movie(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateMovieRequest>,
) -> AppResult<(StatusCode, Json<Movie>)> {
    let new = body.validate()?;
    let movie = state.movies.create(auth.0.id, new).await?;
    info!(movie_id = %movie.id, "movie created");
    Ok((StatusCode::CREATED, Json(movie)))
}

#[instrument(skip(state, auth), fields(user_id = %auth.0.id))]
pub async fn list_movies(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Vec<Movie>>> {
    let scope = Scope::for_subject(&auth.subject());
    Ok(Json(state.movies.list(scope, false).await?))
}

#[instrument(skip(state, auth), fields(user_id = %auth.0.id))]
pub async fn list_watched(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Vec<Movie>>> {
    let scope = Scope::for_subject(&auth.subject());
    Ok(Json(state.movies.list(scope, true).await?))
}

#[instrument(skip(state, auth), fields(user_id = %auth.0.id))]
pub async fn statistics(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<StatisticsResponse>> {
    let scope = Scope::for_subject(&auth.subject());
    Ok(Json(state.movies.statistics(scope).await?.into()))
}

#[instrument(skip(state, auth), fields(user_id = %auth.0.id))]
pub async fn get_movie(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Movie>> {
    Ok(Json(load_authorized(&state, &auth.subject(), id).await?))
}

#[instrument(skip(state, auth, body), fields(user_id = %auth.0.id))]
pub async fn update_movie(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateMovieRequest>,
) -> AppResult<Json<Movie>> {
    let changes = body.validate()?;
    let movie = load_authorized(&state, &auth.subject(), id).await?;
    Ok(Json(state.movies.update(movie.id, changes).await?))
}

#[instrument(skip(state, auth, body), fields(user_id = %auth.0.id))]
pub async fn mark_watched(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    body: Option<Json<WatchRequest>>,
) -> AppResult<Json<Movie>> {
    let movie = load_authorized(&state, &auth.subject(), id).await?;
    let review = body
        .and_then(|Json(b)| b.review)
        .filter(|r| !r.trim().is_empty());
    let changes = MovieChanges::watched(OffsetDateTime::now_utc(), review);
    Ok(Json(state.movies.update(movie.id, changes).await?))
}

#[instrument(skip(state, auth), fields(user_id = %auth.0.id))]
pub async fn delete_movie(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    let movie = load_authorized(&state, &auth.subject(), id).await?;
    state.movies.delete(movie.id).await?;
    info!(movie_id = %movie.id, "movie deleted");
    Ok(Json(MessageResponse {
        message: "Movie deleted successfully".into(),
    }))
}

#[instrument(skip(state, auth), fields(user_id = %auth.0.id))]
pub async fn admin_list_movies(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<Movie>>> {
    require_admin(&auth.subject())?;
    Ok(Json(state.movies.list(Scope::All, false).await?))
}

#[instrument(skip(state, auth), fields(user_id = %auth.0.id))]
pub async fn admin_statistics(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<StatisticsResponse>> {
    require_admin(&auth.subject())?;
    Ok(Json(state.movies.statistics(Scope::All).await?.into()))
}
