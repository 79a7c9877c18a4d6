use axum::{
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, LoginRequest, LoginResponse, MessageResponse, RegisterRequest,
            RegisterResponse, VerifyEmailQuery, VerifyTwoFactorRequest,
        },
        jwt::AuthUser,
        service::AuthService,
        validation,
    },
    error::AppResult,
    notify::escape_html,
    state::AppState,
    users::PublicUser,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/verify-2fa", post(verify_two_factor))
        .route(
            "/auth/verify-email",
            post(verify_email).get(verify_email_link),
        )
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let email = validation::email(&payload.email)?;
    let name = validation::name(&payload.name)?;
    validation::new_password(&payload.password)?;

    let res = AuthService::from_ref(&state)
        .register(email, name, payload.password)
        .await?;
    Ok((StatusCode::CREATED, Json(res)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let email = validation::email(&payload.email)?;
    validation::non_empty("password", &payload.password)?;

    let res = AuthService::from_ref(&state)
        .login(&email, payload.password)
        .await?;
    Ok(Json(res))
}

#[instrument(skip(state, payload))]
pub async fn verify_two_factor(
    State(state): State<AppState>,
    Json(payload): Json<VerifyTwoFactorRequest>,
) -> AppResult<Json<AuthResponse>> {
    validation::non_empty("token", &payload.token)?;
    validation::non_empty("code", &payload.code)?;

    let res = AuthService::from_ref(&state)
        .verify_two_factor(&payload.token, payload.code.trim())
        .await?;
    Ok(Json(res))
}

#[instrument(skip(state, query))]
pub async fn verify_email(
    State(state): State<AppState>,
    Query(query): Query<VerifyEmailQuery>,
) -> AppResult<Json<MessageResponse>> {
    let email = validation::normalize_email(&query.email);
    let res = AuthService::from_ref(&state)
        .verify_email(&query.token, &email)
        .await?;
    Ok(Json(res))
}

/// Target of the emailed link. Any failure renders the same generic page.
#[instrument(skip(state, query))]
pub async fn verify_email_link(
    State(state): State<AppState>,
    Query(query): Query<VerifyEmailQuery>,
) -> (StatusCode, Html<String>) {
    let email = validation::normalize_email(&query.email);
    match AuthService::from_ref(&state)
        .verify_email(&query.token, &email)
        .await
    {
        Ok(res) => (
            StatusCode::OK,
            landing_page("Email verified", &format!("{} You can now log in.", res.message)),
        ),
        Err(e) => {
            warn!(error = %e, "verification link failed");
            (
                StatusCode::BAD_REQUEST,
                landing_page(
                    "Verification failed",
                    "This verification link is invalid or has expired.",
                ),
            )
        }
    }
}

fn landing_page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{t}</title></head>\
         <body><h1>{t}</h1><p>{b}</p></body></html>",
        t = escape_html(title),
        b = escape_html(body),
    ))
}

#[instrument(skip(auth), fields(user_id = %auth.0.id))]
pub async fn get_me(auth: AuthUser) -> Json<PublicUser> {
    Json(PublicUser::from(&auth.0))
}
