//! Registration, email verification and the two-step login.
//!
//! A login attempt moves through three states: unauthenticated, awaiting a
//! 2FA code (the client holds only a temp token), and authenticated (the
//! client holds an access token). Registration and email verification act on
//! the stored account independently of any login attempt.

use std::sync::Arc;

use axum::extract::FromRef;
use rand::Rng;
use time::{Duration, OffsetDateTime};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{AuthResponse, LoginResponse, MessageResponse, RegisterResponse},
    jwt::JwtKeys,
    password,
};
use crate::{
    error::{AppError, AppResult},
    notify::Notifier,
    state::AppState,
    users::{NewUser, PublicUser, TwoFactorCode, User, UserPatch, UserStore},
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Six decimal digits, never with a leading zero.
pub(crate) fn generate_two_factor_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999u32).to_string()
}

/// Random v4 UUID, drawn from the OS generator.
pub(crate) fn generate_verification_token() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    notifier: Arc<dyn Notifier>,
    keys: JwtKeys,
    code_ttl: Duration,
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(
            state.users.clone(),
            state.notifier.clone(),
            JwtKeys::from_ref(state),
            Duration::minutes(state.config.two_factor_ttl_minutes),
        )
    }
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        notifier: Arc<dyn Notifier>,
        keys: JwtKeys,
        code_ttl: Duration,
    ) -> Self {
        Self {
            users,
            notifier,
            keys,
            code_ttl,
        }
    }

    /// Creates an unverified account and mails the verification link.
    ///
    /// A failed send is returned to the caller; the account stays created.
    #[instrument(skip(self, name, password))]
    pub async fn register(
        &self,
        email: String,
        name: String,
        password: String,
    ) -> AppResult<RegisterResponse> {
        if self.users.find_by_email(&email).await?.is_some() {
            warn!(%email, "email already registered");
            return Err(AppError::Conflict(
                "User with this email already exists".into(),
            ));
        }

        let password_hash = password::hash_password_blocking(password).await?;
        let token = generate_verification_token();
        let user = self
            .users
            .create(NewUser {
                email,
                name,
                password_hash,
                email_verification_token: token.clone(),
            })
            .await?;
        info!(user_id = %user.id, email = %user.email, "user registered");

        self.notifier.send_verification(&user, &token).await?;

        Ok(RegisterResponse {
            message: "User registered successfully. Please check your email for verification."
                .into(),
            user_id: user.id,
        })
    }

    /// Password step. Issues a fresh 2FA code (replacing any pending one) and a temp token.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: String) -> AppResult<LoginResponse> {
        let user = self.check_credentials(email, password).await?;

        if !user.is_email_verified {
            warn!(user_id = %user.id, "login before email verification");
            return Err(AppError::Unauthorized(
                "Please verify your email first".into(),
            ));
        }

        let code = TwoFactorCode::new(
            generate_two_factor_code(),
            OffsetDateTime::now_utc(),
            self.code_ttl,
        );
        let plain_code = code.code.clone();
        self.users
            .update(user.id, UserPatch::two_factor(Some(code)))
            .await?;

        let temp_token = self.keys.sign_temp(user.id)?;

        self.notifier.send_two_factor_code(&user, &plain_code).await?;
        info!(user_id = %user.id, "2fa code issued");

        Ok(LoginResponse {
            message: "Two-factor authentication code sent to your email".into(),
            temp_token,
        })
    }

    /// Second step. A code is accepted once; the access token is only issued here.
    #[instrument(skip(self, temp_token, code))]
    pub async fn verify_two_factor(&self, temp_token: &str, code: &str) -> AppResult<AuthResponse> {
        let claims = self.keys.verify_temp(temp_token)?;

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".into()))?;

        let Some(user) = self
            .users
            .consume_two_factor(user.id, code, OffsetDateTime::now_utc())
            .await?
        else {
            warn!(user_id = %user.id, "2fa code rejected");
            return Err(AppError::Unauthorized("Invalid or expired 2FA code".into()));
        };

        let access_token = self.keys.sign_access(&user)?;
        info!(user_id = %user.id, "user logged in");

        Ok(AuthResponse {
            access_token,
            user: PublicUser::from(&user),
        })
    }

    /// Marks the email verified and consumes the token.
    #[instrument(skip(self, token))]
    pub async fn verify_email(&self, token: &str, email: &str) -> AppResult<MessageResponse> {
        let user = match self.users.find_by_email(email).await? {
            Some(u) if u.email_verification_token.as_deref() == Some(token) => u,
            _ => {
                warn!(%email, "email verification rejected");
                return Err(AppError::BadRequest("Invalid verification token".into()));
            }
        };

        self.users.update(user.id, UserPatch::email_verified()).await?;
        info!(user_id = %user.id, "email verified");

        Ok(MessageResponse {
            message: "Email verified successfully".into(),
        })
    }

    /// Same answer for unknown email and wrong password.
    async fn check_credentials(&self, email: &str, password: String) -> AppResult<User> {
        let Some(user) = self.users.find_by_email(email).await? else {
            warn!(%email, "login unknown email");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        };

        if !password::verify_password_blocking(password, user.password_hash.clone()).await? {
            warn!(%email, user_id = %user.id, "login invalid password");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }
        Ok(user)
    }
}
