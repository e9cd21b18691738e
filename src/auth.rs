use std::fmt;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use tracing::{info, warn};

use crate::{
    error::AppError,
    models::{session::Session, user::User},
    state::AppState,
};

pub const SESSION_COOKIE: &str = "trip_session";

/// The single configured login. Only the argon2 hash of its password is kept.
#[derive(Clone)]
pub struct DemoAccount {
    user: User,
    password_hash: String,
}

impl fmt::Debug for DemoAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DemoAccount")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl DemoAccount {
    pub fn new(username: &str, password: &str) -> Result<Self, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| AppError::Other(anyhow::anyhow!("hashing demo password: {err}")))?
            .to_string();
        Ok(Self {
            user: User {
                id: "1".to_string(),
                username: username.to_string(),
            },
            password_hash,
        })
    }

    pub fn verify(&self, username: &str, password: &str) -> Option<&User> {
        if username != self.user.username {
            return None;
        }
        let parsed = PasswordHash::new(&self.password_hash).ok()?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .ok()
            .map(|_| &self.user)
    }
}

pub async fn login(state: &AppState, username: &str, password: &str) -> Result<Session, AppError> {
    let Some(user) = state.account.verify(username, password) else {
        warn!(%username, "login rejected");
        return Err(AppError::Unauthorized);
    };
    let session = state.sessions.create(user).await?;
    info!(%username, "logged in");
    Ok(session)
}

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub session_id: String,
}

/// Session resolved for the current request, if any. Handlers take this as
/// an extractor; nothing about the login lives outside the request.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<AuthenticatedUser>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve_session(&parts.headers, state).await.map(Self)
    }
}

impl CurrentUser {
    pub fn require_user(&self) -> Result<&AuthenticatedUser, AppError> {
        self.0.as_ref().ok_or(AppError::Unauthorized)
    }
}

/// Gate for trip writes. Without `REQUIRE_AUTH` this returns at once and
/// never reads the session table, so handlers call it after validating input.
pub async fn authorize_write(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    if !state.config.require_auth {
        return Ok(());
    }
    match resolve_session(headers, state).await? {
        Some(_) => Ok(()),
        None => Err(AppError::Unauthorized),
    }
}

async fn resolve_session(
    headers: &HeaderMap,
    state: &AppState,
) -> Result<Option<AuthenticatedUser>, AppError> {
    let Some(token) = session_token(headers, state) else {
        return Ok(None);
    };

    let current = state
        .sessions
        .find_active(&token)
        .await?
        .map(|session| AuthenticatedUser {
            user: User::from(&session),
            session_id: session.id,
        });
    Ok(current)
}

/// Bearer header first, then the private session cookie.
fn session_token(headers: &HeaderMap, state: &AppState) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    PrivateCookieJar::from_headers(headers, state.cookie_key.clone())
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

pub fn apply_session_cookie(jar: PrivateCookieJar, session_id: &str) -> PrivateCookieJar {
    jar.add(
        Cookie::build((SESSION_COOKIE, session_id.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    )
}

pub fn clear_session_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}
