use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::PrivateCookieJar;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::bad_json;
use crate::{
    auth::{self, CurrentUser},
    error::AppError,
    models::user::User,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
}

async fn health(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    sqlx::query("SELECT 1").execute(&state.db).await?;
    Ok(Json(json!({
        "status": "ok",
        "timestamp": Utc::now(),
    })))
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    token: String,
    user: User,
}

async fn login(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    form: Result<Json<LoginForm>, JsonRejection>,
) -> Result<(PrivateCookieJar, Json<LoginResponse>), AppError> {
    let Json(form) = form.map_err(bad_json)?;
    let session = auth::login(&state, &form.username, &form.password).await?;
    let user = User::from(&session);
    Ok((
        auth::apply_session_cookie(jar, &session.id),
        Json(LoginResponse {
            token: session.id,
            user,
        }),
    ))
}

async fn logout(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, StatusCode), AppError> {
    if let Some(authenticated) = current.0 {
        state.sessions.destroy(&authenticated.session_id).await?;
    }
    Ok((auth::clear_session_cookie(jar), StatusCode::NO_CONTENT))
}

async fn me(current: CurrentUser) -> Result<Json<User>, AppError> {
    Ok(Json(current.require_user()?.user.clone()))
}
