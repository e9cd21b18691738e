use std::{env, net::SocketAddr, str::FromStr};

use axum::http::HeaderValue;
use chrono::Duration;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    pub cookie_secret: String,
    pub cors_origin: HeaderValue,
    pub demo_username: String,
    pub demo_password: String,
    /// Guards trip writes behind a session when set.
    pub require_auth: bool,
    pub session_ttl: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://trips.db".to_string());
        let listen_addr: SocketAddr = parse_var("APP_LISTEN_ADDR", "127.0.0.1:3002")?;

        let cookie_secret = env::var("COOKIE_SECRET")
            .unwrap_or_else(|_| "change-me-trip-planner-development-cookie-secret".to_string());

        let cors_origin = env::var("CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());
        let cors_origin = HeaderValue::from_str(&cors_origin)
            .map_err(|err| AppError::Config(format!("invalid CORS_ORIGIN: {err}")))?;

        let demo_username = env::var("DEMO_USERNAME").unwrap_or_else(|_| "demo".to_string());
        let demo_password =
            env::var("DEMO_PASSWORD").unwrap_or_else(|_| "password123".to_string());

        let require_auth = parse_flag(&env::var("REQUIRE_AUTH").unwrap_or_default())
            .ok_or_else(|| AppError::Config("invalid REQUIRE_AUTH, expected true/false".into()))?;

        let ttl_hours: i64 = parse_var("SESSION_TTL_HOURS", "24")?;
        if ttl_hours <= 0 {
            return Err(AppError::Config("SESSION_TTL_HOURS must be positive".into()));
        }

        Ok(Self {
            database_url,
            listen_addr,
            cookie_secret,
            cors_origin,
            demo_username,
            demo_password,
            require_auth,
            session_ttl: Duration::hours(ttl_hours),
        })
    }
}

fn parse_var<T>(key: &str, default: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|err| AppError::Config(format!("invalid {key}: {err}")))
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "off" => Some(false),
        "1" | "true" | "yes" | "on" => Some(true),
        _ => None,
    }
}
