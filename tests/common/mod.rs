#![allow(dead_code)]

use std::{fmt, net::SocketAddr};

use anyhow::Context;
use axum::{http::HeaderValue, Router};
use chrono::Duration;
use tempfile::TempDir;
use trip_planner::{
    config::AppConfig,
    db::{init_pool, migrate},
    routes::create_router,
    state::AppState,
};

pub const DEMO_USERNAME: &str = "demo";
pub const DEMO_PASSWORD: &str = "password123";

pub struct TestApp {
    pub state: AppState,
    _root: TempDir,
}

impl fmt::Debug for TestApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestApp").finish()
    }
}

impl TestApp {
    pub async fn new() -> anyhow::Result<Self> {
        Self::with_auth(false).await
    }

    pub async fn with_auth(require_auth: bool) -> anyhow::Result<Self> {
        let root = TempDir::new().context("create temp dir for test database")?;
        let db_path = root.path().join("trips.sqlite");
        let database_url = format!("sqlite://{}", db_path.to_string_lossy());

        let config = AppConfig {
            database_url: database_url.clone(),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            cookie_secret: "test-cookie-secret".into(),
            cors_origin: HeaderValue::from_static("http://localhost:3000"),
            demo_username: DEMO_USERNAME.into(),
            demo_password: DEMO_PASSWORD.into(),
            require_auth,
            session_ttl: Duration::hours(1),
        };

        let db = init_pool(&config.database_url).await?;
        migrate(&db).await?;

        let state = AppState::new(config, db)?;
        Ok(Self { state, _root: root })
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }
}
