use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};

use crate::{
    auth::DemoAccount,
    config::AppConfig,
    db::DbPool,
    error::AppError,
    services::{sessions::SessionStore, trips::TripStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DbPool,
    pub trips: TripStore,
    pub sessions: SessionStore,
    pub account: DemoAccount,
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(config: AppConfig, db: DbPool) -> Result<Self, AppError> {
        let digest = Sha512::digest(config.cookie_secret.as_bytes());
        let cookie_key = Key::from(&digest[..]);
        let account = DemoAccount::new(&config.demo_username, &config.demo_password)?;
        Ok(Self {
            trips: TripStore::new(db.clone()),
            sessions: SessionStore::new(db.clone(), config.session_ttl),
            config,
            db,
            account,
            cookie_key,
        })
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
