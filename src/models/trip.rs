use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row};
use uuid::Uuid;

/// Opaque trip identifier, assigned by the store on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripId(Uuid);

impl TripId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TripId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TripId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: TripId,
    pub title: String,
    pub destination: String,
    pub days: i64,
    pub budget: f64,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for Trip {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let id = id
            .parse()
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let created_at: i64 = row.try_get("created_at")?;
        let created_at = DateTime::<Utc>::from_timestamp_millis(created_at)
            .ok_or_else(|| sqlx::Error::Decode("created_at out of range".into()))?;

        Ok(Self {
            id,
            title: row.try_get("title")?,
            destination: row.try_get("destination")?,
            days: row.try_get("days")?,
            budget: row.try_get("budget")?,
            created_at,
        })
    }
}

/// A fully validated record for `create`; id and timestamp come from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct TripInput {
    pub title: String,
    pub destination: String,
    pub days: i64,
    pub budget: f64,
}

/// Validated partial update. `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripPatch {
    pub title: Option<String>,
    pub destination: Option<String>,
    pub days: Option<i64>,
    pub budget: Option<f64>,
}

impl TripPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.destination.is_none()
            && self.days.is_none()
            && self.budget.is_none()
    }
}
