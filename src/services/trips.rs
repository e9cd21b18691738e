use chrono::{SubsecRound, Utc};
use tracing::{debug, info};

use crate::{
    db::DbPool,
    error::AppError,
    models::trip::{Trip, TripId, TripInput, TripPatch},
    query::{filter_and_paginate, TripFilter, TripPage},
};

const COLUMNS: &str = "id, title, destination, days, budget, created_at";

// ?1 min budget, ?2 max budget.
const BUDGET_BOUNDS: &str = "WHERE (?1 IS NULL OR budget >= ?1) AND (?2 IS NULL OR budget <= ?2)";

// Newest first; rowid breaks ties between trips created in the same millisecond.
const NEWEST_FIRST: &str = "ORDER BY created_at DESC, rowid DESC";

/// Owns persistence of the `trips` table. Cloning shares the pool.
#[derive(Clone)]
pub struct TripStore {
    db: DbPool,
}

impl TripStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: TripInput) -> Result<Trip, AppError> {
        let trip = Trip {
            id: TripId::new(),
            title: input.title,
            destination: input.destination,
            days: input.days,
            budget: input.budget,
            // Stored as epoch millis, so truncate before handing it back.
            created_at: Utc::now().trunc_subsecs(3),
        };

        sqlx::query(
            "INSERT INTO trips (id, title, destination, days, budget, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(trip.id.to_string())
        .bind(&trip.title)
        .bind(&trip.destination)
        .bind(trip.days)
        .bind(trip.budget)
        .bind(trip.created_at.timestamp_millis())
        .execute(&self.db)
        .await?;

        info!(trip_id = %trip.id, "trip created");
        Ok(trip)
    }

    /// Every trip, newest first.
    ///
    /// This is a full table scan and grows linearly with the number of trips.
    /// Use [`TripStore::query`] when only a filtered page is needed.
    pub async fn list_all(&self) -> Result<Vec<Trip>, AppError> {
        let trips = sqlx::query_as::<_, Trip>(&format!(
            "SELECT {COLUMNS} FROM trips {NEWEST_FIRST}"
        ))
        .fetch_all(&self.db)
        .await?;
        debug!(count = trips.len(), "listed all trips");
        Ok(trips)
    }

    /// Filtered page plus the total match count.
    ///
    /// Budget bounds run in SQL. Destination matching needs Unicode case
    /// folding, which SQLite's `lower()` lacks, so it and the page slice run
    /// over the budget-matching rows in [`filter_and_paginate`].
    pub async fn query(&self, filter: &TripFilter) -> Result<TripPage, AppError> {
        let candidates = sqlx::query_as::<_, Trip>(&format!(
            "SELECT {COLUMNS} FROM trips {BUDGET_BOUNDS} {NEWEST_FIRST}"
        ))
        .bind(filter.min_budget)
        .bind(filter.max_budget)
        .fetch_all(&self.db)
        .await?;

        let page = filter_and_paginate(candidates, filter);
        debug!(total = page.total, returned = page.trips.len(), "queried trips");
        Ok(page)
    }

    pub async fn get(&self, id: &TripId) -> Result<Option<Trip>, AppError> {
        let trip = sqlx::query_as::<_, Trip>(&format!("SELECT {COLUMNS} FROM trips WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.db)
            .await?;
        Ok(trip)
    }

    /// Applies only the fields present in `patch` in a single statement.
    /// `created_at` is never written. `Ok(None)` means no trip has this id.
    pub async fn update(&self, id: &TripId, patch: TripPatch) -> Result<Option<Trip>, AppError> {
        if patch.is_empty() {
            return self.get(id).await;
        }

        let updated = sqlx::query_as::<_, Trip>(&format!(
            "UPDATE trips SET \
                 title = COALESCE(?, title), \
                 destination = COALESCE(?, destination), \
                 days = COALESCE(?, days), \
                 budget = COALESCE(?, budget) \
             WHERE id = ? \
             RETURNING {COLUMNS}"
        ))
        .bind(patch.title)
        .bind(patch.destination)
        .bind(patch.days)
        .bind(patch.budget)
        .bind(id.to_string())
        .fetch_optional(&self.db)
        .await?;

        if updated.is_some() {
            info!(trip_id = %id, "trip updated");
        }
        Ok(updated)
    }
}
