use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use serde_with::{serde_as, NoneAsEmptyString};
use tracing::warn;

use super::bad_json;
use crate::{
    auth::authorize_write,
    error::AppError,
    models::trip::{Trip, TripId},
    query::{TripFilter, TripListing, DEFAULT_LIMIT, DEFAULT_PAGE},
    state::AppState,
    validation::{validate_patch, validate_trip},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_trips).post(create_trip))
        .route("/:id", get(get_trip).put(update_trip))
}

#[serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    destination: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    min_budget: Option<f64>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    max_budget: Option<f64>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    page: Option<u32>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    limit: Option<u32>,
}

impl ListParams {
    fn is_empty(&self) -> bool {
        self.destination.is_none()
            && self.min_budget.is_none()
            && self.max_budget.is_none()
            && self.page.is_none()
            && self.limit.is_none()
    }

    fn into_filter(self) -> Result<TripFilter, AppError> {
        for (name, bound) in [("minBudget", self.min_budget), ("maxBudget", self.max_budget)] {
            if bound.is_some_and(|value| !value.is_finite()) {
                return Err(AppError::BadRequest(format!("{name} must be a finite number")));
            }
        }
        // 0 means "not given", same as the web client sends before a page is picked.
        Ok(TripFilter {
            destination: self.destination,
            min_budget: self.min_budget,
            max_budget: self.max_budget,
            page: self.page.filter(|page| *page > 0).unwrap_or(DEFAULT_PAGE),
            limit: self
                .limit
                .filter(|limit| *limit > 0)
                .unwrap_or(DEFAULT_LIMIT),
        })
    }
}

/// Without query parameters this answers with the bare array older clients
/// expect. Any filter or page parameter switches to `{trips, total}`.
async fn list_trips(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<TripListing>, AppError> {
    let Query(params) = params.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    if params.is_empty() {
        let trips = state.trips.list_all().await?;
        return Ok(Json(TripListing::Bare(trips)));
    }

    let filter = params.into_filter()?;
    let page = state.trips.query(&filter).await?;
    Ok(Json(TripListing::Page(page)))
}

async fn create_trip(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Trip>), AppError> {
    let Json(payload) = payload.map_err(bad_json)?;
    let input = validate_trip(&payload)?;
    authorize_write(&state, &headers).await?;
    let trip = state.trips.create(input).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

async fn get_trip(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Trip>, AppError> {
    let id = parse_id(&id)?;
    state
        .trips
        .get(&id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

async fn update_trip(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Trip>, AppError> {
    let Json(payload) = payload.map_err(bad_json)?;
    let patch = validate_patch(&payload)?;
    authorize_write(&state, &headers).await?;
    let id = parse_id(&id)?;

    match state.trips.update(&id, patch).await? {
        Some(trip) => Ok(Json(trip)),
        None => {
            warn!(trip_id = %id, "update for unknown trip");
            Err(AppError::NotFound)
        }
    }
}

fn parse_id(raw: &str) -> Result<TripId, AppError> {
    raw.parse().map_err(|_| {
        warn!(%raw, "malformed trip id");
        AppError::NotFound
    })
}
