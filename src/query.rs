//! Filtering and page slicing over trip listings.
//!
//! [`filter_and_paginate`] is shared by
//! [`TripStore::query`](crate::services::trips::TripStore::query), which feeds
//! it rows already narrowed by budget in SQL, and by callers that only have the
//! full listing, e.g. a client talking to a server that answered with the
//! legacy bare array.

use serde::{Deserialize, Serialize};

use crate::models::trip::Trip;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct TripFilter {
    pub destination: Option<String>,
    pub min_budget: Option<f64>,
    pub max_budget: Option<f64>,
    /// 1-indexed.
    pub page: u32,
    pub limit: u32,
}

impl Default for TripFilter {
    fn default() -> Self {
        Self {
            destination: None,
            min_budget: None,
            max_budget: None,
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl TripFilter {
    pub fn matches(&self, trip: &Trip) -> bool {
        if let Some(needle) = &self.destination {
            if !trip
                .destination
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        if self.min_budget.is_some_and(|min| trip.budget < min) {
            return false;
        }
        if self.max_budget.is_some_and(|max| trip.budget > max) {
            return false;
        }
        true
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.limit)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripPage {
    pub trips: Vec<Trip>,
    /// Matches before pagination.
    pub total: u64,
}

pub fn filter_and_paginate<I>(trips: I, filter: &TripFilter) -> TripPage
where
    I: IntoIterator<Item = Trip>,
{
    let matching: Vec<Trip> = trips.into_iter().filter(|t| filter.matches(t)).collect();
    let total = matching.len() as u64;
    let offset = usize::try_from(filter.offset()).unwrap_or(usize::MAX);
    let trips = matching
        .into_iter()
        .skip(offset)
        .take(filter.limit as usize)
        .collect();

    TripPage { trips, total }
}

/// The two shapes `GET /api/trips` can answer with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TripListing {
    Page(TripPage),
    Bare(Vec<Trip>),
}

impl TripListing {
    /// Collapses either shape into one page. A bare listing has not been
    /// filtered yet, so the filter is applied here; a page is taken as-is.
    pub fn into_page(self, filter: &TripFilter) -> TripPage {
        match self {
            TripListing::Page(page) => page,
            TripListing::Bare(trips) => filter_and_paginate(trips, filter),
        }
    }
}
