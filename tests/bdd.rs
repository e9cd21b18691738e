mod common;

use chrono::{DateTime, SubsecRound, Utc};
use common::TestApp;
use cucumber::{given, then, when, World as _};
use trip_planner::{
    auth,
    error::AppError,
    models::{
        session::Session,
        trip::{Trip, TripId, TripInput, TripPatch},
    },
    query::{TripFilter, TripPage},
    state::AppState,
};

#[derive(Debug, cucumber::World, Default)]
struct AppWorld {
    app: Option<TestApp>,
    created: Vec<Trip>,
    started_at: Option<DateTime<Utc>>,
    updates: Vec<Trip>,
    update_missed: bool,
    listing: Option<Result<Vec<Trip>, AppError>>,
    page: Option<TripPage>,
    login: Option<Result<Session, AppError>>,
}

impl AppWorld {
    fn app_state(&self) -> &AppState {
        &self
            .app
            .as_ref()
            .expect("state must be initialised first")
            .state
    }

    fn last_created(&self) -> &Trip {
        self.created.last().expect("a trip must be created first")
    }

    async fn create_trip(&mut self, title: &str, destination: &str, days: i64, budget: f64) {
        let trip = self
            .app_state()
            .trips
            .create(TripInput {
                title: title.to_string(),
                destination: destination.to_string(),
                days,
                budget,
            })
            .await
            .expect("create trip");
        self.created.push(trip);
    }
}

#[given("a fresh application state")]
async fn given_fresh_state(world: &mut AppWorld) {
    *world = AppWorld {
        app: Some(TestApp::new().await.expect("test app")),
        ..AppWorld::default()
    };
}

#[given(regex = r#"^a trip "([^"]+)" to "([^"]+)" for (\d+) days with budget (\d+(?:\.\d+)?)$"#)]
async fn given_trip(world: &mut AppWorld, title: String, destination: String, days: i64, budget: f64) {
    world.create_trip(&title, &destination, days, budget).await;
}

#[when(regex = r#"^I create a trip "([^"]+)" to "([^"]+)" for (\d+) days with budget (\d+(?:\.\d+)?)$"#)]
async fn when_create_trip(
    world: &mut AppWorld,
    title: String,
    destination: String,
    days: i64,
    budget: f64,
) {
    world.started_at = Some(Utc::now().trunc_subsecs(3));
    world.create_trip(&title, &destination, days, budget).await;
}

#[given(regex = r#"^trips to "([^"]+)", "([^"]+)" and "([^"]+)" were created in that order$"#)]
async fn given_trips_in_order(world: &mut AppWorld, first: String, second: String, third: String) {
    for destination in [first, second, third] {
        world.create_trip("Trip", &destination, 3, 500.0).await;
    }
}

#[given("ten trips with budgets from 100 to 1000")]
async fn given_ten_trips(world: &mut AppWorld) {
    for step in 1..=10 {
        world
            .create_trip("Trip", "Somewhere", 2, f64::from(step) * 100.0)
            .await;
    }
}

#[given("the storage connection is closed")]
async fn given_storage_closed(world: &mut AppWorld) {
    world.app_state().db.close().await;
}

#[then("the created trip has an id and a creation time within the call")]
async fn then_created_trip_has_identity(world: &mut AppWorld) {
    let trip = world.last_created();
    let started = world.started_at.expect("creation start recorded");
    assert!(!trip.id.to_string().is_empty());
    assert!(trip.created_at >= started);
    assert!(trip.created_at <= Utc::now());
}

#[then(regex = r"^the store holds (\d+) trips?$")]
async fn then_store_holds(world: &mut AppWorld, expected: usize) {
    let trips = world.app_state().trips.list_all().await.expect("list trips");
    assert_eq!(trips.len(), expected);
}

#[when("I list all trips")]
async fn when_list_all(world: &mut AppWorld) {
    world.listing = Some(world.app_state().trips.list_all().await);
}

#[then("the listing is ordered by creation time, newest first")]
async fn then_listing_ordered(world: &mut AppWorld) {
    let trips = listed(world);
    assert_eq!(trips.len(), world.created.len());
    for pair in trips.windows(2) {
        assert!(pair[0].created_at >= pair[1].created_at);
    }
}

#[then(regex = r#"^the first listed destination is "([^"]+)"$"#)]
async fn then_first_destination(world: &mut AppWorld, destination: String) {
    assert_eq!(listed(world)[0].destination, destination);
}

#[then("the listing fails with a storage error")]
async fn then_listing_fails(world: &mut AppWorld) {
    match world.listing.as_ref().expect("listing attempted") {
        Err(AppError::Database(_)) => {}
        other => panic!("expected a storage error, got {other:?}"),
    }
}

fn listed(world: &AppWorld) -> &[Trip] {
    world
        .listing
        .as_ref()
        .expect("listing attempted")
        .as_ref()
        .expect("listing succeeded")
}

#[when(regex = r"^I update its budget to (\d+(?:\.\d+)?)$")]
async fn when_update_budget(world: &mut AppWorld, budget: f64) {
    let id = world.last_created().id;
    let updated = world
        .app_state()
        .trips
        .update(&id, budget_patch(budget))
        .await
        .expect("update trip")
        .expect("trip exists");
    world.updates.push(updated);
}

#[when(regex = r"^I update an unknown trip's budget to (\d+(?:\.\d+)?)$")]
async fn when_update_unknown(world: &mut AppWorld, budget: f64) {
    let outcome = world
        .app_state()
        .trips
        .update(&TripId::new(), budget_patch(budget))
        .await
        .expect("a missing trip is not an error");
    world.update_missed = outcome.is_none();
}

fn budget_patch(budget: f64) -> TripPatch {
    TripPatch {
        budget: Some(budget),
        ..TripPatch::default()
    }
}

fn last_update(world: &AppWorld) -> &Trip {
    world.updates.last().expect("an update must have run")
}

#[then(regex = r"^the trip has budget (\d+(?:\.\d+)?)$")]
async fn then_trip_budget(world: &mut AppWorld, budget: f64) {
    assert_eq!(last_update(world).budget, budget);
}

#[then(regex = r#"^the trip keeps title "([^"]+)", destination "([^"]+)" and (\d+) days$"#)]
async fn then_trip_keeps(world: &mut AppWorld, title: String, destination: String, days: i64) {
    let trip = last_update(world);
    assert_eq!(trip.title, title);
    assert_eq!(trip.destination, destination);
    assert_eq!(trip.days, days);
}

#[then("the creation time is unchanged")]
async fn then_creation_unchanged(world: &mut AppWorld) {
    assert_eq!(last_update(world).created_at, world.last_created().created_at);

    let stored = world
        .app_state()
        .trips
        .get(&world.last_created().id)
        .await
        .expect("load trip")
        .expect("trip exists");
    assert_eq!(stored.created_at, world.last_created().created_at);
}

#[then("both updates returned the same trip")]
async fn then_updates_identical(world: &mut AppWorld) {
    assert_eq!(world.updates.len(), 2);
    assert_eq!(world.updates[0], world.updates[1]);
}

#[then("the update reports the trip as not found")]
async fn then_update_missed(world: &mut AppWorld) {
    assert!(world.update_missed);
}

#[when(regex = r"^I query budgets between (\d+) and (\d+) on page (\d+) with limit (\d+)$")]
async fn when_query(world: &mut AppWorld, min: f64, max: f64, page: u32, limit: u32) {
    let filter = TripFilter {
        min_budget: Some(min),
        max_budget: Some(max),
        page,
        limit,
        ..TripFilter::default()
    };
    world.page = Some(world.app_state().trips.query(&filter).await.expect("query"));
}

#[then(regex = r"^the query reports (\d+) matches and returns (\d+) trips$")]
async fn then_query_result(world: &mut AppWorld, total: u64, returned: usize) {
    let page = world.page.as_ref().expect("query ran");
    assert_eq!(page.total, total);
    assert_eq!(page.trips.len(), returned);
    for trip in &page.trips {
        assert!((300.0..=700.0).contains(&trip.budget));
    }
}

#[given(regex = r#"^I am logged in as "([^"]+)" with password "([^"]+)"$"#)]
async fn given_logged_in(world: &mut AppWorld, username: String, password: String) {
    let session = auth::login(world.app_state(), &username, &password)
        .await
        .expect("login");
    world.login = Some(Ok(session));
}

#[when(regex = r#"^I log in as "([^"]+)" with password "([^"]+)"$"#)]
async fn when_log_in(world: &mut AppWorld, username: String, password: String) {
    world.login = Some(auth::login(world.app_state(), &username, &password).await);
}

fn session_id(world: &AppWorld) -> String {
    match world.login.as_ref().expect("login attempted") {
        Ok(session) => session.id.clone(),
        Err(err) => panic!("login failed: {err:?}"),
    }
}

#[then(regex = r#"^a session for "([^"]+)" is active$"#)]
async fn then_session_active(world: &mut AppWorld, username: String) {
    let id = session_id(world);
    let session = world
        .app_state()
        .sessions
        .find_active(&id)
        .await
        .expect("lookup session")
        .expect("session is active");
    assert_eq!(session.username, username);
}

#[then("the login is rejected")]
async fn then_login_rejected(world: &mut AppWorld) {
    assert!(matches!(
        world.login.as_ref().expect("login attempted"),
        Err(AppError::Unauthorized)
    ));
}

#[when("I log out")]
async fn when_log_out(world: &mut AppWorld) {
    let id = session_id(world);
    world
        .app_state()
        .sessions
        .destroy(&id)
        .await
        .expect("destroy session");
}

#[then("the session is no longer active")]
async fn then_session_gone(world: &mut AppWorld) {
    let id = session_id(world);
    let session = world
        .app_state()
        .sessions
        .find_active(&id)
        .await
        .expect("lookup session");
    assert!(session.is_none());
}

#[tokio::main]
async fn main() {
    AppWorld::cucumber()
        .fail_on_skipped()
        .with_default_cli()
        .run("tests/features")
        .await;
}
