use std::{fmt, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use cucumber::{given, then, when, World as _};
use ride_social::{
    config::AppConfig,
    db::init_pool,
    routes::create_router,
    state::AppState,
    store::SqliteDocumentStore,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

#[derive(Debug, cucumber::World, Default)]
struct AppWorld {
    state: Option<TestState>,
    last_status: Option<StatusCode>,
    last_body: Value,
    ride_id: Option<String>,
}

impl AppWorld {
    fn router(&self) -> Router {
        self.state
            .as_ref()
            .expect("state must be initialised first")
            .router
            .clone()
    }

    async fn send(&mut self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = self
            .router()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        self.last_status = Some(status);
        self.last_body = value.clone();
        (status, value)
    }

    async fn publish_ride(&mut self, origin: &str, destination: &str, seats: Option<i64>) {
        let mut body = json!({
            "driver_name": "Ana",
            "origin": origin,
            "destination": destination,
            "departure_time": "2025-06-01T08:30:00Z",
            "contact": "ana@example.org"
        });
        if let Some(seats) = seats {
            body["seats_available"] = json!(seats);
        }
        let (status, created) = self.send("POST", "/api/rides", Some(body)).await;
        if status == StatusCode::OK {
            self.ride_id = created["id"].as_str().map(str::to_string);
        }
    }

    async fn rides(&mut self) -> Vec<Value> {
        let (status, body) = self.send("GET", "/api/rides", None).await;
        assert_eq!(status, StatusCode::OK);
        body.as_array().cloned().unwrap_or_default()
    }
}

struct TestState {
    router: Router,
    _root: TempDir,
}

impl fmt::Debug for TestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestState").finish()
    }
}

impl TestState {
    async fn new() -> anyhow::Result<Self> {
        let root = TempDir::new().context("create temp dir for bdd world")?;
        let db_path = root.path().join("bdd.sqlite");
        let database_url = format!("sqlite://{}?mode=rwc", db_path.to_string_lossy());

        let config = AppConfig {
            database_url: Some(database_url.clone()),
            database_name: Some("bdd".into()),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        };

        let store = SqliteDocumentStore::new(init_pool(&database_url).await?);
        store.migrate().await?;

        let router = create_router(AppState::new(config, Arc::new(store)));
        Ok(Self {
            router,
            _root: root,
        })
    }
}

#[given("a fresh application backed by a temporary database")]
async fn given_fresh_state(world: &mut AppWorld) {
    world.state = Some(TestState::new().await.expect("state"));
    world.ride_id = None;
}

#[given(regex = r#"^a published ride from "([^"]+)" to "([^"]+)" with (\d+) seats$"#)]
async fn given_published_ride(world: &mut AppWorld, origin: String, destination: String, seats: i64) {
    world.publish_ride(&origin, &destination, Some(seats)).await;
    assert!(world.ride_id.is_some(), "ride should have been created");
}

#[when(regex = r#"^a driver publishes a ride from "([^"]+)" to "([^"]+)" with (-?\d+) seats$"#)]
async fn when_publish_ride(world: &mut AppWorld, origin: String, destination: String, seats: i64) {
    world.publish_ride(&origin, &destination, Some(seats)).await;
}

#[when(regex = r#"^a driver publishes a ride from "([^"]+)" to "([^"]+)" without seats$"#)]
async fn when_publish_ride_without_seats(world: &mut AppWorld, origin: String, destination: String) {
    world.publish_ride(&origin, &destination, None).await;
}

#[when(regex = r#"^"([^"]+)" requests a seat on that ride$"#)]
async fn when_request_seat(world: &mut AppWorld, name: String) {
    let ride_id = world.ride_id.clone().expect("a ride must be published first");
    request_seat(world, &ride_id, &name).await;
}

#[when(regex = r#"^"([^"]+)" requests a seat on an unknown ride$"#)]
async fn when_request_unknown(world: &mut AppWorld, name: String) {
    request_seat(world, &Uuid::new_v4().to_string(), &name).await;
}

#[when(regex = r#"^"([^"]+)" requests a seat on ride "([^"]+)"$"#)]
async fn when_request_literal(world: &mut AppWorld, name: String, ride_id: String) {
    request_seat(world, &ride_id, &name).await;
}

#[then(regex = r"^the response status is (\d+)$")]
async fn then_status(world: &mut AppWorld, expected: u16) {
    let status = world.last_status.expect("a request must have been sent");
    assert_eq!(status.as_u16(), expected, "body: {}", world.last_body);
}

#[then(regex = r"^the ride list contains (\d+) rides?$")]
async fn then_ride_count(world: &mut AppWorld, expected: usize) {
    assert_eq!(world.rides().await.len(), expected);
}

#[then(regex = r#"^the listed ride goes from "([^"]+)" to "([^"]+)" with (\d+) seats$"#)]
async fn then_listed_ride(world: &mut AppWorld, origin: String, destination: String, seats: i64) {
    let rides = world.rides().await;
    let ride = rides.last().expect("at least one ride");
    assert_eq!(ride["origin"], json!(origin));
    assert_eq!(ride["destination"], json!(destination));
    assert_eq!(ride["seats_available"], json!(seats));
    assert!(ride["created_at"].is_string());
}

#[then(regex = r#"^that ride has (\d+) requests? with status "([^"]+)"$"#)]
async fn then_requests_with_status(world: &mut AppWorld, expected: usize, status: String) {
    let ride_id = world.ride_id.clone().expect("a ride must be published first");
    let (code, body) = world
        .send("GET", &format!("/api/rides/{ride_id}/requests"), None)
        .await;
    assert_eq!(code, StatusCode::OK);
    let requests = body.as_array().cloned().unwrap_or_default();
    assert_eq!(requests.len(), expected);
    for request in requests {
        assert_eq!(request["status"], json!(status));
        assert_eq!(request["ride_id"], json!(ride_id));
        assert!(request["requested_at"].is_string());
    }
}

#[then(regex = r#"^the diagnostics report "([^"]+)" for the database$"#)]
async fn then_diagnostics(world: &mut AppWorld, expected: String) {
    let (code, body) = world.send("GET", "/test", None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["database"], json!(expected));
}

async fn request_seat(world: &mut AppWorld, ride_id: &str, name: &str) {
    let body = json!({
        "requester_name": name,
        "contact": format!("{}@example.org", name.to_lowercase()),
    });
    world
        .send("POST", &format!("/api/rides/{ride_id}/requests"), Some(body))
        .await;
}

#[tokio::main]
async fn main() {
    AppWorld::cucumber()
        .fail_on_skipped()
        .with_default_cli()
        .run("tests/features")
        .await;
}
