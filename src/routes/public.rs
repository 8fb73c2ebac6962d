use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::state::AppState;

const MAX_LISTED_COLLECTIONS: usize = 10;
const MAX_ERROR_LEN: usize = 50;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/test", get(diagnostics))
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Ride Social API is running" }))
}

#[derive(Debug, Serialize)]
pub struct Diagnostics {
    pub backend: String,
    pub database: String,
    pub database_url: String,
    pub database_name: String,
    pub connection_status: String,
    pub collections: Vec<String>,
}

fn truncate(err: impl ToString) -> String {
    err.to_string().chars().take(MAX_ERROR_LEN).collect()
}

fn presence(value: &Option<String>) -> String {
    let label = if value.is_some() { "✅ Set" } else { "❌ Not Set" };
    label.to_string()
}

/// Probes the store; failures end up in the body, never in the status code.
async fn diagnostics(State(state): State<AppState>) -> Json<Diagnostics> {
    let mut report = Diagnostics {
        backend: "✅ Running".into(),
        database: "❌ Not Available".into(),
        database_url: presence(&state.config.database_url),
        database_name: presence(&state.config.database_name),
        connection_status: "Not Connected".into(),
        collections: Vec::new(),
    };

    match state.store.ping().await {
        Ok(()) => {
            report.connection_status = "Connected".into();
            match state.store.list_collections(MAX_LISTED_COLLECTIONS).await {
                Ok(collections) => {
                    report.collections = collections;
                    report.database = "✅ Connected & Working".into();
                }
                Err(err) => {
                    warn!("listing collections failed: {err}");
                    report.database = format!("⚠️  Connected but Error: {}", truncate(err));
                }
            }
        }
        Err(err) => {
            warn!(backend = state.store.backend(), "store unreachable: {err}");
            report.database = format!("❌ Error: {}", truncate(err));
        }
    }

    Json(report)
}
