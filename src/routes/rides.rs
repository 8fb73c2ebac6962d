use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use tracing::{debug, info};

use crate::{
    error::AppError,
    extract::ValidatedJson,
    models::{ride, ride_request, Created, NewRide, NewRideRequest, Ride, RideId, RideRequest},
    state::AppState,
    store::Filter,
};

pub const MAX_RIDES: usize = 100;
pub const MAX_REQUESTS: usize = 200;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_rides).post(create_ride))
        .route("/:ride_id/requests", get(list_requests).post(create_request))
}

async fn list_rides(State(state): State<AppState>) -> Result<Json<Vec<Ride>>, AppError> {
    let docs = state
        .store
        .find(ride::COLLECTION, &Filter::all(), MAX_RIDES)
        .await?;
    let rides = docs
        .into_iter()
        .map(Ride::from_document)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(rides))
}

async fn create_ride(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<NewRide>,
) -> Result<Json<Created>, AppError> {
    let id = state
        .store
        .insert(ride::COLLECTION, payload.into_fields())
        .await?;
    info!(%id, "ride created");
    Ok(Json(Created { id }))
}

async fn create_request(
    State(state): State<AppState>,
    Path(ride_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<NewRideRequest>,
) -> Result<Json<Created>, AppError> {
    let ride_id = RideId::parse(&ride_id)?;
    state
        .store
        .find_one(ride::COLLECTION, &Filter::by_id(ride_id.to_string()))
        .await?
        .ok_or_else(|| AppError::NotFound("Ride not found".into()))?;

    let id = state
        .store
        .insert(
            ride_request::COLLECTION,
            payload.into_fields(ride_id, Utc::now()),
        )
        .await?;
    info!(%id, ride_id = %ride_id, "ride request created");
    Ok(Json(Created { id }))
}

async fn list_requests(
    State(state): State<AppState>,
    Path(ride_id): Path<String>,
) -> Result<Json<Vec<RideRequest>>, AppError> {
    // Requests store the canonical id, so any accepted spelling of it lists the same requests.
    let ride_id = RideId::parse(&ride_id)
        .map(|id| id.to_string())
        .unwrap_or(ride_id);
    let filter = Filter::all().field_eq("ride_id", ride_id.as_str());
    let docs = state
        .store
        .find(ride_request::COLLECTION, &filter, MAX_REQUESTS)
        .await?;
    debug!(%ride_id, count = docs.len(), "listing ride requests");
    let requests = docs
        .into_iter()
        .map(RideRequest::from_document)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(requests))
}
