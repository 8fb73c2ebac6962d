pub mod ride;
pub mod ride_request;

use serde::Serialize;

pub use ride::{NewRide, Ride};
pub use ride_request::{NewRideRequest, RequestStatus, RideId, RideRequest};

/// Response for endpoints that create a document.
#[derive(Debug, Clone, Serialize)]
pub struct Created {
    pub id: String,
}
