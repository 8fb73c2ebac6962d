use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    store::{Document, Fields, StoreError},
};

pub const COLLECTION: &str = "riderequest";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Declined => "declined",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "accepted" => Ok(RequestStatus::Accepted),
            "declined" => Ok(RequestStatus::Declined),
            other => Err(format!("unknown status `{other}`")),
        }
    }
}

/// Storage identifier of a ride, in canonical hyphenated form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RideId(Uuid);

impl RideId {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| AppError::InvalidId("Invalid ride id".into()))
    }
}

impl fmt::Display for RideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewRideRequest {
    pub requester_name: String,
    pub contact: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl NewRideRequest {
    /// Fields of a freshly submitted request: always pending, stamped with `requested_at`.
    pub fn into_fields(self, ride_id: RideId, requested_at: DateTime<Utc>) -> Fields {
        let mut fields = Fields::new();
        fields.insert("ride_id".into(), Value::String(ride_id.to_string()));
        fields.insert("requester_name".into(), Value::String(self.requester_name));
        fields.insert("contact".into(), Value::String(self.contact));
        fields.insert(
            "message".into(),
            self.message.map(Value::String).unwrap_or(Value::Null),
        );
        fields.insert(
            "status".into(),
            Value::String(RequestStatus::Pending.as_str().into()),
        );
        fields.insert(
            "requested_at".into(),
            Value::String(requested_at.to_rfc3339()),
        );
        fields
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideRequest {
    pub id: String,
    pub ride_id: String,
    pub requester_name: String,
    pub contact: String,
    pub message: Option<String>,
    pub status: RequestStatus,
    pub requested_at: Option<DateTime<Utc>>,
}

impl RideRequest {
    pub fn from_document(doc: Document) -> Result<Self, StoreError> {
        let status = match doc.optional_str(COLLECTION, "status")? {
            Some(raw) => raw.parse::<RequestStatus>().map_err(|reason| StoreError::InvalidField {
                collection: COLLECTION,
                id: doc.id.clone(),
                field: "status",
                reason,
            })?,
            None => RequestStatus::default(),
        };
        Ok(Self {
            ride_id: doc.required_str(COLLECTION, "ride_id")?,
            requester_name: doc.required_str(COLLECTION, "requester_name")?,
            contact: doc.required_str(COLLECTION, "contact")?,
            message: doc.optional_str(COLLECTION, "message")?,
            requested_at: doc.optional_timestamp(COLLECTION, "requested_at")?,
            status,
            id: doc.id,
        })
    }
}
