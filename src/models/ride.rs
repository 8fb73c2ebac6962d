use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError};

use crate::store::{Document, Fields, StoreError};

pub const COLLECTION: &str = "ride";

/// Ride offered by a driver, as submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewRide {
    pub driver_name: String,
    #[serde(default)]
    pub car_model: Option<String>,
    #[validate(range(min = 1, message = "seats_available must be at least 1"))]
    pub seats_available: i64,
    pub origin: String,
    pub destination: String,
    #[validate(custom(function = "validate_departure_time"))]
    pub departure_time: String,
    pub contact: String,
    #[serde(default)]
    pub notes: Option<String>,
}

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y%m%d"];

const LOCAL_DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y%m%dT%H%M%S%.f",
    "%Y%m%dT%H%M",
];

/// Strips a trailing `Z`, `±HH`, `±HHMM` or `±HH:MM` designator from the time part.
fn strip_utc_offset(value: &str) -> &str {
    if let Some(local) = value.strip_suffix(['Z', 'z']) {
        return local;
    }
    let Some(t) = value.find('T') else {
        return value;
    };
    let Some(sign) = value[t..].rfind(['+', '-']).map(|pos| t + pos) else {
        return value;
    };
    let offset = value[sign + 1..].as_bytes();
    let well_formed = match offset.len() {
        2 | 4 => offset.iter().all(u8::is_ascii_digit),
        5 => {
            offset[2] == b':'
                && offset[..2].iter().all(u8::is_ascii_digit)
                && offset[3..].iter().all(u8::is_ascii_digit)
        }
        _ => false,
    };
    if well_formed {
        &value[..sign]
    } else {
        value
    }
}

fn is_iso8601(value: &str) -> bool {
    if DateTime::parse_from_rfc3339(value).is_ok() {
        return true;
    }
    if DATE_FORMATS
        .iter()
        .any(|format| NaiveDate::parse_from_str(value, format).is_ok())
    {
        return true;
    }
    let local = strip_utc_offset(value);
    LOCAL_DATE_TIME_FORMATS
        .iter()
        .any(|format| NaiveDateTime::parse_from_str(local, format).is_ok())
}

/// Accepts ISO-8601 calendar dates and date-times, extended or basic, with an optional UTC offset.
fn validate_departure_time(value: &str) -> Result<(), ValidationError> {
    if is_iso8601(value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("iso8601");
        err.message = Some("departure_time must be an ISO-8601 date-time".into());
        Err(err)
    }
}

fn optional(value: Option<String>) -> Value {
    value.map(Value::String).unwrap_or(Value::Null)
}

impl NewRide {
    pub fn into_fields(self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("driver_name".into(), Value::String(self.driver_name));
        fields.insert("car_model".into(), optional(self.car_model));
        fields.insert("seats_available".into(), Value::from(self.seats_available));
        fields.insert("origin".into(), Value::String(self.origin));
        fields.insert("destination".into(), Value::String(self.destination));
        fields.insert("departure_time".into(), Value::String(self.departure_time));
        fields.insert("contact".into(), Value::String(self.contact));
        fields.insert("notes".into(), optional(self.notes));
        fields
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ride {
    pub id: String,
    pub driver_name: String,
    pub car_model: Option<String>,
    pub seats_available: i64,
    pub origin: String,
    pub destination: String,
    pub departure_time: String,
    pub contact: String,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Ride {
    pub fn from_document(doc: Document) -> Result<Self, StoreError> {
        Ok(Self {
            driver_name: doc.required_str(COLLECTION, "driver_name")?,
            car_model: doc.optional_str(COLLECTION, "car_model")?,
            seats_available: doc.required_i64(COLLECTION, "seats_available")?,
            origin: doc.required_str(COLLECTION, "origin")?,
            destination: doc.required_str(COLLECTION, "destination")?,
            departure_time: doc.required_str(COLLECTION, "departure_time")?,
            contact: doc.required_str(COLLECTION, "contact")?,
            notes: doc.optional_str(COLLECTION, "notes")?,
            created_at: doc.created_at,
            id: doc.id,
        })
    }
}
