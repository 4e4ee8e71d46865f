use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::lenient;

/// Rejected caller or record coordinate
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("latitude and longitude are required")]
    Missing,

    #[error("latitude and longitude must be finite numbers")]
    NotFinite,

    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// Validated latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(CoordinateError::NotFinite);
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(CoordinateError::LongitudeOutOfRange(lng));
        }
        Ok(Self { lat, lng })
    }

    /// Build from optional request fields
    pub fn from_parts(lat: Option<f64>, lng: Option<f64>) -> Result<Self, CoordinateError> {
        match (lat, lng) {
            (Some(lat), Some(lng)) => Self::new(lat, lng),
            _ => Err(CoordinateError::Missing),
        }
    }

    /// Great-circle distance to another coordinate in kilometers
    #[inline]
    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        crate::core::distance::haversine_distance(self.lat, self.lng, other.lat, other.lng)
    }
}

/// Location attribute as stored, either half possibly absent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub lng: Option<f64>,
}

impl GeoPoint {
    /// Both halves present and finite
    pub fn usable(&self) -> Option<Coordinate> {
        usable_pair(self.lat, self.lng)
    }
}

impl From<Coordinate> for GeoPoint {
    fn from(c: Coordinate) -> Self {
        Self {
            lat: Some(c.lat),
            lng: Some(c.lng),
        }
    }
}

fn usable_pair(lat: Option<f64>, lng: Option<f64>) -> Option<Coordinate> {
    match (lat, lng) {
        (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => {
            Some(Coordinate { lat, lng })
        }
        _ => None,
    }
}

/// Emergency contact event logged against a doctor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallLog {
    /// RFC 3339 for new entries; older entries keep whatever text was stored
    #[serde(default, deserialize_with = "lenient::string")]
    pub timestamp: String,
    #[serde(
        rename = "patientName",
        alias = "callerName",
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub caller_name: Option<String>,
    #[serde(
        rename = "patientPhone",
        alias = "callerPhone",
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub caller_phone: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinate>,
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
}

/// Registered doctor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    #[serde(alias = "_id", deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub phone: String,
    #[serde(rename = "licenseNumber", default, deserialize_with = "lenient::string")]
    pub license_number: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub specialty: String,
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    pub experience: Option<u32>,
    #[serde(rename = "clinicAddress", default, deserialize_with = "lenient::string")]
    pub clinic_address: String,
    #[serde(rename = "availableHours", default, deserialize_with = "lenient::string")]
    pub available_hours: String,
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(rename = "callLogs", default, deserialize_with = "lenient::entries")]
    pub call_logs: Vec<CallLog>,
}

impl Doctor {
    /// Resolve where this doctor can be reached
    ///
    /// The nested `location` wins when both halves are finite; otherwise the
    /// top-level `lat`/`lng` pair is used. Records with neither are not
    /// rankable.
    pub fn coordinate(&self) -> Option<Coordinate> {
        self.location
            .as_ref()
            .and_then(GeoPoint::usable)
            .or_else(|| usable_pair(self.lat, self.lng))
    }
}

/// Registered patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    #[serde(alias = "_id", deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub phone: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub address: String,
    #[serde(rename = "favoriteDoctorIds", default, deserialize_with = "lenient::ids")]
    pub favorite_doctor_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Booked consultation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    #[serde(alias = "_id", deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(rename = "doctorId", deserialize_with = "lenient::id")]
    pub doctor_id: String,
    #[serde(rename = "patientId", deserialize_with = "lenient::id")]
    pub patient_id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub time: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub status: AppointmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
}

/// Doctor annotated with its distance from a caller
///
/// Only lives for the duration of one selection request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedDoctor {
    #[serde(flatten)]
    pub doctor: Doctor,
    #[serde(rename = "distanceKm")]
    pub distance_km: f64,
}

/// Whole persisted dataset, as laid out in the JSON data file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub doctors: Vec<Doctor>,
    #[serde(default)]
    pub patients: Vec<Patient>,
    #[serde(default)]
    pub appointments: Vec<Appointment>,
}
