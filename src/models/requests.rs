use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{AppointmentStatus, Coordinate, CoordinateError, GeoPoint};
use crate::models::lenient;

/// Emergency call from a patient's device
///
/// Coordinates are optional here so that a missing field reaches the
/// dispatcher and is reported as invalid input instead of a JSON error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallDoctorRequest {
    #[serde(default, deserialize_with = "lenient::number")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub lng: Option<f64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
}

/// Doctor registration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateDoctorRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub phone: String,
    #[serde(rename = "licenseNumber", alias = "license_number", default)]
    pub license_number: String,
    #[serde(default)]
    pub specialty: String,
    #[serde(default)]
    pub experience: Option<u32>,
    #[serde(rename = "clinicAddress", alias = "clinic_address", default)]
    pub clinic_address: String,
    #[serde(rename = "availableHours", alias = "available_hours", default)]
    pub available_hours: String,
    #[serde(default)]
    pub location: Option<Coordinate>,
}

impl CreateDoctorRequest {
    /// Range-check the submitted clinic location
    pub fn checked_location(&self) -> Result<Option<Coordinate>, CoordinateError> {
        self.location
            .map(|point| Coordinate::new(point.lat, point.lng))
            .transpose()
    }

    pub fn location_point(&self) -> Option<GeoPoint> {
        self.location.map(GeoPoint::from)
    }
}

/// Patient registration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePatientRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(rename = "favoriteDoctorIds", default, deserialize_with = "lenient::ids")]
    pub favorite_doctor_ids: Vec<String>,
}

/// Replace a patient's favourite doctors
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateFavoritesRequest {
    #[validate(length(min = 1))]
    #[serde(rename = "patientId", alias = "patient_id", deserialize_with = "lenient::id")]
    pub patient_id: String,
    #[serde(rename = "favoriteDoctorIds", default, deserialize_with = "lenient::ids")]
    pub favorite_doctor_ids: Vec<String>,
}

/// Book an appointment
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAppointmentRequest {
    #[validate(length(min = 1))]
    #[serde(rename = "doctorId", alias = "doctor_id", deserialize_with = "lenient::id")]
    pub doctor_id: String,
    #[validate(length(min = 1))]
    #[serde(rename = "patientId", alias = "patient_id", deserialize_with = "lenient::id")]
    pub patient_id: String,
    #[validate(length(min = 1))]
    pub date: String,
    #[validate(length(min = 1))]
    pub time: String,
    #[serde(default)]
    pub status: AppointmentStatus,
}

/// Attach a consultation report to an appointment
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateAppointmentReportRequest {
    #[validate(length(min = 1))]
    #[serde(rename = "appointmentId", alias = "appointment_id", deserialize_with = "lenient::id")]
    pub appointment_id: String,
    #[validate(length(min = 1))]
    pub report: String,
}

/// Attach a report to one of a doctor's call logs
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateCallReportRequest {
    #[validate(length(min = 1))]
    #[serde(rename = "doctorId", alias = "doctor_id", deserialize_with = "lenient::id")]
    pub doctor_id: String,
    #[serde(rename = "logIndex", alias = "log_index")]
    pub log_index: usize,
    #[validate(length(min = 1))]
    pub report: String,
}

/// Optional filters for listing appointments
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentQuery {
    #[serde(rename = "doctorId", alias = "doctor_id", default)]
    pub doctor_id: Option<String>,
    #[serde(rename = "patientId", alias = "patient_id", default)]
    pub patient_id: Option<String>,
}
