use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::models::domain::RankedDoctor;

/// Response for the call-doctor endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CallDoctorResponse {
    pub doctors: Vec<RankedDoctor>,
    #[serde(rename = "callLogged")]
    pub call_logged: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Counts shown on the admin dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminSummary {
    pub doctors: usize,
    #[serde(rename = "locatedDoctors")]
    pub located_doctors: usize,
    pub patients: usize,
    pub appointments: usize,
    #[serde(rename = "appointmentsByStatus")]
    pub appointments_by_status: BTreeMap<String, usize>,
    #[serde(rename = "callLogs")]
    pub call_logs: usize,
}
