use actix_web::{web, HttpResponse, Responder};

use crate::models::{AdminSummary, Appointment, Doctor, HealthResponse, Patient};
use crate::routes::{store_error_response, AppState};
use crate::services::{AppointmentStore, DoctorStore, PatientStore};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/admin/summary", web::get().to(summary));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = match state.store.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            tracing::warn!("Store health check failed: {}", e);
            false
        }
    };

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        store: state.store.backend().to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Dashboard counts
///
/// GET /api/v1/admin/summary
async fn summary(state: web::Data<AppState>) -> impl Responder {
    let doctors = match state.store.list_doctors().await {
        Ok(d) => d,
        Err(e) => return store_error_response("Failed to fetch doctors", &e),
    };
    let patients = match state.store.list_patients().await {
        Ok(p) => p,
        Err(e) => return store_error_response("Failed to fetch patients", &e),
    };
    let appointments = match state.store.list_appointments().await {
        Ok(a) => a,
        Err(e) => return store_error_response("Failed to fetch appointments", &e),
    };

    HttpResponse::Ok().json(summarize(&doctors, &patients, &appointments))
}

pub(crate) fn summarize(
    doctors: &[Doctor],
    patients: &[Patient],
    appointments: &[Appointment],
) -> AdminSummary {
    let mut summary = AdminSummary {
        doctors: doctors.len(),
        located_doctors: doctors.iter().filter(|d| d.coordinate().is_some()).count(),
        patients: patients.len(),
        appointments: appointments.len(),
        call_logs: doctors.iter().map(|d| d.call_logs.len()).sum(),
        ..Default::default()
    };

    for appointment in appointments {
        *summary
            .appointments_by_status
            .entry(appointment.status.to_string())
            .or_default() += 1;
    }

    summary
}
