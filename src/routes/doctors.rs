use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use validator::Validate;

use crate::models::{CreateDoctorRequest, UpdateCallReportRequest};
use crate::routes::{error_response, store_error_response, validation_error, AppState};
use crate::services::{DoctorStore, NewDoctor};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/doctors", web::get().to(list_doctors))
        .route("/doctors", web::post().to(create_doctor))
        .route("/doctors", web::patch().to(update_call_report))
        .route("/doctors/{id}", web::get().to(get_doctor));
}

async fn list_doctors(state: web::Data<AppState>) -> impl Responder {
    match state.store.list_doctors().await {
        Ok(doctors) => HttpResponse::Ok().json(doctors),
        Err(e) => {
            tracing::error!("Failed to list doctors: {}", e);
            store_error_response("Failed to fetch doctors", &e)
        }
    }
}

async fn get_doctor(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();

    match state.store.get_doctor(&id).await {
        Ok(Some(doctor)) => HttpResponse::Ok().json(doctor),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            "Doctor not found",
            format!("No doctor with id {}", id),
        ),
        Err(e) => {
            tracing::error!("Failed to fetch doctor {}: {}", id, e);
            store_error_response("Failed to fetch doctor", &e)
        }
    }
}

/// Register a doctor
///
/// POST /api/v1/doctors
async fn create_doctor(
    state: web::Data<AppState>,
    req: web::Json<CreateDoctorRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }
    if let Err(e) = req.checked_location() {
        return error_response(StatusCode::BAD_REQUEST, "Invalid location", e.to_string());
    }

    match state.store.add_doctor(NewDoctor::from(req.into_inner())).await {
        Ok(doctor) => {
            tracing::info!("Registered doctor {} ({})", doctor.id, doctor.name);
            HttpResponse::Created().json(doctor)
        }
        Err(e) => {
            tracing::error!("Failed to register doctor: {}", e);
            store_error_response("Failed to add doctor", &e)
        }
    }
}

/// Attach a report to one of a doctor's emergency call logs
///
/// PATCH /api/v1/doctors
///
/// Request body:
/// ```json
/// { "doctorId": "5", "logIndex": 0, "report": "string" }
/// ```
async fn update_call_report(
    state: web::Data<AppState>,
    req: web::Json<UpdateCallReportRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    match state
        .store
        .update_call_report(&req.doctor_id, req.log_index, &req.report)
        .await
    {
        Ok(Some(doctor)) => HttpResponse::Ok().json(doctor),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            "Call log not found",
            format!("Doctor {} has no call log at index {}", req.doctor_id, req.log_index),
        ),
        Err(e) => {
            tracing::error!("Failed to update call report for {}: {}", req.doctor_id, e);
            store_error_response("Failed to update call report", &e)
        }
    }
}
