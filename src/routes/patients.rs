use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use validator::Validate;

use crate::models::{CreatePatientRequest, UpdateFavoritesRequest};
use crate::routes::{error_response, store_error_response, validation_error, AppState};
use crate::services::{NewPatient, PatientStore};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/patients", web::get().to(list_patients))
        .route("/patients", web::post().to(create_patient))
        .route("/patients", web::patch().to(update_favorites));
}

async fn list_patients(state: web::Data<AppState>) -> impl Responder {
    match state.store.list_patients().await {
        Ok(patients) => HttpResponse::Ok().json(patients),
        Err(e) => {
            tracing::error!("Failed to list patients: {}", e);
            store_error_response("Failed to fetch patients", &e)
        }
    }
}

async fn create_patient(
    state: web::Data<AppState>,
    req: web::Json<CreatePatientRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    match state.store.add_patient(NewPatient::from(req.into_inner())).await {
        Ok(patient) => {
            tracing::info!("Registered patient {}", patient.id);
            HttpResponse::Created().json(patient)
        }
        Err(e) => {
            tracing::error!("Failed to register patient: {}", e);
            store_error_response("Failed to add patient", &e)
        }
    }
}

/// Replace a patient's favourite doctors
///
/// PATCH /api/v1/patients
async fn update_favorites(
    state: web::Data<AppState>,
    req: web::Json<UpdateFavoritesRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let UpdateFavoritesRequest {
        patient_id,
        favorite_doctor_ids,
    } = req.into_inner();

    match state.store.update_favorites(&patient_id, favorite_doctor_ids).await {
        Ok(Some(patient)) => HttpResponse::Ok().json(patient),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            "Patient not found",
            format!("No patient with id {}", patient_id),
        ),
        Err(e) => {
            tracing::error!("Failed to update favourites for {}: {}", patient_id, e);
            store_error_response("Failed to update favourites", &e)
        }
    }
}
