use actix_web::{http::StatusCode, web, HttpResponse, Responder};

use crate::core::{DispatchError, EmergencyCall};
use crate::models::{CallDoctorRequest, CallDoctorResponse};
use crate::routes::{error_response, AppState};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/call-doctor", web::post().to(call_doctor));
}

/// Emergency call endpoint
///
/// POST /api/v1/call-doctor
///
/// Request body:
/// ```json
/// {
///   "lat": -20.165,
///   "lng": 57.501,
///   "name": "string",
///   "phone": "string",
///   "mode": "direct"
/// }
/// ```
///
/// Responds with the nearest doctors, closest first. The channel alert
/// is delivered in the background and never delays the reply.
async fn call_doctor(
    state: web::Data<AppState>,
    req: web::Json<CallDoctorRequest>,
) -> impl Responder {
    let call = EmergencyCall::from(req.into_inner());

    match state.dispatcher.dispatch(&*state.store, call).await {
        Ok(outcome) => {
            let call_logged = outcome.call_logged;
            let warnings = outcome.warnings.iter().map(ToString::to_string).collect();

            tracing::info!(
                "Emergency call answered with {} doctors (call logged: {})",
                outcome.doctors.len(),
                call_logged
            );

            HttpResponse::Ok().json(CallDoctorResponse {
                doctors: outcome.doctors,
                call_logged,
                warnings,
            })
        }
        Err(DispatchError::InvalidInput(e)) => {
            tracing::info!("Rejected emergency call: {}", e);
            error_response(StatusCode::BAD_REQUEST, "Invalid location", e.to_string())
        }
        Err(DispatchError::NotFound) => error_response(
            StatusCode::NOT_FOUND,
            "No nearest doctors found",
            "No doctor has a usable location",
        ),
        Err(DispatchError::StoreUnavailable(e)) => {
            tracing::error!("Failed to load doctors for emergency call: {}", e);
            error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "Doctor directory unavailable",
                e.to_string(),
            )
        }
    }
}
