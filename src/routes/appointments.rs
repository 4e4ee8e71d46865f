use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use validator::Validate;

use crate::core::booking_message;
use crate::models::{
    Appointment, AppointmentQuery, CreateAppointmentRequest, UpdateAppointmentReportRequest,
};
use crate::routes::{error_response, store_error_response, validation_error, AppState};
use crate::services::{
    spawn_composed_notification, AppointmentStore, DoctorStore, NewAppointment, Notifier,
    PatientStore, Store,
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/appointments", web::get().to(list_appointments))
        .route("/appointments", web::post().to(create_appointment))
        .route("/appointments", web::patch().to(update_report));
}

/// List appointments
///
/// GET /api/v1/appointments?doctorId={id}&patientId={id}
///
/// Both filters are optional and combine.
async fn list_appointments(
    state: web::Data<AppState>,
    query: web::Query<AppointmentQuery>,
) -> impl Responder {
    match state.store.list_appointments().await {
        Ok(appointments) => {
            let filtered: Vec<Appointment> = appointments
                .into_iter()
                .filter(|a| query.doctor_id.as_ref().map_or(true, |id| &a.doctor_id == id))
                .filter(|a| query.patient_id.as_ref().map_or(true, |id| &a.patient_id == id))
                .collect();
            HttpResponse::Ok().json(filtered)
        }
        Err(e) => {
            tracing::error!("Failed to list appointments: {}", e);
            store_error_response("Failed to fetch appointments", &e)
        }
    }
}

/// Book an appointment
///
/// POST /api/v1/appointments
///
/// Request body:
/// ```json
/// {
///   "doctorId": "5",
///   "patientId": "1",
///   "date": "2025-03-14",
///   "time": "09:30"
/// }
/// ```
async fn create_appointment(
    state: web::Data<AppState>,
    req: web::Json<CreateAppointmentRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let appointment = match state
        .store
        .add_appointment(NewAppointment::from(req.into_inner()))
        .await
    {
        Ok(appointment) => appointment,
        Err(e) => {
            tracing::error!("Failed to book appointment: {}", e);
            return store_error_response("Failed to book appointment", &e);
        }
    };

    tracing::info!(
        "Booked appointment {} for patient {} with doctor {}",
        appointment.id,
        appointment.patient_id,
        appointment.doctor_id
    );

    if state.notifier.is_enabled() {
        let store = state.store.clone();
        let booked = appointment.clone();
        // Name lookups and delivery both happen after the reply
        drop(spawn_composed_notification(
            state.notifier.clone(),
            async move { describe_booking(&*store, &booked).await },
        ));
    }

    HttpResponse::Created().json(appointment)
}

/// Booking alert text with names resolved where the store has them
async fn describe_booking(store: &dyn Store, appointment: &Appointment) -> String {
    let patient = match store.get_patient(&appointment.patient_id).await {
        Ok(patient) => patient,
        Err(e) => {
            tracing::warn!("Could not look up patient {}: {}", appointment.patient_id, e);
            None
        }
    };
    let doctor = match store.get_doctor(&appointment.doctor_id).await {
        Ok(doctor) => doctor,
        Err(e) => {
            tracing::warn!("Could not look up doctor {}: {}", appointment.doctor_id, e);
            None
        }
    };

    booking_message(
        appointment,
        patient.as_ref().map(|p| p.name.as_str()),
        doctor.as_ref().map(|d| d.name.as_str()),
    )
}

/// Attach a consultation report
///
/// PATCH /api/v1/appointments
async fn update_report(
    state: web::Data<AppState>,
    req: web::Json<UpdateAppointmentReportRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    match state
        .store
        .update_appointment_report(&req.appointment_id, &req.report)
        .await
    {
        Ok(Some(appointment)) => HttpResponse::Ok().json(appointment),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            "Appointment not found",
            format!("No appointment with id {}", req.appointment_id),
        ),
        Err(e) => {
            tracing::error!("Failed to update appointment {}: {}", req.appointment_id, e);
            store_error_response("Failed to update appointment", &e)
        }
    }
}
