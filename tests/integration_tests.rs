// Integration tests for MyDoctor

use actix_web::{http::StatusCode, test, web, App};
use async_trait::async_trait;
use mydoctor::core::{EmergencyDispatcher, NearestLocator};
use mydoctor::models::{Appointment, CallLog, Doctor, Patient};
use mydoctor::routes::{self, handle_json_payload_error, handle_query_payload_error, AppState};
use mydoctor::services::{
    AppointmentStore, CallLogWriter, DoctorStore, JsonFileStore, NewAppointment, NewDoctor,
    NewPatient, Notifier, NotifyError, PatientStore, Store, StoreError,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    /// Wait for background deliveries to land
    async fn wait_for(&self, count: usize) -> Vec<String> {
        for _ in 0..400 {
            if self.messages.lock().unwrap().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.messages()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

/// Store whose backend never answers
struct UnreachableStore;

fn offline() -> StoreError {
    StoreError::Api("connection refused".to_string())
}

#[async_trait]
impl DoctorStore for UnreachableStore {
    async fn list_doctors(&self) -> Result<Vec<Doctor>, StoreError> {
        Err(offline())
    }

    async fn get_doctor(&self, _id: &str) -> Result<Option<Doctor>, StoreError> {
        Err(offline())
    }

    async fn add_doctor(&self, _doctor: NewDoctor) -> Result<Doctor, StoreError> {
        Err(offline())
    }

    async fn update_call_report(
        &self,
        _doctor_id: &str,
        _log_index: usize,
        _report: &str,
    ) -> Result<Option<Doctor>, StoreError> {
        Err(offline())
    }
}

#[async_trait]
impl CallLogWriter for UnreachableStore {
    async fn record_call(&self, _doctor_id: &str, _log: CallLog) -> Result<(), StoreError> {
        Err(offline())
    }
}

#[async_trait]
impl PatientStore for UnreachableStore {
    async fn list_patients(&self) -> Result<Vec<Patient>, StoreError> {
        Err(offline())
    }

    async fn get_patient(&self, _id: &str) -> Result<Option<Patient>, StoreError> {
        Err(offline())
    }

    async fn add_patient(&self, _patient: NewPatient) -> Result<Patient, StoreError> {
        Err(offline())
    }

    async fn update_favorites(
        &self,
        _patient_id: &str,
        _favorite_doctor_ids: Vec<String>,
    ) -> Result<Option<Patient>, StoreError> {
        Err(offline())
    }
}

#[async_trait]
impl AppointmentStore for UnreachableStore {
    async fn list_appointments(&self) -> Result<Vec<Appointment>, StoreError> {
        Err(offline())
    }

    async fn add_appointment(&self, _appointment: NewAppointment) -> Result<Appointment, StoreError> {
        Err(offline())
    }

    async fn update_appointment_report(
        &self,
        _appointment_id: &str,
        _report: &str,
    ) -> Result<Option<Appointment>, StoreError> {
        Err(offline())
    }
}

#[async_trait]
impl Store for UnreachableStore {
    fn backend(&self) -> &'static str {
        "unreachable"
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Err(offline())
    }
}

/// File store whose patient and doctor lookups are slow
struct SlowLookupStore {
    inner: JsonFileStore,
    delay: Duration,
}

#[async_trait]
impl DoctorStore for SlowLookupStore {
    async fn list_doctors(&self) -> Result<Vec<Doctor>, StoreError> {
        self.inner.list_doctors().await
    }

    async fn get_doctor(&self, id: &str) -> Result<Option<Doctor>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_doctor(id).await
    }

    async fn add_doctor(&self, doctor: NewDoctor) -> Result<Doctor, StoreError> {
        self.inner.add_doctor(doctor).await
    }

    async fn update_call_report(
        &self,
        doctor_id: &str,
        log_index: usize,
        report: &str,
    ) -> Result<Option<Doctor>, StoreError> {
        self.inner.update_call_report(doctor_id, log_index, report).await
    }
}

#[async_trait]
impl CallLogWriter for SlowLookupStore {
    async fn record_call(&self, doctor_id: &str, log: CallLog) -> Result<(), StoreError> {
        self.inner.record_call(doctor_id, log).await
    }
}

#[async_trait]
impl PatientStore for SlowLookupStore {
    async fn list_patients(&self) -> Result<Vec<Patient>, StoreError> {
        self.inner.list_patients().await
    }

    async fn get_patient(&self, id: &str) -> Result<Option<Patient>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_patient(id).await
    }

    async fn add_patient(&self, patient: NewPatient) -> Result<Patient, StoreError> {
        self.inner.add_patient(patient).await
    }

    async fn update_favorites(
        &self,
        patient_id: &str,
        favorite_doctor_ids: Vec<String>,
    ) -> Result<Option<Patient>, StoreError> {
        self.inner.update_favorites(patient_id, favorite_doctor_ids).await
    }
}

#[async_trait]
impl AppointmentStore for SlowLookupStore {
    async fn list_appointments(&self) -> Result<Vec<Appointment>, StoreError> {
        self.inner.list_appointments().await
    }

    async fn add_appointment(&self, appointment: NewAppointment) -> Result<Appointment, StoreError> {
        self.inner.add_appointment(appointment).await
    }

    async fn update_appointment_report(
        &self,
        appointment_id: &str,
        report: &str,
    ) -> Result<Option<Appointment>, StoreError> {
        self.inner.update_appointment_report(appointment_id, report).await
    }
}

#[async_trait]
impl Store for SlowLookupStore {
    fn backend(&self) -> &'static str {
        "slow"
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        self.inner.health_check().await
    }
}

fn app_state(store: Arc<dyn Store>, notifier: Arc<dyn Notifier>) -> AppState {
    let dispatcher = EmergencyDispatcher::new(NearestLocator::default(), notifier.clone());
    AppState::new(store, notifier, dispatcher)
}

async fn seeded_store(dir: &tempfile::TempDir) -> Arc<dyn Store> {
    let store = JsonFileStore::open(dir.path().join("data.json"), true)
        .await
        .unwrap();
    Arc::new(store)
}

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
                .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
                .configure(routes::configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn test_call_doctor_returns_nearest_three() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store(&dir).await;
    let notifier = Arc::new(RecordingNotifier::default());
    let app = init_app!(app_state(store.clone(), notifier.clone()));

    let req = test::TestRequest::post()
        .uri("/api/v1/call-doctor")
        .set_json(json!({ "lat": -20.165, "lng": 57.501, "name": "Ana", "phone": "+230 5555 1234" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    let ids: Vec<&str> = body["doctors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["2", "1", "5"]);
    assert_eq!(body["callLogged"], true);
    assert!(body.get("warnings").is_none());

    let distance = body["doctors"][0]["distanceKm"].as_f64().unwrap();
    assert!((distance - 8.08).abs() < 0.01);

    // Call was logged against the nearest doctor
    let doctor = store.get_doctor("2").await.unwrap().unwrap();
    assert_eq!(doctor.call_logs.len(), 1);
    assert_eq!(doctor.call_logs[0].caller_name.as_deref(), Some("Ana"));

    let messages = notifier.wait_for(1).await;
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("EMERGENCY CALL"));
    assert!(messages[0].contains("Dr. Decoy One"));
}

#[actix_web::test]
async fn test_call_doctor_accepts_string_coordinates() {
    let dir = tempfile::tempdir().unwrap();
    let notifier = Arc::new(RecordingNotifier::default());
    let app = init_app!(app_state(seeded_store(&dir).await, notifier));

    let req = test::TestRequest::post()
        .uri("/api/v1/call-doctor")
        .set_json(json!({ "lat": "-20.078003", "lng": "57.61123541244636" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["doctors"][0]["id"], "5");
    assert_eq!(body["doctors"][0]["name"], "Dr. Sahil Jeebun");
}

#[actix_web::test]
async fn test_direct_call_skips_alert() {
    let dir = tempfile::tempdir().unwrap();
    let notifier = Arc::new(RecordingNotifier::default());
    let app = init_app!(app_state(seeded_store(&dir).await, notifier.clone()));

    let req = test::TestRequest::post()
        .uri("/api/v1/call-doctor")
        .set_json(json!({ "lat": -20.165, "lng": 57.501, "mode": "direct" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(notifier.messages().is_empty());
}

#[actix_web::test]
async fn test_call_doctor_invalid_location() {
    let dir = tempfile::tempdir().unwrap();
    let app = init_app!(app_state(
        seeded_store(&dir).await,
        Arc::new(RecordingNotifier::default())
    ));

    for body in [
        json!({ "name": "Ana" }),
        json!({ "lat": -20.165 }),
        json!({ "lat": "abc", "lng": 57.5 }),
        json!({ "lat": 95.0, "lng": 57.5 }),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/v1/call-doctor")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status_code"], 400);
    }
}

#[actix_web::test]
async fn test_call_doctor_no_located_doctors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.json");
    std::fs::write(
        &path,
        r#"{"doctors": [{"id": "1", "name": "Dr. Nowhere", "location": {"lat": null, "lng": 10}}], "patients": [], "appointments": []}"#,
    )
    .unwrap();
    let store = Arc::new(JsonFileStore::open(&path, false).await.unwrap());
    let app = init_app!(app_state(store, Arc::new(RecordingNotifier::default())));

    let req = test::TestRequest::post()
        .uri("/api/v1/call-doctor")
        .set_json(json!({ "lat": -20.165, "lng": 57.501 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_unreachable_store() {
    let app = init_app!(app_state(
        Arc::new(UnreachableStore),
        Arc::new(RecordingNotifier::default())
    ));

    let req = test::TestRequest::post()
        .uri("/api/v1/call-doctor")
        .set_json(json!({ "lat": -20.165, "lng": 57.501 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["store"], "unreachable");
}

#[actix_web::test]
async fn test_malformed_json_body() {
    let dir = tempfile::tempdir().unwrap();
    let app = init_app!(app_state(
        seeded_store(&dir).await,
        Arc::new(RecordingNotifier::default())
    ));

    let req = test::TestRequest::post()
        .uri("/api/v1/call-doctor")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_json");
}

#[actix_web::test]
async fn test_doctor_registration_and_call_report() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store(&dir).await;
    let app = init_app!(app_state(store, Arc::new(RecordingNotifier::default())));

    let req = test::TestRequest::post()
        .uri("/api/v1/doctors")
        .set_json(json!({
            "name": "Dr. Port Louis",
            "email": "pl@example.com",
            "phone": "+230 200 0000",
            "specialty": "Emergency Medicine",
            "location": { "lat": -20.166, "lng": 57.502 }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["id"], "6");

    // The new doctor is now the nearest one to Port Louis
    let req = test::TestRequest::post()
        .uri("/api/v1/call-doctor")
        .set_json(json!({ "lat": -20.165, "lng": 57.501, "mode": "direct" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["doctors"][0]["id"], "6");

    let req = test::TestRequest::patch()
        .uri("/api/v1/doctors")
        .set_json(json!({ "doctorId": "6", "logIndex": 0, "report": "Patient stabilised" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["callLogs"][0]["report"], "Patient stabilised");

    let req = test::TestRequest::patch()
        .uri("/api/v1/doctors")
        .set_json(json!({ "doctorId": "6", "logIndex": 3, "report": "late" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get().uri("/api/v1/doctors/404").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_doctor_registration_validation() {
    let dir = tempfile::tempdir().unwrap();
    let app = init_app!(app_state(
        seeded_store(&dir).await,
        Arc::new(RecordingNotifier::default())
    ));

    let req = test::TestRequest::post()
        .uri("/api/v1/doctors")
        .set_json(json!({ "name": "", "email": "nope", "phone": "1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_patient_favourites() {
    let dir = tempfile::tempdir().unwrap();
    let app = init_app!(app_state(
        seeded_store(&dir).await,
        Arc::new(RecordingNotifier::default())
    ));

    let req = test::TestRequest::post()
        .uri("/api/v1/patients")
        .set_json(json!({ "name": "Ana Perrine", "email": "ana@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let patient: Value = test::read_body_json(resp).await;
    assert_eq!(patient["id"], "2");

    let req = test::TestRequest::patch()
        .uri("/api/v1/patients")
        .set_json(json!({ "patientId": 2, "favoriteDoctorIds": [5, "1"] }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["favoriteDoctorIds"], json!(["5", "1"]));

    let req = test::TestRequest::get().uri("/api/v1/patients").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn test_booking_flow() {
    let dir = tempfile::tempdir().unwrap();
    let notifier = Arc::new(RecordingNotifier::default());
    let app = init_app!(app_state(seeded_store(&dir).await, notifier.clone()));

    let req = test::TestRequest::post()
        .uri("/api/v1/appointments")
        .set_json(json!({ "doctorId": 5, "patientId": "1", "date": "2025-03-14", "time": "09:30" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let appointment: Value = test::read_body_json(resp).await;
    assert_eq!(appointment["status"], "pending");
    let id = appointment["id"].as_str().unwrap().to_string();

    let messages = notifier.wait_for(1).await;
    assert!(messages[0].contains("Patient: John Smith"));
    assert!(messages[0].contains("Doctor: Dr. Sahil Jeebun"));

    let req = test::TestRequest::get()
        .uri("/api/v1/appointments?doctorId=5")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let req = test::TestRequest::get()
        .uri("/api/v1/appointments?doctorId=1")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body.as_array().unwrap().is_empty());

    let req = test::TestRequest::patch()
        .uri("/api/v1/appointments")
        .set_json(json!({ "appointmentId": id, "report": "Follow up in two weeks" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["report"], "Follow up in two weeks");

    let req = test::TestRequest::get().uri("/api/v1/admin/summary").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["doctors"], 4);
    assert_eq!(body["locatedDoctors"], 4);
    assert_eq!(body["patients"], 1);
    assert_eq!(body["appointments"], 1);
    assert_eq!(body["appointmentsByStatus"]["pending"], 1);
}

#[actix_web::test]
async fn test_booking_reply_does_not_wait_for_alert_lookups() {
    let dir = tempfile::tempdir().unwrap();
    let inner = JsonFileStore::open(dir.path().join("data.json"), true)
        .await
        .unwrap();
    let store = Arc::new(SlowLookupStore {
        inner,
        delay: Duration::from_millis(1500),
    });
    let notifier = Arc::new(RecordingNotifier::default());
    let app = init_app!(app_state(store, notifier.clone()));

    let req = test::TestRequest::post()
        .uri("/api/v1/appointments")
        .set_json(json!({ "doctorId": "5", "patientId": "1", "date": "2025-03-14", "time": "09:30" }))
        .to_request();
    let resp = tokio::time::timeout(Duration::from_millis(1000), test::call_service(&app, req))
        .await
        .expect("booking reply waited for the alert lookups");
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert!(notifier.messages().is_empty());

    let messages = notifier.wait_for(1).await;
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Patient: John Smith"));
}

#[actix_web::test]
async fn test_doctor_location_must_be_in_range() {
    let dir = tempfile::tempdir().unwrap();
    let app = init_app!(app_state(
        seeded_store(&dir).await,
        Arc::new(RecordingNotifier::default())
    ));

    let req = test::TestRequest::post()
        .uri("/api/v1/doctors")
        .set_json(json!({
            "name": "Dr. Elsewhere",
            "email": "far@example.com",
            "phone": "+230 200 0001",
            "location": { "lat": 500.0, "lng": 57.5 }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get().uri("/api/v1/doctors").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.as_array().unwrap().len(), 4);
}

#[actix_web::test]
async fn test_health_check() {
    let dir = tempfile::tempdir().unwrap();
    let app = init_app!(app_state(
        seeded_store(&dir).await,
        Arc::new(RecordingNotifier::default())
    ));

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "file");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
