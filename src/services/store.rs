use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    Appointment, AppointmentStatus, CallLog, CreateAppointmentRequest, CreateDoctorRequest,
    CreatePatientRequest, Doctor, GeoPoint, Patient,
};

/// Errors that can occur when reading or writing records
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    Api(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Fields of a doctor before the store assigns an identifier
#[derive(Debug, Clone, Default)]
pub struct NewDoctor {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub license_number: String,
    pub specialty: String,
    pub experience: Option<u32>,
    pub clinic_address: String,
    pub available_hours: String,
    pub location: Option<GeoPoint>,
}

impl NewDoctor {
    pub fn with_id(self, id: String) -> Doctor {
        Doctor {
            id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            license_number: self.license_number,
            specialty: self.specialty,
            experience: self.experience,
            clinic_address: self.clinic_address,
            available_hours: self.available_hours,
            location: self.location,
            lat: None,
            lng: None,
            call_logs: Vec::new(),
        }
    }
}

impl From<CreateDoctorRequest> for NewDoctor {
    fn from(req: CreateDoctorRequest) -> Self {
        let location = req.location_point();
        Self {
            name: req.name,
            email: req.email,
            phone: req.phone,
            license_number: req.license_number,
            specialty: req.specialty,
            experience: req.experience,
            clinic_address: req.clinic_address,
            available_hours: req.available_hours,
            location,
        }
    }
}

/// Fields of a patient before the store assigns an identifier
#[derive(Debug, Clone, Default)]
pub struct NewPatient {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub favorite_doctor_ids: Vec<String>,
}

impl NewPatient {
    pub fn with_id(self, id: String) -> Patient {
        Patient {
            id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            address: self.address,
            favorite_doctor_ids: self.favorite_doctor_ids,
        }
    }
}

impl From<CreatePatientRequest> for NewPatient {
    fn from(req: CreatePatientRequest) -> Self {
        Self {
            name: req.name,
            email: req.email,
            phone: req.phone,
            address: req.address,
            favorite_doctor_ids: req.favorite_doctor_ids,
        }
    }
}

/// Fields of an appointment before the store assigns an identifier
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub doctor_id: String,
    pub patient_id: String,
    pub date: String,
    pub time: String,
    pub status: AppointmentStatus,
}

impl NewAppointment {
    pub fn with_id(self, id: String) -> Appointment {
        Appointment {
            id,
            doctor_id: self.doctor_id,
            patient_id: self.patient_id,
            date: self.date,
            time: self.time,
            status: self.status,
            report: None,
        }
    }
}

impl From<CreateAppointmentRequest> for NewAppointment {
    fn from(req: CreateAppointmentRequest) -> Self {
        Self {
            doctor_id: req.doctor_id,
            patient_id: req.patient_id,
            date: req.date,
            time: req.time,
            status: req.status,
        }
    }
}

/// Read and register doctors
#[async_trait]
pub trait DoctorStore: Send + Sync {
    async fn list_doctors(&self) -> Result<Vec<Doctor>, StoreError>;

    async fn get_doctor(&self, id: &str) -> Result<Option<Doctor>, StoreError>;

    async fn add_doctor(&self, doctor: NewDoctor) -> Result<Doctor, StoreError>;

    /// Attach a report to the call log at `log_index`
    ///
    /// Returns `None` when the doctor or the log entry does not exist.
    async fn update_call_report(
        &self,
        doctor_id: &str,
        log_index: usize,
        report: &str,
    ) -> Result<Option<Doctor>, StoreError>;
}

/// Append emergency call events to a doctor's history
#[async_trait]
pub trait CallLogWriter: Send + Sync {
    /// Fails with `StoreError::NotFound` when the doctor is unknown
    async fn record_call(&self, doctor_id: &str, log: CallLog) -> Result<(), StoreError>;
}

#[async_trait]
pub trait PatientStore: Send + Sync {
    async fn list_patients(&self) -> Result<Vec<Patient>, StoreError>;

    async fn get_patient(&self, id: &str) -> Result<Option<Patient>, StoreError>;

    async fn add_patient(&self, patient: NewPatient) -> Result<Patient, StoreError>;

    async fn update_favorites(
        &self,
        patient_id: &str,
        favorite_doctor_ids: Vec<String>,
    ) -> Result<Option<Patient>, StoreError>;
}

#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn list_appointments(&self) -> Result<Vec<Appointment>, StoreError>;

    async fn add_appointment(&self, appointment: NewAppointment) -> Result<Appointment, StoreError>;

    async fn update_appointment_report(
        &self,
        appointment_id: &str,
        report: &str,
    ) -> Result<Option<Appointment>, StoreError>;
}

/// Complete persistence backend, chosen once at startup
#[async_trait]
pub trait Store: DoctorStore + CallLogWriter + PatientStore + AppointmentStore {
    /// Short backend name for health output and logs
    fn backend(&self) -> &'static str;

    async fn health_check(&self) -> Result<bool, StoreError>;
}

/// Next identifier after the largest numeric one in `ids`
pub(crate) fn next_numeric_id<'a>(ids: impl Iterator<Item = &'a str>) -> String {
    let max = ids.filter_map(|id| id.parse::<u64>().ok()).max().unwrap_or(0);
    (max + 1).to_string()
}
