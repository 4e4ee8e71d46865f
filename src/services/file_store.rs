use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::models::{Appointment, CallLog, Dataset, Doctor, Patient};
use crate::services::store::{
    next_numeric_id, AppointmentStore, CallLogWriter, DoctorStore, NewAppointment, NewDoctor,
    NewPatient, PatientStore, Store, StoreError,
};

const SAMPLE_DATA: &str = include_str!("../../data/sample.json");

/// Built-in records used to seed a fresh data file
pub fn sample_dataset() -> Result<Dataset, StoreError> {
    Ok(serde_json::from_str(SAMPLE_DATA)?)
}

/// Store backed by a single JSON file
///
/// Every operation reads the whole file. Mutations hold `write_lock` for the
/// full read-modify-write cycle and replace the file atomically, so readers
/// never observe a half-written dataset.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open the data file, creating it from sample data if allowed
    pub async fn open<P: AsRef<Path>>(path: P, seed_if_missing: bool) -> Result<Self, StoreError> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        };

        if !tokio::fs::try_exists(&store.path).await? {
            let initial = if seed_if_missing {
                tracing::info!("Seeding data file {} with sample records", store.path.display());
                sample_dataset()?
            } else {
                tracing::info!("Creating empty data file {}", store.path.display());
                Dataset::default()
            };
            store.write(&initial).await?;
        }

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Dataset, StoreError> {
        let bytes = tokio::fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn write(&self, data: &Dataset) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(data)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Run `f` against the current dataset and persist the result
    async fn update<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Dataset) -> Result<T, StoreError> + Send,
        T: Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut data = self.read().await?;
        let out = f(&mut data)?;
        self.write(&data).await?;
        Ok(out)
    }
}

#[async_trait]
impl DoctorStore for JsonFileStore {
    async fn list_doctors(&self) -> Result<Vec<Doctor>, StoreError> {
        Ok(self.read().await?.doctors)
    }

    async fn get_doctor(&self, id: &str) -> Result<Option<Doctor>, StoreError> {
        Ok(self.read().await?.doctors.into_iter().find(|d| d.id == id))
    }

    async fn add_doctor(&self, doctor: NewDoctor) -> Result<Doctor, StoreError> {
        let doctor = self
            .update(|data| {
                let id = next_numeric_id(data.doctors.iter().map(|d| d.id.as_str()));
                let doctor = doctor.with_id(id);
                data.doctors.push(doctor.clone());
                Ok(doctor)
            })
            .await?;

        tracing::debug!("Added doctor {} ({})", doctor.id, doctor.name);
        Ok(doctor)
    }

    async fn update_call_report(
        &self,
        doctor_id: &str,
        log_index: usize,
        report: &str,
    ) -> Result<Option<Doctor>, StoreError> {
        self.update(|data| {
            let Some(doctor) = data.doctors.iter_mut().find(|d| d.id == doctor_id) else {
                return Ok(None);
            };
            let Some(log) = doctor.call_logs.get_mut(log_index) else {
                return Ok(None);
            };
            log.report = Some(report.to_string());
            Ok(Some(doctor.clone()))
        })
        .await
    }
}

#[async_trait]
impl CallLogWriter for JsonFileStore {
    async fn record_call(&self, doctor_id: &str, log: CallLog) -> Result<(), StoreError> {
        self.update(|data| {
            let doctor = data
                .doctors
                .iter_mut()
                .find(|d| d.id == doctor_id)
                .ok_or_else(|| StoreError::NotFound(format!("doctor {}", doctor_id)))?;
            doctor.call_logs.push(log);
            Ok(())
        })
        .await?;

        tracing::debug!("Recorded call log for doctor {}", doctor_id);
        Ok(())
    }
}

#[async_trait]
impl PatientStore for JsonFileStore {
    async fn list_patients(&self) -> Result<Vec<Patient>, StoreError> {
        Ok(self.read().await?.patients)
    }

    async fn get_patient(&self, id: &str) -> Result<Option<Patient>, StoreError> {
        Ok(self.read().await?.patients.into_iter().find(|p| p.id == id))
    }

    async fn add_patient(&self, patient: NewPatient) -> Result<Patient, StoreError> {
        self.update(|data| {
            let id = next_numeric_id(data.patients.iter().map(|p| p.id.as_str()));
            let patient = patient.with_id(id);
            data.patients.push(patient.clone());
            Ok(patient)
        })
        .await
    }

    async fn update_favorites(
        &self,
        patient_id: &str,
        favorite_doctor_ids: Vec<String>,
    ) -> Result<Option<Patient>, StoreError> {
        self.update(|data| {
            Ok(data
                .patients
                .iter_mut()
                .find(|p| p.id == patient_id)
                .map(|patient| {
                    patient.favorite_doctor_ids = favorite_doctor_ids;
                    patient.clone()
                }))
        })
        .await
    }
}

#[async_trait]
impl AppointmentStore for JsonFileStore {
    async fn list_appointments(&self) -> Result<Vec<Appointment>, StoreError> {
        Ok(self.read().await?.appointments)
    }

    async fn add_appointment(&self, appointment: NewAppointment) -> Result<Appointment, StoreError> {
        self.update(|data| {
            let id = next_numeric_id(data.appointments.iter().map(|a| a.id.as_str()));
            let appointment = appointment.with_id(id);
            data.appointments.push(appointment.clone());
            Ok(appointment)
        })
        .await
    }

    async fn update_appointment_report(
        &self,
        appointment_id: &str,
        report: &str,
    ) -> Result<Option<Appointment>, StoreError> {
        self.update(|data| {
            Ok(data
                .appointments
                .iter_mut()
                .find(|a| a.id == appointment_id)
                .map(|appointment| {
                    appointment.report = Some(report.to_string());
                    appointment.clone()
                }))
        })
        .await
    }
}

#[async_trait]
impl Store for JsonFileStore {
    fn backend(&self) -> &'static str {
        "file"
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        self.read().await.map(|_| true)
    }
}
