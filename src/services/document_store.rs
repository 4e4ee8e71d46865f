use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::models::{Appointment, CallLog, Doctor, Patient};
use crate::services::store::{
    AppointmentStore, CallLogWriter, DoctorStore, NewAppointment, NewDoctor, NewPatient,
    PatientStore, Store, StoreError,
};

/// Collection IDs in the document database
#[derive(Debug, Clone)]
pub struct DocumentCollections {
    pub doctors: String,
    pub patients: String,
    pub appointments: String,
}

impl Default for DocumentCollections {
    fn default() -> Self {
        Self {
            doctors: "doctors".to_string(),
            patients: "patients".to_string(),
            appointments: "appointments".to_string(),
        }
    }
}

/// Store backed by an Appwrite-compatible document database
///
/// Talks to the REST API under `/databases/{database}/collections/{collection}/documents`.
/// Document IDs (`$id`) become record IDs; record attributes are read either
/// from a nested `data` object or from the top level of each document.
///
/// Call logs live inside the doctor document, so appending one is a
/// read-modify-write. Those cycles are serialised per doctor within this
/// process; writers in other processes are not coordinated.
pub struct DocumentStore {
    base_url: String,
    api_key: String,
    project_id: String,
    database_id: String,
    page_size: u32,
    client: Client,
    collections: DocumentCollections,
    doctor_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl DocumentStore {
    /// Create a new document store client
    pub fn new(
        base_url: String,
        api_key: String,
        project_id: String,
        database_id: String,
        collections: DocumentCollections,
        page_size: u32,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            api_key,
            project_id,
            database_id,
            page_size: page_size.max(1),
            client,
            collections,
            doctor_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Lock guarding read-modify-write cycles on one doctor document
    async fn doctor_lock(&self, doctor_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.doctor_locks.lock().await;
        locks.entry(doctor_id.to_string()).or_default().clone()
    }

    fn documents_url(&self, collection: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.base_url.trim_end_matches('/'),
            self.database_id,
            collection
        )
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.documents_url(collection), urlencoding::encode(id))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
    }

    async fn check(response: reqwest::Response, action: &str) -> Result<Value, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Document API failed to {}: {} - {}", action, status, body);
            return Err(StoreError::Api(format!("Failed to {}: {}", action, status)));
        }
        Ok(response.json().await?)
    }

    /// List every document in a collection, skipping ones that do not parse
    ///
    /// Pages through the collection with `limit`/`offset` queries until a
    /// short page arrives or the reported `total` is reached.
    async fn list_documents<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>, StoreError> {
        let page_size = u64::from(self.page_size);
        let limit = json!({ "method": "limit", "values": [page_size] }).to_string();

        let mut records: Vec<T> = Vec::new();
        let mut offset: u64 = 0;

        loop {
            let offset_query = json!({ "method": "offset", "values": [offset] }).to_string();
            let url = format!(
                "{}?queries[]={}&queries[]={}",
                self.documents_url(collection),
                urlencoding::encode(&limit),
                urlencoding::encode(&offset_query)
            );

            tracing::debug!("Listing documents from: {}", url);

            let response = self.authorized(self.client.get(&url)).send().await?;
            let json = Self::check(response, &format!("list {}", collection)).await?;

            let total = json.get("total").and_then(|t| t.as_u64());

            let documents = json
                .get("documents")
                .and_then(|d| d.as_array())
                .ok_or_else(|| StoreError::InvalidResponse("Missing documents array".into()))?;

            records.extend(documents.iter().filter_map(|doc| match parse_document(doc) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("Skipping unreadable document in {}: {}", collection, e);
                    None
                }
            }));

            let fetched = documents.len() as u64;
            offset += fetched;

            let exhausted = fetched < page_size || total.is_some_and(|t| offset >= t);
            if exhausted {
                break;
            }
        }

        tracing::debug!("Fetched {} documents from {}", records.len(), collection);
        Ok(records)
    }

    async fn get_document<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>, StoreError> {
        let url = self.document_url(collection, id);
        let response = self.authorized(self.client.get(&url)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let json = Self::check(response, &format!("fetch {} document", collection)).await?;
        parse_document(&json).map(Some)
    }

    async fn create_document<T, R>(&self, collection: &str, record: &R) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
        R: Serialize + Sync,
    {
        let payload = json!({
            "documentId": uuid::Uuid::new_v4().simple().to_string(),
            "data": attributes(record)?,
        });

        let response = self
            .authorized(self.client.post(self.documents_url(collection)))
            .json(&payload)
            .send()
            .await?;

        let json = Self::check(response, &format!("create {} document", collection)).await?;
        parse_document(&json)
    }

    async fn update_document<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> Result<Option<T>, StoreError> {
        let response = self
            .authorized(self.client.patch(self.document_url(collection, id)))
            .json(&json!({ "data": data }))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let json = Self::check(response, &format!("update {} document", collection)).await?;
        parse_document(&json).map(Some)
    }
}

/// Record attributes for a write, without the identifier the database owns
fn attributes<R: Serialize>(record: &R) -> Result<Value, StoreError> {
    let mut value = serde_json::to_value(record)?;
    if let Some(obj) = value.as_object_mut() {
        obj.remove("id");
    }
    Ok(value)
}

/// Turn a stored document into a record
fn parse_document<T: DeserializeOwned>(doc: &Value) -> Result<T, StoreError> {
    let mut data: Map<String, Value> = doc
        .get("data")
        .unwrap_or(doc)
        .as_object()
        .cloned()
        .ok_or_else(|| StoreError::InvalidResponse("Document is not an object".into()))?;

    if let Some(id) = doc.get("$id").cloned() {
        data.insert("id".to_string(), id);
    }
    data.retain(|key, _| !key.starts_with('$'));

    serde_json::from_value(Value::Object(data))
        .map_err(|e| StoreError::InvalidResponse(format!("Failed to parse document: {}", e)))
}

#[async_trait]
impl DoctorStore for DocumentStore {
    async fn list_doctors(&self) -> Result<Vec<Doctor>, StoreError> {
        self.list_documents(&self.collections.doctors).await
    }

    async fn get_doctor(&self, id: &str) -> Result<Option<Doctor>, StoreError> {
        self.get_document(&self.collections.doctors, id).await
    }

    async fn add_doctor(&self, doctor: NewDoctor) -> Result<Doctor, StoreError> {
        let record = doctor.with_id(String::new());
        self.create_document(&self.collections.doctors, &record).await
    }

    async fn update_call_report(
        &self,
        doctor_id: &str,
        log_index: usize,
        report: &str,
    ) -> Result<Option<Doctor>, StoreError> {
        let lock = self.doctor_lock(doctor_id).await;
        let _guard = lock.lock().await;

        let Some(mut doctor) = self.get_doctor(doctor_id).await? else {
            return Ok(None);
        };
        let Some(log) = doctor.call_logs.get_mut(log_index) else {
            return Ok(None);
        };
        log.report = Some(report.to_string());

        let data = json!({ "callLogs": doctor.call_logs });
        self.update_document(&self.collections.doctors, doctor_id, data)
            .await
    }
}

#[async_trait]
impl CallLogWriter for DocumentStore {
    async fn record_call(&self, doctor_id: &str, log: CallLog) -> Result<(), StoreError> {
        let lock = self.doctor_lock(doctor_id).await;
        let _guard = lock.lock().await;

        let mut doctor = self
            .get_doctor(doctor_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("doctor {}", doctor_id)))?;

        doctor.call_logs.push(log);
        let data = json!({ "callLogs": doctor.call_logs });

        self.update_document::<Doctor>(&self.collections.doctors, doctor_id, data)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("doctor {}", doctor_id)))?;

        tracing::debug!("Recorded call log for doctor {}", doctor_id);
        Ok(())
    }
}

#[async_trait]
impl PatientStore for DocumentStore {
    async fn list_patients(&self) -> Result<Vec<Patient>, StoreError> {
        self.list_documents(&self.collections.patients).await
    }

    async fn get_patient(&self, id: &str) -> Result<Option<Patient>, StoreError> {
        self.get_document(&self.collections.patients, id).await
    }

    async fn add_patient(&self, patient: NewPatient) -> Result<Patient, StoreError> {
        let record = patient.with_id(String::new());
        self.create_document(&self.collections.patients, &record).await
    }

    async fn update_favorites(
        &self,
        patient_id: &str,
        favorite_doctor_ids: Vec<String>,
    ) -> Result<Option<Patient>, StoreError> {
        let data = json!({ "favoriteDoctorIds": favorite_doctor_ids });
        self.update_document(&self.collections.patients, patient_id, data)
            .await
    }
}

#[async_trait]
impl AppointmentStore for DocumentStore {
    async fn list_appointments(&self) -> Result<Vec<Appointment>, StoreError> {
        self.list_documents(&self.collections.appointments).await
    }

    async fn add_appointment(&self, appointment: NewAppointment) -> Result<Appointment, StoreError> {
        let record = appointment.with_id(String::new());
        self.create_document(&self.collections.appointments, &record)
            .await
    }

    async fn update_appointment_report(
        &self,
        appointment_id: &str,
        report: &str,
    ) -> Result<Option<Appointment>, StoreError> {
        let data = json!({ "report": report });
        self.update_document(&self.collections.appointments, appointment_id, data)
            .await
    }
}

#[async_trait]
impl Store for DocumentStore {
    fn backend(&self) -> &'static str {
        "document"
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        let url = format!(
            "{}/databases/{}/collections/{}",
            self.base_url.trim_end_matches('/'),
            self.database_id,
            self.collections.doctors
        );
        let response = self.authorized(self.client.get(&url)).send().await?;
        Ok(response.status().is_success())
    }
}
