// Service exports
pub mod document_store;
pub mod file_store;
pub mod notifier;
pub mod store;

pub use document_store::{DocumentCollections, DocumentStore};
pub use file_store::{sample_dataset, JsonFileStore};
pub use notifier::{
    spawn_composed_notification, spawn_notification, DisabledNotifier, Notifier, NotifyError,
    SlackNotifier,
};
pub use store::{
    AppointmentStore, CallLogWriter, DoctorStore, NewAppointment, NewDoctor, NewPatient,
    PatientStore, Store, StoreError,
};

use std::sync::Arc;
use std::time::Duration;

use crate::config::{NotificationSettings, StorageBackend, StorageSettings};

/// Construct the configured store
///
/// The backend is fixed for the life of the process; an unreachable
/// document database is reported per request rather than replaced by
/// file data.
pub async fn build_store(settings: &StorageSettings) -> Result<Arc<dyn Store>, StoreError> {
    match settings.backend {
        StorageBackend::File => {
            let store =
                JsonFileStore::open(&settings.file.path, settings.file.seed_if_missing).await?;
            tracing::info!("Using JSON file store at {}", settings.file.path);
            Ok(Arc::new(store))
        }
        StorageBackend::Document => {
            let document = settings.document.as_ref().ok_or_else(|| {
                StoreError::Api("storage.document settings are required for the document backend".into())
            })?;

            let collections = DocumentCollections {
                doctors: document.collections.doctors.clone(),
                patients: document.collections.patients.clone(),
                appointments: document.collections.appointments.clone(),
            };

            let store = DocumentStore::new(
                document.endpoint.clone(),
                document.api_key.clone(),
                document.project_id.clone(),
                document.database_id.clone(),
                collections,
                document.page_size.unwrap_or(500),
                Duration::from_secs(document.timeout_secs.unwrap_or(30)),
            )?;
            tracing::info!("Using document store at {}", document.endpoint);
            Ok(Arc::new(store))
        }
    }
}

/// Construct the notifier, falling back to a disabled one when Slack is not configured
pub fn build_notifier(settings: &NotificationSettings) -> Result<Arc<dyn Notifier>, NotifyError> {
    let slack = &settings.slack;
    match slack.credentials() {
        Some((token, channel)) => {
            let notifier = SlackNotifier::new(
                slack.api_base.clone(),
                token.to_string(),
                channel.to_string(),
                Duration::from_secs(slack.timeout_secs.unwrap_or(10)),
            )?;
            tracing::info!("Slack notifications enabled for channel {}", notifier.channel());
            Ok(Arc::new(notifier))
        }
        None => {
            tracing::info!("Slack not configured - notifications disabled");
            Ok(Arc::new(DisabledNotifier))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FileStorageSettings, SlackSettings};

    #[tokio::test]
    async fn test_build_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let settings = StorageSettings {
            backend: StorageBackend::File,
            file: FileStorageSettings {
                path: dir.path().join("data.json").to_string_lossy().into_owned(),
                seed_if_missing: true,
            },
            document: None,
        };

        let store = build_store(&settings).await.unwrap();
        assert_eq!(store.backend(), "file");
        assert_eq!(store.list_doctors().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_document_backend_requires_settings() {
        let settings = StorageSettings {
            backend: StorageBackend::Document,
            ..Default::default()
        };
        assert!(build_store(&settings).await.is_err());
    }

    #[tokio::test]
    async fn test_notifier_selection() {
        let disabled = build_notifier(&NotificationSettings::default()).unwrap();
        assert!(!disabled.is_enabled());

        let settings = NotificationSettings {
            slack: SlackSettings {
                bot_token: Some("xoxb-test".to_string()),
                channel_id: Some("C123".to_string()),
                ..Default::default()
            },
        };
        let slack = build_notifier(&settings).unwrap();
        assert!(slack.is_enabled());
    }
}
