use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::core::alerts::emergency_message;
use crate::core::nearest::{NearestLocator, NoDoctorsAvailable};
use crate::models::{CallDoctorRequest, CallLog, Coordinate, CoordinateError, RankedDoctor};
use crate::services::{
    spawn_notification, CallLogWriter, DoctorStore, Notifier, NotifyError, StoreError,
};

/// Terminal failures of an emergency call
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Invalid caller location: {0}")]
    InvalidInput(#[from] CoordinateError),

    #[error("No nearest doctors found")]
    NotFound,

    #[error("Doctor directory unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl From<NoDoctorsAvailable> for DispatchError {
    fn from(_: NoDoctorsAvailable) -> Self {
        DispatchError::NotFound
    }
}

/// Side effect that failed without failing the call
///
/// Alert delivery is not listed here: it finishes after the reply and its
/// outcome is logged by the delivery task.
#[derive(Debug, Error)]
pub enum CollaboratorFailure {
    #[error("call log was not recorded: {0}")]
    CallLog(#[source] StoreError),
}

/// How the caller wants the alert handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CallMode {
    /// Notify the on-call channel
    #[default]
    Broadcast,
    /// Caller phones the doctor directly; no channel alert
    Direct,
}

impl CallMode {
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some("direct") => CallMode::Direct,
            _ => CallMode::Broadcast,
        }
    }
}

/// Incoming emergency call before validation
#[derive(Debug, Clone, Default)]
pub struct EmergencyCall {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub caller_name: Option<String>,
    pub caller_phone: Option<String>,
    pub mode: CallMode,
}

impl From<CallDoctorRequest> for EmergencyCall {
    fn from(req: CallDoctorRequest) -> Self {
        Self {
            lat: req.lat,
            lng: req.lng,
            mode: CallMode::from_flag(req.mode.as_deref()),
            caller_name: req.name,
            caller_phone: req.phone,
        }
    }
}

/// Result of a dispatched call
#[derive(Debug)]
pub struct DispatchOutcome {
    /// Nearest doctors, closest first
    pub doctors: Vec<RankedDoctor>,
    /// Whether the call log reached the store
    pub call_logged: bool,
    /// Non-fatal failures, e.g. the call log could not be written
    pub warnings: Vec<CollaboratorFailure>,
    /// Background alert delivery, if one was started
    pub notification: Option<JoinHandle<Result<(), NotifyError>>>,
}

/// Routes an emergency call to the nearest doctors
///
/// Validates the caller location, ranks the doctor directory, logs the
/// call against the closest doctor and alerts the notification channel.
/// Only invalid input, an empty ranking, or an unreadable directory fail
/// the call; logging and alerting are best-effort.
#[derive(Clone)]
pub struct EmergencyDispatcher {
    locator: NearestLocator,
    notifier: Arc<dyn Notifier>,
}

impl EmergencyDispatcher {
    pub fn new(locator: NearestLocator, notifier: Arc<dyn Notifier>) -> Self {
        Self { locator, notifier }
    }

    pub async fn dispatch<S>(
        &self,
        store: &S,
        call: EmergencyCall,
    ) -> Result<DispatchOutcome, DispatchError>
    where
        S: DoctorStore + CallLogWriter + ?Sized,
    {
        let caller = Coordinate::from_parts(call.lat, call.lng)?;

        let doctors = store.list_doctors().await?;
        tracing::debug!(
            "Ranking {} doctors for caller at {}, {}",
            doctors.len(),
            caller.lat,
            caller.lng
        );

        let ranked = self.locator.find_nearest(&caller, doctors)?;

        let mut warnings = Vec::new();

        let selected = &ranked[0].doctor;
        tracing::info!(
            "Selected doctor {} ({}) at {:.2} km",
            selected.id,
            selected.name,
            ranked[0].distance_km
        );

        let log = CallLog {
            timestamp: chrono::Utc::now().to_rfc3339(),
            caller_name: call.caller_name.clone(),
            caller_phone: call.caller_phone.clone(),
            location: Some(caller),
            report: None,
        };

        let call_logged = match store.record_call(&selected.id, log).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to save call log for doctor {}: {}", selected.id, e);
                warnings.push(CollaboratorFailure::CallLog(e));
                false
            }
        };

        let notification = if call.mode == CallMode::Direct {
            tracing::debug!("Direct call - skipping channel alert");
            None
        } else if !self.notifier.is_enabled() {
            tracing::debug!("Notifier disabled - skipping channel alert");
            None
        } else {
            let message = emergency_message(
                call.caller_name.as_deref(),
                call.caller_phone.as_deref(),
                &caller,
                &ranked,
            );
            Some(spawn_notification(self.notifier.clone(), message))
        };

        Ok(DispatchOutcome {
            doctors: ranked,
            call_logged,
            warnings,
            notification,
        })
    }
}
