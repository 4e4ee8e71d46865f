//! MyDoctor - appointment and emergency-dispatch service for MyDoctor.mu
//!
//! Patients book consultations with registered doctors, and in an
//! emergency the service ranks doctors by great-circle distance from the
//! caller, logs the call and alerts the on-call Slack channel.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{haversine_distance, EmergencyDispatcher, NearestLocator};
pub use models::{Coordinate, Doctor, RankedDoctor};
pub use routes::AppState;
pub use services::{build_notifier, build_store, Notifier, Store};
