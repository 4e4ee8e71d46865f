// Model exports
pub mod domain;
pub mod lenient;
pub mod requests;
pub mod responses;

pub use domain::{
    Appointment, AppointmentStatus, CallLog, Coordinate, CoordinateError, Dataset, Doctor,
    GeoPoint, Patient, RankedDoctor,
};
pub use requests::{
    AppointmentQuery, CallDoctorRequest, CreateAppointmentRequest, CreateDoctorRequest,
    CreatePatientRequest, UpdateAppointmentReportRequest, UpdateCallReportRequest,
    UpdateFavoritesRequest,
};
pub use responses::{AdminSummary, CallDoctorResponse, ErrorResponse, HealthResponse};
