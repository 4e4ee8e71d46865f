// Core algorithm exports
pub mod alerts;
pub mod dispatcher;
pub mod distance;
pub mod nearest;

pub use alerts::{booking_message, emergency_message, maps_link};
pub use dispatcher::{
    CallMode, CollaboratorFailure, DispatchError, DispatchOutcome, EmergencyCall,
    EmergencyDispatcher,
};
pub use distance::haversine_distance;
pub use nearest::{NearestLocator, NoDoctorsAvailable, NEAREST_LIMIT};
