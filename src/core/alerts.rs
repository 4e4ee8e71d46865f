use crate::models::{Appointment, Coordinate, RankedDoctor};

const UNKNOWN: &str = "Unknown";

/// Google Maps search link for a coordinate
pub fn maps_link(location: &Coordinate) -> String {
    format!(
        "https://www.google.com/maps/search/?api=1&query={},{}",
        urlencoding::encode(&location.lat.to_string()),
        urlencoding::encode(&location.lng.to_string()),
    )
}

fn or_unknown(value: Option<&str>) -> &str {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => UNKNOWN,
    }
}

/// Alert text posted when a patient places an emergency call
pub fn emergency_message(
    caller_name: Option<&str>,
    caller_phone: Option<&str>,
    location: &Coordinate,
    doctors: &[RankedDoctor],
) -> String {
    let nearest = doctors
        .iter()
        .map(|d| format!("- {} ({:.2} km away)", d.doctor.name, d.distance_km))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "\u{1F6A8} EMERGENCY CALL: Patient needs immediate medical assistance!\n\n\
         Name: {}\n\
         Phone: {}\n\
         Location: {}, {}\n\
         Map: {}\n\n\
         Nearest Doctors:\n{}\n\n\
         Please respond urgently to this emergency call.",
        or_unknown(caller_name),
        or_unknown(caller_phone),
        location.lat,
        location.lng,
        maps_link(location),
        nearest,
    )
}

/// Alert text posted when an appointment is booked
pub fn booking_message(
    appointment: &Appointment,
    patient_name: Option<&str>,
    doctor_name: Option<&str>,
) -> String {
    format!(
        "New appointment booked!\nPatient: {}\nDoctor: {}\nDate: {}\nTime: {}\nStatus: {}",
        or_unknown(patient_name),
        or_unknown(doctor_name),
        appointment.date,
        appointment.time,
        appointment.status,
    )
}
