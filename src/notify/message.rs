//! Alert message formatting
//!
//! User-facing text is Persian, matching the audience of the booking
//! provider. Slot times are rendered in Iran standard time (fixed +03:30,
//! the country abolished DST in 2022).

use chrono::{DateTime, FixedOffset, Utc};

use crate::models::{AppointmentSlot, Doctor};

/// Iran standard time offset (+03:30)
fn irst() -> FixedOffset {
    FixedOffset::east_opt(3 * 3600 + 1800).expect("valid fixed offset")
}

/// Render a slot start for display
pub fn format_slot_time(slot: &AppointmentSlot) -> String {
    match slot.starts_at() {
        Some(ts) => ts
            .with_timezone(&irst())
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        None => "-".to_string(),
    }
}

/// Build the alert text for one doctor's discovery result
pub fn slot_alert(doctor: &Doctor, slots: &[AppointmentSlot], profile_base: &str) -> String {
    let mut lines = vec![
        "🔔 نوبت خالی پیدا شد!".to_string(),
        format!("👨‍⚕️ {}", doctor.name),
    ];

    if !doctor.specialty.is_empty() {
        lines.push(format!("🩺 {}", doctor.specialty));
    }

    lines.push(format!("📅 {} نوبت باز", slots.len()));

    if let Some(first) = slots.iter().min_by_key(|s| s.from_time) {
        lines.push(format!("⏰ اولین نوبت: {}", format_slot_time(first)));
    }

    lines.push(format!("🔗 {}", doctor.profile_url(profile_base)));

    lines.join("\n")
}

/// Timestamp used in audit log lines
pub fn cycle_stamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
