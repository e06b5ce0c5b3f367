//! Static slot list served when the backend cannot be reached. Deterministic
//! and infallible: no I/O, no clock, same shape as a live response.

use crate::models::{DaySlots, Slot, SlotStatus};

pub const FALLBACK_MORNING: [&str; 6] = ["09:00", "09:30", "10:00", "10:30", "11:00", "11:30"];

pub const FALLBACK_AFTERNOON: [&str; 8] = [
    "14:00", "14:30", "15:00", "15:30", "16:00", "16:30", "17:00", "17:30",
];

fn to_slots(times: &[&str]) -> Vec<Slot> {
    times
        .iter()
        .map(|time| Slot {
            time: (*time).to_string(),
            display_time: (*time).to_string(),
            status: SlotStatus::Available,
        })
        .collect()
}

pub fn fallback_slots() -> DaySlots {
    DaySlots {
        morning: to_slots(&FALLBACK_MORNING),
        afternoon: to_slots(&FALLBACK_AFTERNOON),
    }
}
