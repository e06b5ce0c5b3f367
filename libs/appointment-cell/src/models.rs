use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ==============================================================================
// CORE SLOT MODELS
// ==============================================================================

/// One bookable time for a regular appointment, as rendered to the user.
/// Selection is by position in the displayed list, so the exact list shown
/// must be kept verbatim in the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub time: String,
    #[serde(rename = "displayTime")]
    pub display_time: String,
    pub status: SlotStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Available,
    Unavailable,
}

impl Slot {
    pub fn is_available(&self) -> bool {
        self.status == SlotStatus::Available
    }
}

/// Morning/afternoon split as the backend serves it. The fallback provider
/// produces the identical shape, so callers cannot tell live from degraded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DaySlots {
    pub morning: Vec<Slot>,
    pub afternoon: Vec<Slot>,
}

impl DaySlots {
    pub fn is_empty(&self) -> bool {
        self.morning.is_empty() && self.afternoon.is_empty()
    }
}

// ==============================================================================
// WIRE MODELS  (GET /appointments/available/{date}, /appointments/reserved/{date})
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct AvailableSlotsResponse {
    pub success: bool,
    pub data: AvailableSlotsData,
}

#[derive(Debug, Deserialize)]
pub struct AvailableSlotsData {
    #[serde(rename = "displayDate")]
    pub display_date: String,
    pub available: DaySlots,
}

#[derive(Debug, Deserialize)]
pub struct ReservedSlotsResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Vec<String>,
}

// ==============================================================================
// BOOKING MODELS  (POST /appointments)
// ==============================================================================

/// Input to `BookingService::create_appointment`. Client-supplied name, date
/// and time are validated upstream by the conversation engine; the optional
/// fields get safe defaults at submit time.
#[derive(Debug, Clone, Default)]
pub struct AppointmentRequest {
    pub client_name: Option<String>,
    pub social_work: Option<String>,
    pub phone: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AppointmentResponse {
    pub success: bool,
    pub data: AppointmentConfirmation,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentConfirmation {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "clientName")]
    pub client_name: String,
    #[serde(rename = "socialWork")]
    pub social_work: String,
    pub phone: String,
    pub date: String,
    pub time: String,
    pub status: String,
}

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("No connection to the backend")]
    Offline,

    #[error("Backend rejected the appointment: {0}")]
    Rejected(String),
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotStatus::Available => write!(f, "available"),
            SlotStatus::Unavailable => write!(f, "unavailable"),
        }
    }
}
