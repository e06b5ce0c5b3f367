use serde::{Deserialize, Serialize};
use thiserror::Error;

// ==============================================================================
// FIXED NUMBER <-> TIME TABLE
// ==============================================================================

/// The 10 sobreturno numbers and their wall-clock times: a morning block of
/// five and an afternoon block of five. This is configuration, not a rule to
/// derive; every number is permanently bound to its time.
pub const SOBRETURNO_TIMES: [(u8, &str); 10] = [
    (1, "11:00"),
    (2, "11:15"),
    (3, "11:30"),
    (4, "11:45"),
    (5, "12:00"),
    (6, "19:00"),
    (7, "19:15"),
    (8, "19:30"),
    (9, "19:45"),
    (10, "20:00"),
];

/// Numbers in the morning block; everything above is the afternoon block.
pub const MORNING_NUMBERS: std::ops::RangeInclusive<u8> = 1..=5;

pub fn time_for_number(number: u8) -> Option<&'static str> {
    SOBRETURNO_TIMES
        .iter()
        .find(|(n, _)| *n == number)
        .map(|(_, time)| *time)
}

/// Reverse lookup for backend records that arrive without an explicit
/// number. A record whose time is not in the table has no number.
pub fn number_for_time(time: &str) -> Option<u8> {
    SOBRETURNO_TIMES
        .iter()
        .find(|(_, t)| *t == time)
        .map(|(n, _)| *n)
}

// ==============================================================================
// DOMAIN MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SobreturnoStatus {
    Available,
    Pending,
    Confirmed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

/// A reservation record as the backend reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SobreturnoReservation {
    #[serde(default)]
    pub sobreturno_number: Option<u8>,
    pub time: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub status: Option<SobreturnoStatus>,
    #[serde(default)]
    pub is_sobreturno: Option<bool>,
}

impl SobreturnoReservation {
    /// Cancelled reservations free their slot; anything else holds it.
    pub fn blocks_slot(&self) -> bool {
        !matches!(self.status, Some(SobreturnoStatus::Cancelled))
    }
}

/// One entry of the availability view shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SobreturnoSlot {
    pub number: u8,
    pub time: String,
    pub available: bool,
}

/// Input to `SobreturnoService::create_sobreturno`.
#[derive(Debug, Clone)]
pub struct SobreturnoRequest {
    pub client_name: String,
    pub social_work: String,
    pub phone: String,
    pub date: String,
    pub sobreturno_number: u8,
    pub time: Option<String>,
    pub email: Option<String>,
}

// ==============================================================================
// WIRE MODELS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct ValidateResponse {
    pub available: bool,
}

/// The create endpoint answers either with the stored record (`_id`) or a
/// `{success: true}` envelope depending on the backend version.
#[derive(Debug, Deserialize)]
pub struct CreateSobreturnoResponse {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
}

impl CreateSobreturnoResponse {
    pub fn created(&self) -> bool {
        self.success == Some(true) || self.id.is_some()
    }
}

#[derive(Error, Debug)]
pub enum SobreturnoError {
    #[error("Sobreturno {number} is no longer available")]
    SlotTaken { number: u8 },

    #[error("No connection to the backend")]
    Offline,

    #[error("Backend rejected the sobreturno: {0}")]
    Rejected(String),
}
