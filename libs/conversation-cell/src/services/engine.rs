use std::sync::Arc;
use std::sync::OnceLock;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Timelike, Utc, Weekday};
use regex::Regex;
use tracing::{info, warn};

use appointment_cell::models::{AppointmentRequest, BookingError, DaySlots, Slot};
use appointment_cell::{AvailabilityService, BookingService};
use shared_config::AppConfig;
use sobreturno_cell::{SobreturnoError, SobreturnoRequest, SobreturnoService, SobreturnoSlot};

use crate::messages;
use crate::models::{ConversationSession, ConversationState, FlowKind};
use crate::services::session::SessionStore;

const GREETING_KEYWORDS: &[&str] = &[
    "hi",
    "hello",
    "hola",
    "buenas",
    "hola doctor",
    "doctor",
    "buenos días",
    "buenas tardes",
    "buenas noches",
    "ola",
    "ole",
    "turno",
    "turnos",
    "horarios",
];
const SOBRETURNO_KEYWORDS: &[&str] = &["sobreturno", "sobreturnos"];
const GOODBYE_KEYWORDS: &[&str] = &["bye", "adiós", "adios", "chao", "chau"];

/// Drives one chat turn at a time: reads the caller's session, applies the
/// state machine, talks to the scheduling services, and answers with the
/// outbound texts. Terminal turns clear the session before returning.
pub struct ConversationEngine {
    availability: Arc<AvailabilityService>,
    booking: Arc<BookingService>,
    sobreturnos: Arc<SobreturnoService>,
    sessions: Arc<dyn SessionStore>,
    tz_offset: FixedOffset,
    admin_number: String,
    now_override: Option<DateTime<FixedOffset>>,
}

impl ConversationEngine {
    pub fn new(
        config: &AppConfig,
        availability: Arc<AvailabilityService>,
        booking: Arc<BookingService>,
        sobreturnos: Arc<SobreturnoService>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        let tz_offset = FixedOffset::east_opt(config.timezone_offset_hours * 3600)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"));

        Self {
            availability,
            booking,
            sobreturnos,
            sessions,
            tz_offset,
            admin_number: config.admin_number.clone(),
            now_override: None,
        }
    }

    /// Pins the engine's clock so scheduling decisions are deterministic.
    pub fn with_fixed_now(mut self, now: DateTime<FixedOffset>) -> Self {
        self.now_override = Some(now);
        self
    }

    fn now(&self) -> DateTime<FixedOffset> {
        self.now_override
            .unwrap_or_else(|| Utc::now().with_timezone(&self.tz_offset))
    }

    fn is_admin(&self, from: &str) -> bool {
        !self.admin_number.is_empty() && from == self.admin_number
    }

    pub async fn handle_message(&self, from: &str, body: &str) -> Vec<String> {
        let input = body.trim();
        let normalized = input.to_lowercase();

        if self.is_admin(from) && normalized.starts_with('!') {
            return self.handle_admin(&normalized).await;
        }

        match self.sessions.get(from).await {
            Some(session) => self.advance(from, session, input, &normalized).await,
            None => self.start(from, &normalized).await,
        }
    }

    async fn start(&self, from: &str, normalized: &str) -> Vec<String> {
        if GOODBYE_KEYWORDS.contains(&normalized) {
            return vec![messages::farewell()];
        }

        if SOBRETURNO_KEYWORDS.contains(&normalized) {
            info!("Starting sobreturno flow for {}", from);
            self.sessions
                .update(from, ConversationSession::new(FlowKind::Sobreturno))
                .await;
            return vec![messages::sobreturno_intro(), messages::name_prompt()];
        }

        if GREETING_KEYWORDS.contains(&normalized) {
            info!("Starting turnos flow for {}", from);
            self.sessions
                .update(from, ConversationSession::new(FlowKind::Turnos))
                .await;
            return vec![messages::welcome(), messages::name_prompt()];
        }

        vec![messages::unknown_entry()]
    }

    async fn advance(
        &self,
        from: &str,
        session: ConversationSession,
        input: &str,
        normalized: &str,
    ) -> Vec<String> {
        // Cancellation wins over whatever the state expects next.
        if normalized == "cancelar" {
            info!("Conversation cancelled by {}", from);
            self.sessions.clear(from).await;
            return vec![messages::cancelled()];
        }

        match session.state {
            ConversationState::CollectingName => self.collect_name(from, session, input).await,
            ConversationState::CollectingPlan => {
                self.collect_plan(from, session, normalized).await
            }
            ConversationState::AwaitingSelection => {
                self.handle_selection(from, session, normalized).await
            }
        }
    }

    async fn collect_name(
        &self,
        from: &str,
        mut session: ConversationSession,
        input: &str,
    ) -> Vec<String> {
        match validate_client_name(input) {
            Ok(name) => {
                let first = name.split(' ').next().unwrap_or_default().to_string();
                session.client_name = Some(name);
                session.invalid_name = false;
                session.state = ConversationState::CollectingPlan;
                self.sessions.update(from, session).await;
                vec![messages::thanks_name(&first), messages::plan_menu()]
            }
            Err(reason) => {
                // A second bad attempt in a row gets the fuller reminder.
                let mut replies = if session.invalid_name {
                    vec![messages::name_still_invalid()]
                } else {
                    Vec::new()
                };
                session.invalid_name = true;
                self.sessions.update(from, session).await;
                replies.push(name_error_message(reason));
                replies.push(messages::name_prompt());
                replies
            }
        }
    }

    async fn collect_plan(
        &self,
        from: &str,
        mut session: ConversationSession,
        normalized: &str,
    ) -> Vec<String> {
        match parse_plan_choice(normalized) {
            Some(plan) => {
                session.social_work = Some(plan.to_string());
                self.present_options(from, session).await
            }
            None => vec![messages::plan_invalid(), messages::plan_menu()],
        }
    }

    /// Leaves CollectingPlan by showing the option list for the next working
    /// day. The list stored in the session is exactly the list rendered; the
    /// user's next answer resolves against it.
    async fn present_options(
        &self,
        from: &str,
        mut session: ConversationSession,
    ) -> Vec<String> {
        let now = self.now();
        let date = next_working_day(now);
        let date_spanish = format_date_spanish(date);

        match session.flow {
            FlowKind::Turnos => {
                let day_slots = self.availability.get_available_slots(date).await;
                let reserved = self.availability.get_reserved_slots(date).await;
                let current_time = if date == now.date_naive() {
                    Some(now.format("%H:%M").to_string())
                } else {
                    None
                };

                let (morning, afternoon) =
                    bookable_slots(&day_slots, &reserved, current_time.as_deref());
                if morning.is_empty() && afternoon.is_empty() {
                    self.sessions.clear(from).await;
                    return vec![messages::no_slots()];
                }

                let message = messages::slot_list(&date_spanish, &morning, &afternoon);
                session.available_slots = morning.into_iter().chain(afternoon).collect();
                session.appointment_date = Some(date);
                session.state = ConversationState::AwaitingSelection;
                self.sessions.update(from, session).await;
                vec![message]
            }
            FlowKind::Sobreturno => {
                let view = self.sobreturnos.get_available_sobreturnos(date).await;
                let available: Vec<SobreturnoSlot> =
                    view.into_iter().filter(|s| s.available).collect();
                if available.is_empty() {
                    self.sessions.clear(from).await;
                    return vec![messages::no_sobreturnos()];
                }

                let message = messages::sobreturno_list(&date_spanish, &available);
                session.available_sobreturnos = available;
                session.appointment_date = Some(date);
                session.state = ConversationState::AwaitingSelection;
                self.sessions.update(from, session).await;
                vec![message]
            }
        }
    }

    async fn handle_selection(
        &self,
        from: &str,
        session: ConversationSession,
        normalized: &str,
    ) -> Vec<String> {
        match session.flow {
            FlowKind::Turnos => self.book_appointment(from, session, normalized).await,
            FlowKind::Sobreturno => self.book_sobreturno(from, session, normalized).await,
        }
    }

    async fn book_appointment(
        &self,
        from: &str,
        mut session: ConversationSession,
        normalized: &str,
    ) -> Vec<String> {
        let position: usize = match normalized.parse() {
            Ok(n) if n >= 1 && n <= session.available_slots.len() => n,
            _ => return vec![messages::slot_selection_invalid()],
        };
        let slot = session.available_slots[position - 1].clone();
        session.selected_slot = Some(slot.clone());
        self.sessions.update(from, session.clone()).await;

        // Everything the payload needs must have been collected; a partial
        // booking is never sent.
        let (client_name, social_work, date) = match (
            session.client_name.clone(),
            session.social_work.clone(),
            session.appointment_date,
        ) {
            (Some(name), Some(plan), Some(date)) => (name, plan, date),
            _ => {
                warn!("Session for {} is missing booking fields", from);
                self.sessions.clear(from).await;
                return vec![messages::missing_data_restart("turnos")];
            }
        };

        let request = AppointmentRequest {
            client_name: Some(client_name),
            social_work: Some(social_work),
            phone: Some(from.to_string()),
            date: Some(date.format("%Y-%m-%d").to_string()),
            time: Some(slot.display_time.clone()),
            email: None,
        };

        match self.booking.create_appointment(request).await {
            Ok(confirmation) => {
                self.sessions.clear(from).await;
                vec![
                    messages::appointment_confirmation(
                        &format_date_spanish(date),
                        &confirmation.time,
                        &confirmation.client_name,
                        &confirmation.phone,
                        &confirmation.social_work,
                    ),
                    messages::farewell(),
                ]
            }
            Err(BookingError::Offline) => {
                self.sessions.clear(from).await;
                vec![messages::offline_error()]
            }
            Err(BookingError::Rejected(reason)) => {
                self.sessions.clear(from).await;
                vec![messages::booking_failed(&reason)]
            }
        }
    }

    async fn book_sobreturno(
        &self,
        from: &str,
        mut session: ConversationSession,
        normalized: &str,
    ) -> Vec<String> {
        let number: u8 = match normalized.parse() {
            Ok(n) => n,
            Err(_) => return vec![messages::sobreturno_selection_invalid()],
        };
        if !session
            .available_sobreturnos
            .iter()
            .any(|s| s.number == number)
        {
            return vec![messages::sobreturno_selection_invalid()];
        }

        let (client_name, social_work, date) = match (
            session.client_name.clone(),
            session.social_work.clone(),
            session.appointment_date,
        ) {
            (Some(name), Some(plan), Some(date)) => (name, plan, date),
            _ => {
                warn!("Session for {} is missing sobreturno fields", from);
                self.sessions.clear(from).await;
                return vec![messages::missing_data_restart("sobreturnos")];
            }
        };

        let request = SobreturnoRequest {
            client_name: client_name.clone(),
            social_work: social_work.clone(),
            phone: from.to_string(),
            date: date.format("%Y-%m-%d").to_string(),
            sobreturno_number: number,
            time: None,
            email: None,
        };

        match self.sobreturnos.create_sobreturno(&request).await {
            Ok(()) => {
                self.sessions.clear(from).await;
                vec![
                    messages::sobreturno_confirmation(
                        &format_date_spanish(date),
                        number,
                        &client_name,
                        from,
                        &social_work,
                    ),
                    messages::farewell(),
                ]
            }
            Err(SobreturnoError::SlotTaken { number }) => {
                // Lost the race. Drop the stale entry and let the caller
                // pick another number from the same list.
                session.available_sobreturnos.retain(|s| s.number != number);
                if session.available_sobreturnos.is_empty() {
                    self.sessions.clear(from).await;
                    return vec![messages::sobreturno_taken(), messages::no_sobreturnos()];
                }
                self.sessions.update(from, session).await;
                vec![messages::sobreturno_taken()]
            }
            Err(SobreturnoError::Offline) => {
                self.sessions.clear(from).await;
                vec![messages::offline_error()]
            }
            Err(SobreturnoError::Rejected(reason)) => {
                self.sessions.clear(from).await;
                vec![messages::booking_failed(&reason)]
            }
        }
    }

    async fn handle_admin(&self, normalized: &str) -> Vec<String> {
        match normalized {
            "!help" => vec![messages::admin_help()],
            "!status" => {
                let online = self.sobreturnos.check_connectivity().await;
                vec![messages::admin_status(online)]
            }
            _ => Vec::new(),
        }
    }
}

// ==============================================================================
// PURE HELPERS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NameError {
    TooShort,
    InvalidCharacters,
    NeedsTwoWords,
    PartTooShort,
}

fn name_error_message(reason: NameError) -> String {
    match reason {
        NameError::TooShort => messages::name_too_short(),
        NameError::InvalidCharacters => messages::name_invalid_characters(),
        NameError::NeedsTwoWords => messages::name_needs_two_words(),
        NameError::PartTooShort => messages::name_parts_too_short(),
    }
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-záéíóúñÁÉÍÓÚÑ\s]+$").expect("name pattern is valid")
    })
}

/// Strict full-name rule: letters only (Spanish accents allowed), at least
/// two words of two letters each. Returns the title-cased name.
pub fn validate_client_name(input: &str) -> Result<String, NameError> {
    let cleaned = input.split_whitespace().collect::<Vec<_>>().join(" ");

    if cleaned.chars().count() < 4 {
        return Err(NameError::TooShort);
    }
    if !name_pattern().is_match(&cleaned) {
        return Err(NameError::InvalidCharacters);
    }

    let words: Vec<&str> = cleaned.split(' ').collect();
    if words.len() < 2 {
        return Err(NameError::NeedsTwoWords);
    }
    if words.iter().any(|w| w.chars().count() < 2) {
        return Err(NameError::PartTooShort);
    }

    Ok(words
        .iter()
        .map(|w| title_case(w))
        .collect::<Vec<_>>()
        .join(" "))
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

pub fn parse_plan_choice(input: &str) -> Option<&'static str> {
    match input.trim() {
        "1" => Some("INSSSEP"),
        "2" => Some("Swiss Medical"),
        "3" => Some("OSDE"),
        "4" => Some("Galeno"),
        "5" => Some("CONSULTA PARTICULAR"),
        "6" => Some("Otras Obras Sociales"),
        _ => None,
    }
}

/// Next bookable day: today until the 20:30 cutoff, then tomorrow, always
/// skipping weekends.
pub fn next_working_day(now: DateTime<FixedOffset>) -> NaiveDate {
    let mut date = now.date_naive();

    let past_cutoff = now.hour() > 20 || (now.hour() == 20 && now.minute() >= 30);
    if past_cutoff {
        if let Some(next) = date.succ_opt() {
            date = next;
        }
    }

    while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }

    date
}

/// Splits a day's slots into the bookable morning/afternoon lists: available
/// status, not among the reserved display-times, and still ahead of the
/// clock when booking for today ("HH:MM" strings compare correctly).
pub fn bookable_slots(
    day: &DaySlots,
    reserved: &[String],
    current_time: Option<&str>,
) -> (Vec<Slot>, Vec<Slot>) {
    let keep = |slot: &&Slot| {
        slot.is_available()
            && !reserved.contains(&slot.display_time)
            && current_time.map_or(true, |now| slot.display_time.as_str() > now)
    };

    (
        day.morning.iter().filter(keep).cloned().collect(),
        day.afternoon.iter().filter(keep).cloned().collect(),
    )
}

pub fn format_date_spanish(date: NaiveDate) -> String {
    const WEEKDAYS: [&str; 7] = [
        "lunes",
        "martes",
        "miércoles",
        "jueves",
        "viernes",
        "sábado",
        "domingo",
    ];
    const MONTHS: [&str; 12] = [
        "enero",
        "febrero",
        "marzo",
        "abril",
        "mayo",
        "junio",
        "julio",
        "agosto",
        "septiembre",
        "octubre",
        "noviembre",
        "diciembre",
    ];

    format!(
        "{} {} de {} de {}",
        WEEKDAYS[date.weekday().num_days_from_monday() as usize],
        date.day(),
        MONTHS[date.month0() as usize],
        date.year()
    )
}

#[cfg(test)]
mod tests {
    use appointment_cell::models::SlotStatus;
    use chrono::TimeZone;

    use super::*;

    fn offset() -> FixedOffset {
        FixedOffset::west_opt(3 * 3600).expect("valid offset")
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
        offset()
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .single()
            .expect("valid test datetime")
    }

    #[test]
    fn single_word_name_is_rejected() {
        assert_eq!(validate_client_name("Juan"), Err(NameError::NeedsTwoWords));
    }

    #[test]
    fn digits_in_name_are_rejected() {
        assert_eq!(
            validate_client_name("Juan P3rez"),
            Err(NameError::InvalidCharacters)
        );
    }

    #[test]
    fn short_name_parts_are_rejected() {
        assert_eq!(
            validate_client_name("Juan B"),
            Err(NameError::PartTooShort)
        );
        assert_eq!(validate_client_name("Jo"), Err(NameError::TooShort));
    }

    #[test]
    fn valid_name_is_title_cased() {
        assert_eq!(
            validate_client_name("  juan   PÉREZ "),
            Ok("Juan Pérez".to_string())
        );
        assert_eq!(
            validate_client_name("maría del carmen lópez"),
            Ok("María Del Carmen López".to_string())
        );
    }

    #[test]
    fn plan_choices_map_to_social_works() {
        assert_eq!(parse_plan_choice("2"), Some("Swiss Medical"));
        assert_eq!(parse_plan_choice("5"), Some("CONSULTA PARTICULAR"));
        assert_eq!(parse_plan_choice("7"), None);
        assert_eq!(parse_plan_choice("dos"), None);
    }

    #[test]
    fn before_cutoff_books_the_same_weekday() {
        // Wednesday morning
        assert_eq!(
            next_working_day(at(2024, 6, 12, 9, 0)),
            NaiveDate::from_ymd_opt(2024, 6, 12).expect("valid date")
        );
    }

    #[test]
    fn after_cutoff_rolls_to_the_next_day() {
        // Wednesday 20:30 rolls to Thursday
        assert_eq!(
            next_working_day(at(2024, 6, 12, 20, 30)),
            NaiveDate::from_ymd_opt(2024, 6, 13).expect("valid date")
        );
    }

    #[test]
    fn weekends_are_skipped() {
        // Friday night and Saturday both land on Monday
        assert_eq!(
            next_working_day(at(2024, 6, 14, 21, 0)),
            NaiveDate::from_ymd_opt(2024, 6, 17).expect("valid date")
        );
        assert_eq!(
            next_working_day(at(2024, 6, 15, 10, 0)),
            NaiveDate::from_ymd_opt(2024, 6, 17).expect("valid date")
        );
    }

    fn slot(time: &str, status: SlotStatus) -> Slot {
        Slot {
            time: time.to_string(),
            display_time: time.to_string(),
            status,
        }
    }

    #[test]
    fn reserved_and_passed_slots_are_filtered() {
        let day = DaySlots {
            morning: vec![
                slot("09:00", SlotStatus::Available),
                slot("09:30", SlotStatus::Available),
                slot("10:00", SlotStatus::Unavailable),
            ],
            afternoon: vec![
                slot("15:00", SlotStatus::Available),
                slot("15:30", SlotStatus::Available),
            ],
        };
        let reserved = vec!["15:00".to_string()];

        let (morning, afternoon) = bookable_slots(&day, &reserved, Some("09:15"));

        assert_eq!(morning.len(), 1);
        assert_eq!(morning[0].display_time, "09:30");
        assert_eq!(afternoon.len(), 1);
        assert_eq!(afternoon[0].display_time, "15:30");
    }

    #[test]
    fn future_date_keeps_every_open_slot() {
        let day = DaySlots {
            morning: vec![slot("09:00", SlotStatus::Available)],
            afternoon: vec![slot("15:00", SlotStatus::Available)],
        };

        let (morning, afternoon) = bookable_slots(&day, &[], None);
        assert_eq!(morning.len() + afternoon.len(), 2);
    }

    #[test]
    fn spanish_long_date() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).expect("valid date");
        assert_eq!(format_date_spanish(date), "lunes 10 de junio de 2024");
    }
}
