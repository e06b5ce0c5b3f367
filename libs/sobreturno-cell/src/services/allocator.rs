use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{FixedOffset, NaiveDate, Utc};
use reqwest::Method;
use serde_json::json;
use tracing::{debug, info, warn};

use shared_backend::{extract_message, BackendClient, BackendError, RetryPolicy, RetryResult};
use shared_cache::TtlCache;
use shared_config::AppConfig;

use crate::models::{
    number_for_time, time_for_number, CreateSobreturnoResponse, SobreturnoError,
    SobreturnoRequest, SobreturnoReservation, SobreturnoSlot, ValidateResponse,
    SOBRETURNO_TIMES,
};

const HEALTH_PATH: &str = "/sobreturnos/health";

/// Allocates the 10 numbered overflow slots of a day. Reads go through a
/// short-lived cache; the pre-booking check and the booking itself always
/// hit the backend, which is the only authority on who got a slot.
pub struct SobreturnoService {
    backend: Arc<BackendClient>,
    cache: Arc<TtlCache>,
    retry: RetryPolicy,
    cache_ttl: Duration,
    tz_offset: FixedOffset,
    online: AtomicBool,
}

impl SobreturnoService {
    pub fn new(config: &AppConfig, backend: Arc<BackendClient>, cache: Arc<TtlCache>) -> Self {
        let tz_offset = FixedOffset::east_opt(config.timezone_offset_hours * 3600)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"));

        Self {
            backend,
            cache,
            retry: RetryPolicy::default(),
            cache_ttl: config.sobreturno_cache_ttl,
            tz_offset,
            online: AtomicBool::new(true),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn reserved_key(date: NaiveDate) -> String {
        format!("sobreturnos_reserved_{}", date.format("%Y-%m-%d"))
    }

    fn available_key(date: NaiveDate) -> String {
        format!("sobreturnos_available_{}", date.format("%Y-%m-%d"))
    }

    fn validate_key(date: NaiveDate) -> String {
        format!("sobreturnos_validate_{}", date.format("%Y-%m-%d"))
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }

    fn mark_online(&self, online: bool) {
        self.online.store(online, Ordering::Relaxed);
    }

    /// Short probe against the health endpoint. Updates the connectivity
    /// state used by the booking path.
    pub async fn check_connectivity(&self) -> bool {
        let reachable = self.backend.health_check(HEALTH_PATH).await.is_ok();
        self.mark_online(reachable);
        reachable
    }

    async fn fetch_reservations(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<SobreturnoReservation>, BackendError> {
        let date_str = date.format("%Y-%m-%d").to_string();
        self.backend
            .request_with_query::<Vec<SobreturnoReservation>>(
                Method::GET,
                "/sobreturnos",
                &[
                    ("date", date_str.as_str()),
                    ("status", "confirmed"),
                    ("isSobreturno", "true"),
                ],
                None,
            )
            .await
    }

    /// Confirmed reservations for `date`, normalized so every record with a
    /// known time carries its number. Cached briefly; failures return an
    /// empty list rather than blocking the flow.
    pub async fn get_reserved_sobreturnos(&self, date: NaiveDate) -> Vec<SobreturnoReservation> {
        let key = Self::reserved_key(date);

        if let Some(cached) = self.cache.get::<Vec<SobreturnoReservation>>(&key) {
            debug!("Serving reserved sobreturnos for {} from cache", date);
            return cached;
        }

        let result = self
            .retry
            .retry_request(|| self.fetch_reservations(date))
            .await;

        match result {
            Ok(RetryResult::Value(reservations)) => {
                self.mark_online(true);
                let reservations = normalize_reservations(reservations);
                self.cache.set(&key, &reservations, self.cache_ttl);
                info!(
                    "Cached {} reserved sobreturnos for {}",
                    reservations.len(),
                    date
                );
                reservations
            }
            Ok(RetryResult::Degraded) => {
                warn!("Backend degraded fetching sobreturnos for {}", date);
                self.mark_online(false);
                Vec::new()
            }
            Err(e) => {
                warn!("Failed to fetch sobreturnos for {}: {}", date, e);
                Vec::new()
            }
        }
    }

    /// The 10 slots of `date` with their availability: reserved numbers are
    /// taken, and on the current day slots whose time already passed are
    /// unavailable too.
    pub async fn get_available_sobreturnos(&self, date: NaiveDate) -> Vec<SobreturnoSlot> {
        let key = Self::available_key(date);

        if let Some(cached) = self.cache.get::<Vec<SobreturnoSlot>>(&key) {
            debug!("Serving sobreturno availability for {} from cache", date);
            return cached;
        }

        let reservations = self.get_reserved_sobreturnos(date).await;
        let taken = taken_numbers(&reservations);

        let now = Utc::now().with_timezone(&self.tz_offset);
        let current_time = if now.date_naive() == date {
            Some(now.format("%H:%M").to_string())
        } else {
            None
        };

        let slots = availability_view(&taken, current_time.as_deref());
        self.cache.set(&key, &slots, self.cache_ttl);
        slots
    }

    /// Authoritative check for one slot, bypassing the view cache. Asks the
    /// dedicated validate endpoint first; if that fails, falls back to a
    /// fresh reservation fetch.
    pub async fn is_sobreturno_available(&self, date: NaiveDate, number: u8) -> bool {
        if time_for_number(number).is_none() {
            return false;
        }

        let date_str = date.format("%Y-%m-%d").to_string();
        let number_str = number.to_string();

        match self
            .backend
            .request_with_query::<ValidateResponse>(
                Method::GET,
                "/sobreturnos/validate",
                &[
                    ("date", date_str.as_str()),
                    ("sobreturnoNumber", number_str.as_str()),
                ],
                None,
            )
            .await
        {
            Ok(response) => response.available,
            Err(e) => {
                warn!(
                    "Validate endpoint failed for {} #{}: {}, checking reservations",
                    date, number, e
                );
                match self.fetch_reservations(date).await {
                    Ok(reservations) => {
                        let reservations = normalize_reservations(reservations);
                        !taken_numbers(&reservations).contains(&number)
                    }
                    Err(e) => {
                        warn!("Reservation fallback failed for {}: {}", date, e);
                        false
                    }
                }
            }
        }
    }

    /// Books one sobreturno. The backend is the lock: we re-validate right
    /// before posting, but a conflicting write racing past the check comes
    /// back as `SlotTaken` from the create call itself.
    pub async fn create_sobreturno(
        &self,
        request: &SobreturnoRequest,
    ) -> Result<(), SobreturnoError> {
        let number = request.sobreturno_number;
        let time = match time_for_number(number) {
            Some(time) => time,
            None => {
                return Err(SobreturnoError::Rejected(format!(
                    "invalid sobreturno number {}",
                    number
                )))
            }
        };

        let date = match NaiveDate::parse_from_str(&request.date, "%Y-%m-%d") {
            Ok(date) => date,
            Err(_) => {
                return Err(SobreturnoError::Rejected(format!(
                    "invalid date {}",
                    request.date
                )))
            }
        };

        if !self.check_connectivity().await {
            warn!("Backend unreachable, refusing to book sobreturno");
            return Err(SobreturnoError::Offline);
        }

        if !self.is_sobreturno_available(date, number).await {
            info!("Sobreturno {} on {} already taken", number, date);
            return Err(SobreturnoError::SlotTaken { number });
        }

        let client_name = if request.client_name.trim().is_empty() {
            "Sin nombre"
        } else {
            request.client_name.as_str()
        };
        let email = request
            .email
            .clone()
            .unwrap_or_else(|| format!("{}@sobreturno.temp", request.phone));
        let time = request.time.as_deref().unwrap_or(time);

        let payload = json!({
            "clientName": client_name,
            "socialWork": request.social_work,
            "phone": request.phone,
            "email": email,
            "date": request.date,
            "time": time,
            "sobreturnoNumber": number,
            "isSobreturno": true,
            "status": "confirmed",
            "attended": false,
        });

        let result = self
            .backend
            .request::<CreateSobreturnoResponse>(Method::POST, "/sobreturnos", Some(payload))
            .await;

        match result {
            Ok(response) if response.created() => {
                info!("Booked sobreturno {} on {}", number, date);
                self.clear_date_cache(date);
                Ok(())
            }
            Ok(_) => Err(SobreturnoError::Rejected(
                "backend did not confirm the sobreturno".to_string(),
            )),
            Err(e) if e.is_conflict() => {
                info!("Sobreturno {} on {} lost the race", number, date);
                self.clear_date_cache(date);
                Err(SobreturnoError::SlotTaken { number })
            }
            Err(e) if e.is_timeout_class() => {
                self.mark_online(false);
                Err(SobreturnoError::Offline)
            }
            Err(BackendError::Status { message, .. }) => {
                Err(SobreturnoError::Rejected(extract_message(&message)))
            }
            Err(e) => Err(SobreturnoError::Rejected(e.to_string())),
        }
    }

    /// Drops every cached view of `date` so the next read reflects the
    /// write that just happened.
    pub fn clear_date_cache(&self, date: NaiveDate) {
        self.cache.delete(&Self::reserved_key(date));
        self.cache.delete(&Self::available_key(date));
        self.cache.delete(&Self::validate_key(date));
    }
}

/// Assigns numbers to records that arrived without one, via the time table,
/// and drops records that block nothing.
fn normalize_reservations(reservations: Vec<SobreturnoReservation>) -> Vec<SobreturnoReservation> {
    reservations
        .into_iter()
        .filter(|r| r.blocks_slot())
        .map(|mut r| {
            if r.sobreturno_number.is_none() {
                r.sobreturno_number = number_for_time(&r.time);
            }
            r
        })
        .collect()
}

fn taken_numbers(reservations: &[SobreturnoReservation]) -> Vec<u8> {
    let mut taken: Vec<u8> = reservations
        .iter()
        .filter_map(|r| r.sobreturno_number)
        .collect();
    taken.sort_unstable();
    taken.dedup();
    taken
}

/// Builds the per-day view of all 10 slots. `current_time` is the clinic's
/// wall-clock "HH:MM" when the view is for today, `None` otherwise; times
/// at or before it are no longer offered.
fn availability_view(taken: &[u8], current_time: Option<&str>) -> Vec<SobreturnoSlot> {
    SOBRETURNO_TIMES
        .iter()
        .map(|(number, time)| {
            let passed = current_time.is_some_and(|now| *time <= now);
            SobreturnoSlot {
                number: *number,
                time: (*time).to_string(),
                available: !taken.contains(number) && !passed,
            }
        })
        .collect()
}
