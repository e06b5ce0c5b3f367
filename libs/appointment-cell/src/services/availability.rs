use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Method;
use tracing::{debug, info, warn};

use shared_backend::{BackendClient, RetryPolicy, RetryResult};
use shared_cache::TtlCache;
use shared_config::AppConfig;

use crate::models::{AvailableSlotsResponse, DaySlots, ReservedSlotsResponse};
use crate::services::fallback::fallback_slots;

const HEALTH_PATH: &str = "/sobreturnos/health";

/// Availability reads for regular appointments: cache, then backend through
/// the retry policy, then static fallback. `get_available_slots` never fails
/// and never blocks on a dead backend longer than the probe + retries.
pub struct AvailabilityService {
    backend: Arc<BackendClient>,
    cache: Arc<TtlCache>,
    retry: RetryPolicy,
    cache_ttl: Duration,
    /// Connectivity as observed by the last probe or call. Owned by the
    /// gateway rather than ambient, so tests can steer it via the probe.
    online: AtomicBool,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig, backend: Arc<BackendClient>, cache: Arc<TtlCache>) -> Self {
        Self {
            backend,
            cache,
            retry: RetryPolicy::default(),
            cache_ttl: config.cache_ttl,
            online: AtomicBool::new(true),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn cache_key(date: NaiveDate) -> String {
        format!("appointments_{}", date.format("%Y-%m-%d"))
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }

    fn mark_online(&self, online: bool) {
        self.online.store(online, Ordering::Relaxed);
    }

    /// Available regular slots for `date`: cache hit, else live fetch, else
    /// the static fallback list (same shape as a live response).
    pub async fn get_available_slots(&self, date: NaiveDate) -> DaySlots {
        let key = Self::cache_key(date);
        debug!("Fetching available slots for {}", date);

        if let Some(cached) = self.cache.get::<DaySlots>(&key) {
            debug!("Serving slots for {} from cache", date);
            return cached;
        }

        if self.backend.health_check(HEALTH_PATH).await.is_err() {
            warn!("Health check failed, serving fallback slots for {}", date);
            self.mark_online(false);
            return fallback_slots();
        }
        self.mark_online(true);

        let path = format!("/appointments/available/{}", date.format("%Y-%m-%d"));
        let result = self
            .retry
            .retry_request(|| {
                self.backend
                    .request::<AvailableSlotsResponse>(Method::GET, &path, None)
            })
            .await;

        match result {
            Ok(RetryResult::Value(response)) => {
                let slots = response.data.available;
                self.cache.set(&key, &slots, self.cache_ttl);
                info!("Cached available slots for {}", date);
                slots
            }
            Ok(RetryResult::Degraded) => {
                warn!("Backend degraded, serving fallback slots for {}", date);
                self.mark_online(false);
                fallback_slots()
            }
            Err(e) => {
                warn!("Failed to fetch slots for {}: {}", date, e);
                self.mark_online(false);
                fallback_slots()
            }
        }
    }

    /// Reserved display-times for `date`. Best-effort: offline or failing
    /// lookups return an empty list so the booking flow is never blocked.
    pub async fn get_reserved_slots(&self, date: NaiveDate) -> Vec<String> {
        if !self.is_online() {
            return Vec::new();
        }

        let path = format!("/appointments/reserved/{}", date.format("%Y-%m-%d"));
        match self
            .backend
            .request::<ReservedSlotsResponse>(Method::GET, &path, None)
            .await
        {
            Ok(response) => response.data,
            Err(e) => {
                warn!("Failed to fetch reserved slots for {}: {}", date, e);
                Vec::new()
            }
        }
    }
}
