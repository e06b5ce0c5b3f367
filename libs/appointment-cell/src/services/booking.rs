use std::sync::Arc;

use chrono::{FixedOffset, Utc};
use reqwest::Method;
use serde_json::json;
use tracing::{error, info};

use shared_backend::{extract_message, BackendClient, BackendError};
use shared_config::AppConfig;

use crate::models::{AppointmentConfirmation, AppointmentRequest, AppointmentResponse, BookingError};

/// Commits regular appointments. A booking POST is never retried: a blind
/// retry after an ambiguous failure could double-submit.
pub struct BookingService {
    backend: Arc<BackendClient>,
    tz_offset: FixedOffset,
}

impl BookingService {
    pub fn new(config: &AppConfig, backend: Arc<BackendClient>) -> Self {
        let tz_offset = FixedOffset::east_opt(config.timezone_offset_hours * 3600)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"));
        Self { backend, tz_offset }
    }

    fn today(&self) -> String {
        Utc::now()
            .with_timezone(&self.tz_offset)
            .format("%Y-%m-%d")
            .to_string()
    }

    pub async fn create_appointment(
        &self,
        request: AppointmentRequest,
    ) -> Result<AppointmentConfirmation, BookingError> {
        let phone = request.phone.unwrap_or_default();
        let email = request
            .email
            .unwrap_or_else(|| format!("{}@phone.com", phone));

        let payload = json!({
            "clientName": request.client_name.unwrap_or_else(|| "Sin nombre".to_string()),
            "socialWork": request.social_work.unwrap_or_else(|| "CONSULTA PARTICULAR".to_string()),
            "phone": phone,
            "date": request.date.unwrap_or_else(|| self.today()),
            "time": request.time.unwrap_or_else(|| "10:00".to_string()),
            "email": email,
            "isSobreturno": false,
            "status": "pending",
            "attended": false,
        });

        info!("Creating appointment: {}", payload);

        match self
            .backend
            .request::<AppointmentResponse>(Method::POST, "/appointments", Some(payload))
            .await
        {
            Ok(response) if response.success => {
                info!("Appointment {} created", response.data.id);
                Ok(response.data)
            }
            Ok(_) => Err(BookingError::Rejected(
                "invalid response from server".to_string(),
            )),
            Err(e) if e.is_timeout_class() => {
                error!("Connection error while creating appointment: {}", e);
                Err(BookingError::Offline)
            }
            Err(BackendError::Status { message, .. }) => {
                error!("Backend rejected appointment: {}", message);
                Err(BookingError::Rejected(extract_message(&message)))
            }
            Err(e) => {
                error!("Failed to create appointment: {}", e);
                Err(BookingError::Rejected(e.to_string()))
            }
        }
    }
}
