use std::env;
use std::time::Duration;

use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend_url: String,
    pub chatbot_api_key: String,
    pub http_port: u16,
    /// Fixed UTC offset of the clinic, in hours (Buenos Aires is -3).
    pub timezone_offset_hours: i32,
    pub admin_number: String,
    pub cache_ttl: Duration,
    pub sobreturno_cache_ttl: Duration,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            backend_url: env::var("API_URL")
                .unwrap_or_else(|_| {
                    warn!("API_URL not set, using default backend URL");
                    "https://micitamedica.me/api".to_string()
                }),
            chatbot_api_key: env::var("CHATBOT_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("CHATBOT_API_KEY not set, using empty value");
                    String::new()
                }),
            http_port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3008),
            timezone_offset_hours: env::var("TIMEZONE_OFFSET_HOURS")
                .ok()
                .and_then(|h| h.parse().ok())
                .unwrap_or(-3),
            admin_number: env::var("ADMIN_NUMBER")
                .unwrap_or_else(|_| {
                    warn!("ADMIN_NUMBER not set, admin commands disabled");
                    String::new()
                }),
            cache_ttl: Duration::from_secs(
                env::var("CACHE_TTL_SECONDS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            sobreturno_cache_ttl: Duration::from_secs(
                env::var("SOBRETURNO_CACHE_TTL_SECONDS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.backend_url.is_empty() && !self.chatbot_api_key.is_empty()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: String::new(),
            chatbot_api_key: String::new(),
            http_port: 3008,
            timezone_offset_hours: -3,
            admin_number: String::new(),
            cache_ttl: Duration::from_secs(300),
            sobreturno_cache_ttl: Duration::from_secs(60),
        }
    }
}
