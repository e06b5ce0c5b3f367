use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("API error ({code}): {message}")]
    Status { code: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Request failed: {0}")]
    Other(String),
}

impl BackendError {
    /// Timeout-class failures are expected when the backend is slow rather
    /// than down, and are recoverable through fallback data.
    pub fn is_timeout_class(&self) -> bool {
        matches!(self, BackendError::Timeout | BackendError::Connection(_))
    }

    /// The backend answers a double-submitted sobreturno with a conflict
    /// status or an "already exists" style message.
    pub fn is_conflict(&self) -> bool {
        match self {
            BackendError::Status { code: 409, .. } => true,
            BackendError::Status { message, .. } => {
                let msg = message.to_lowercase();
                msg.contains("already exists") || msg.contains("not available")
            }
            _ => false,
        }
    }
}

/// Backend error bodies are usually `{"message": "..."}`; fall back to the
/// raw text when they are not.
pub fn extract_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::Timeout
        } else if e.is_connect() {
            BackendError::Connection(e.to_string())
        } else if e.is_decode() {
            BackendError::Decode(e.to_string())
        } else {
            BackendError::Other(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_detection_covers_status_and_message() {
        let conflict = BackendError::Status {
            code: 409,
            message: String::new(),
        };
        assert!(conflict.is_conflict());

        let dup = BackendError::Status {
            code: 400,
            message: "sobreturno already exists".to_string(),
        };
        assert!(dup.is_conflict());

        assert!(!BackendError::Timeout.is_conflict());
    }

    #[test]
    fn extract_message_prefers_json_field() {
        assert_eq!(
            extract_message(r#"{"message": "slot already booked"}"#),
            "slot already booked"
        );
        assert_eq!(extract_message("boom"), "boom");
    }
}
