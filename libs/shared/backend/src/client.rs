use std::time::Duration;

use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::error::BackendError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Thin HTTP client for the scheduling backend. All cell services go through
/// this; it owns the base URL, the API key header and the status mapping.
pub struct BackendClient {
    client: Client,
    probe_client: Client,
    base_url: String,
    api_key: String,
}

impl BackendClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            probe_client: Client::builder()
                .timeout(PROBE_TIMEOUT)
                .build()
                .unwrap_or_default(),
            base_url: config.backend_url.clone(),
            api_key: config.chatbot_api_key.clone(),
        }
    }

    fn get_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if !self.api_key.is_empty() {
            if let Ok(value) = HeaderValue::from_str(&self.api_key) {
                headers.insert("X-API-Key", value);
            }
        }

        headers
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, BackendError>
    where
        T: DeserializeOwned,
    {
        self.request_with_query(method, path, &[], body).await
    }

    pub async fn request_with_query<T>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<Value>,
    ) -> Result<T, BackendError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {}", url);

        let mut req = self
            .client
            .request(method, &url)
            .headers(self.get_headers());

        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("API error ({}): {}", status, error_text);

            return Err(BackendError::Status {
                code: status.as_u16(),
                message: error_text,
            });
        }

        let data = response
            .json::<T>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(data)
    }

    /// Lightweight connectivity probe with a short timeout. Only a 200
    /// counts as reachable.
    pub async fn health_check(&self, path: &str) -> Result<(), BackendError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Probing connectivity at {}", url);

        let response = self
            .probe_client
            .get(&url)
            .headers(self.get_headers())
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() != 200 {
            return Err(BackendError::Status {
                code: status.as_u16(),
                message: "health check failed".to_string(),
            });
        }

        Ok(())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
