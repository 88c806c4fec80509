//! Langsys API client with connection pooling and rate limiting
//!
//! This module provides the HTTP client for the Langsys translation manager
//! API, including authentication, rate limiting, retry logic for transient
//! failures, and normalized error classification.

use governor::{DefaultDirectRateLimiter, Quota};
use langsys_common::{
    LangsysError, LocaleDirectory, LocaleInfo, LocaleName, MissingTokenRecord, Result,
    TranslationData,
};
use reqwest::{header::CONTENT_TYPE, Client, Method};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{num::NonZeroU32, sync::Arc, time::Duration};
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};
use tracing::{debug, error, info, instrument, warn};

/// Default base URL of the Langsys API
pub const DEFAULT_BASE_URL: &str = "https://api.langsys.dev/api";

/// Configuration for the Langsys API client
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the Langsys API
    pub base_url: String,
    /// The project created in Langsys for this application
    pub project_id: String,
    /// API key associated with the configured project
    pub api_key: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Connection pool max idle connections per host (default: 10)
    pub max_idle_per_host: usize,
    /// Rate limit: requests per second (default: 10)
    pub rate_limit_per_sec: u32,
    /// Maximum number of retry attempts for transient failures (default: 3)
    pub max_retries: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            project_id: String::new(),
            api_key: String::new(),
            timeout_secs: 30,
            max_idle_per_host: 10,
            rate_limit_per_sec: 10,
            max_retries: 3,
        }
    }
}

impl ApiConfig {
    /// Create a new configuration with the minimum required parameters
    pub fn new(project_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Set the API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the rate limit
    pub fn with_rate_limit(mut self, rate_limit_per_sec: u32) -> Self {
        self.rate_limit_per_sec = rate_limit_per_sec;
        self
    }

    /// Set the maximum retry attempts
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Normalized Langsys API response envelope
///
/// Every route answers with this shape; `status` is the server-side success
/// flag, independent of the HTTP status code.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiResponse<T> {
    /// Server-side success flag
    pub status: bool,
    /// The actual data payload
    pub data: Option<T>,
    /// Error descriptions, usually present when `status` is false
    #[serde(default)]
    pub errors: Option<Vec<String>>,
    /// Pagination, present on list routes
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_count: Option<u32>,
    #[serde(default)]
    pub records_per_page: Option<u32>,
}

impl<T> ApiResponse<T> {
    /// Check if the response indicates success
    pub fn is_success(&self) -> bool {
        self.status
    }

    /// Get the data payload, if present
    pub fn into_data(self) -> Option<T> {
        self.data
    }

    /// Get the error list, if any
    pub fn error_list(&self) -> &[String] {
        self.errors.as_deref().unwrap_or_default()
    }
}

/// Langsys API client with connection pooling and rate limiting
#[derive(Debug, Clone)]
pub struct LangsysClient {
    client: Client,
    config: ApiConfig,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl LangsysClient {
    /// Create a new Langsys client with the given configuration
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(config.max_idle_per_host)
            .build()
            .map_err(|e| LangsysError::network_with_source("Failed to create HTTP client", e))?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.rate_limit_per_sec)
                .ok_or_else(|| LangsysError::config("Rate limit must be greater than 0"))?,
        );
        let rate_limiter = Arc::new(DefaultDirectRateLimiter::direct(quota));

        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    /// Create a new client with default configuration
    pub fn with_defaults(
        project_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self> {
        Self::new(ApiConfig::new(project_id, api_key))
    }

    /// The configured project id
    pub fn project_id(&self) -> &str {
        &self.config.project_id
    }

    /// Build a request URL for an API route, expanding the project id
    fn build_url(&self, route: &str) -> String {
        let route = route.trim_start_matches('/');
        let route = route.replace("[projectid]", &self.config.project_id);
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), route)
    }

    /// Whether a failure is worth retrying at the transport layer.
    /// Client errors carry the same outcome on every attempt.
    fn is_transient(error: &LangsysError) -> bool {
        match error {
            LangsysError::Network { .. } => true,
            LangsysError::Api { status_code, .. } => {
                status_code.map_or(true, |code| code >= 500)
            }
            _ => false,
        }
    }

    /// Classify a non-success HTTP status, pulling server error details from
    /// the response body when it parses as an envelope
    fn classify_status(status: u16, body: &str) -> LangsysError {
        let server_errors = serde_json::from_str::<ApiResponse<serde_json::Value>>(body)
            .ok()
            .and_then(|envelope| envelope.errors)
            .unwrap_or_default();

        match status {
            401 => LangsysError::auth("Project id or API key rejected"),
            422 => LangsysError::validation_with_errors(
                "Server rejected request data",
                server_errors,
            ),
            code => LangsysError::api_with_status(format!("API returned HTTP {}", code), code),
        }
    }

    /// Make an authenticated request with retry on transient failures,
    /// returning the raw response body on HTTP success
    #[instrument(skip(self, body), fields(route = %route))]
    async fn send(
        &self,
        method: Method,
        route: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<String> {
        self.rate_limiter.until_ready().await;

        let url = self.build_url(route);
        debug!("Sending {} request to: {}", method, url);

        let retry_strategy = ExponentialBackoff::from_millis(100)
            .max_delay(Duration::from_secs(10))
            .take(self.config.max_retries);

        let text = RetryIf::spawn(
            retry_strategy,
            || async {
                let mut request = self
                    .client
                    .request(method.clone(), &url)
                    .header("x-Authorization", &self.config.api_key)
                    .header(CONTENT_TYPE, "application/json; charset=utf-8");
                if let Some(body) = body {
                    request = request.json(body);
                }

                let response = match request.send().await {
                    Ok(response) => response,
                    Err(e) if e.is_timeout() => {
                        warn!("Request timeout, will retry: {}", e);
                        return Err(LangsysError::network_with_source("Request timeout", e));
                    }
                    Err(e) if e.is_connect() => {
                        warn!("Connection error, will retry: {}", e);
                        return Err(LangsysError::network_with_source("Connection error", e));
                    }
                    Err(e) => {
                        error!("Request failed: {}", e);
                        return Err(LangsysError::network_with_source("Request failed", e));
                    }
                };

                let status = response.status();
                let text = response.text().await.map_err(|e| {
                    LangsysError::network_with_source("Failed to read response body", e)
                })?;

                if status.is_success() {
                    debug!("Request successful: {}", status);
                    Ok(text)
                } else {
                    warn!("Request returned non-success status: {}", status);
                    Err(Self::classify_status(status.as_u16(), &text))
                }
            },
            Self::is_transient,
        )
        .await?;

        Ok(text)
    }

    /// Make a request and unwrap the envelope into its data payload
    async fn request_data<T>(
        &self,
        method: Method,
        route: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let text = self.send(method, route, body).await?;

        let envelope: ApiResponse<T> = serde_json::from_str(&text).map_err(|e| {
            LangsysError::data_shape(format!("Unexpected response shape: {}", e))
        })?;

        if !envelope.is_success() {
            let errors = envelope.error_list().join("; ");
            return Err(LangsysError::api(if errors.is_empty() {
                "API reported failure without details".to_string()
            } else {
                errors
            }));
        }

        envelope
            .into_data()
            .ok_or_else(|| LangsysError::data_shape("API response contained no data"))
    }

    /// Make a request where no response payload is expected beyond the
    /// status flag
    async fn request_ack(
        &self,
        method: Method,
        route: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<()> {
        let text = self.send(method, route, body).await?;

        let envelope: ApiResponse<serde_json::Value> =
            serde_json::from_str(&text).map_err(|e| {
                LangsysError::data_shape(format!("Unexpected response shape: {}", e))
            })?;

        if envelope.is_success() {
            Ok(())
        } else {
            let errors = envelope.error_list().join("; ");
            Err(LangsysError::api(if errors.is_empty() {
                "API reported failure without details".to_string()
            } else {
                errors
            }))
        }
    }

    // ========================================================================
    // Public API Methods
    // ========================================================================

    /// Confirm the configured project id and API key are authorized
    #[instrument(skip(self))]
    pub async fn validate(&self) -> Result<()> {
        info!("Validating project authorization");
        self.request_ack(Method::GET, "authorize-project/[projectid]", None)
            .await
    }

    /// Fetch the complete category/token/translation set for a locale
    #[instrument(skip(self), fields(locale = %locale))]
    pub async fn fetch_translations(&self, locale: &str) -> Result<TranslationData> {
        info!("Fetching translations for locale {}", locale);
        let route = format!("projects/[projectid]/translations/{}", locale);
        self.request_data(Method::GET, &route, None).await
    }

    /// Report a batch of unresolved tokens so they can be queued for
    /// translation. Safe to retry with the same batch.
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub async fn submit_missing(&self, records: &[MissingTokenRecord]) -> Result<()> {
        info!("Submitting {} missing tokens", records.len());
        let body = serde_json::to_value(records)?;
        self.request_ack(Method::POST, "projects/[projectid]/tokens", Some(&body))
            .await
    }

    /// Fetch the locale directory grouped by language name, localized to the
    /// given locale
    #[instrument(skip(self))]
    pub async fn list_locales(&self, in_locale: &str) -> Result<LocaleDirectory> {
        let route = format!("locales/{}", in_locale);
        self.request_data(Method::GET, &route, None).await
    }

    /// Fetch the locale directory as a flat code/name list
    #[instrument(skip(self))]
    pub async fn list_locales_flat(&self, in_locale: &str) -> Result<Vec<LocaleName>> {
        let route = format!("locales/{}/flat", in_locale);
        self.request_data(Method::GET, &route, None).await
    }

    /// Fetch the locale directory with full and language-only names
    #[instrument(skip(self))]
    pub async fn list_locales_data(&self, in_locale: &str) -> Result<Vec<LocaleInfo>> {
        let route = format!("locales/{}/data", in_locale);
        self.request_data(Method::GET, &route, None).await
    }
}
