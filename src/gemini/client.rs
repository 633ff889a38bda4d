use super::retry::RetryPolicy;
use super::types::{
    ApiErrorBody, GenerateContentRequest, ImagenRequest, ListModelsResponse, ModelDescriptor,
    Operation, ResponseEnvelope, VideoRequest,
};
use super::{ClientProvider, ClientSettings, GenerativeApi};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_retry::RetryIf;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Gemini REST client authenticated with a query-string API key.
///
/// Carries only static configuration; every call is an independent request.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self::new_with_client(api_key, Client::new())
    }

    pub fn new_with_client(api_key: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// `model` may be a bare id or carry a `models/` prefix.
    fn model_url(&self, model: &str, action: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/v1beta/models/{}:{}", self.base_url, model, action)
    }

    async fn send_once(&self, method: Method, url: &str, body: Option<&Value>) -> Result<Vec<u8>> {
        let mut request = self
            .client
            .request(method, url)
            .timeout(self.timeout)
            .query(&[("key", self.api_key.as_str())]);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let raw = String::from_utf8_lossy(&bytes).into_owned();
            let message = serde_json::from_slice::<ApiErrorBody>(&bytes)
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| "unknown error".to_string());
            tracing::error!("Gemini API error (status {}): {}", status, message);
            return Err(Error::Api {
                message,
                status: Some(status.as_u16()),
                body: Some(raw),
            });
        }

        Ok(bytes.to_vec())
    }

    /// Runs `op` under the retry policy. Only transport failures are retried;
    /// HTTP error statuses return on the first attempt.
    async fn with_retry<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.retry.attempts();
        let mut attempt = 0u32;

        let result = RetryIf::start(
            self.retry.delays(),
            || {
                attempt += 1;
                let current = attempt;
                let fut = op();
                async move {
                    fut.await.map_err(|e| {
                        if e.is_transient() {
                            tracing::warn!(
                                "{} failed (attempt {}/{}): {}",
                                label,
                                current,
                                attempts,
                                e
                            );
                        }
                        e
                    })
                }
            },
            |e: &Error| e.is_transient(),
        )
        .await;

        match result {
            Err(Error::Http(e)) if e.is_timeout() => {
                tracing::error!("{} timed out after {} attempts", label, attempts);
                Err(Error::RequestTimeout { attempts })
            }
            Err(Error::Http(e)) => Err(Error::Api {
                message: format!("network error: {}", e),
                status: None,
                body: None,
            }),
            other => other,
        }
    }

    async fn request_bytes(&self, method: Method, url: &str, body: Option<Value>) -> Result<Vec<u8>> {
        tracing::debug!("Sending {} request to Gemini: {}", method, url);
        self.with_retry(url, || self.send_once(method.clone(), url, body.as_ref()))
            .await
    }

    async fn request_json<Resp: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
    ) -> Result<Resp> {
        let bytes = self.request_bytes(method, url, body).await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::error!(
                "Failed to parse Gemini response: {}\nBody: {}",
                e,
                String::from_utf8_lossy(&bytes)
            );
            Error::Serialization(e)
        })
    }
}

/// Ceiling applied to wait budgets too large to represent as a deadline.
const MAX_POLL_WAIT_SECS: u64 = 365 * 24 * 60 * 60;

/// Number of status GETs that fit in `max_wait` at one per `interval`.
pub fn poll_budget(max_wait: Duration, interval: Duration) -> u32 {
    let interval_ms = interval.as_millis().max(1);
    let polls = max_wait.as_millis().div_ceil(interval_ms);
    polls.clamp(1, u32::MAX as u128) as u32
}

#[async_trait]
impl GenerativeApi for GeminiClient {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<ResponseEnvelope> {
        let url = self.model_url(model, "generateContent");
        self.request_json(Method::POST, &url, Some(serde_json::to_value(request)?))
            .await
    }

    async fn generate_image_predict(
        &self,
        model: &str,
        request: &ImagenRequest,
    ) -> Result<ResponseEnvelope> {
        let url = self.model_url(model, "predict");
        self.request_json(Method::POST, &url, Some(serde_json::to_value(request)?))
            .await
    }

    async fn generate_video(&self, model: &str, request: &VideoRequest) -> Result<Operation> {
        let url = self.model_url(model, "generateVideos");
        let operation: Operation = self
            .request_json(Method::POST, &url, Some(serde_json::to_value(request)?))
            .await?;
        tracing::info!(
            "Video generation started: {}",
            operation.name.as_deref().unwrap_or("<unnamed>")
        );
        Ok(operation)
    }

    async fn poll_operation(
        &self,
        name: &str,
        max_wait: Duration,
        poll_interval: Duration,
    ) -> Result<Operation> {
        if poll_interval.is_zero() {
            return Err(Error::InvalidInput(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        let url = format!("{}/v1beta/{}", self.base_url, name.trim_start_matches('/'));
        let deadline = Instant::now()
            .checked_add(max_wait)
            .unwrap_or_else(|| Instant::now() + Duration::from_secs(MAX_POLL_WAIT_SECS));
        let max_polls = poll_budget(max_wait, poll_interval);

        for poll in 1..=max_polls {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            let status = tokio::time::timeout(
                remaining,
                self.request_json::<Operation>(Method::GET, &url, None),
            )
            .await;
            let operation = match status {
                Ok(result) => result?,
                Err(_) => {
                    tracing::warn!("Status request for {} outlived the wait budget", name);
                    break;
                }
            };
            if operation.done {
                tracing::info!("Operation {} finished after {} polls", name, poll);
                return Ok(operation);
            }
            tracing::debug!("Operation {} still running (poll {}/{})", name, poll, max_polls);

            let remaining = deadline.saturating_duration_since(Instant::now());
            tokio::time::sleep(poll_interval.min(remaining)).await;
        }

        Err(Error::OperationTimeout {
            name: name.to_string(),
            waited: max_wait,
        })
    }

    async fn list_models(&self) -> Result<Vec<ModelDescriptor>> {
        let url = format!("{}/v1beta/models", self.base_url);
        let response: ListModelsResponse = self.request_json(Method::GET, &url, None).await?;
        Ok(response.models)
    }

    async fn download(&self, uri: &str) -> Result<Vec<u8>> {
        self.request_bytes(Method::GET, uri, None).await
    }
}

/// Hands out [`GeminiClient`]s that share one connection pool.
#[derive(Clone)]
pub struct HttpClientProvider {
    http: Client,
    base_url: String,
    backoff_unit: Duration,
}

impl HttpClientProvider {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            backoff_unit: RetryPolicy::default().backoff_unit,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    pub fn build(&self, settings: &ClientSettings) -> GeminiClient {
        GeminiClient::new_with_client(settings.api_key.clone(), self.http.clone())
            .with_base_url(self.base_url.clone())
            .with_timeout(settings.timeout)
            .with_retry_policy(
                RetryPolicy::new(settings.max_retries).with_backoff_unit(self.backoff_unit),
            )
    }
}

impl Default for HttpClientProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientProvider for HttpClientProvider {
    fn client(&self, settings: &ClientSettings) -> Box<dyn GenerativeApi> {
        Box::new(self.build(settings))
    }
}
