//! Gemini API client
//!
//! Request building, bounded retry, long-running operation polling and
//! lenient response parsing for the content, Imagen, video and model-listing
//! endpoints.

pub mod catalog;
pub mod client;
pub mod mock;
pub mod parse;
pub mod retry;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{GeminiClient, HttpClientProvider};
pub use mock::{MockClientProvider, MockGeminiApi, RecordedCall};
pub use parse::{
    extract_json_object, parse_answer_text, parse_image_response, parse_text_response,
    split_thoughts, ThoughtSplit,
};
pub use retry::RetryPolicy;
pub use types::*;

use crate::Result;
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait GenerativeApi: Send + Sync {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<ResponseEnvelope>;

    /// Imagen batch prediction.
    async fn generate_image_predict(
        &self,
        model: &str,
        request: &ImagenRequest,
    ) -> Result<ResponseEnvelope>;

    /// Starts a video job and returns its operation handle.
    async fn generate_video(&self, model: &str, request: &VideoRequest) -> Result<Operation>;

    /// Polls until the operation reports `done` or the wait budget runs out.
    async fn poll_operation(
        &self,
        name: &str,
        max_wait: Duration,
        poll_interval: Duration,
    ) -> Result<Operation>;

    async fn list_models(&self) -> Result<Vec<ModelDescriptor>>;

    /// Fetches a generated file by URI.
    async fn download(&self, uri: &str) -> Result<Vec<u8>>;
}

/// Per-node client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_key: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl ClientSettings {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            timeout: client::DEFAULT_TIMEOUT,
            max_retries: retry::DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_timeout_secs(self, secs: u64) -> Self {
        self.with_timeout(Duration::from_secs(secs))
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Builds API clients for nodes; swapped for a mock in tests.
pub trait ClientProvider: Send + Sync {
    fn client(&self, settings: &ClientSettings) -> Box<dyn GenerativeApi>;
}
