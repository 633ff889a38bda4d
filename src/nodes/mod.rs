//! Node adapters
//!
//! Each node turns widget values into one API call and maps the reply onto
//! host outputs. Nodes never fail: a missing key, an API failure or a local
//! error all come back as a readable message in one of the output slots.

pub mod advanced;
pub mod image;
pub mod nano_banana;
pub mod options;
pub mod registry;
pub mod text;
pub mod utility;
pub mod video;
pub mod vision;

pub use advanced::{PromptOptimizer, StructuredOutput, Thinking};
pub use image::{ImageEdit, ImageGen, ImageOutput, ImagenGenerate};
pub use nano_banana::{BananaInputs, NanoBanana, NanoBananaPro};
pub use registry::{NodeInfo, NODES};
pub use text::{Chat, Text};
pub use utility::{ApiConfig, ModelInfo, PromptBuilder};
pub use video::{ImageToVideo, VideoGen, VideoOutput};
pub use vision::{DocumentProcess, VisionAnalyze};

use crate::config::Config;
use crate::gemini::client::DEFAULT_TIMEOUT;
use crate::gemini::retry::DEFAULT_MAX_RETRIES;
use crate::gemini::{ClientProvider, ClientSettings, GenerativeApi, HttpClientProvider};
use crate::{Error, Result};
use async_trait::async_trait;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const MISSING_KEY: &str = "Error: please provide a valid API key";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Shared services for node execution.
#[derive(Clone)]
pub struct NodeContext {
    provider: Arc<dyn ClientProvider>,
    output_dir: PathBuf,
    poll_interval: Duration,
    timeout: Duration,
    max_retries: u32,
}

impl NodeContext {
    pub fn new(provider: Arc<dyn ClientProvider>) -> Self {
        Self {
            provider,
            output_dir: PathBuf::from(crate::config::DEFAULT_OUTPUT_DIR),
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Real HTTP clients against the configured base URL, with the
    /// configured timeout and retry count as client defaults.
    pub fn from_config(config: &Config) -> Self {
        let provider = HttpClientProvider::new().with_base_url(config.base_url.clone());
        Self::new(Arc::new(provider))
            .with_output_dir(config.output_dir.clone())
            .with_client_defaults(Duration::from_secs(config.timeout_secs), config.max_retries)
    }

    pub fn with_client_defaults(mut self, timeout: Duration, max_retries: u32) -> Self {
        self.timeout = timeout;
        self.max_retries = max_retries;
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Client settings for `api_key` using this context's defaults.
    pub fn settings(&self, api_key: &str) -> ClientSettings {
        ClientSettings::new(api_key)
            .with_timeout(self.timeout)
            .with_max_retries(self.max_retries)
    }

    pub fn client(&self, settings: &ClientSettings) -> Box<dyn GenerativeApi> {
        self.provider.client(settings)
    }
}

/// A host node: fixed identifier, typed widget inputs (the implementing
/// struct) and typed outputs.
#[async_trait]
pub trait Node: Send + Sync {
    const NAME: &'static str;
    type Output: Send;

    async fn run(&self, ctx: &NodeContext) -> Self::Output;
}

/// Message shown in an output slot for `err`.
pub fn describe_error(err: &Error) -> String {
    if err.is_api() {
        format!("API error: {}", err)
    } else {
        format!("Error: {}", err)
    }
}

/// Runs `work` unless `api_key` is blank, turning every failure into
/// `fallback(message)`. `work` is never polled without a key.
pub(crate) async fn guarded<T, F, Fut>(node: &str, api_key: &str, fallback: F, work: Fut) -> T
where
    F: FnOnce(String) -> T,
    Fut: Future<Output = Result<T>>,
{
    if api_key.trim().is_empty() {
        tracing::warn!("{}: no API key provided", node);
        return fallback(MISSING_KEY.to_string());
    }
    match work.await {
        Ok(output) => output,
        Err(e) => {
            tracing::error!("{} failed: {}", node, e);
            fallback(describe_error(&e))
        }
    }
}

/// `text` unless it is empty.
pub(crate) fn or_default(text: String, default: impl Into<String>) -> String {
    if text.trim().is_empty() {
        default.into()
    } else {
        text
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_error_prefixes() {
        let api = Error::Api {
            message: "quota".to_string(),
            status: Some(429),
            body: None,
        };
        assert_eq!(
            describe_error(&api),
            "API error: API request failed (status 429): quota"
        );
        assert_eq!(
            describe_error(&Error::InvalidInput("bad".to_string())),
            "Error: Invalid input: bad"
        );
    }

    #[tokio::test]
    async fn test_guarded_skips_work_without_key() {
        let polled = std::sync::atomic::AtomicBool::new(false);
        let out = guarded("Test", "  ", |msg| msg, async {
            polled.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok("ran".to_string())
        })
        .await;

        assert_eq!(out, MISSING_KEY);
        assert!(!polled.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_guarded_maps_errors() {
        let out: String = guarded("Test", "key", |msg| msg, async {
            Err(Error::OperationTimeout {
                name: "op".to_string(),
                waited: Duration::from_secs(30),
            })
        })
        .await;
        assert!(out.starts_with("API error: Operation op"));
    }

    #[test]
    fn test_from_config_sets_client_defaults() {
        let config = Config {
            timeout_secs: 5,
            max_retries: 0,
            ..Config::default()
        };
        let settings = NodeContext::from_config(&config).settings("k");
        assert_eq!(settings.api_key, "k");
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(settings.max_retries, 0);
    }

    #[tokio::test]
    async fn test_nodes_build_clients_from_context_defaults() {
        use crate::gemini::MockGeminiApi;

        let (ctx, provider) = test_support::context(MockGeminiApi::new().with_text_response("ok"));
        let ctx = ctx.with_client_defaults(Duration::from_secs(7), 1);

        let text = Text {
            prompt: "hi".to_string(),
            api_key: "k".to_string(),
            ..Text::default()
        };
        assert_eq!(text.run(&ctx).await.text, "ok");
        let settings = provider.last_settings().unwrap();
        assert_eq!(settings.timeout, Duration::from_secs(7));
        assert_eq!(settings.max_retries, 1);

        let image = ImageGen {
            prompt: "a cat".to_string(),
            api_key: "k".to_string(),
            ..ImageGen::default()
        };
        image.run(&ctx).await;
        let settings = provider.last_settings().unwrap();
        assert_eq!(settings.timeout, Duration::from_secs(120));
        assert_eq!(settings.max_retries, 1);
    }

    #[test]
    fn test_or_default() {
        assert_eq!(or_default(String::new(), "fallback"), "fallback");
        assert_eq!(or_default("kept".to_string(), "fallback"), "kept");
    }
}
