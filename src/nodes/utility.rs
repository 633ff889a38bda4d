use super::options::{InfoFormat, ModelFilter};
use super::{describe_error, Node, NodeContext};
use crate::gemini::catalog::{supports_thinking, ModelKind};
use crate::gemini::client::DEFAULT_TIMEOUT;
use crate::gemini::retry::DEFAULT_MAX_RETRIES;
use crate::gemini::ClientSettings;
use async_trait::async_trait;
use serde::Serialize;

/// Credential pass-through that can optionally prove the key works.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_key: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub validate_key: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            max_retries: DEFAULT_MAX_RETRIES,
            validate_key: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiConfigOutput {
    /// The key, or empty when it is missing or failed validation.
    pub api_key: String,
    pub status: String,
}

#[async_trait]
impl Node for ApiConfig {
    const NAME: &'static str = "GeminiApiConfig";
    type Output = ApiConfigOutput;

    async fn run(&self, ctx: &NodeContext) -> ApiConfigOutput {
        if self.api_key.trim().is_empty() {
            return ApiConfigOutput {
                api_key: String::new(),
                status: "Error: please provide an API key".to_string(),
            };
        }

        let mut status = vec![
            format!("timeout: {}s", self.timeout_secs),
            format!("retries: {}", self.max_retries),
        ];
        if self.validate_key {
            let settings = ClientSettings::new(&self.api_key)
                .with_timeout_secs(30)
                .with_max_retries(1);
            match ctx.client(&settings).list_models().await {
                Ok(models) => status.push(format!("key valid, {} models available", models.len())),
                Err(e) => {
                    tracing::warn!("API key validation failed: {}", e);
                    return ApiConfigOutput {
                        api_key: String::new(),
                        status: format!("Validation failed: {}", describe_error(&e)),
                    };
                }
            }
        } else {
            status.push("key not validated".to_string());
        }

        ApiConfigOutput {
            api_key: self.api_key.clone(),
            status: status.join(" | "),
        }
    }
}

/// Lists the built-in model catalog. Works offline; the key is accepted for
/// graph compatibility only.
#[derive(Debug, Clone, Default)]
pub struct ModelInfo {
    pub api_key: String,
    pub filter: ModelFilter,
    pub format: InfoFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct CatalogEntry {
    name: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    endpoint: &'static str,
    thinking: bool,
}

impl ModelInfo {
    fn entries(&self) -> Vec<CatalogEntry> {
        let kinds: &[ModelKind] = match self.filter {
            ModelFilter::All => &[
                ModelKind::Text,
                ModelKind::Image,
                ModelKind::Imagen,
                ModelKind::Video,
            ],
            ModelFilter::Text => &[ModelKind::Text],
            ModelFilter::Image => &[ModelKind::Image, ModelKind::Imagen],
            ModelFilter::Video => &[ModelKind::Video],
        };
        kinds
            .iter()
            .flat_map(|kind| {
                kind.models().iter().map(move |&name| CatalogEntry {
                    name,
                    kind: kind.label(),
                    endpoint: kind.endpoint(),
                    thinking: *kind == ModelKind::Text && supports_thinking(name),
                })
            })
            .collect()
    }

    pub fn describe(&self) -> String {
        let entries = self.entries();
        match self.format {
            InfoFormat::List => entries
                .iter()
                .map(|e| format!("• {} ({})", e.name, e.kind))
                .collect::<Vec<_>>()
                .join("\n"),
            InfoFormat::Detailed => entries
                .iter()
                .map(|e| {
                    format!(
                        "• {}\n  type: {}\n  endpoint: {}\n  thinking: {}",
                        e.name,
                        e.kind,
                        e.endpoint,
                        if e.thinking { "yes" } else { "no" }
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"),
            InfoFormat::Json => serde_json::to_string_pretty(&entries).unwrap_or_default(),
        }
    }
}

#[async_trait]
impl Node for ModelInfo {
    const NAME: &'static str = "GeminiModelInfo";
    type Output = String;

    async fn run(&self, _ctx: &NodeContext) -> String {
        self.describe()
    }
}

/// Joins prompt fragments, skipping blank ones.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    pub subject: String,
    pub action: String,
    pub environment: String,
    pub style: String,
    pub lighting: String,
    pub quality_tags: String,
    pub additional: String,
    pub separator: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            subject: String::new(),
            action: String::new(),
            environment: String::new(),
            style: String::new(),
            lighting: String::new(),
            quality_tags: "masterpiece, best quality, highly detailed".to_string(),
            additional: String::new(),
            separator: ", ".to_string(),
        }
    }
}

impl PromptBuilder {
    pub fn build(&self) -> String {
        [
            &self.subject,
            &self.action,
            &self.environment,
            &self.style,
            &self.lighting,
            &self.quality_tags,
            &self.additional,
        ]
        .iter()
        .map(|fragment| fragment.trim())
        .filter(|fragment| !fragment.is_empty())
        .collect::<Vec<_>>()
        .join(&self.separator)
    }
}

#[async_trait]
impl Node for PromptBuilder {
    const NAME: &'static str = "PromptBuilder";
    type Output = String;

    async fn run(&self, _ctx: &NodeContext) -> String {
        self.build()
    }
}
