use super::options::{EnhancementLevel, PromptLanguage, TargetStyle, ThinkingLevel};
use super::{guarded, Node, NodeContext};
use crate::gemini::catalog::supports_thinking_level;
use crate::gemini::{
    extract_json_object, parse_text_response, split_thoughts, GenerateContentRequest,
    GenerationConfig, ThinkingConfig,
};
use crate::prompts::{render, OPTIMIZER_SYSTEM, OPTIMIZER_USER};
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;

pub const THINKING_HIDDEN: &str = "[thinking hidden]";

/// JSON generation constrained by a response schema.
#[derive(Debug, Clone)]
pub struct StructuredOutput {
    pub prompt: String,
    pub json_schema: String,
    pub model: String,
    pub api_key: String,
    pub system_instruction: String,
}

impl Default for StructuredOutput {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            json_schema: "{\n  \"type\": \"object\",\n  \"properties\": {\n    \"name\": {\"type\": \"string\"}\n  }\n}".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key: String::new(),
            system_instruction: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredOutputResult {
    /// Pretty-printed reply, or the raw reply if it is not valid JSON.
    pub json: String,
    pub raw: String,
}

impl StructuredOutput {
    async fn generate(&self, ctx: &NodeContext) -> Result<StructuredOutputResult> {
        let schema: Value = match serde_json::from_str(&self.json_schema) {
            Ok(schema) => schema,
            Err(e) => {
                return Ok(StructuredOutputResult {
                    json: String::new(),
                    raw: format!("JSON schema parse error: {}", e),
                })
            }
        };

        let request = GenerateContentRequest::from_prompt(self.prompt.as_str())
            .with_system_instruction(Some(self.system_instruction.as_str()))
            .with_generation_config(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(schema),
                ..GenerationConfig::default()
            });
        let response = ctx
            .client(&ctx.settings(&self.api_key))
            .generate_content(&self.model, &request)
            .await?;

        let raw = parse_text_response(&response);
        let json = serde_json::from_str::<Value>(&raw)
            .ok()
            .and_then(|value| serde_json::to_string_pretty(&value).ok())
            .unwrap_or_else(|| raw.clone());
        Ok(StructuredOutputResult { json, raw })
    }
}

#[async_trait]
impl Node for StructuredOutput {
    const NAME: &'static str = "GeminiStructuredOutput";
    type Output = StructuredOutputResult;

    async fn run(&self, ctx: &NodeContext) -> StructuredOutputResult {
        guarded(
            Self::NAME,
            &self.api_key,
            |raw| StructuredOutputResult {
                json: String::new(),
                raw,
            },
            self.generate(ctx),
        )
        .await
    }
}

/// Rewrites a rough prompt for a target image generator.
#[derive(Debug, Clone)]
pub struct PromptOptimizer {
    pub raw_prompt: String,
    pub target_style: TargetStyle,
    pub model: String,
    pub api_key: String,
    pub level: EnhancementLevel,
    pub include_negative: bool,
    pub language: PromptLanguage,
}

impl Default for PromptOptimizer {
    fn default() -> Self {
        Self {
            raw_prompt: String::new(),
            target_style: TargetStyle::default(),
            model: "gemini-2.5-flash".to_string(),
            api_key: String::new(),
            level: EnhancementLevel::default(),
            include_negative: true,
            language: PromptLanguage::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptimizedPrompt {
    pub positive: String,
    pub negative: String,
    pub explanation: String,
}

impl OptimizedPrompt {
    fn failed(explanation: String) -> Self {
        Self {
            explanation,
            ..Self::default()
        }
    }

    fn from_reply(reply: String, include_negative: bool) -> Self {
        let Some(parsed) = extract_json_object(&reply) else {
            return Self {
                positive: reply,
                negative: String::new(),
                explanation: "Could not parse structured output".to_string(),
            };
        };
        let field = |key: &str| {
            parsed
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            positive: field("positive_prompt"),
            negative: if include_negative {
                field("negative_prompt")
            } else {
                String::new()
            },
            explanation: field("explanation"),
        }
    }
}

impl PromptOptimizer {
    fn system_instruction(&self) -> String {
        let negative = if self.include_negative {
            "Include a negative prompt listing what to avoid."
        } else {
            "Leave negative_prompt empty."
        };
        render(
            OPTIMIZER_SYSTEM,
            &[
                ("style", self.target_style.label()),
                ("level", self.level.label()),
                ("language", self.language.label()),
                ("negative", negative),
            ],
        )
    }

    async fn optimize(&self, ctx: &NodeContext) -> Result<OptimizedPrompt> {
        let system = self.system_instruction();
        let request = GenerateContentRequest::from_prompt(render(
            OPTIMIZER_USER,
            &[("prompt", self.raw_prompt.as_str())],
        ))
        .with_system_instruction(Some(system.as_str()));
        let response = ctx
            .client(&ctx.settings(&self.api_key))
            .generate_content(&self.model, &request)
            .await?;
        Ok(OptimizedPrompt::from_reply(
            parse_text_response(&response),
            self.include_negative,
        ))
    }
}

#[async_trait]
impl Node for PromptOptimizer {
    const NAME: &'static str = "GeminiPromptOptimizer";
    type Output = OptimizedPrompt;

    async fn run(&self, ctx: &NodeContext) -> OptimizedPrompt {
        guarded(
            Self::NAME,
            &self.api_key,
            OptimizedPrompt::failed,
            self.optimize(ctx),
        )
        .await
    }
}

/// Extended reasoning with the thought summary split from the answer.
#[derive(Debug, Clone)]
pub struct Thinking {
    pub prompt: String,
    pub model: String,
    pub api_key: String,
    pub level: ThinkingLevel,
    pub thinking_budget: u32,
    pub show_thinking: bool,
}

impl Default for Thinking {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            model: "gemini-2.5-pro".to_string(),
            api_key: String::new(),
            level: ThinkingLevel::default(),
            thinking_budget: 4096,
            show_thinking: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThinkingOutput {
    pub answer: String,
    pub thinking: String,
}

impl Thinking {
    async fn think(&self, ctx: &NodeContext) -> Result<ThinkingOutput> {
        let thinking_level = supports_thinking_level(&self.model).then(|| self.level.label().to_string());
        let request = GenerateContentRequest::from_prompt(self.prompt.as_str())
            .with_generation_config(GenerationConfig {
                thinking_config: Some(ThinkingConfig {
                    thinking_budget: self.thinking_budget,
                    thinking_level,
                    include_thoughts: Some(true),
                }),
                ..GenerationConfig::default()
            });

        let settings = ctx.settings(&self.api_key).with_timeout_secs(180);
        let response = ctx
            .client(&settings)
            .generate_content(&self.model, &request)
            .await?;

        let split = split_thoughts(&response);
        Ok(ThinkingOutput {
            answer: split.answer,
            thinking: if self.show_thinking {
                split.thoughts.join("\n")
            } else {
                THINKING_HIDDEN.to_string()
            },
        })
    }
}

#[async_trait]
impl Node for Thinking {
    const NAME: &'static str = "GeminiThinking";
    type Output = ThinkingOutput;

    async fn run(&self, ctx: &NodeContext) -> ThinkingOutput {
        guarded(
            Self::NAME,
            &self.api_key,
            |answer| ThinkingOutput {
                answer,
                thinking: String::new(),
            },
            self.think(ctx),
        )
        .await
    }
}
