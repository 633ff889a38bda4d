use super::{guarded, Node, NodeContext};
use crate::gemini::catalog::supports_thinking;
use crate::gemini::{
    parse_answer_text, parse_text_response, split_thoughts, Content, GenerateContentRequest,
    GenerationConfig, Part, ThinkingConfig,
};
use crate::Result;
use async_trait::async_trait;

/// Single-turn text generation.
#[derive(Debug, Clone)]
pub struct Text {
    pub prompt: String,
    pub model: String,
    pub api_key: String,
    pub system_instruction: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub enable_thinking: bool,
    pub thinking_budget: u32,
}

impl Default for Text {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            model: "gemini-2.5-flash".to_string(),
            api_key: String::new(),
            system_instruction: String::new(),
            temperature: 1.0,
            max_output_tokens: 8192,
            enable_thinking: false,
            thinking_budget: 1024,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextOutput {
    pub text: String,
    /// First thought summary, when thinking was requested.
    pub thinking: String,
}

impl TextOutput {
    fn failed(message: String) -> Self {
        Self {
            text: message,
            thinking: String::new(),
        }
    }
}

impl Text {
    fn request(&self) -> GenerateContentRequest {
        let thinking_config = (self.enable_thinking && supports_thinking(&self.model)).then(|| {
            ThinkingConfig {
                thinking_budget: self.thinking_budget,
                include_thoughts: Some(true),
                ..ThinkingConfig::default()
            }
        });
        GenerateContentRequest::from_prompt(self.prompt.as_str())
            .with_system_instruction(Some(self.system_instruction.as_str()))
            .with_generation_config(GenerationConfig {
                temperature: Some(self.temperature),
                max_output_tokens: Some(self.max_output_tokens),
                thinking_config,
                ..GenerationConfig::default()
            })
    }

    async fn generate(&self, ctx: &NodeContext) -> Result<TextOutput> {
        let client = ctx.client(&ctx.settings(&self.api_key));
        let response = client.generate_content(&self.model, &self.request()).await?;
        Ok(TextOutput {
            text: parse_answer_text(&response),
            thinking: split_thoughts(&response)
                .thoughts
                .into_iter()
                .next()
                .unwrap_or_default(),
        })
    }
}

#[async_trait]
impl Node for Text {
    const NAME: &'static str = "GeminiText";
    type Output = TextOutput;

    async fn run(&self, ctx: &NodeContext) -> TextOutput {
        guarded(
            Self::NAME,
            &self.api_key,
            TextOutput::failed,
            self.generate(ctx),
        )
        .await
    }
}

/// Multi-turn chat over a JSON-encoded history of role-tagged messages.
#[derive(Debug, Clone)]
pub struct Chat {
    pub message: String,
    pub model: String,
    pub api_key: String,
    /// JSON array of `{role, parts}`; empty for a new conversation.
    pub history: String,
    pub system_instruction: String,
    pub max_history_turns: usize,
}

impl Default for Chat {
    fn default() -> Self {
        Self {
            message: String::new(),
            model: "gemini-2.5-flash".to_string(),
            api_key: String::new(),
            history: String::new(),
            system_instruction: String::new(),
            max_history_turns: 10,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatOutput {
    pub reply: String,
    pub history: String,
}

impl Chat {
    /// Stored history, trimmed to the last `max_history_turns` exchanges.
    fn prior_messages(&self) -> Result<Vec<Content>> {
        if self.history.trim().is_empty() {
            return Ok(Vec::new());
        }
        let mut messages: Vec<Content> = serde_json::from_str(&self.history)?;
        let keep = self.max_history_turns.max(1) * 2;
        if messages.len() > keep {
            messages.drain(..messages.len() - keep);
        }
        Ok(messages)
    }

    async fn send(&self, ctx: &NodeContext) -> Result<ChatOutput> {
        let mut messages = self.prior_messages()?;
        messages.push(Content::with_role(
            "user",
            vec![Part::text(self.message.as_str())],
        ));

        let client = ctx.client(&ctx.settings(&self.api_key));
        let request = GenerateContentRequest::from_contents(messages)
            .with_system_instruction(Some(self.system_instruction.as_str()));
        let response = client.generate_content(&self.model, &request).await?;
        let reply = parse_text_response(&response);

        let mut messages = request.contents;
        messages.push(Content::with_role("model", vec![Part::text(reply.as_str())]));
        Ok(ChatOutput {
            reply,
            history: serde_json::to_string_pretty(&messages)?,
        })
    }
}

#[async_trait]
impl Node for Chat {
    const NAME: &'static str = "GeminiChat";
    type Output = ChatOutput;

    async fn run(&self, ctx: &NodeContext) -> ChatOutput {
        guarded(
            Self::NAME,
            &self.api_key,
            |reply| ChatOutput {
                reply,
                history: self.history.clone(),
            },
            self.send(ctx),
        )
        .await
    }
}
