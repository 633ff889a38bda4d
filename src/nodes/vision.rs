use super::options::{AnalysisFormat, DocumentTask, ResponseLanguage};
use super::{guarded, Node, NodeContext};
use crate::gemini::{
    extract_json_object, parse_text_response, Content, GenerateContentRequest, Part,
};
use crate::media::tensor::png_base64;
use crate::media::{attachment_mime, ImageTensor};
use crate::{Error, Result};
use async_trait::async_trait;
use base64::Engine as _;
use std::path::Path;

/// Frames of a batch sent per request.
pub const MAX_VISION_IMAGES: usize = 5;

/// Describes or tags an image batch.
#[derive(Debug, Clone)]
pub struct VisionAnalyze {
    pub images: ImageTensor,
    pub prompt: String,
    pub model: String,
    pub api_key: String,
    pub output_format: AnalysisFormat,
    pub language: ResponseLanguage,
}

impl Default for VisionAnalyze {
    fn default() -> Self {
        Self {
            images: ImageTensor::placeholder(),
            prompt: "Describe this image in detail.".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key: String::new(),
            output_format: AnalysisFormat::default(),
            language: ResponseLanguage::default(),
        }
    }
}

impl VisionAnalyze {
    fn full_prompt(&self) -> String {
        format!(
            "{}\n\n{}\n{}",
            self.prompt,
            self.output_format.guide(),
            self.language.guide()
        )
    }

    async fn analyze(&self, ctx: &NodeContext) -> Result<String> {
        let mut parts = vec![Part::text(self.full_prompt())];
        for frame in self.images.to_frames().iter().take(MAX_VISION_IMAGES) {
            parts.push(Part::inline("image/png", png_base64(frame)?));
        }
        let request = GenerateContentRequest::from_contents(vec![Content::new(parts)]);
        let response = ctx
            .client(&ctx.settings(&self.api_key))
            .generate_content(&self.model, &request)
            .await?;
        Ok(parse_text_response(&response))
    }
}

#[async_trait]
impl Node for VisionAnalyze {
    const NAME: &'static str = "GeminiVisionAnalyze";
    type Output = String;

    async fn run(&self, ctx: &NodeContext) -> String {
        guarded(Self::NAME, &self.api_key, |msg| msg, self.analyze(ctx)).await
    }
}

/// Summarizes, extracts from or answers questions about a local document.
#[derive(Debug, Clone)]
pub struct DocumentProcess {
    pub file_path: String,
    pub prompt: String,
    pub model: String,
    pub api_key: String,
    pub task: DocumentTask,
}

impl Default for DocumentProcess {
    fn default() -> Self {
        Self {
            file_path: String::new(),
            prompt: "Summarize the main content of this document.".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key: String::new(),
            task: DocumentTask::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentOutput {
    pub result: String,
    /// Pretty-printed JSON for the structured-data task, empty otherwise.
    pub structured: String,
}

impl DocumentOutput {
    fn failed(result: String) -> Self {
        Self {
            result,
            structured: String::new(),
        }
    }
}

impl DocumentProcess {
    async fn process(&self, ctx: &NodeContext) -> Result<DocumentOutput> {
        let path = Path::new(self.file_path.trim());
        if self.file_path.trim().is_empty() || !path.is_file() {
            return Err(Error::InvalidInput(format!(
                "file not found: '{}'",
                self.file_path
            )));
        }
        let bytes = std::fs::read(path)?;
        let parts = vec![
            Part::text(format!("{}\n\n{}", self.prompt, self.task.guide())),
            Part::inline(
                attachment_mime(path, &bytes),
                base64::engine::general_purpose::STANDARD.encode(&bytes),
            ),
        ];

        let settings = ctx.settings(&self.api_key).with_timeout_secs(120);
        let response = ctx
            .client(&settings)
            .generate_content(
                &self.model,
                &GenerateContentRequest::from_contents(vec![Content::new(parts)]),
            )
            .await?;
        let result = parse_text_response(&response);

        let structured = match self.task {
            DocumentTask::Json => structured_json(&result),
            _ => String::new(),
        };
        Ok(DocumentOutput { result, structured })
    }
}

/// Pretty JSON of the object embedded in `text`; the raw text when the braces
/// do not parse; empty when there is no object at all.
fn structured_json(text: &str) -> String {
    match extract_json_object(text) {
        Some(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| text.to_string()),
        None if text.contains('{') => text.to_string(),
        None => String::new(),
    }
}

#[async_trait]
impl Node for DocumentProcess {
    const NAME: &'static str = "GeminiDocumentProcess";
    type Output = DocumentOutput;

    async fn run(&self, ctx: &NodeContext) -> DocumentOutput {
        guarded(
            Self::NAME,
            &self.api_key,
            DocumentOutput::failed,
            self.process(ctx),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::MockGeminiApi;
    use crate::nodes::test_support::context;
    use crate::nodes::MISSING_KEY;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_vision_without_key() {
        let (ctx, provider) = context(MockGeminiApi::new());
        assert_eq!(VisionAnalyze::default().run(&ctx).await, MISSING_KEY);
        assert_eq!(provider.clients_built(), 0);
    }

    #[tokio::test]
    async fn test_vision_caps_batch_at_five_frames() {
        let (ctx, provider) = context(MockGeminiApi::new().with_text_response("seven cats"));
        let frames: Vec<_> = (0..7)
            .map(|i| ::image::RgbImage::from_pixel(2, 2, ::image::Rgb([i * 30, 0, 0])))
            .collect();
        let node = VisionAnalyze {
            images: ImageTensor::from_frames(&frames).unwrap(),
            prompt: "What is this?".to_string(),
            api_key: "k".to_string(),
            output_format: AnalysisFormat::Tags,
            language: ResponseLanguage::Japanese,
            ..VisionAnalyze::default()
        };

        assert_eq!(node.run(&ctx).await, "seven cats");

        let body = provider.api().last_content_body().unwrap();
        let parts = body["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 1 + MAX_VISION_IMAGES);
        assert_eq!(
            parts[0]["text"],
            "What is this?\n\nList the key tags, separated by commas.\n日本語で回答してください。"
        );
        assert!(parts[1..].iter().all(|p| p["inlineData"]["mimeType"] == "image/png"));
    }

    #[tokio::test]
    async fn test_document_missing_file() {
        let (ctx, provider) = context(MockGeminiApi::new());
        let node = DocumentProcess {
            file_path: "/no/such/file.pdf".to_string(),
            api_key: "k".to_string(),
            ..DocumentProcess::default()
        };

        let out = node.run(&ctx).await;
        assert_eq!(
            out,
            DocumentOutput::failed("Error: Invalid input: file not found: '/no/such/file.pdf'".to_string())
        );
        assert_eq!(provider.api().get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_document_without_key_checks_key_first() {
        let (ctx, provider) = context(MockGeminiApi::new());
        let out = DocumentProcess::default().run(&ctx).await;
        assert_eq!(out, DocumentOutput::failed(MISSING_KEY.to_string()));
        assert_eq!(provider.clients_built(), 0);
    }

    #[tokio::test]
    async fn test_document_json_task() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("invoice.pdf");
        std::fs::write(&file, b"%PDF-1.4").unwrap();

        let reply = "Here you go:\n```json\n{\"total\": 12.5}\n```";
        let (ctx, provider) = context(MockGeminiApi::new().with_text_response(reply));
        let node = DocumentProcess {
            file_path: file.display().to_string(),
            prompt: "Extract the total.".to_string(),
            api_key: "k".to_string(),
            task: DocumentTask::Json,
            ..DocumentProcess::default()
        };

        let out = node.run(&ctx).await;
        assert_eq!(out.result, reply);
        assert_eq!(out.structured, "{\n  \"total\": 12.5\n}");

        let body = provider.api().last_content_body().unwrap();
        assert_eq!(
            body["contents"][0]["parts"],
            json!([
                { "text": "Extract the total.\n\nOutput the result as JSON." },
                { "inlineData": { "mimeType": "application/pdf", "data": "JVBERi0xLjQ=" } }
            ])
        );
    }

    #[test]
    fn test_structured_json_fallbacks() {
        assert_eq!(structured_json("no object here"), "");
        assert_eq!(structured_json("{broken"), "{broken");
    }
}
