//! Prompt-plus-attachments image generation in the style of the host's
//! built-in Gemini image node.

use super::image::{ImageOutput, IMAGE_TIMEOUT_SECS};
use super::options::{aspect_override, ResponseMode, Resolution, SeedControl};
use super::{guarded, Node, NodeContext};
use crate::gemini::{Content, GenerateContentRequest, ImageConfig, Part};
use crate::media::tensor::tensor_to_png_base64;
use crate::media::{attachment_mime, ImageTensor};
use crate::prompts::IMAGE_SYSTEM;
use crate::Result;
use async_trait::async_trait;
use base64::Engine as _;
use std::path::Path;

const PRO_TIMEOUT_SECS: u64 = 180;

/// Widget values shared by both variants.
#[derive(Debug, Clone)]
pub struct BananaInputs {
    pub prompt: String,
    pub model: String,
    pub seed: u64,
    pub seed_control: SeedControl,
    pub aspect_ratio: String,
    pub response_mode: ResponseMode,
    pub api_key: String,
    pub image: Option<ImageTensor>,
    /// Optional file sent as an extra inline attachment.
    pub file_path: String,
    /// Blank falls back to the built-in image-engine instruction.
    pub system_prompt: String,
}

impl BananaInputs {
    fn parts(&self) -> Result<Vec<Part>> {
        let mut parts = Vec::new();
        if let Some(image) = &self.image {
            parts.push(Part::inline("image/png", tensor_to_png_base64(image)?));
        }
        if let Some(part) = file_part(&self.file_path)? {
            parts.push(part);
        }
        parts.push(Part::text(self.prompt.as_str()));
        Ok(parts)
    }

    fn system_prompt(&self) -> &str {
        if self.system_prompt.trim().is_empty() {
            IMAGE_SYSTEM.trim_end()
        } else {
            &self.system_prompt
        }
    }

    async fn generate(
        &self,
        ctx: &NodeContext,
        image_config: Option<ImageConfig>,
        timeout_secs: u64,
        generated: String,
    ) -> Result<ImageOutput> {
        let request = GenerateContentRequest::from_contents(vec![Content::new(self.parts()?)])
            .with_system_instruction(Some(self.system_prompt()))
            .with_response_modalities(self.response_mode.modalities())
            .with_image_config(image_config);

        let settings = ctx.settings(&self.api_key).with_timeout_secs(timeout_secs);
        let response = ctx
            .client(&settings)
            .generate_content(&self.model, &request)
            .await?;
        ImageOutput::from_response(
            &response,
            ImageTensor::placeholder(),
            generated,
            "No image was generated",
        )
    }
}

/// Inline part for `path`; a blank path means no attachment and a missing
/// file is skipped with a warning.
fn file_part(path: &str) -> Result<Option<Part>> {
    let path = path.trim();
    if path.is_empty() {
        return Ok(None);
    }
    let path = Path::new(path);
    if !path.is_file() {
        tracing::warn!("Attachment {} not found, skipping", path.display());
        return Ok(None);
    }
    let bytes = std::fs::read(path)?;
    let mime = attachment_mime(path, &bytes);
    let data = base64::engine::general_purpose::STANDARD.encode(&bytes);
    Ok(Some(Part::inline(mime, data)))
}

/// Gemini 2.5 Flash image generation.
#[derive(Debug, Clone)]
pub struct NanoBanana {
    pub inputs: BananaInputs,
}

impl Default for NanoBanana {
    fn default() -> Self {
        Self {
            inputs: BananaInputs {
                prompt: String::new(),
                model: "gemini-2.5-flash-image".to_string(),
                seed: 0,
                seed_control: SeedControl::Randomize,
                aspect_ratio: "auto".to_string(),
                response_mode: ResponseMode::default(),
                api_key: String::new(),
                image: None,
                file_path: String::new(),
                system_prompt: IMAGE_SYSTEM.trim_end().to_string(),
            },
        }
    }
}

#[async_trait]
impl Node for NanoBanana {
    const NAME: &'static str = "NanoBanana";
    type Output = ImageOutput;

    async fn run(&self, ctx: &NodeContext) -> ImageOutput {
        let inputs = &self.inputs;
        // The seed is reported, not sent: the endpoint has no seed parameter.
        let seed = inputs.seed_control.apply(inputs.seed);
        let image_config = aspect_override(&inputs.aspect_ratio).map(ImageConfig::aspect);
        guarded(
            Self::NAME,
            &inputs.api_key,
            ImageOutput::placeholder,
            inputs.generate(
                ctx,
                image_config,
                IMAGE_TIMEOUT_SECS,
                format!("Generated (seed: {})", seed),
            ),
        )
        .await
    }
}

/// Gemini 3 Pro image generation; resolution and aspect ratio are always sent.
#[derive(Debug, Clone)]
pub struct NanoBananaPro {
    pub inputs: BananaInputs,
    pub resolution: Resolution,
}

impl Default for NanoBananaPro {
    fn default() -> Self {
        Self {
            inputs: BananaInputs {
                model: "gemini-3-pro-image-preview".to_string(),
                seed: 12345,
                seed_control: SeedControl::Fixed,
                aspect_ratio: "16:9".to_string(),
                ..NanoBanana::default().inputs
            },
            resolution: Resolution::K2,
        }
    }
}

#[async_trait]
impl Node for NanoBananaPro {
    const NAME: &'static str = "NanoBananaPro";
    type Output = ImageOutput;

    async fn run(&self, ctx: &NodeContext) -> ImageOutput {
        let inputs = &self.inputs;
        let seed = inputs.seed_control.apply(inputs.seed);
        let image_config = ImageConfig {
            aspect_ratio: Some(inputs.aspect_ratio.clone()),
            image_size: Some(self.resolution.label().to_string()),
        };
        guarded(
            Self::NAME,
            &inputs.api_key,
            ImageOutput::placeholder,
            inputs.generate(
                ctx,
                Some(image_config),
                PRO_TIMEOUT_SECS,
                format!("Generated (seed: {}, {})", seed, self.resolution),
            ),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::MockGeminiApi;
    use crate::nodes::test_support::{context, image_reply, png_base64};
    use crate::nodes::MISSING_KEY;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn banana(prompt: &str) -> NanoBanana {
        let mut node = NanoBanana::default();
        node.inputs.prompt = prompt.to_string();
        node.inputs.api_key = "k".to_string();
        node
    }

    #[tokio::test]
    async fn test_without_key() {
        let (ctx, provider) = context(MockGeminiApi::new());
        assert_eq!(
            NanoBanana::default().run(&ctx).await,
            ImageOutput::placeholder(MISSING_KEY.to_string())
        );
        assert_eq!(
            NanoBananaPro::default().run(&ctx).await,
            ImageOutput::placeholder(MISSING_KEY.to_string())
        );
        assert_eq!(provider.clients_built(), 0);
    }

    #[tokio::test]
    async fn test_auto_aspect_sends_no_image_config() {
        let (ctx, provider) = context(MockGeminiApi::new().with_content_response(image_reply(None)));
        let mut node = banana("a banana on the moon");
        node.inputs.seed = 7;
        node.inputs.seed_control = SeedControl::Increment;

        let out = node.run(&ctx).await;
        assert_eq!(out.text, "Generated (seed: 8)");

        let body = provider.api().last_content_body().unwrap();
        assert_eq!(
            body["generationConfig"],
            json!({ "responseModalities": ["Text", "Image"] })
        );
        assert_eq!(
            body["system_instruction"]["parts"][0]["text"],
            IMAGE_SYSTEM.trim_end()
        );
        assert!(body.get("seed").is_none());
    }

    #[tokio::test]
    async fn test_attachments_precede_prompt() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("notes.txt");
        std::fs::write(&file, "hello").unwrap();

        let (ctx, provider) = context(MockGeminiApi::new().with_content_response(image_reply(None)));
        let mut node = banana("use these");
        node.inputs.image = Some(ImageTensor::new(1, 1, 2, vec![1.0, 0.0, 0.0, 0.0, 0.0, 1.0]).unwrap());
        node.inputs.file_path = file.display().to_string();
        node.inputs.system_prompt = "   ".to_string();
        node.inputs.aspect_ratio = "3:2".to_string();

        node.run(&ctx).await;
        let body = provider.api().last_content_body().unwrap();
        assert_eq!(
            body["contents"][0]["parts"],
            json!([
                { "inlineData": { "mimeType": "image/png", "data": png_base64() } },
                { "inlineData": { "mimeType": "text/plain", "data": "aGVsbG8=" } },
                { "text": "use these" }
            ])
        );
        assert_eq!(body["generationConfig"]["imageConfig"], json!({ "aspectRatio": "3:2" }));
        assert_eq!(
            body["system_instruction"]["parts"][0]["text"],
            IMAGE_SYSTEM.trim_end()
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_skipped() {
        let (ctx, provider) = context(MockGeminiApi::new().with_content_response(image_reply(None)));
        let mut node = banana("p");
        node.inputs.file_path = "/definitely/not/here.png".to_string();

        node.run(&ctx).await;
        let body = provider.api().last_content_body().unwrap();
        assert_eq!(body["contents"][0]["parts"], json!([{ "text": "p" }]));
    }

    #[tokio::test]
    async fn test_pro_always_sends_size() {
        let (ctx, provider) = context(MockGeminiApi::new().with_content_response(image_reply(None)));
        let mut node = NanoBananaPro {
            resolution: Resolution::K4,
            ..NanoBananaPro::default()
        };
        node.inputs.api_key = "k".to_string();
        node.inputs.response_mode = ResponseMode::ImageOnly;

        let out = node.run(&ctx).await;
        assert_eq!(out.text, "Generated (seed: 12345, 4K)");
        assert_eq!(provider.last_settings().unwrap().timeout.as_secs(), 180);

        let body = provider.api().last_content_body().unwrap();
        assert_eq!(
            body["generationConfig"],
            json!({
                "responseModalities": ["Image"],
                "imageConfig": { "aspectRatio": "16:9", "imageSize": "4K" }
            })
        );
    }

    #[tokio::test]
    async fn test_model_text_wins_over_status() {
        let (ctx, _) = context(
            MockGeminiApi::new().with_content_response(image_reply(Some("Here is your banana"))),
        );
        let out = banana("p").run(&ctx).await;
        assert_eq!(out.text, "Here is your banana");
    }

    #[tokio::test]
    async fn test_api_failure_gives_placeholder() {
        let (ctx, _) = context(MockGeminiApi::new().with_failure(403, "permission denied"));
        let out = banana("p").run(&ctx).await;

        assert_eq!(out.image, ImageTensor::placeholder());
        assert_eq!(
            out.text,
            "API error: API request failed (status 403): permission denied"
        );
    }
}
