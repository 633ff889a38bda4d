use super::options::{aspect_override, ResponseMode, Resolution};
use super::{guarded, or_default, Node, NodeContext};
use crate::gemini::catalog::supports_image_size;
use crate::gemini::{
    parse_image_response, parse_text_response, Content, GenerateContentRequest, ImageConfig,
    ImagenRequest, Part, ResponseEnvelope,
};
use crate::media::tensor::{bytes_to_tensor, tensor_to_png_base64};
use crate::media::ImageTensor;
use crate::Result;
use async_trait::async_trait;

pub(crate) const IMAGE_TIMEOUT_SECS: u64 = 120;

/// Image plus the model's commentary or a status line.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageOutput {
    pub image: ImageTensor,
    pub text: String,
}

impl ImageOutput {
    pub(crate) fn placeholder(text: String) -> Self {
        Self {
            image: ImageTensor::placeholder(),
            text,
        }
    }

    /// First image of `response`, or `fallback` when none came back.
    pub(crate) fn from_response(
        response: &ResponseEnvelope,
        fallback: ImageTensor,
        generated: impl Into<String>,
        missing: &str,
    ) -> Result<Self> {
        let text = parse_text_response(response);
        match parse_image_response(response).first() {
            Some(bytes) => Ok(Self {
                image: bytes_to_tensor(bytes)?,
                text: or_default(text, generated),
            }),
            None => {
                tracing::warn!("Response carried no image");
                Ok(Self {
                    image: fallback,
                    text: or_default(text, missing),
                })
            }
        }
    }
}

/// Text-to-image with the Gemini image models.
#[derive(Debug, Clone)]
pub struct ImageGen {
    pub prompt: String,
    pub model: String,
    pub aspect_ratio: String,
    pub api_key: String,
    /// `None` leaves the size to the model.
    pub image_size: Option<Resolution>,
    pub response_mode: ResponseMode,
}

impl Default for ImageGen {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            model: "gemini-2.5-flash-image".to_string(),
            aspect_ratio: "1:1".to_string(),
            api_key: String::new(),
            image_size: None,
            response_mode: ResponseMode::default(),
        }
    }
}

impl ImageGen {
    fn request(&self) -> GenerateContentRequest {
        let mut image_config = ImageConfig::aspect(&self.aspect_ratio);
        if supports_image_size(&self.model) {
            image_config.image_size = self.image_size.map(|size| size.label().to_string());
        }
        GenerateContentRequest::from_prompt(self.prompt.as_str())
            .with_response_modalities(self.response_mode.modalities())
            .with_image_config(Some(image_config))
    }

    async fn generate(&self, ctx: &NodeContext) -> Result<ImageOutput> {
        let settings = ctx.settings(&self.api_key).with_timeout_secs(IMAGE_TIMEOUT_SECS);
        let response = ctx
            .client(&settings)
            .generate_content(&self.model, &self.request())
            .await?;
        ImageOutput::from_response(
            &response,
            ImageTensor::placeholder(),
            "Image generated",
            "No image was generated",
        )
    }
}

#[async_trait]
impl Node for ImageGen {
    const NAME: &'static str = "GeminiImageGen";
    type Output = ImageOutput;

    async fn run(&self, ctx: &NodeContext) -> ImageOutput {
        guarded(
            Self::NAME,
            &self.api_key,
            ImageOutput::placeholder,
            self.generate(ctx),
        )
        .await
    }
}

/// Instruction-driven edit of an input image. Every failure hands the input
/// image back unchanged.
#[derive(Debug, Clone)]
pub struct ImageEdit {
    pub image: ImageTensor,
    pub prompt: String,
    pub model: String,
    pub api_key: String,
    /// `original` keeps the input's aspect ratio.
    pub aspect_ratio: String,
}

impl Default for ImageEdit {
    fn default() -> Self {
        Self {
            image: ImageTensor::placeholder(),
            prompt: String::new(),
            model: "gemini-2.5-flash-image".to_string(),
            api_key: String::new(),
            aspect_ratio: "original".to_string(),
        }
    }
}

impl ImageEdit {
    async fn edit(&self, ctx: &NodeContext) -> Result<ImageOutput> {
        let parts = vec![
            Part::text(self.prompt.as_str()),
            Part::inline("image/png", tensor_to_png_base64(&self.image)?),
        ];
        let request = GenerateContentRequest::from_contents(vec![Content::new(parts)])
            .with_response_modalities(ResponseMode::ImageAndText.modalities())
            .with_image_config(aspect_override(&self.aspect_ratio).map(ImageConfig::aspect));

        let settings = ctx.settings(&self.api_key).with_timeout_secs(IMAGE_TIMEOUT_SECS);
        let response = ctx
            .client(&settings)
            .generate_content(&self.model, &request)
            .await?;
        ImageOutput::from_response(
            &response,
            self.image.clone(),
            "Image edited",
            "No edited image was returned",
        )
    }
}

#[async_trait]
impl Node for ImageEdit {
    const NAME: &'static str = "GeminiImageEdit";
    type Output = ImageOutput;

    async fn run(&self, ctx: &NodeContext) -> ImageOutput {
        guarded(
            Self::NAME,
            &self.api_key,
            |text| ImageOutput {
                image: self.image.clone(),
                text,
            },
            self.edit(ctx),
        )
        .await
    }
}

/// Imagen `predict`, one sample.
#[derive(Debug, Clone)]
pub struct ImagenGenerate {
    pub prompt: String,
    pub model: String,
    pub aspect_ratio: String,
    pub api_key: String,
    /// 0 lets the service pick.
    pub seed: u64,
}

impl Default for ImagenGenerate {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            model: "imagen-3".to_string(),
            aspect_ratio: "1:1".to_string(),
            api_key: String::new(),
            seed: 0,
        }
    }
}

impl ImagenGenerate {
    async fn generate(&self, ctx: &NodeContext) -> Result<ImageOutput> {
        let seed = (self.seed > 0).then_some(self.seed);
        let request = ImagenRequest::new(&self.prompt, &self.aspect_ratio, 1, seed);
        let settings = ctx.settings(&self.api_key).with_timeout_secs(IMAGE_TIMEOUT_SECS);
        let response = ctx
            .client(&settings)
            .generate_image_predict(&self.model, &request)
            .await?;

        // Imagen replies carry no text, so the status line is always ours.
        match parse_image_response(&response).first() {
            Some(bytes) => Ok(ImageOutput {
                image: bytes_to_tensor(bytes)?,
                text: "Generated".to_string(),
            }),
            None => Ok(ImageOutput::placeholder(
                "No image was generated".to_string(),
            )),
        }
    }
}

#[async_trait]
impl Node for ImagenGenerate {
    const NAME: &'static str = "ImagenGenerate";
    type Output = ImageOutput;

    async fn run(&self, ctx: &NodeContext) -> ImageOutput {
        guarded(
            Self::NAME,
            &self.api_key,
            ImageOutput::placeholder,
            self.generate(ctx),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::{MockGeminiApi, RecordedCall};
    use crate::nodes::test_support::{context, image_reply, png_base64};
    use crate::nodes::MISSING_KEY;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn red_blue() -> ImageTensor {
        ImageTensor::new(1, 1, 2, vec![1.0, 0.0, 0.0, 0.0, 0.0, 1.0]).unwrap()
    }

    #[tokio::test]
    async fn test_image_gen_without_key() {
        let (ctx, provider) = context(MockGeminiApi::new());
        let out = ImageGen::default().run(&ctx).await;

        assert_eq!(out, ImageOutput::placeholder(MISSING_KEY.to_string()));
        assert_eq!(provider.clients_built(), 0);
    }

    #[tokio::test]
    async fn test_image_gen_decodes_first_image() {
        let (ctx, provider) = context(MockGeminiApi::new().with_content_response(image_reply(
            Some("A red and a blue pixel"),
        )));
        let node = ImageGen {
            prompt: "pixels".to_string(),
            api_key: "k".to_string(),
            aspect_ratio: "16:9".to_string(),
            image_size: Some(Resolution::K4),
            ..ImageGen::default()
        };

        let out = node.run(&ctx).await;
        assert_eq!(out.image, red_blue());
        assert_eq!(out.text, "A red and a blue pixel");
        assert_eq!(
            provider.last_settings().unwrap().timeout.as_secs(),
            IMAGE_TIMEOUT_SECS
        );

        // imageSize is only sent to the Gemini 3 image model.
        let body = provider.api().last_content_body().unwrap();
        assert_eq!(
            body["generationConfig"],
            json!({
                "responseModalities": ["Text", "Image"],
                "imageConfig": { "aspectRatio": "16:9" }
            })
        );
    }

    #[tokio::test]
    async fn test_image_gen_sends_size_for_gemini_3() {
        let (ctx, provider) = context(MockGeminiApi::new().with_content_response(image_reply(None)));
        let node = ImageGen {
            model: "gemini-3-pro-image-preview".to_string(),
            api_key: "k".to_string(),
            image_size: Some(Resolution::K2),
            response_mode: ResponseMode::ImageOnly,
            ..ImageGen::default()
        };

        let out = node.run(&ctx).await;
        assert_eq!(out.text, "Image generated");
        let body = provider.api().last_content_body().unwrap();
        assert_eq!(
            body["generationConfig"],
            json!({
                "responseModalities": ["Image"],
                "imageConfig": { "aspectRatio": "1:1", "imageSize": "2K" }
            })
        );
    }

    #[tokio::test]
    async fn test_image_gen_text_only_reply_gives_placeholder() {
        let (ctx, _) = context(MockGeminiApi::new().with_text_response("I cannot draw that"));
        let node = ImageGen {
            api_key: "k".to_string(),
            ..ImageGen::default()
        };

        let out = node.run(&ctx).await;
        assert_eq!(out.image, ImageTensor::placeholder());
        assert_eq!(out.text, "I cannot draw that");
    }

    #[tokio::test]
    async fn test_image_edit_returns_input_on_failure() {
        let (ctx, _) = context(MockGeminiApi::new().with_failure(500, "backend down"));
        let input = ImageTensor::filled(3, 3, [9, 9, 9]);
        let node = ImageEdit {
            image: input.clone(),
            prompt: "make it pop".to_string(),
            api_key: "k".to_string(),
            ..ImageEdit::default()
        };

        let out = node.run(&ctx).await;
        assert_eq!(out.image, input);
        assert!(out.text.starts_with("API error:"));
    }

    #[tokio::test]
    async fn test_image_edit_attaches_png_and_skips_original_aspect() {
        let (ctx, provider) = context(MockGeminiApi::new().with_content_response(image_reply(None)));
        let node = ImageEdit {
            image: red_blue(),
            prompt: "swap colors".to_string(),
            api_key: "k".to_string(),
            ..ImageEdit::default()
        };

        let out = node.run(&ctx).await;
        assert_eq!(out.text, "Image edited");

        let body = provider.api().last_content_body().unwrap();
        assert_eq!(
            body["contents"][0]["parts"],
            json!([
                { "text": "swap colors" },
                { "inlineData": { "mimeType": "image/png", "data": png_base64() } }
            ])
        );
        assert!(body["generationConfig"].get("imageConfig").is_none());
    }

    #[tokio::test]
    async fn test_image_edit_without_image_reply_keeps_input() {
        let (ctx, _) = context(MockGeminiApi::new().with_text_response(""));
        let input = ImageTensor::filled(2, 2, [1, 2, 3]);
        let node = ImageEdit {
            image: input.clone(),
            api_key: "k".to_string(),
            aspect_ratio: "4:3".to_string(),
            ..ImageEdit::default()
        };

        let out = node.run(&ctx).await;
        assert_eq!(out.image, input);
        assert_eq!(out.text, "No edited image was returned");
    }

    #[tokio::test]
    async fn test_imagen_seed_and_prediction() {
        let (ctx, provider) = context(MockGeminiApi::new().with_content_response(json!({
            "predictions": [{ "bytesBase64Encoded": png_base64(), "mimeType": "image/png" }]
        })));
        let node = ImagenGenerate {
            prompt: "a lighthouse".to_string(),
            api_key: "k".to_string(),
            seed: 1_234_567,
            ..ImagenGenerate::default()
        };

        let out = node.run(&ctx).await;
        assert_eq!(out.image, red_blue());
        assert_eq!(out.text, "Generated");

        let calls = provider.api().calls();
        let RecordedCall::Predict { model, body } = &calls[0] else {
            panic!("expected a predict call");
        };
        assert_eq!(model, "imagen-3");
        assert_eq!(body["parameters"]["seed"], 234_567);
        assert_eq!(body["parameters"]["sampleCount"], 1);
    }

    #[tokio::test]
    async fn test_imagen_zero_seed_is_omitted() {
        let (ctx, provider) = context(MockGeminiApi::new());
        let node = ImagenGenerate {
            api_key: "k".to_string(),
            ..ImagenGenerate::default()
        };

        let out = node.run(&ctx).await;
        assert_eq!(out, ImageOutput::placeholder("No image was generated".to_string()));
        let calls = provider.api().calls();
        let RecordedCall::Predict { body, .. } = &calls[0] else {
            panic!("expected a predict call");
        };
        assert!(body["parameters"].get("seed").is_none());
    }
}
