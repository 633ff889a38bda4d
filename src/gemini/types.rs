//! Gemini payload types shared by the client, the parsers and the nodes.
//!
//! Response types default every field so that a partially-shaped reply still
//! decodes; generative responses are not schema-guaranteed per call.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Treats an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Gemini content container used in both requests and responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn new(parts: Vec<Part>) -> Self {
        Self { role: None, parts }
    }

    pub fn with_role(role: &str, parts: Vec<Part>) -> Self {
        Self {
            role: Some(role.to_string()),
            parts,
        }
    }
}

/// One content part. Text, thought summaries and inline media share the same
/// object shape on the wire, so every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn inline(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            }),
            ..Self::default()
        }
    }

    pub fn is_thought(&self) -> bool {
        self.thought.unwrap_or(false)
    }
}

/// Base64 inline payload used for attachments and generated images.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub mime_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: String,
}

/// `generateContent` request body.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// Wraps a plain prompt into a single user message.
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self::from_contents(vec![Content::new(vec![Part::text(prompt)])])
    }

    /// Uses a pre-built, ordered sequence of (optionally role-tagged) messages.
    pub fn from_contents(contents: Vec<Content>) -> Self {
        Self {
            contents,
            ..Self::default()
        }
    }

    /// Empty instructions are ignored.
    pub fn with_system_instruction(mut self, instruction: Option<&str>) -> Self {
        self.system_instruction = instruction
            .filter(|text| !text.is_empty())
            .map(|text| Content::new(vec![Part::text(text)]));
        self
    }

    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }

    /// Merges `responseModalities` into the generation config, creating it if needed.
    pub fn with_response_modalities(mut self, modalities: &[&str]) -> Self {
        if !modalities.is_empty() {
            self.generation_config
                .get_or_insert_with(GenerationConfig::default)
                .response_modalities = Some(modalities.iter().map(|m| m.to_string()).collect());
        }
        self
    }

    /// Merges `imageConfig` into the generation config, creating it if needed.
    pub fn with_image_config(mut self, image_config: Option<ImageConfig>) -> Self {
        if let Some(image_config) = image_config.filter(|c| !c.is_empty()) {
            self.generation_config
                .get_or_insert_with(GenerationConfig::default)
                .image_config = Some(image_config);
        }
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_config: Option<ImageConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub thinking_budget: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_thoughts: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_size: Option<String>,
}

impl ImageConfig {
    pub fn aspect(aspect_ratio: &str) -> Self {
        Self {
            aspect_ratio: Some(aspect_ratio.to_string()),
            image_size: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.aspect_ratio.is_none() && self.image_size.is_none()
    }
}

/// Imagen `predict` request body.
#[derive(Debug, Clone, Serialize)]
pub struct ImagenRequest {
    pub instances: Vec<ImagenInstance>,
    pub parameters: ImagenParameters,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImagenInstance {
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagenParameters {
    pub sample_count: u32,
    pub aspect_ratio: String,
    pub output_mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Imagen accepts seeds below one million.
pub const IMAGEN_SEED_MODULUS: u64 = 1_000_000;

impl ImagenRequest {
    pub fn new(prompt: &str, aspect_ratio: &str, sample_count: u32, seed: Option<u64>) -> Self {
        Self {
            instances: vec![ImagenInstance {
                prompt: prompt.to_string(),
            }],
            parameters: ImagenParameters {
                sample_count,
                aspect_ratio: aspect_ratio.to_string(),
                output_mime_type: "image/png".to_string(),
                seed: seed.map(|s| s % IMAGEN_SEED_MODULUS),
            },
        }
    }
}

/// `generateVideos` request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRequest {
    pub prompt: String,
    pub config: VideoConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_frame_image: Option<FrameImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_frame_image: Option<FrameImage>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoConfig {
    pub aspect_ratio: String,
    pub resolution: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameImage {
    pub bytes_base64_encoded: String,
    pub mime_type: String,
}

impl FrameImage {
    pub fn png(base64_data: String) -> Self {
        Self {
            bytes_base64_encoded: base64_data,
            mime_type: "image/png".to_string(),
        }
    }
}

impl VideoRequest {
    pub fn new(prompt: &str, aspect_ratio: &str, resolution: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            config: VideoConfig {
                aspect_ratio: aspect_ratio.to_string(),
                resolution: resolution.to_string(),
            },
            first_frame_image: None,
            last_frame_image: None,
        }
    }

    pub fn with_frames(mut self, first: Option<String>, last: Option<String>) -> Self {
        self.first_frame_image = first.map(FrameImage::png);
        self.last_frame_image = last.map(FrameImage::png);
        self
    }
}

/// Decoded reply to `generateContent` or `predict`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    #[serde(default, deserialize_with = "null_as_default")]
    pub candidates: Vec<Candidate>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub predictions: Vec<Prediction>,
    #[serde(default)]
    pub prompt_feedback: Option<Value>,
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
}

/// Candidate completion item returned by Gemini.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// One Imagen prediction.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    #[serde(default)]
    pub bytes_base64_encoded: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: Option<u32>,
    #[serde(default)]
    pub candidates_token_count: Option<u32>,
    #[serde(default)]
    pub thoughts_token_count: Option<u32>,
    #[serde(default)]
    pub total_token_count: Option<u32>,
}

/// Long-running operation handle returned by `generateVideos` and the status endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub done: bool,
    #[serde(default)]
    pub error: Option<OperationError>,
    #[serde(default)]
    pub response: Option<VideoResponse>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Finished video payload. The API has shipped both a flat `generatedVideos`
/// list and a nested `generateVideoResponse.generatedSamples` list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub generated_videos: Vec<GeneratedVideo>,
    #[serde(default)]
    pub generate_video_response: Option<GeneratedSamples>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSamples {
    #[serde(default, deserialize_with = "null_as_default")]
    pub generated_samples: Vec<GeneratedVideo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneratedVideo {
    #[serde(default)]
    pub video: Option<Video>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub bytes_base64_encoded: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

impl Operation {
    /// First generated video, whichever response shape carried it.
    pub fn first_video(&self) -> Option<&Video> {
        let response = self.response.as_ref()?;
        response
            .generated_videos
            .iter()
            .chain(
                response
                    .generate_video_response
                    .iter()
                    .flat_map(|r| r.generated_samples.iter()),
            )
            .find_map(|v| v.video.as_ref())
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| {
            e.message
                .clone()
                .unwrap_or_else(|| "unknown error".to_string())
        })
    }
}

/// Entry of the `models` listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_token_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_token_limit: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub supported_generation_methods: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListModelsResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub models: Vec<ModelDescriptor>,
}

/// Error body shape returned alongside non-success statuses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<ApiErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_null_fields_decode_as_empty() {
        let envelope: ResponseEnvelope = serde_json::from_value(json!({
            "candidates": null,
            "predictions": null
        }))
        .unwrap();
        assert!(envelope.candidates.is_empty());
        assert!(envelope.predictions.is_empty());

        let envelope: ResponseEnvelope = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": null } }]
        }))
        .unwrap();
        assert!(envelope.candidates[0].content.as_ref().unwrap().parts.is_empty());

        let operation: Operation = serde_json::from_value(json!({
            "name": "operations/x",
            "done": null,
            "response": { "generatedVideos": null, "generateVideoResponse": { "generatedSamples": null } }
        }))
        .unwrap();
        assert!(!operation.done);
        assert!(operation.first_video().is_none());

        let models: ListModelsResponse =
            serde_json::from_value(json!({ "models": null })).unwrap();
        assert!(models.models.is_empty());
    }

    #[test]
    fn test_prompt_request_wraps_single_message() {
        let request = GenerateContentRequest::from_prompt("hello");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "contents": [{ "parts": [{ "text": "hello" }] }] })
        );
    }

    #[test]
    fn test_modalities_and_image_config_merge_into_generation_config() {
        let request = GenerateContentRequest::from_prompt("cat")
            .with_generation_config(GenerationConfig {
                temperature: Some(0.5),
                ..GenerationConfig::default()
            })
            .with_system_instruction(Some("be brief"))
            .with_response_modalities(&["Text", "Image"])
            .with_image_config(Some(ImageConfig::aspect("16:9")));

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "contents": [{ "parts": [{ "text": "cat" }] }],
                "system_instruction": { "parts": [{ "text": "be brief" }] },
                "generationConfig": {
                    "temperature": 0.5,
                    "responseModalities": ["Text", "Image"],
                    "imageConfig": { "aspectRatio": "16:9" }
                }
            })
        );
    }

    #[test]
    fn test_empty_options_leave_generation_config_absent() {
        let request = GenerateContentRequest::from_prompt("cat")
            .with_system_instruction(Some(""))
            .with_response_modalities(&[])
            .with_image_config(Some(ImageConfig::default()));

        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("generationConfig").is_none());
        assert!(value.get("system_instruction").is_none());
    }

    #[test]
    fn test_imagen_seed_is_reduced_modulo_one_million() {
        let request = ImagenRequest::new("a fox", "1:1", 1, Some(1_500_000));
        assert_eq!(request.parameters.seed, Some(500_000));

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "instances": [{ "prompt": "a fox" }],
                "parameters": {
                    "sampleCount": 1,
                    "aspectRatio": "1:1",
                    "outputMimeType": "image/png",
                    "seed": 500000
                }
            })
        );
    }

    #[test]
    fn test_video_request_serializes_frames() {
        let request = VideoRequest::new("waves", "16:9", "720p")
            .with_frames(Some("Zmlyc3Q=".to_string()), None);

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "prompt": "waves",
                "config": { "aspectRatio": "16:9", "resolution": "720p" },
                "firstFrameImage": { "bytesBase64Encoded": "Zmlyc3Q=", "mimeType": "image/png" }
            })
        );
    }

    #[test]
    fn test_operation_reads_both_video_shapes() {
        let flat: Operation = serde_json::from_value(json!({
            "name": "operations/1",
            "done": true,
            "response": { "generatedVideos": [{ "video": { "uri": "https://a/1.mp4" } }] }
        }))
        .unwrap();
        assert_eq!(
            flat.first_video().and_then(|v| v.uri.as_deref()),
            Some("https://a/1.mp4")
        );

        let nested: Operation = serde_json::from_value(json!({
            "done": true,
            "response": {
                "generateVideoResponse": {
                    "generatedSamples": [{ "video": { "uri": "https://a/2.mp4" } }]
                }
            }
        }))
        .unwrap();
        assert_eq!(
            nested.first_video().and_then(|v| v.uri.as_deref()),
            Some("https://a/2.mp4")
        );
    }

    #[test]
    fn test_envelope_tolerates_unknown_and_missing_fields() {
        let envelope: ResponseEnvelope = serde_json::from_value(json!({
            "candidates": [{ "index": 0 }],
            "modelVersion": "x"
        }))
        .unwrap();
        assert_eq!(envelope.candidates.len(), 1);
        assert!(envelope.candidates[0].content.is_none());
    }

    #[test]
    fn test_chat_history_round_trips_through_content() {
        let history = vec![
            Content::with_role("user", vec![Part::text("hi")]),
            Content::with_role("model", vec![Part::text("hello")]),
        ];
        let json = serde_json::to_string(&history).unwrap();
        let parsed: Vec<Content> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, history);
    }
}
