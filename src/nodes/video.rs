use super::{guarded, Node, NodeContext};
use crate::gemini::{GenerativeApi, Operation, VideoRequest};
use crate::media::tensor::tensor_to_png_base64;
use crate::media::{save_video, video_output_path, ImageTensor};
use crate::{Error, Result};
use async_trait::async_trait;
use base64::Engine as _;
use std::time::Duration;

pub const DEFAULT_MAX_WAIT_SECS: u64 = 600;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoOutput {
    /// Local file, or the remote URI when the download failed.
    pub path: String,
    pub status: String,
}

impl VideoOutput {
    fn failed(status: String) -> Self {
        Self {
            path: String::new(),
            status,
        }
    }
}

/// Starts the job, waits for it and persists the first video.
async fn run_job(
    ctx: &NodeContext,
    api_key: &str,
    model: &str,
    request: &VideoRequest,
    filename: Option<&str>,
    max_wait_secs: u64,
) -> Result<VideoOutput> {
    let settings = ctx.settings(api_key).with_timeout_secs(max_wait_secs);
    let client = ctx.client(&settings);

    let started = client.generate_video(model, request).await?;
    let operation = if started.done {
        started
    } else {
        let name = started.name.as_deref().ok_or_else(|| Error::Api {
            message: "no operation name in response".to_string(),
            status: None,
            body: None,
        })?;
        client
            .poll_operation(name, Duration::from_secs(max_wait_secs), ctx.poll_interval())
            .await?
    };
    persist(ctx, client.as_ref(), &operation, filename).await
}

async fn persist(
    ctx: &NodeContext,
    client: &dyn GenerativeApi,
    operation: &Operation,
    filename: Option<&str>,
) -> Result<VideoOutput> {
    if let Some(message) = operation.error_message() {
        return Ok(VideoOutput::failed(format!("Generation failed: {}", message)));
    }
    let Some(video) = operation.first_video() else {
        return Ok(VideoOutput::failed("No video was generated".to_string()));
    };

    let bytes = match (&video.bytes_base64_encoded, &video.uri) {
        (Some(data), _) if !data.is_empty() => {
            base64::engine::general_purpose::STANDARD.decode(data)?
        }
        (_, Some(uri)) if !uri.is_empty() => match client.download(uri).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Video download from {} failed: {}", uri, e);
                return Ok(VideoOutput {
                    path: uri.clone(),
                    status: format!("Video generated but download failed ({})\nURI: {}", e, uri),
                });
            }
        },
        _ => return Ok(VideoOutput::failed("Video data unavailable".to_string())),
    };

    let path = video_output_path(ctx.output_dir(), filename)?;
    save_video(&bytes, &path).await?;
    let path = path.display().to_string();
    Ok(VideoOutput {
        status: format!("Video generated\nPath: {}", path),
        path,
    })
}

/// Text-to-video with Veo.
#[derive(Debug, Clone)]
pub struct VideoGen {
    pub prompt: String,
    pub model: String,
    pub api_key: String,
    pub aspect_ratio: String,
    pub resolution: String,
    /// Blank for a timestamped name.
    pub output_filename: String,
    pub max_wait_secs: u64,
}

impl Default for VideoGen {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            model: "veo-3.1-generate-preview".to_string(),
            api_key: String::new(),
            aspect_ratio: "16:9".to_string(),
            resolution: "720p".to_string(),
            output_filename: String::new(),
            max_wait_secs: DEFAULT_MAX_WAIT_SECS,
        }
    }
}

#[async_trait]
impl Node for VideoGen {
    const NAME: &'static str = "GeminiVideoGen";
    type Output = VideoOutput;

    async fn run(&self, ctx: &NodeContext) -> VideoOutput {
        let request = VideoRequest::new(&self.prompt, &self.aspect_ratio, &self.resolution);
        guarded(
            Self::NAME,
            &self.api_key,
            VideoOutput::failed,
            run_job(
                ctx,
                &self.api_key,
                &self.model,
                &request,
                Some(self.output_filename.as_str()),
                self.max_wait_secs,
            ),
        )
        .await
    }
}

/// Image-to-video from optional first and last frames.
#[derive(Debug, Clone)]
pub struct ImageToVideo {
    pub prompt: String,
    pub model: String,
    pub api_key: String,
    pub first_frame: Option<ImageTensor>,
    pub last_frame: Option<ImageTensor>,
    pub aspect_ratio: String,
    pub max_wait_secs: u64,
}

impl Default for ImageToVideo {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            model: "veo-3.1-generate-preview".to_string(),
            api_key: String::new(),
            first_frame: None,
            last_frame: None,
            aspect_ratio: "16:9".to_string(),
            max_wait_secs: DEFAULT_MAX_WAIT_SECS,
        }
    }
}

impl ImageToVideo {
    async fn generate(&self, ctx: &NodeContext) -> Result<VideoOutput> {
        let first = self.first_frame.as_ref().map(tensor_to_png_base64).transpose()?;
        let last = self.last_frame.as_ref().map(tensor_to_png_base64).transpose()?;
        let request =
            VideoRequest::new(&self.prompt, &self.aspect_ratio, "720p").with_frames(first, last);
        run_job(
            ctx,
            &self.api_key,
            &self.model,
            &request,
            None,
            self.max_wait_secs,
        )
        .await
    }
}

#[async_trait]
impl Node for ImageToVideo {
    const NAME: &'static str = "GeminiImageToVideo";
    type Output = VideoOutput;

    async fn run(&self, ctx: &NodeContext) -> VideoOutput {
        guarded(
            Self::NAME,
            &self.api_key,
            VideoOutput::failed,
            self.generate(ctx),
        )
        .await
    }
}
