//! Static model catalog offered by the node widgets.

pub const TEXT_MODELS: &[&str] = &[
    "gemini-3-pro-preview",
    "gemini-3-flash-preview",
    "gemini-2.5-pro",
    "gemini-2.5-flash",
    "gemini-2.5-flash-lite",
    "gemini-2.0-flash",
    "gemini-1.5-pro",
    "gemini-1.5-flash",
];

pub const IMAGE_MODELS: &[&str] = &["gemini-2.5-flash-image", "gemini-3-pro-image-preview"];

pub const VIDEO_MODELS: &[&str] = &[
    "veo-3.1-generate-preview",
    "veo-3.1-fast-preview",
    "veo-3",
    "veo-3-fast",
    "veo-2",
];

pub const IMAGEN_MODELS: &[&str] = &["imagen-3", "imagen-3-fast"];

/// Which endpoint family a model is served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Text,
    Image,
    Imagen,
    Video,
}

impl ModelKind {
    pub fn label(&self) -> &'static str {
        match self {
            ModelKind::Text => "text",
            ModelKind::Image => "image",
            ModelKind::Imagen => "image",
            ModelKind::Video => "video",
        }
    }

    /// REST method used to invoke models of this kind.
    pub fn endpoint(&self) -> &'static str {
        match self {
            ModelKind::Text | ModelKind::Image => "generateContent",
            ModelKind::Imagen => "predict",
            ModelKind::Video => "generateVideos",
        }
    }

    pub fn models(&self) -> &'static [&'static str] {
        match self {
            ModelKind::Text => TEXT_MODELS,
            ModelKind::Image => IMAGE_MODELS,
            ModelKind::Imagen => IMAGEN_MODELS,
            ModelKind::Video => VIDEO_MODELS,
        }
    }
}

/// Thinking is only offered on the 2.5 and 3 generations.
pub fn supports_thinking(model: &str) -> bool {
    model.contains("2.5") || model.contains("gemini-3")
}

/// Gemini 3 models accept a `thinkingLevel` alongside the budget.
pub fn supports_thinking_level(model: &str) -> bool {
    model.contains("gemini-3")
}

/// Only the Gemini 3 image model honors an explicit `imageSize`.
pub fn supports_image_size(model: &str) -> bool {
    model == "gemini-3-pro-image-preview"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thinking_support() {
        assert!(supports_thinking("gemini-2.5-flash"));
        assert!(supports_thinking("gemini-3-pro-preview"));
        assert!(!supports_thinking("gemini-2.0-flash"));
        assert!(!supports_thinking("gemini-1.5-pro"));
    }

    #[test]
    fn test_thinking_level_only_on_gemini_3() {
        assert!(supports_thinking_level("gemini-3-flash-preview"));
        assert!(!supports_thinking_level("gemini-2.5-pro"));
    }

    #[test]
    fn test_kind_endpoints() {
        assert_eq!(ModelKind::Imagen.endpoint(), "predict");
        assert_eq!(ModelKind::Video.endpoint(), "generateVideos");
        assert!(ModelKind::Video.models().contains(&"veo-2"));
    }
}
