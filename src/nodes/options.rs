//! Combo-box widget values shared by the nodes.

use rand::Rng;
use std::fmt;
use std::str::FromStr;

/// Declares a widget enum whose variants map one-to-one onto the labels the
/// host shows, with `FromStr`/`Display` over those labels.
macro_rules! widget_options {
    (
        $(#[$meta:meta])*
        $name:ident, default $default:ident {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const OPTIONS: &'static [&'static str] = &[$($label),+];

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $($label => Ok($name::$variant),)+
                    _ => Err(format!(
                        "Unknown {} '{}'. Expected one of: {}",
                        stringify!($name),
                        s,
                        Self::OPTIONS.join(", ")
                    )),
                }
            }
        }
    };
}

widget_options! {
    /// Which modalities an image model is asked to return.
    ResponseMode, default ImageAndText {
        ImageAndText => "IMAGE+TEXT",
        ImageOnly => "IMAGE_ONLY",
    }
}

impl ResponseMode {
    pub fn modalities(&self) -> &'static [&'static str] {
        match self {
            ResponseMode::ImageAndText => &["Text", "Image"],
            ResponseMode::ImageOnly => &["Image"],
        }
    }
}

widget_options! {
    /// Output resolution for Gemini 3 image models.
    Resolution, default K2 {
        K1 => "1K",
        K2 => "2K",
        K4 => "4K",
    }
}

widget_options! {
    SeedControl, default Randomize {
        Randomize => "randomize",
        Increment => "increment",
        Fixed => "fixed",
    }
}

impl SeedControl {
    /// Seed to use for this run.
    pub fn apply(&self, seed: u64) -> u64 {
        match self {
            SeedControl::Randomize => rand::thread_rng().gen(),
            SeedControl::Increment => seed.wrapping_add(1),
            SeedControl::Fixed => seed,
        }
    }
}

widget_options! {
    AnalysisFormat, default Detailed {
        Detailed => "detailed description",
        Brief => "brief description",
        DiffusionPrompt => "SD/FLUX prompt",
        MidjourneyPrompt => "Midjourney prompt",
        Tags => "tag list",
        Json => "JSON structure",
    }
}

impl AnalysisFormat {
    pub fn guide(&self) -> &'static str {
        match self {
            AnalysisFormat::Detailed => "Describe the image content in detailed paragraphs.",
            AnalysisFormat::Brief => "Describe the image concisely in one or two sentences.",
            AnalysisFormat::DiffusionPrompt => {
                "Write an English prompt suitable for Stable Diffusion or FLUX."
            }
            AnalysisFormat::MidjourneyPrompt => "Write an English prompt in Midjourney format.",
            AnalysisFormat::Tags => "List the key tags, separated by commas.",
            AnalysisFormat::Json => "Output a structured analysis as JSON.",
        }
    }
}

widget_options! {
    ResponseLanguage, default English {
        English => "English",
        Chinese => "中文",
        Japanese => "日本語",
    }
}

impl ResponseLanguage {
    pub fn guide(&self) -> &'static str {
        match self {
            ResponseLanguage::English => "Respond in English.",
            ResponseLanguage::Chinese => "请使用中文。",
            ResponseLanguage::Japanese => "日本語で回答してください。",
        }
    }
}

widget_options! {
    DocumentTask, default Summary {
        Summary => "summary",
        FullText => "full text",
        KeyPoints => "key information",
        Json => "structured data (JSON)",
        QuestionAnswer => "question answering",
    }
}

impl DocumentTask {
    pub fn guide(&self) -> &'static str {
        match self {
            DocumentTask::Summary => "Provide a concise summary.",
            DocumentTask::FullText => "Extract all of the text content.",
            DocumentTask::KeyPoints => "List the key information and figures.",
            DocumentTask::Json => "Output the result as JSON.",
            DocumentTask::QuestionAnswer => "Answer the question.",
        }
    }
}

widget_options! {
    TargetStyle, default Diffusion {
        Diffusion => "SD/FLUX",
        Midjourney => "Midjourney",
        DallE => "DALL-E",
        Imagen => "Gemini Imagen",
        General => "general enhancement",
    }
}

widget_options! {
    EnhancementLevel, default Medium {
        Light => "light",
        Medium => "medium",
        Strong => "strong",
    }
}

widget_options! {
    PromptLanguage, default English {
        English => "English",
        Chinese => "中文",
        KeepOriginal => "keep original",
    }
}

widget_options! {
    ThinkingLevel, default Medium {
        Low => "low",
        Medium => "medium",
        High => "high",
        Max => "max",
    }
}

widget_options! {
    ModelFilter, default All {
        All => "all",
        Text => "text models",
        Image => "image models",
        Video => "video models",
    }
}

widget_options! {
    InfoFormat, default List {
        List => "list",
        Detailed => "detailed",
        Json => "JSON",
    }
}

/// `None` for the aspect-ratio widget values that mean "leave it to the model".
pub fn aspect_override(aspect_ratio: &str) -> Option<&str> {
    match aspect_ratio.trim() {
        "" | "auto" | "original" => None,
        ratio => Some(ratio),
    }
}
