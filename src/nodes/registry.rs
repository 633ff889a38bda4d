//! Static table of the nodes exposed to the host graph.

use super::{
    ApiConfig, Chat, DocumentProcess, ImageEdit, ImageGen, ImageToVideo, ImagenGenerate,
    ModelInfo, NanoBanana, NanoBananaPro, Node, PromptBuilder, PromptOptimizer, StructuredOutput,
    Text, Thinking, VideoGen, VisionAnalyze,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeInfo {
    /// Identifier the host uses to look the node up.
    pub name: &'static str,
    pub display_name: &'static str,
    pub category: &'static str,
}

const fn node(name: &'static str, display_name: &'static str, category: &'static str) -> NodeInfo {
    NodeInfo {
        name,
        display_name,
        category,
    }
}

pub const NODES: &[NodeInfo] = &[
    node(Text::NAME, "Gemini Text", "Gemini/Text"),
    node(Chat::NAME, "Gemini Chat", "Gemini/Text"),
    node(ImageGen::NAME, "Gemini Image Generate", "Gemini/Image"),
    node(ImageEdit::NAME, "Gemini Image Edit", "Gemini/Image"),
    node(ImagenGenerate::NAME, "Imagen Generate", "Gemini/Image"),
    node(VideoGen::NAME, "Gemini Video Generate", "Gemini/Video"),
    node(ImageToVideo::NAME, "Gemini Image to Video", "Gemini/Video"),
    node(VisionAnalyze::NAME, "Gemini Vision Analyze", "Gemini/Vision"),
    node(DocumentProcess::NAME, "Gemini Document Process", "Gemini/Vision"),
    node(StructuredOutput::NAME, "Gemini Structured Output", "Gemini/Advanced"),
    node(PromptOptimizer::NAME, "Gemini Prompt Optimizer", "Gemini/Advanced"),
    node(Thinking::NAME, "Gemini Thinking", "Gemini/Advanced"),
    node(ApiConfig::NAME, "Gemini API Config", "Gemini/Tools"),
    node(ModelInfo::NAME, "Gemini Model Info", "Gemini/Tools"),
    node(PromptBuilder::NAME, "Prompt Builder", "Gemini/Tools"),
    node(NanoBanana::NAME, "Nano Banana", "Gemini/NanoBanana"),
    node(NanoBananaPro::NAME, "Nano Banana Pro", "Gemini/NanoBanana"),
];

pub fn find(name: &str) -> Option<&'static NodeInfo> {
    NODES.iter().find(|info| info.name == name)
}
