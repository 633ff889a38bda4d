//! Gemini node kit - node adapters over the Google Gemini REST API
//!
//! Text, chat, image, video, vision, document and structured-output nodes for
//! a node-graph host, built on a small retrying Gemini client.

pub mod config;
pub mod error;
pub mod gemini;
pub mod media;
pub mod nodes;
pub mod prompts;

pub use error::{Error, Result};
