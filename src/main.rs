use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gemini_node_kit::config::Config;
use gemini_node_kit::media::tensor::encode_png;
use gemini_node_kit::media::{bytes_to_tensor, output_path};
use gemini_node_kit::nodes::options::{AnalysisFormat, InfoFormat, ModelFilter};
use gemini_node_kit::nodes::{
    ApiConfig, ImageGen, ImageOutput, ImagenGenerate, ModelInfo, Node, NodeContext, Text,
    VideoGen, VisionAnalyze, NODES,
};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "gemini-node-kit")]
#[command(about = "Run Gemini nodes from the command line")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate text from a prompt.
    Text {
        prompt: String,
        #[arg(long, default_value = "gemini-2.5-flash")]
        model: String,
        #[arg(long, default_value = "")]
        system: String,
        /// Request thought summaries on models that support them.
        #[arg(long)]
        thinking: bool,
    },
    /// Generate an image with a Gemini image model.
    Image {
        prompt: String,
        #[arg(long, default_value = "gemini-2.5-flash-image")]
        model: String,
        #[arg(long, default_value = "1:1", value_parser = parse_aspect_arg)]
        aspect: String,
        /// File name inside the output directory.
        #[arg(long)]
        out: Option<String>,
    },
    /// Generate an image with Imagen.
    Imagen {
        prompt: String,
        #[arg(long, default_value = "1:1", value_parser = parse_aspect_arg)]
        aspect: String,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long)]
        out: Option<String>,
    },
    /// Generate a video with Veo and wait for it.
    Video {
        prompt: String,
        #[arg(long, default_value = "veo-3.1-generate-preview")]
        model: String,
        #[arg(long, default_value = "16:9", value_parser = parse_aspect_arg)]
        aspect: String,
        #[arg(long, default_value = "720p")]
        resolution: String,
        #[arg(long)]
        out: Option<String>,
        #[arg(long, default_value_t = 600)]
        max_wait: u64,
    },
    /// Describe a local image.
    Analyze {
        file: PathBuf,
        #[arg(long, default_value = "Describe this image in detail.")]
        prompt: String,
        #[arg(long, default_value = "detailed description")]
        format: AnalysisFormat,
    },
    /// Show the built-in model catalog.
    Models {
        #[arg(long, default_value = "all")]
        filter: ModelFilter,
        #[arg(long, default_value = "list")]
        format: InfoFormat,
    },
    /// List the available nodes.
    Nodes,
    /// Check that the configured API key is accepted.
    CheckKey,
}

fn parse_aspect_arg(input: &str) -> std::result::Result<String, String> {
    let valid = input
        .split_once(':')
        .map(|(w, h)| w.parse::<u32>().is_ok() && h.parse::<u32>().is_ok())
        .unwrap_or(false);
    if valid {
        Ok(input.to_string())
    } else {
        Err(format!("Invalid aspect ratio '{}'. Expected format: W:H", input))
    }
}

fn save_image(ctx: &NodeContext, output: &ImageOutput, filename: Option<&str>) -> Result<()> {
    let frame = output
        .image
        .to_rgb()
        .context("generated image batch was empty")?;
    let path = output_path(ctx.output_dir(), filename, "gemini_image", ".png")?;
    std::fs::write(&path, encode_png(&frame)?)?;
    info!("Saved image to {}", path.display());
    println!("{}", path.display());
    Ok(())
}

async fn run(command: Command, config: &Config) -> Result<()> {
    let ctx = NodeContext::from_config(config);
    match &command {
        Command::Models { filter, format } => {
            let node = ModelInfo {
                filter: *filter,
                format: *format,
                ..ModelInfo::default()
            };
            println!("{}", node.run(&ctx).await);
            return Ok(());
        }
        Command::Nodes => {
            for info in NODES {
                println!("{:<24} {:<20} {}", info.name, info.category, info.display_name);
            }
            return Ok(());
        }
        _ => {}
    }

    let api_key = config.require_api_key()?.to_string();
    match command {
        Command::Text {
            prompt,
            model,
            system,
            thinking,
        } => {
            let out = Text {
                prompt,
                model,
                api_key,
                system_instruction: system,
                enable_thinking: thinking,
                ..Text::default()
            }
            .run(&ctx)
            .await;
            if !out.thinking.is_empty() {
                eprintln!("[thinking] {}", out.thinking);
            }
            println!("{}", out.text);
        }
        Command::Image {
            prompt,
            model,
            aspect,
            out,
        } => {
            let output = ImageGen {
                prompt,
                model,
                aspect_ratio: aspect,
                api_key,
                ..ImageGen::default()
            }
            .run(&ctx)
            .await;
            println!("{}", output.text);
            save_image(&ctx, &output, out.as_deref())?;
        }
        Command::Imagen {
            prompt,
            aspect,
            seed,
            out,
        } => {
            let output = ImagenGenerate {
                prompt,
                aspect_ratio: aspect,
                api_key,
                seed,
                ..ImagenGenerate::default()
            }
            .run(&ctx)
            .await;
            println!("{}", output.text);
            save_image(&ctx, &output, out.as_deref())?;
        }
        Command::Video {
            prompt,
            model,
            aspect,
            resolution,
            out,
            max_wait,
        } => {
            let output = VideoGen {
                prompt,
                model,
                api_key,
                aspect_ratio: aspect,
                resolution,
                output_filename: out.unwrap_or_default(),
                max_wait_secs: max_wait,
            }
            .run(&ctx)
            .await;
            println!("{}", output.status);
        }
        Command::Analyze {
            file,
            prompt,
            format,
        } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let node = VisionAnalyze {
                images: bytes_to_tensor(&bytes)?,
                prompt,
                api_key,
                output_format: format,
                ..VisionAnalyze::default()
            };
            println!("{}", node.run(&ctx).await);
        }
        Command::CheckKey => {
            let out = ApiConfig {
                api_key,
                timeout_secs: config.timeout_secs,
                max_retries: config.max_retries,
                validate_key: true,
            }
            .run(&ctx)
            .await;
            println!("{}", out.status);
            if out.api_key.is_empty() {
                anyhow::bail!("API key check failed");
            }
        }
        Command::Models { .. } | Command::Nodes => unreachable!("handled above"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gemini_node_kit=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(args.command, &config).await {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
