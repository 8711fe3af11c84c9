//! Runs the Gemini blocks the way a block runtime would: register the
//! extension with a host, fire `Set Gemini API Key`, then `Ask Gemini`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use gemini_block::host::RuntimeHost;
use gemini_block::{
    ASK_GEMINI_OPCODE, EXTENSION_ID, GeminiConfig, GeminiExtension, SET_API_KEY_OPCODE, register,
};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "ask-gemini", about = "Ask Gemini a question through the block runtime host")]
struct Args {
    /// API key handed to the `Set Gemini API Key` block.
    #[arg(long)]
    api_key: String,

    /// Model to target; overrides the configuration file.
    #[arg(long)]
    model: Option<String>,

    /// Optional JSON configuration (`model`, `baseUrl`, `apiVersion`, `timeoutMs`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the extension descriptor before asking.
    #[arg(long)]
    show_blocks: bool,

    /// Prompt handed to the `Ask Gemini` block.
    #[arg(default_value = "What is the capital of France?")]
    prompt: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    info!(model = config.model(), endpoint = %config.endpoint(), "starting");

    let host = RuntimeHost::new();
    let extension = Arc::new(GeminiExtension::new(config)?);
    register(&host, extension)?;

    if args.show_blocks {
        let descriptors = serde_json::to_string_pretty(&host.descriptors())?;
        println!("{descriptors}");
    }

    host.invoke(
        EXTENSION_ID,
        SET_API_KEY_OPCODE,
        &json!({ "KEY": args.api_key }),
    )
    .await?;

    let answer = host
        .invoke(
            EXTENSION_ID,
            ASK_GEMINI_OPCODE,
            &json!({ "PROMPT": args.prompt }),
        )
        .await?;

    println!("{}", answer.as_str().unwrap_or_default());
    Ok(())
}

fn load_config(args: &Args) -> Result<GeminiConfig> {
    let config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            GeminiConfig::from_json(&raw)?
        }
        None => GeminiConfig::default(),
    };

    Ok(match &args.model {
        Some(model) => config.with_model(model),
        None => config,
    })
}
