//! CLI binary for receipt2json.
//!
//! A thin shim over the library crate: `extract` maps flags to an
//! `ExtractionConfig` and prints the result, `serve` runs the HTTP
//! endpoint.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use receipt2json::server::{serve, ServerState};
use receipt2json::{extract_receipt, ExtractionConfig, GeminiClient};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "receipt2json",
    version,
    about = "Extract structured receipt data from images using the Gemini vision API"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract a single receipt image and print the JSON result
    Extract {
        /// Path to the receipt image (JPEG, PNG, WebP, …)
        image: PathBuf,

        #[command(flatten)]
        opts: ExtractionOpts,
    },
    /// Run the HTTP endpoint
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1:8787")]
        addr: SocketAddr,

        /// API key clients must present (X-API-Key or Bearer).
        /// Unset = unauthenticated endpoint.
        #[arg(long, env = "API_KEY")]
        api_key: Option<String>,

        #[command(flatten)]
        opts: ExtractionOpts,
    },
}

#[derive(Args)]
struct ExtractionOpts {
    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: String,

    /// Gemini model identifier
    #[arg(long, default_value = receipt2json::DEFAULT_MODEL)]
    model: String,

    /// Sampling temperature (0.0–2.0)
    #[arg(long, default_value_t = 0.1)]
    temperature: f32,

    /// Maximum output tokens
    #[arg(long, default_value_t = 2048)]
    max_output_tokens: u32,

    /// Custom prompt replacing the built-in template
    #[arg(long)]
    prompt: Option<String>,

    /// Return whatever JSON the model produced instead of the fixed schema
    #[arg(long)]
    no_strict_schema: bool,
}

impl ExtractionOpts {
    fn to_config(&self) -> Result<ExtractionConfig> {
        let mut builder = ExtractionConfig::builder()
            .model(&self.model)
            .temperature(self.temperature)
            .max_output_tokens(self.max_output_tokens)
            .strict_schema(!self.no_strict_schema);
        if let Some(prompt) = &self.prompt {
            builder = builder.prompt_override(prompt);
        }
        builder.build().context("invalid extraction options")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Command::Extract { image, opts } => {
            let config = opts.to_config()?;
            let bytes = std::fs::read(&image)
                .with_context(|| format!("failed to read {}", image.display()))?;

            let client = GeminiClient::new(&opts.gemini_api_key);
            let result = extract_receipt(&client, &bytes, &config).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Serve {
            addr,
            api_key,
            opts,
        } => {
            let config = opts.to_config()?;
            let state = Arc::new(ServerState {
                client: GeminiClient::new(&opts.gemini_api_key),
                config,
                api_key,
            });
            serve(addr, state).await.context("server error")?;
        }
    }

    Ok(())
}
