//! PixelForge MCP Server
//!
//! MCP server for image generation, editing, and analysis using Google
//! Gemini image models.

use anyhow::{Context, Result};
use clap::Parser;
use pixelforge_mcp::PixelForgeServer;
use pixelforge_mcp_common::config::{CONFIG_PATH_ENV_VAR, DEFAULT_CONFIG_PATH};
use pixelforge_mcp_common::tracing::try_init_tracing;
use pixelforge_mcp_common::{McpServerBuilder, Settings, TransportArgs};
use std::path::PathBuf;

/// Command-line arguments for the PixelForge server.
#[derive(Parser, Debug)]
#[command(name = "pixelforge-mcp", version)]
#[command(about = "MCP server for image generation, editing, and analysis using Google Gemini")]
struct Args {
    /// Transport configuration
    #[command(flatten)]
    transport: TransportArgs,

    /// Path to the YAML config file
    #[arg(long, env = CONFIG_PATH_ENV_VAR, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env may carry PIXELFORGE_CONFIG, PORT or PIXELFORGE_HOST, which clap reads
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Settings decide the default log level, so they load before tracing exists
    let settings = Settings::load(Some(args.config.as_path())).context("Failed to load configuration")?;
    let _ = try_init_tracing(settings.log_level);

    tracing::info!(
        name = %settings.server_name,
        version = %settings.server_version,
        default_model = %settings.default_model,
        output_dir = %settings.output_dir.display(),
        config_file = %args.config.display(),
        config_file_found = args.config.is_file(),
        "Configuration loaded"
    );

    let server = PixelForgeServer::new(settings).context("Failed to initialize server")?;

    let transport = args.transport.into_transport();
    McpServerBuilder::new(server)
        .with_transport(transport)
        .run()
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
