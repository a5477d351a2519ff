//! Tracing initialization for the PixelForge server.
//!
//! Log output goes to stderr. On the stdio transport stdout carries the MCP
//! protocol stream, so nothing else may be written there.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Overrides the configured level when set. Examples:
//!   - `RUST_LOG=debug` - Enable debug logging for all modules
//!   - `RUST_LOG=pixelforge_mcp=debug` - Enable debug for the server crate only
//!   - `RUST_LOG=warn,reqwest=debug` - Warn by default, debug for the HTTP client

use crate::config::LogLevel;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
};

/// Build the filter: `RUST_LOG` if set and valid, else `default_level`.
pub fn env_filter(default_level: LogLevel) -> EnvFilter {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    filter_for(directives.as_deref(), default_level)
}

fn filter_for(directives: Option<&str>, default_level: LogLevel) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(default_level.as_str()))
}

/// Try to initialize tracing at the given default level.
///
/// Returns `Err(())` if a global subscriber was already installed, which
/// happens when tests initialize tracing more than once.
///
/// # Example
///
/// ```
/// use pixelforge_mcp_common::config::LogLevel;
/// use pixelforge_mcp_common::tracing::try_init_tracing;
///
/// let _ = try_init_tracing(LogLevel::Info);
/// tracing::info!("Server starting");
/// ```
pub fn try_init_tracing(default_level: LogLevel) -> Result<(), ()> {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE);

    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(fmt_layer)
        .try_init()
        .map_err(|_| ())
}
