//! PixelForge MCP Common Library
//!
//! Settings resolution, the image model catalog, error types, tracing setup,
//! and the MCP transport runner used by the PixelForge server.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod error;
pub mod models;
pub mod server;
pub mod tracing;
pub mod transport;

#[cfg(test)]
mod transport_test;

pub use config::{ApiKey, FileConfig, LogLevel, Settings};
pub use error::{ConfigError, Error, Result};
pub use models::{AspectRatio, GeminiImageModel, ModelRegistry, SafetyPreset};
pub use server::{McpServerBuilder, ServerError, shutdown_channel};
pub use transport::{Transport, TransportArgs, TransportMode};
