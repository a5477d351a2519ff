//! PixelForge MCP Server Library
//!
//! Image generation, editing, and analysis over the Model Context Protocol,
//! backed by Google Gemini image models.

pub mod handler;
pub mod resources;
pub mod server;
pub mod validation;

pub use handler::{AnalysisResult, ImageHandler, ImageResult};
pub use server::PixelForgeServer;
pub use validation::{AnalyzeImageParams, EditImageParams, GenerateImageParams, ValidationError};
