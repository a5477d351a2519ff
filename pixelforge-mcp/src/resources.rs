//! Static catalog payloads for the PixelForge server.
//!
//! These back both the catalog tools (`list_available_models`,
//! `get_server_info`) and the read-only MCP resources:
//! - `pixelforge://models` - Image model catalog
//! - `pixelforge://aspect_ratios` - Supported aspect ratios
//! - `pixelforge://safety_presets` - Safety presets and their thresholds

use pixelforge_mcp_common::config::Settings;
use pixelforge_mcp_common::models::{
    AspectRatio, GEMINI_2_5_FLASH_IMAGE, GEMINI_3_PRO_IMAGE_PREVIEW, GeminiImageModel,
    ModelRegistry, SafetyPreset,
};
use serde::Serialize;
use serde_json::{Value, json};

/// URI of the model catalog resource.
pub const MODELS_URI: &str = "pixelforge://models";
/// URI of the aspect ratio resource.
pub const ASPECT_RATIOS_URI: &str = "pixelforge://aspect_ratios";
/// URI of the safety preset resource.
pub const SAFETY_PRESETS_URI: &str = "pixelforge://safety_presets";

const MODEL_RECOMMENDATION: &str =
    "Use gemini-2.5-flash-image for speed, gemini-3-pro-image-preview for quality";
const MODEL_NOTE: &str =
    "Each model can be selected per-request using the 'model' parameter in generate_image()";
const MODEL_SWITCHING_GUIDANCE: &str = "Models can be switched on every generate_image() call. \
     Use 'model' parameter to override default. \
     Call list_available_models() for detailed capabilities.";

/// Response of the `list_available_models` tool.
#[derive(Debug, Clone, Serialize)]
pub struct ModelCatalog {
    pub success: bool,
    pub models: &'static [GeminiImageModel],
    pub recommendation: &'static str,
    pub note: &'static str,
}

/// The model catalog.
pub fn model_catalog() -> ModelCatalog {
    ModelCatalog {
        success: true,
        models: ModelRegistry::list(),
        recommendation: MODEL_RECOMMENDATION,
        note: MODEL_NOTE,
    }
}

/// Response of the `get_server_info` tool.
pub fn server_info(settings: &Settings) -> Value {
    json!({
        "server": {
            "name": settings.server_name,
            "version": settings.server_version,
            "log_level": settings.log_level.as_str(),
        },
        "storage": {
            "output_directory": settings.output_dir.display().to_string(),
        },
        "imagen": {
            "default_model": settings.default_model,
            "default_aspect_ratio": settings.default_aspect_ratio.as_str(),
            "default_temperature": settings.default_temperature,
            "safety_setting": settings.safety_setting.as_str(),
        },
        "model_switching": {
            "enabled": true,
            "method": "per_request_parameter",
            "available_models": ModelRegistry::list().len(),
            "guidance": MODEL_SWITCHING_GUIDANCE,
            "quick_tips": {
                "fast": GEMINI_2_5_FLASH_IMAGE.id,
                "quality": GEMINI_3_PRO_IMAGE_PREVIEW.id,
                "text_in_images": GEMINI_3_PRO_IMAGE_PREVIEW.id,
                "high_res": GEMINI_3_PRO_IMAGE_PREVIEW.id,
            },
        },
    })
}

/// Content of `pixelforge://models`.
pub fn models_resource_json() -> String {
    serde_json::to_string_pretty(&model_catalog()).unwrap_or_else(|_| "{}".to_string())
}

/// Content of `pixelforge://aspect_ratios`.
pub fn aspect_ratios_resource_json() -> String {
    let ratios: Vec<&str> = AspectRatio::ALL.iter().map(|r| r.as_str()).collect();
    let value = json!({
        "aspect_ratios": ratios,
        "default": AspectRatio::default().as_str(),
    });
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
}

/// Content of `pixelforge://safety_presets`.
pub fn safety_presets_resource_json() -> String {
    let presets: Vec<Value> = SafetyPreset::ALL
        .iter()
        .map(|p| {
            json!({
                "name": p.as_str(),
                "threshold": p.threshold(),
                "categories": SafetyPreset::HARM_CATEGORIES,
                "default": *p == SafetyPreset::default(),
            })
        })
        .collect();
    serde_json::to_string_pretty(&json!({ "safety_presets": presets }))
        .unwrap_or_else(|_| "{}".to_string())
}
