//! Model catalog and the enumerated parameter domains shared by the
//! configuration resolver and the request validator.
//!
//! The catalog is informational. Model names supplied by callers are never
//! checked against it: the vendor API is the authority on which models
//! exist, and its rejection is relayed to the caller as-is.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Accepted sampling temperatures, inclusive on both ends.
pub const TEMPERATURE_RANGE: RangeInclusive<f64> = 0.0..=2.0;

/// Temperature used when neither config nor request supplies one.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Check a temperature against [`TEMPERATURE_RANGE`]. NaN and `-0.0` are
/// rejected.
pub fn check_temperature(value: f64) -> Result<f64, String> {
    if TEMPERATURE_RANGE.contains(&value) && !value.is_sign_negative() {
        Ok(value)
    } else {
        Err(format!(
            "Temperature must be between {:.1} and {:.1}, got {}",
            TEMPERATURE_RANGE.start(),
            TEMPERATURE_RANGE.end(),
            value
        ))
    }
}

/// Supported output aspect ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "2:3")]
    Portrait2x3,
    #[serde(rename = "3:2")]
    Landscape3x2,
    #[serde(rename = "3:4")]
    Portrait3x4,
    #[serde(rename = "4:3")]
    Landscape4x3,
    #[serde(rename = "4:5")]
    Portrait4x5,
    #[serde(rename = "5:4")]
    Landscape5x4,
    #[serde(rename = "9:16")]
    Portrait9x16,
    #[serde(rename = "16:9")]
    Landscape16x9,
    #[serde(rename = "21:9")]
    Ultrawide21x9,
}

impl AspectRatio {
    /// Every supported ratio, in the order shown to callers.
    pub const ALL: [AspectRatio; 10] = [
        AspectRatio::Square,
        AspectRatio::Portrait2x3,
        AspectRatio::Landscape3x2,
        AspectRatio::Portrait3x4,
        AspectRatio::Landscape4x3,
        AspectRatio::Portrait4x5,
        AspectRatio::Landscape5x4,
        AspectRatio::Portrait9x16,
        AspectRatio::Landscape16x9,
        AspectRatio::Ultrawide21x9,
    ];

    /// The wire form, e.g. `"16:9"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait2x3 => "2:3",
            AspectRatio::Landscape3x2 => "3:2",
            AspectRatio::Portrait3x4 => "3:4",
            AspectRatio::Landscape4x3 => "4:3",
            AspectRatio::Portrait4x5 => "4:5",
            AspectRatio::Landscape5x4 => "5:4",
            AspectRatio::Portrait9x16 => "9:16",
            AspectRatio::Landscape16x9 => "16:9",
            AspectRatio::Ultrawide21x9 => "21:9",
        }
    }

    /// Comma-separated list of valid values for error messages.
    pub fn valid_options() -> String {
        Self::ALL
            .iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Invalid aspect ratio '{}'. Valid options: {}",
                    s,
                    Self::valid_options()
                )
            })
    }
}

/// Named safety-filter levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SafetyPreset {
    /// Block content with low probability of harm and above.
    #[default]
    #[serde(rename = "preset:strict")]
    Strict,
    /// Block only content with high probability of harm.
    #[serde(rename = "preset:relaxed")]
    Relaxed,
}

impl SafetyPreset {
    /// Every supported preset.
    pub const ALL: [SafetyPreset; 2] = [SafetyPreset::Strict, SafetyPreset::Relaxed];

    /// Harm categories the preset thresholds apply to.
    pub const HARM_CATEGORIES: [&'static str; 4] = [
        "HARM_CATEGORY_HARASSMENT",
        "HARM_CATEGORY_HATE_SPEECH",
        "HARM_CATEGORY_SEXUALLY_EXPLICIT",
        "HARM_CATEGORY_DANGEROUS_CONTENT",
    ];

    /// The wire form, e.g. `"preset:strict"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            SafetyPreset::Strict => "preset:strict",
            SafetyPreset::Relaxed => "preset:relaxed",
        }
    }

    /// Vendor block threshold for this preset.
    pub fn threshold(&self) -> &'static str {
        match self {
            SafetyPreset::Strict => "BLOCK_LOW_AND_ABOVE",
            SafetyPreset::Relaxed => "BLOCK_ONLY_HIGH",
        }
    }

    /// Comma-separated list of valid values for error messages.
    pub fn valid_options() -> String {
        Self::ALL
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for SafetyPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SafetyPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Invalid safety setting '{}'. Valid options: {}",
                    s,
                    Self::valid_options()
                )
            })
    }
}

/// Capability ratings published for a model.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ModelCapabilities {
    pub text_rendering: &'static str,
    pub complex_scenes: &'static str,
    pub editing: &'static str,
    pub resolution: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_inputs: Option<&'static str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub thinking_process: bool,
}

/// Gemini image model definition.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GeminiImageModel {
    /// Full model identifier
    #[serde(rename = "name")]
    pub id: &'static str,
    /// Marketing name
    pub nickname: &'static str,
    pub speed: &'static str,
    pub quality: &'static str,
    /// Whether this is the built-in default model
    #[serde(rename = "default")]
    pub is_default: bool,
    pub description: &'static str,
    /// Typical use cases
    pub best_for: &'static [&'static str],
    pub capabilities: ModelCapabilities,
}

// =============================================================================
// Static Model Definitions
// =============================================================================

/// Gemini 2.5 Flash Image ("Nano Banana")
pub const GEMINI_2_5_FLASH_IMAGE: GeminiImageModel = GeminiImageModel {
    id: "gemini-2.5-flash-image",
    nickname: "Nano Banana",
    speed: "fast",
    quality: "good",
    is_default: true,
    description: "Optimized for speed and efficiency. Best for high-volume, low-latency tasks.",
    best_for: &[
        "Quick iterations and concept exploration",
        "High-volume batch generation",
        "Simple compositions and designs",
        "When speed matters more than perfection",
    ],
    capabilities: ModelCapabilities {
        text_rendering: "basic",
        complex_scenes: "moderate",
        editing: "basic",
        resolution: "1K",
        reference_inputs: None,
        thinking_process: false,
    },
};

/// Gemini 3 Pro Image (preview)
pub const GEMINI_3_PRO_IMAGE_PREVIEW: GeminiImageModel = GeminiImageModel {
    id: "gemini-3-pro-image-preview",
    nickname: "Gemini 3 Pro Image",
    speed: "moderate",
    quality: "excellent",
    is_default: false,
    description: "Latest reasoning-enhanced model with advanced composition capabilities.",
    best_for: &[
        "Photorealistic final outputs",
        "Complex multi-object scenes",
        "Legible text rendering in images",
        "Character consistency across images",
        "Multi-turn image editing workflows",
        "High-resolution outputs (2K/4K)",
    ],
    capabilities: ModelCapabilities {
        text_rendering: "excellent",
        complex_scenes: "excellent",
        editing: "advanced",
        resolution: "1K/2K/4K",
        reference_inputs: Some("up to 14 images"),
        thinking_process: true,
    },
};

/// All catalogued image models
pub const GEMINI_IMAGE_MODELS: &[GeminiImageModel] =
    &[GEMINI_2_5_FLASH_IMAGE, GEMINI_3_PRO_IMAGE_PREVIEW];

/// Default model identifier used when neither config nor request names one.
pub const DEFAULT_MODEL: &str = GEMINI_2_5_FLASH_IMAGE.id;

/// Lookup helpers over the static catalog.
pub struct ModelRegistry;

impl ModelRegistry {
    /// Find a catalogued model by its identifier.
    ///
    /// Returns `None` for uncatalogued names, which remain valid request values.
    pub fn find(name: &str) -> Option<&'static GeminiImageModel> {
        let name = name.trim();
        GEMINI_IMAGE_MODELS.iter().find(|m| m.id == name)
    }

    /// List all catalogued image models.
    pub fn list() -> &'static [GeminiImageModel] {
        GEMINI_IMAGE_MODELS
    }

    /// The catalogued default model.
    pub fn default_model() -> &'static GeminiImageModel {
        &GEMINI_2_5_FLASH_IMAGE
    }
}
