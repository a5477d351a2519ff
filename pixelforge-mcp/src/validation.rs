//! Tool parameter types and request validation.
//!
//! Each tool deserializes its MCP arguments into a `*Params` struct, then
//! validates it against the resolved `Settings` to produce a request with
//! every default filled in. Validation collects every field error before
//! returning, and runs before any network call.

use pixelforge_mcp_common::config::Settings;
use pixelforge_mcp_common::error::Error;
use pixelforge_mcp_common::models::{AspectRatio, SafetyPreset, check_temperature};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Maximum prompt length, in characters, after trimming.
pub const MAX_PROMPT_CHARS: usize = 2000;

/// Image file extensions accepted for input and output, lowercase.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Prompt used by `analyze_image` when the caller supplies none.
pub const DEFAULT_ANALYSIS_PROMPT: &str =
    "Describe this image in detail, including objects, colors, composition, and mood.";

/// Validation error details for a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The field that failed validation.
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Join field errors into a single `Error::Validation`.
pub fn to_error(errors: &[ValidationError]) -> Error {
    let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    Error::validation(messages.join("; "))
}

// =============================================================================
// Tool Parameters
// =============================================================================

/// Arguments of the `generate_image` tool.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct GenerateImageParams {
    /// Text description of the image to generate (max 2000 characters).
    pub prompt: String,

    /// Filename to save under the output directory. Letters, digits, `_`,
    /// `-` and `.` only; `.png` is appended when there is no image extension.
    /// Generated from a timestamp when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_filename: Option<String>,

    /// Aspect ratio: 1:1, 2:3, 3:2, 3:4, 4:3, 4:5, 5:4, 9:16, 16:9, or 21:9.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,

    /// Creativity level between 0.0 and 2.0. Higher is more varied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Model to use, e.g. "gemini-2.5-flash-image" (fast) or
    /// "gemini-3-pro-image-preview" (quality). Call list_available_models
    /// for details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Content safety filter: "preset:strict" or "preset:relaxed".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety_setting: Option<String>,
}

/// Arguments of the `edit_image` tool.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct EditImageParams {
    /// Description of the desired changes (max 2000 characters).
    pub prompt: String,

    /// Path to the PNG, JPEG, or WebP image to edit.
    pub input_image_path: String,

    /// Filename for the edited image, with the same rules as generate_image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_filename: Option<String>,

    /// Creativity level between 0.0 and 2.0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Model to use. Defaults to the configured model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Arguments of the `analyze_image` tool.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct AnalyzeImageParams {
    /// Path to the PNG, JPEG, or WebP image to analyze.
    pub image_path: String,

    /// Custom analysis instruction. Defaults to a general description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    /// Model to use. Defaults to the configured model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

// =============================================================================
// Validated Requests
// =============================================================================

/// A fully resolved `generate_image` request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateImageRequest {
    pub prompt: String,
    pub output_filename: Option<String>,
    pub aspect_ratio: AspectRatio,
    pub temperature: f64,
    pub model: String,
    pub safety_setting: SafetyPreset,
}

/// A fully resolved `edit_image` request.
#[derive(Debug, Clone, PartialEq)]
pub struct EditImageRequest {
    pub prompt: String,
    /// Absolute path of the source image
    pub input_image_path: PathBuf,
    pub output_filename: Option<String>,
    pub temperature: f64,
    pub model: String,
}

/// A fully resolved `analyze_image` request.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeImageRequest {
    /// Absolute path of the image
    pub image_path: PathBuf,
    pub prompt: String,
    pub model: String,
}

impl GenerateImageParams {
    /// Validate and fill defaults from `settings`.
    ///
    /// # Returns
    /// - `Ok(GenerateImageRequest)` if all parameters are valid
    /// - `Err(Vec<ValidationError>)` with all validation errors
    pub fn validate(&self, settings: &Settings) -> Result<GenerateImageRequest, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let prompt = collect(&mut errors, validate_prompt("prompt", &self.prompt));
        let output_filename = collect(
            &mut errors,
            self.output_filename.as_deref().map(sanitize_filename).transpose(),
        );

        let aspect_ratio = match self.aspect_ratio.as_deref() {
            None => Some(settings.default_aspect_ratio),
            Some(raw) => collect(
                &mut errors,
                raw.parse::<AspectRatio>()
                    .map_err(|msg| ValidationError::new("aspect_ratio", msg)),
            ),
        };

        let temperature = collect(
            &mut errors,
            resolve_temperature(self.temperature, settings),
        );

        let safety_setting = match self.safety_setting.as_deref() {
            None => Some(settings.safety_setting),
            Some(raw) => collect(
                &mut errors,
                raw.parse::<SafetyPreset>()
                    .map_err(|msg| ValidationError::new("safety_setting", msg)),
            ),
        };

        match (prompt, output_filename, aspect_ratio, temperature, safety_setting) {
            (Some(prompt), Some(output_filename), Some(aspect_ratio), Some(temperature), Some(safety_setting))
                if errors.is_empty() =>
            {
                Ok(GenerateImageRequest {
                    prompt,
                    output_filename,
                    aspect_ratio,
                    temperature,
                    model: resolve_model(self.model.as_deref(), settings),
                    safety_setting,
                })
            }
            _ => Err(errors),
        }
    }
}

impl EditImageParams {
    /// Validate and fill defaults from `settings`.
    pub fn validate(&self, settings: &Settings) -> Result<EditImageRequest, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let prompt = collect(&mut errors, validate_prompt("prompt", &self.prompt));
        let input_image_path = collect(
            &mut errors,
            validate_image_path("input_image_path", &self.input_image_path),
        );
        let output_filename = collect(
            &mut errors,
            self.output_filename.as_deref().map(sanitize_filename).transpose(),
        );
        let temperature = collect(
            &mut errors,
            resolve_temperature(self.temperature, settings),
        );

        match (prompt, input_image_path, output_filename, temperature) {
            (Some(prompt), Some(input_image_path), Some(output_filename), Some(temperature))
                if errors.is_empty() =>
            {
                Ok(EditImageRequest {
                    prompt,
                    input_image_path,
                    output_filename,
                    temperature,
                    model: resolve_model(self.model.as_deref(), settings),
                })
            }
            _ => Err(errors),
        }
    }
}

impl AnalyzeImageParams {
    /// Validate and fill defaults from `settings`.
    pub fn validate(&self, settings: &Settings) -> Result<AnalyzeImageRequest, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let image_path = collect(
            &mut errors,
            validate_image_path("image_path", &self.image_path),
        );
        let prompt = match self.prompt.as_deref() {
            None => Some(DEFAULT_ANALYSIS_PROMPT.to_string()),
            Some(raw) => collect(&mut errors, validate_prompt("prompt", raw)),
        };

        match (image_path, prompt) {
            (Some(image_path), Some(prompt)) if errors.is_empty() => Ok(AnalyzeImageRequest {
                image_path,
                prompt,
                model: resolve_model(self.model.as_deref(), settings),
            }),
            _ => Err(errors),
        }
    }
}

fn collect<T>(errors: &mut Vec<ValidationError>, result: Result<T, ValidationError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            errors.push(e);
            None
        }
    }
}

fn resolve_model(model: Option<&str>, settings: &Settings) -> String {
    match model.map(str::trim) {
        Some(m) if !m.is_empty() => m.to_string(),
        _ => settings.default_model.clone(),
    }
}

fn resolve_temperature(value: Option<f64>, settings: &Settings) -> Result<f64, ValidationError> {
    match value {
        None => Ok(settings.default_temperature),
        Some(t) => check_temperature(t).map_err(|msg| ValidationError::new("temperature", msg)),
    }
}

// =============================================================================
// Field Validators
// =============================================================================

/// Trim a prompt and check it is non-empty and within `MAX_PROMPT_CHARS`.
pub fn validate_prompt(field: &str, raw: &str) -> Result<String, ValidationError> {
    let prompt = raw.trim();
    if prompt.is_empty() {
        return Err(ValidationError::new(field, "Prompt cannot be empty"));
    }
    if prompt.chars().count() > MAX_PROMPT_CHARS {
        return Err(ValidationError::new(
            field,
            format!("Prompt too long (max {} characters)", MAX_PROMPT_CHARS),
        ));
    }
    Ok(prompt.to_string())
}

/// Reject path traversal and unusual characters, and default the extension
/// to `.png`.
///
/// # Example
///
/// ```
/// use pixelforge_mcp::validation::sanitize_filename;
///
/// assert_eq!(sanitize_filename("sunset").unwrap(), "sunset.png");
/// assert_eq!(sanitize_filename("photo.JPG").unwrap(), "photo.JPG");
/// assert!(sanitize_filename("../etc/passwd").is_err());
/// ```
pub fn sanitize_filename(raw: &str) -> Result<String, ValidationError> {
    const FIELD: &str = "output_filename";

    if raw.is_empty() {
        return Err(ValidationError::new(FIELD, "Filename cannot be empty"));
    }
    if raw.contains("..") || raw.contains('/') || raw.contains('\\') {
        return Err(ValidationError::new(
            FIELD,
            "Filename cannot contain path separators",
        ));
    }
    if !raw
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(ValidationError::new(
            FIELD,
            "Filename can only contain letters, numbers, underscore, hyphen, and dot",
        ));
    }

    if has_image_extension(raw) {
        Ok(raw.to_string())
    } else {
        Ok(format!("{}.png", raw))
    }
}

fn has_image_extension(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(&format!(".{}", ext)))
}

/// Check that `raw` names an existing image file and return its absolute path.
pub fn validate_image_path(field: &str, raw: &str) -> Result<PathBuf, ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::new(field, "Image path cannot be empty"));
    }

    let path = Path::new(raw);
    if !path.exists() {
        return Err(ValidationError::new(field, format!("Image not found: {}", raw)));
    }
    if !path.is_file() {
        return Err(ValidationError::new(field, format!("Path is not a file: {}", raw)));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ValidationError::new(
            field,
            format!(
                "Invalid image format '{}'. Supported: {}",
                extension,
                IMAGE_EXTENSIONS.join(", ")
            ),
        ));
    }

    std::path::absolute(path)
        .map_err(|e| ValidationError::new(field, format!("Cannot resolve {}: {}", raw, e)))
}

/// MIME type for an image path, from its extension.
pub fn mime_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn settings() -> Settings {
        Settings::new("test-key")
    }

    fn image_file(dir: &tempfile::TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, b"\x89PNG\r\n\x1a\n").unwrap();
        path
    }

    #[test]
    fn test_generate_defaults_come_from_settings() {
        let mut settings = settings();
        settings.default_model = "gemini-3-pro-image-preview".to_string();
        settings.default_aspect_ratio = AspectRatio::Landscape16x9;
        settings.default_temperature = 1.1;
        settings.safety_setting = SafetyPreset::Relaxed;

        let params = GenerateImageParams {
            prompt: "  a red fox in snow  ".to_string(),
            ..Default::default()
        };
        let request = params.validate(&settings).unwrap();

        assert_eq!(request.prompt, "a red fox in snow");
        assert_eq!(request.model, "gemini-3-pro-image-preview");
        assert_eq!(request.aspect_ratio, AspectRatio::Landscape16x9);
        assert_eq!(request.temperature, 1.1);
        assert_eq!(request.safety_setting, SafetyPreset::Relaxed);
        assert_eq!(request.output_filename, None);
    }

    #[test]
    fn test_generate_collects_every_error() {
        let params = GenerateImageParams {
            prompt: "   ".to_string(),
            aspect_ratio: Some("7:3".to_string()),
            temperature: Some(2.5),
            safety_setting: Some("preset:none".to_string()),
            output_filename: Some("../x".to_string()),
            model: None,
        };
        let errors = params.validate(&settings()).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();

        assert_eq!(
            fields,
            vec!["prompt", "output_filename", "aspect_ratio", "temperature", "safety_setting"]
        );
        assert_eq!(errors[0].message, "Prompt cannot be empty");
        assert!(errors[2].message.contains("16:9"), "should list valid options");
        assert!(errors[4].message.contains("preset:relaxed"));
    }

    #[test]
    fn test_decoded_temperature_just_outside_range_is_rejected() {
        for raw in [
            r#"{"prompt": "p", "temperature": 2.00000001}"#,
            r#"{"prompt": "p", "temperature": -1e-50}"#,
            r#"{"prompt": "p", "temperature": -0.0}"#,
        ] {
            let params: GenerateImageParams = serde_json::from_str(raw).unwrap();
            let errors = params.validate(&settings()).unwrap_err();
            assert_eq!(errors[0].field, "temperature", "for {}", raw);
        }

        let params: GenerateImageParams =
            serde_json::from_str(r#"{"prompt": "p", "temperature": 2.0}"#).unwrap();
        assert_eq!(params.validate(&settings()).unwrap().temperature, 2.0);
    }

    #[test]
    fn test_prompt_length_limit() {
        assert!(validate_prompt("prompt", &"a".repeat(MAX_PROMPT_CHARS)).is_ok());
        let err = validate_prompt("prompt", &"a".repeat(MAX_PROMPT_CHARS + 1)).unwrap_err();
        assert_eq!(err.message, "Prompt too long (max 2000 characters)");
    }

    #[test]
    fn test_prompt_length_counts_characters_not_bytes() {
        let prompt = "é".repeat(MAX_PROMPT_CHARS);
        assert!(validate_prompt("prompt", &prompt).is_ok());
    }

    #[test]
    fn test_blank_model_uses_default() {
        let params = GenerateImageParams {
            prompt: "p".to_string(),
            model: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(params.validate(&settings()).unwrap().model, "gemini-2.5-flash-image");
    }

    #[test]
    fn test_unknown_model_is_forwarded() {
        let params = GenerateImageParams {
            prompt: "p".to_string(),
            model: Some("imagen-99-ultra".to_string()),
            ..Default::default()
        };
        assert_eq!(params.validate(&settings()).unwrap().model, "imagen-99-ultra");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("cat").unwrap(), "cat.png");
        assert_eq!(sanitize_filename("cat.webp").unwrap(), "cat.webp");
        assert_eq!(sanitize_filename("cat.JPEG").unwrap(), "cat.JPEG");
        assert_eq!(sanitize_filename("cat.gif").unwrap(), "cat.gif.png");
        assert_eq!(sanitize_filename("my-cat_01").unwrap(), "my-cat_01.png");

        assert!(sanitize_filename("..").is_err());
        assert!(sanitize_filename("a/b.png").is_err());
        assert!(sanitize_filename("a\\b.png").is_err());
        assert!(sanitize_filename("cat pic.png").is_err());
        assert!(sanitize_filename("").is_err());
    }

    #[test]
    fn test_image_path_checks() {
        let dir = tempfile::tempdir().unwrap();
        let png = image_file(&dir, "in.PNG");
        let txt = image_file(&dir, "notes.txt");

        let resolved = validate_image_path("image_path", png.to_str().unwrap()).unwrap();
        assert!(resolved.is_absolute());

        let err = validate_image_path("image_path", txt.to_str().unwrap()).unwrap_err();
        assert!(err.message.contains("Invalid image format"));

        let err = validate_image_path("image_path", dir.path().to_str().unwrap()).unwrap_err();
        assert!(err.message.contains("not a file"));

        let missing = dir.path().join("missing.png");
        let err = validate_image_path("image_path", missing.to_str().unwrap()).unwrap_err();
        assert!(err.message.contains("not found"));
    }

    #[test]
    fn test_edit_validation() {
        let dir = tempfile::tempdir().unwrap();
        let png = image_file(&dir, "source.png");

        let params = EditImageParams {
            prompt: "add a rainbow".to_string(),
            input_image_path: png.to_string_lossy().into_owned(),
            output_filename: Some("rainbow".to_string()),
            temperature: Some(0.0),
            model: None,
        };
        let request = params.validate(&settings()).unwrap();
        assert_eq!(request.output_filename.as_deref(), Some("rainbow.png"));
        assert_eq!(request.temperature, 0.0);
        assert!(request.input_image_path.is_absolute());

        let params = EditImageParams {
            prompt: String::new(),
            input_image_path: dir.path().join("nope.png").to_string_lossy().into_owned(),
            ..Default::default()
        };
        let errors = params.validate(&settings()).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_analyze_default_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let jpg = image_file(&dir, "photo.jpg");

        let params = AnalyzeImageParams {
            image_path: jpg.to_string_lossy().into_owned(),
            prompt: None,
            model: None,
        };
        let request = params.validate(&settings()).unwrap();
        assert_eq!(request.prompt, DEFAULT_ANALYSIS_PROMPT);

        let params = AnalyzeImageParams {
            image_path: jpg.to_string_lossy().into_owned(),
            prompt: Some(" ".to_string()),
            model: None,
        };
        assert!(params.validate(&settings()).is_err());
    }

    #[test]
    fn test_to_error_joins_messages() {
        let err = to_error(&[
            ValidationError::new("prompt", "Prompt cannot be empty"),
            ValidationError::new("temperature", "out of range"),
        ]);
        assert!(err.is_validation());
        assert!(err.to_string().contains("prompt: Prompt cannot be empty; temperature: out of range"));
    }

    #[test]
    fn test_mime_type_for() {
        assert_eq!(mime_type_for(Path::new("a.PNG")), "image/png");
        assert_eq!(mime_type_for(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("a.webp")), "image/webp");
    }

    fn valid_ratio_strategy() -> impl Strategy<Value = AspectRatio> {
        prop::sample::select(AspectRatio::ALL.to_vec())
    }

    proptest! {
        /// Any temperature outside [0, 2] is rejected.
        #[test]
        fn temperature_outside_range_rejected(
            t in prop_oneof![-1000.0f64..-0.0001f64, 2.0001f64..1000.0f64]
        ) {
            let params = GenerateImageParams {
                prompt: "p".to_string(),
                temperature: Some(t),
                ..Default::default()
            };
            let errors = params.validate(&settings()).unwrap_err();
            prop_assert_eq!(errors.len(), 1);
            prop_assert_eq!(errors[0].field.as_str(), "temperature");
        }

        /// Every supported ratio validates, whatever the model.
        #[test]
        fn every_ratio_valid_for_any_model(
            ratio in valid_ratio_strategy(),
            model in "[a-z][a-z0-9.-]{0,30}"
        ) {
            let params = GenerateImageParams {
                prompt: "p".to_string(),
                aspect_ratio: Some(ratio.as_str().to_string()),
                model: Some(model.clone()),
                ..Default::default()
            };
            let request = params.validate(&settings()).unwrap();
            prop_assert_eq!(request.aspect_ratio, ratio);
            prop_assert_eq!(request.model, model);
        }

        /// Strings outside the ratio set are rejected.
        #[test]
        fn unknown_ratio_rejected(raw in "[0-9]{1,2}:[0-9]{1,2}") {
            prop_assume!(!AspectRatio::ALL.iter().any(|r| r.as_str() == raw));
            let params = GenerateImageParams {
                prompt: "p".to_string(),
                aspect_ratio: Some(raw),
                ..Default::default()
            };
            prop_assert!(params.validate(&settings()).is_err());
        }

        /// Accepted filenames are a single path component with an image extension.
        #[test]
        fn sanitized_filename_is_a_single_component(raw in "[A-Za-z0-9_./\\\\-]{1,30}") {
            if let Ok(name) = sanitize_filename(&raw) {
                prop_assert!(!name.contains('/'));
                prop_assert!(!name.contains('\\'));
                prop_assert!(has_image_extension(&name));
            }
        }
    }
}
