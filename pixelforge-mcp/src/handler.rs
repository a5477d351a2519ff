//! Image handler for the PixelForge server.
//!
//! This module provides the `ImageHandler` struct, which sends validated
//! requests to the Gemini `generateContent` API, writes returned images to
//! the output directory, and shapes the results returned to MCP callers.

use crate::validation::{AnalyzeImageRequest, EditImageRequest, GenerateImageRequest, mime_type_for};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use pixelforge_mcp_common::config::Settings;
use pixelforge_mcp_common::error::Error;
use pixelforge_mcp_common::models::SafetyPreset;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Timeout applied to each vendor request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Image handler.
///
/// Holds the resolved settings and a pooled HTTP client. Cheap to share
/// behind an `Arc`; every call is independent.
#[derive(Debug, Clone)]
pub struct ImageHandler {
    settings: Arc<Settings>,
    http: reqwest::Client,
}

impl ImageHandler {
    /// Create a new ImageHandler with the given settings.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    #[instrument(level = "debug", name = "image_handler_new", skip_all)]
    pub fn new(settings: Arc<Settings>) -> Result<Self, Error> {
        debug!(base_url = %settings.api_base_url, "Initializing ImageHandler");

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                Error::api(&settings.api_base_url, 0, format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self { settings, http })
    }

    /// The resolved settings this handler was built with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Generate an image from a text prompt.
    ///
    /// # Returns
    /// * `Ok(ImageResult)` - Where the image was saved and how it was produced
    /// * `Err(Error)` - If the API call fails or the image cannot be written
    #[instrument(
        level = "info",
        name = "generate_image",
        skip(self, request),
        fields(model = %request.model, aspect_ratio = %request.aspect_ratio)
    )]
    pub async fn generate_image(&self, request: GenerateImageRequest) -> Result<ImageResult, Error> {
        info!(temperature = request.temperature, "Generating image with Gemini API");

        let body = GenerateContentRequest {
            contents: vec![GeminiContent::user(vec![GeminiPart::text(&request.prompt)])],
            generation_config: GeminiGenerationConfig {
                response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
                temperature: Some(request.temperature),
                image_config: Some(GeminiImageConfig {
                    aspect_ratio: request.aspect_ratio.as_str().to_string(),
                }),
            },
            safety_settings: safety_settings(request.safety_setting),
        };

        let (endpoint, response) = self.generate_content(&request.model, &body).await?;
        let image = extract_image(&endpoint, &response)?;

        let path = self.output_path(request.output_filename.as_deref(), "generated");
        let (image_path, image_size_bytes) = self.save_image(&endpoint, &image, &path).await?;

        info!(path = %image_path, bytes = image_size_bytes, "Image generated");

        Ok(ImageResult {
            success: true,
            message: format!("Image generated successfully at {}", image_path),
            image_path,
            image_size_bytes,
            details: ImageDetails {
                model: request.model,
                aspect_ratio: Some(request.aspect_ratio.as_str().to_string()),
                temperature: request.temperature,
            },
        })
    }

    /// Edit an existing image according to a prompt.
    #[instrument(
        level = "info",
        name = "edit_image",
        skip(self, request),
        fields(model = %request.model, input = %request.input_image_path.display())
    )]
    pub async fn edit_image(&self, request: EditImageRequest) -> Result<ImageResult, Error> {
        let source = read_inline_image(&request.input_image_path).await?;

        info!(temperature = request.temperature, "Editing image with Gemini API");

        let body = GenerateContentRequest {
            contents: vec![GeminiContent::user(vec![
                GeminiPart::text(&request.prompt),
                GeminiPart::InlineData { inline_data: source },
            ])],
            generation_config: GeminiGenerationConfig {
                response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
                temperature: Some(request.temperature),
                image_config: None,
            },
            safety_settings: safety_settings(self.settings.safety_setting),
        };

        let (endpoint, response) = self.generate_content(&request.model, &body).await?;
        let image = extract_image(&endpoint, &response)?;

        let path = self.output_path(request.output_filename.as_deref(), "edited");
        let (image_path, image_size_bytes) = self.save_image(&endpoint, &image, &path).await?;

        info!(path = %image_path, bytes = image_size_bytes, "Image edited");

        Ok(ImageResult {
            success: true,
            message: format!("Image edited successfully at {}", image_path),
            image_path,
            image_size_bytes,
            details: ImageDetails {
                model: request.model,
                aspect_ratio: None,
                temperature: request.temperature,
            },
        })
    }

    /// Describe an image in text.
    #[instrument(
        level = "info",
        name = "analyze_image",
        skip(self, request),
        fields(model = %request.model, image = %request.image_path.display())
    )]
    pub async fn analyze_image(&self, request: AnalyzeImageRequest) -> Result<AnalysisResult, Error> {
        let image = read_inline_image(&request.image_path).await?;

        let body = GenerateContentRequest {
            contents: vec![GeminiContent::user(vec![
                GeminiPart::text(&request.prompt),
                GeminiPart::InlineData { inline_data: image },
            ])],
            generation_config: GeminiGenerationConfig {
                response_modalities: vec!["TEXT".to_string()],
                temperature: None,
                image_config: None,
            },
            safety_settings: safety_settings(self.settings.safety_setting),
        };

        let (endpoint, response) = self.generate_content(&request.model, &body).await?;
        let analysis = extract_text(&response);

        if analysis.is_empty() {
            return Err(Error::api(
                &endpoint,
                200,
                no_output_message("No analysis returned", &response),
            ));
        }

        info!(chars = analysis.len(), "Image analyzed");

        Ok(AnalysisResult {
            success: true,
            analysis,
            image_path: request.image_path.display().to_string(),
        })
    }

    /// POST a request to the model's generateContent endpoint.
    async fn generate_content(
        &self,
        model: &str,
        body: &GenerateContentRequest,
    ) -> Result<(String, GeminiResponse), Error> {
        let endpoint = self.settings.generate_content_endpoint(model);
        debug!(endpoint = %endpoint, "Calling Gemini API");

        let response = self
            .http
            .post(&endpoint)
            .header(API_KEY_HEADER, self.settings.api_key.expose())
            .json(body)
            .send()
            .await
            .map_err(|e| Error::api(&endpoint, 0, format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Gemini API returned an error");
            return Err(Error::api(&endpoint, status.as_u16(), body));
        }

        let response_text = response.text().await.map_err(|e| {
            Error::api(&endpoint, status.as_u16(), format!("Failed to read response: {}", e))
        })?;

        debug!(bytes = response_text.len(), "Received Gemini API response");

        let parsed: GeminiResponse = serde_json::from_str(&response_text).map_err(|e| {
            Error::api(
                &endpoint,
                status.as_u16(),
                format!(
                    "Failed to parse response: {}. Raw: {}",
                    e,
                    truncate(&response_text, 1000)
                ),
            )
        })?;

        Ok((endpoint, parsed))
    }

    /// Where to write an output image.
    ///
    /// `filename` must already be sanitised. Without one, a millisecond
    /// timestamp name is generated under the given prefix.
    pub fn output_path(&self, filename: Option<&str>, prefix: &str) -> PathBuf {
        match filename {
            Some(name) => self.settings.output_dir.join(name),
            None => {
                let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S_%3f");
                self.settings
                    .output_dir
                    .join(format!("{}_{}.png", prefix, timestamp))
            }
        }
    }

    /// Decode and write an image, returning its absolute path and size.
    async fn save_image(
        &self,
        endpoint: &str,
        image: &GeminiInlineData,
        path: &Path,
    ) -> Result<(String, u64), Error> {
        let data = BASE64
            .decode(&image.data)
            .map_err(|e| Error::api(endpoint, 200, format!("Invalid image data in response: {}", e)))?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, &data).await?;

        let absolute = std::path::absolute(path)?;
        Ok((absolute.display().to_string(), data.len() as u64))
    }
}

fn safety_settings(preset: SafetyPreset) -> Vec<GeminiSafetySetting> {
    SafetyPreset::HARM_CATEGORIES
        .iter()
        .map(|category| GeminiSafetySetting {
            category: category.to_string(),
            threshold: preset.threshold().to_string(),
        })
        .collect()
}

async fn read_inline_image(path: &Path) -> Result<GeminiInlineData, Error> {
    let bytes = tokio::fs::read(path).await?;
    Ok(GeminiInlineData {
        mime_type: mime_type_for(path).to_string(),
        data: BASE64.encode(bytes),
    })
}

/// The last non-thought image in the first candidate.
///
/// Thinking models may emit draft images marked as thoughts before the
/// final one.
fn extract_image(endpoint: &str, response: &GeminiResponse) -> Result<GeminiInlineData, Error> {
    response
        .candidates
        .iter()
        .filter_map(|c| c.content.as_ref())
        .flat_map(|content| content.parts.iter())
        .filter_map(|part| match part {
            GeminiResponsePart::InlineData { inline_data, thought: false } => Some(inline_data),
            _ => None,
        })
        .last()
        .cloned()
        .ok_or_else(|| Error::api(endpoint, 200, no_output_message("No image returned", response)))
}

/// Concatenated non-thought text of all candidates.
fn extract_text(response: &GeminiResponse) -> String {
    response
        .candidates
        .iter()
        .filter_map(|c| c.content.as_ref())
        .flat_map(|content| content.parts.iter())
        .filter_map(|part| match part {
            GeminiResponsePart::Text { text, thought: false } => Some(text.as_str()),
            _ => None,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Explain an empty response using whatever the vendor reported.
fn no_output_message(prefix: &str, response: &GeminiResponse) -> String {
    let mut message = prefix.to_string();

    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        message.push_str(&format!(" (prompt blocked: {})", reason));
    } else if let Some(reason) = response
        .candidates
        .iter()
        .find_map(|c| c.finish_reason.as_deref())
    {
        message.push_str(&format!(" (finish reason: {})", reason));
    }

    let text = extract_text(response);
    if !text.is_empty() {
        message.push_str(&format!(". Model said: {}", text));
    }
    message
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// =============================================================================
// API Request/Response Types
// =============================================================================

/// Gemini generateContent request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// Conversation contents
    pub contents: Vec<GeminiContent>,
    /// Generation configuration
    pub generation_config: GeminiGenerationConfig,
    /// Per-category block thresholds
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub safety_settings: Vec<GeminiSafetySetting>,
}

/// Gemini content structure.
#[derive(Debug, Serialize)]
pub struct GeminiContent {
    /// Role (user or model)
    pub role: String,
    /// Content parts
    pub parts: Vec<GeminiPart>,
}

impl GeminiContent {
    fn user(parts: Vec<GeminiPart>) -> Self {
        Self {
            role: "user".to_string(),
            parts,
        }
    }
}

/// Gemini content part (request).
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum GeminiPart {
    /// Text content
    Text { text: String },
    /// Inline image
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
}

impl GeminiPart {
    fn text(text: &str) -> Self {
        GeminiPart::Text {
            text: text.to_string(),
        }
    }
}

/// Gemini generation config.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiGenerationConfig {
    /// Response modalities (TEXT, IMAGE)
    pub response_modalities: Vec<String>,
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Image configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_config: Option<GeminiImageConfig>,
}

/// Gemini image configuration.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiImageConfig {
    /// Aspect ratio for generated images
    pub aspect_ratio: String,
}

/// Block threshold for one harm category.
#[derive(Debug, Serialize)]
pub struct GeminiSafetySetting {
    pub category: String,
    pub threshold: String,
}

/// Gemini API response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiResponse {
    /// Response candidates
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
    /// Present when the prompt itself was rejected
    #[serde(default)]
    pub prompt_feedback: Option<GeminiPromptFeedback>,
}

/// Gemini response candidate.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiCandidate {
    /// Content
    pub content: Option<GeminiResponseContent>,
    /// Why generation stopped, e.g. STOP, SAFETY, IMAGE_SAFETY
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Prompt-level feedback.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiPromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

/// Gemini response content.
#[derive(Debug, Deserialize)]
pub struct GeminiResponseContent {
    /// Content parts
    #[serde(default)]
    pub parts: Vec<GeminiResponsePart>,
}

/// Gemini response part.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum GeminiResponsePart {
    /// Inline data (image)
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
        #[serde(default)]
        thought: bool,
    },
    /// Text content
    Text {
        text: String,
        #[serde(default)]
        thought: bool,
    },
    /// Any other part kind
    Other(serde::de::IgnoredAny),
}

/// Gemini inline data (base64 encoded).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiInlineData {
    /// MIME type
    pub mime_type: String,
    /// Base64-encoded data
    pub data: String,
}

// =============================================================================
// Result Types
// =============================================================================

/// Result of `generate_image` and `edit_image`.
#[derive(Debug, Clone, Serialize)]
pub struct ImageResult {
    pub success: bool,
    pub message: String,
    /// Absolute path of the written image
    pub image_path: String,
    pub image_size_bytes: u64,
    pub details: ImageDetails,
}

/// Parameters the image was produced with.
#[derive(Debug, Clone, Serialize)]
pub struct ImageDetails {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    pub temperature: f64,
}

/// Result of `analyze_image`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub success: bool,
    pub analysis: String,
    pub image_path: String,
}
