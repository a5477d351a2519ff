//! MCP Server implementation for PixelForge.
//!
//! This module provides the MCP server handler that exposes:
//! - `generate_image`, `edit_image`, and `analyze_image` tools backed by Gemini
//! - `list_available_models` and `get_server_info` catalog tools
//! - Resources for models, aspect ratios, and safety presets
//!
//! Invalid arguments are reported as MCP `invalid_params` errors. Failures
//! after validation (vendor rejections, I/O) come back as a tool result
//! with `isError` set and a `{success: false, message}` JSON body.

use crate::handler::ImageHandler;
use crate::resources;
use crate::validation::{AnalyzeImageParams, EditImageParams, GenerateImageParams, ValidationError, to_error};
use pixelforge_mcp_common::config::Settings;
use pixelforge_mcp_common::error::Error;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    model::{
        CallToolResult, Content, Implementation, ListResourcesResult, ListToolsResult,
        ReadResourceResult, Resource, ResourceContents, ServerCapabilities, ServerInfo, Tool,
    },
};
use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Tool argument object as received over MCP.
pub type Arguments = serde_json::Map<String, serde_json::Value>;

/// MCP Server for image generation, editing, and analysis.
#[derive(Clone)]
pub struct PixelForgeServer {
    handler: Arc<ImageHandler>,
}

impl PixelForgeServer {
    /// Create a new server from resolved settings.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(settings: Settings) -> Result<Self, Error> {
        let handler = ImageHandler::new(Arc::new(settings))?;
        Ok(Self {
            handler: Arc::new(handler),
        })
    }

    /// The settings the server is running with.
    pub fn settings(&self) -> &Settings {
        self.handler.settings()
    }

    /// Run a tool by name.
    pub async fn dispatch(&self, name: &str, arguments: Option<Arguments>) -> Result<CallToolResult, McpError> {
        match name {
            "generate_image" => self.generate_image(parse_arguments(arguments)?).await,
            "edit_image" => self.edit_image(parse_arguments(arguments)?).await,
            "analyze_image" => self.analyze_image(parse_arguments(arguments)?).await,
            "list_available_models" => {
                info!("Listing available models");
                Ok(CallToolResult::success(vec![json_content(&resources::model_catalog())]))
            }
            "get_server_info" => {
                debug!("Reporting server info");
                Ok(CallToolResult::success(vec![json_content(&resources::server_info(
                    self.settings(),
                ))]))
            }
            _ => Err(McpError::invalid_params(format!("Unknown tool: {}", name), None)),
        }
    }

    /// Generate an image from a text prompt.
    pub async fn generate_image(&self, params: GenerateImageParams) -> Result<CallToolResult, McpError> {
        let request = params.validate(self.settings()).map_err(invalid_params)?;
        info!(prompt = %preview(&request.prompt), "Generating image");
        tool_result(self.handler.generate_image(request).await)
    }

    /// Edit an existing image.
    pub async fn edit_image(&self, params: EditImageParams) -> Result<CallToolResult, McpError> {
        let request = params.validate(self.settings()).map_err(invalid_params)?;
        info!(input = %request.input_image_path.display(), "Editing image");
        tool_result(self.handler.edit_image(request).await)
    }

    /// Describe an image.
    pub async fn analyze_image(&self, params: AnalyzeImageParams) -> Result<CallToolResult, McpError> {
        let request = params.validate(self.settings()).map_err(invalid_params)?;
        info!(image = %request.image_path.display(), "Analyzing image");
        tool_result(self.handler.analyze_image(request).await)
    }
}

/// Descriptors of every tool the server exposes.
pub fn tools() -> Vec<Tool> {
    vec![
        tool(
            "generate_image",
            "Generate an image from a text prompt using Google Gemini and save it to the \
             output directory. Choose gemini-2.5-flash-image for fast iterations or \
             gemini-3-pro-image-preview for quality, text in images, and high resolution. \
             The model can be switched on every call.",
            schema_of::<GenerateImageParams>(),
        ),
        tool(
            "edit_image",
            "Edit an existing local image according to a text prompt and save the result \
             to the output directory.",
            schema_of::<EditImageParams>(),
        ),
        tool(
            "analyze_image",
            "Describe a local image in detail: objects, colors, composition, and mood, \
             or answer a custom prompt about it.",
            schema_of::<AnalyzeImageParams>(),
        ),
        tool(
            "list_available_models",
            "List the available image models with speed, quality, capabilities, and \
             guidance on when to choose each.",
            empty_schema(),
        ),
        tool(
            "get_server_info",
            "Show the server configuration (defaults, output directory) and model \
             switching guidance.",
            empty_schema(),
        ),
    ]
}

/// Descriptors of every resource the server exposes.
pub fn resource_list() -> Vec<Resource> {
    vec![
        resource(
            resources::MODELS_URI,
            "Available Image Models",
            "Catalog of Gemini image models and their capabilities",
        ),
        resource(
            resources::ASPECT_RATIOS_URI,
            "Aspect Ratios",
            "Aspect ratios accepted by generate_image",
        ),
        resource(
            resources::SAFETY_PRESETS_URI,
            "Safety Presets",
            "Safety presets and the block thresholds they apply",
        ),
    ]
}

/// Content of a resource, or `None` for an unknown URI.
pub fn resource_content(uri: &str) -> Option<String> {
    match uri {
        resources::MODELS_URI => Some(resources::models_resource_json()),
        resources::ASPECT_RATIOS_URI => Some(resources::aspect_ratios_resource_json()),
        resources::SAFETY_PRESETS_URI => Some(resources::safety_presets_resource_json()),
        _ => None,
    }
}

fn tool(name: &'static str, description: &'static str, input_schema: Arc<Arguments>) -> Tool {
    Tool {
        name: Cow::Borrowed(name),
        description: Some(Cow::Borrowed(description)),
        input_schema,
        annotations: None,
        icons: None,
        meta: None,
        output_schema: None,
        title: None,
    }
}

fn resource(uri: &str, name: &str, description: &str) -> Resource {
    Resource {
        raw: rmcp::model::RawResource {
            uri: uri.to_string(),
            name: name.to_string(),
            title: None,
            description: Some(description.to_string()),
            mime_type: Some("application/json".to_string()),
            size: None,
            icons: None,
            meta: None,
        },
        annotations: None,
    }
}

fn schema_of<T: JsonSchema>() -> Arc<Arguments> {
    let schema = schemars::schema_for!(T);
    match serde_json::to_value(&schema) {
        Ok(serde_json::Value::Object(map)) => Arc::new(map),
        _ => empty_schema(),
    }
}

fn empty_schema() -> Arc<Arguments> {
    let mut map = Arguments::new();
    map.insert("type".to_string(), serde_json::Value::String("object".to_string()));
    map.insert(
        "properties".to_string(),
        serde_json::Value::Object(Arguments::new()),
    );
    Arc::new(map)
}

fn parse_arguments<T: DeserializeOwned>(arguments: Option<Arguments>) -> Result<T, McpError> {
    let arguments = arguments.ok_or_else(|| McpError::invalid_params("Missing parameters", None))?;
    serde_json::from_value(serde_json::Value::Object(arguments))
        .map_err(|e| McpError::invalid_params(format!("Invalid parameters: {}", e), None))
}

fn invalid_params(errors: Vec<ValidationError>) -> McpError {
    let err = to_error(&errors);
    warn!(error = %err, "Rejected tool call");
    McpError::invalid_params(err.to_string(), None)
}

/// Map a handler outcome onto an MCP tool result.
fn tool_result<T: Serialize>(result: Result<T, Error>) -> Result<CallToolResult, McpError> {
    match result {
        Ok(value) => Ok(CallToolResult::success(vec![json_content(&value)])),
        Err(e) if e.is_validation() => Err(McpError::invalid_params(e.to_string(), None)),
        Err(e) => {
            warn!(error = %e, "Tool call failed");
            let body = serde_json::json!({
                "success": false,
                "message": e.to_string(),
            });
            Ok(CallToolResult::error(vec![json_content(&body)]))
        }
    }
}

fn json_content<T: Serialize>(value: &T) -> Content {
    let text = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!(r#"{{"success": false, "message": "Failed to encode result: {}"}}"#, e));
    Content::text(text)
}

/// First 50 characters of a prompt, for logs.
fn preview(prompt: &str) -> String {
    let mut chars = prompt.chars();
    let head: String = chars.by_ref().take(50).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

impl ServerHandler for PixelForgeServer {
    fn get_info(&self) -> ServerInfo {
        let settings = self.settings();
        ServerInfo {
            instructions: Some(
                "Image generation server backed by Google Gemini image models. \
                 Use generate_image to create images from text, edit_image to modify an \
                 existing image, and analyze_image to describe one. Call \
                 list_available_models to choose between the fast and the quality model; \
                 the model can be switched per request."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: settings.server_name.clone(),
                version: settings.server_version.clone(),
                ..Implementation::from_build_env()
            },
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _params: Option<rmcp::model::PaginatedRequestParams>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        async move {
            Ok(ListToolsResult {
                tools: tools(),
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn call_tool(
        &self,
        params: rmcp::model::CallToolRequestParams,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move { self.dispatch(params.name.as_ref(), params.arguments).await }
    }

    fn list_resources(
        &self,
        _params: Option<rmcp::model::PaginatedRequestParams>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        async move {
            debug!("Listing resources");
            Ok(ListResourcesResult {
                resources: resource_list(),
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn read_resource(
        &self,
        params: rmcp::model::ReadResourceRequestParams,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        async move {
            let uri = &params.uri;
            debug!(uri = %uri, "Reading resource");

            let content = resource_content(uri).ok_or_else(|| {
                McpError::resource_not_found(format!("Unknown resource: {}", uri), None)
            })?;

            Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(content, uri.clone())],
            })
        }
    }
}
