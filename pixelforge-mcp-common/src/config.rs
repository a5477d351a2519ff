//! Configuration module for resolving process settings.
//!
//! Settings are resolved once at startup from three layers, highest
//! precedence first: environment variables, the optional YAML config file,
//! and built-in defaults. The API key is only ever read from the
//! environment.

use crate::error::ConfigError;
use crate::models::{AspectRatio, DEFAULT_MODEL, DEFAULT_TEMPERATURE, SafetyPreset, check_temperature};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Accepted API key variables, in lookup order.
pub const API_KEY_ENV_VARS: [&str; 3] = [
    "GOOGLE_API_KEY",
    "GOOGLE_GENERATIVE_AI_API_KEY",
    "GEMINI_API_KEY",
];

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV_VAR: &str = "PIXELFORGE_CONFIG";

/// Config file read when no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

/// Root of the Gemini REST API.
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Directory generated images are written to by default.
pub const DEFAULT_OUTPUT_DIR: &str = "./generated_images";

/// Server name reported to MCP clients by default.
pub const DEFAULT_SERVER_NAME: &str = "pixelforge-mcp";

const ENV_DEFAULT_MODEL: &str = "PIXELFORGE_DEFAULT_MODEL";
const ENV_DEFAULT_ASPECT_RATIO: &str = "PIXELFORGE_DEFAULT_ASPECT_RATIO";
const ENV_DEFAULT_TEMPERATURE: &str = "PIXELFORGE_DEFAULT_TEMPERATURE";
const ENV_SAFETY_SETTING: &str = "PIXELFORGE_SAFETY_SETTING";
const ENV_OUTPUT_DIR: &str = "PIXELFORGE_OUTPUT_DIR";
const ENV_LOG_LEVEL: &str = "PIXELFORGE_LOG_LEVEL";
const ENV_API_BASE_URL: &str = "PIXELFORGE_API_BASE_URL";

/// Vendor API credential. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a raw key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key, for building the request header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(****)")
    }
}

/// Log verbosity, used as the tracing filter when `RUST_LOG` is unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Lowercase filter directive, e.g. `"info"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    /// Case-insensitive; also accepts the `WARNING` and `CRITICAL` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" | "critical" => Ok(LogLevel::Error),
            _ => Err(format!(
                "Invalid log level '{}'. Valid options: trace, debug, info, warn, error",
                s
            )),
        }
    }
}

/// `imagen:` section of the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImagenSection {
    pub default_model: Option<String>,
    pub default_aspect_ratio: Option<String>,
    pub default_temperature: Option<f64>,
    pub safety_setting: Option<String>,
    pub api_base_url: Option<String>,
}

/// `storage:` section of the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageSection {
    pub output_dir: Option<PathBuf>,
}

/// `server:` section of the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerSection {
    pub name: Option<String>,
    pub log_level: Option<String>,
}

/// Raw contents of the YAML config file. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub imagen: ImagenSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub server: ServerSection,
}

impl FileConfig {
    /// Parse YAML text. Blank input yields an empty config.
    pub fn from_yaml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| ConfigError::FileParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load the config file at `path`.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    ///
    /// # Errors
    /// Returns `ConfigError::FileRead` or `ConfigError::FileParse` when the
    /// file exists but cannot be used.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Self::from_yaml_str(&content, path).map(Some)
    }
}

/// Resolved, immutable process settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Vendor API credential
    pub api_key: ApiKey,
    /// Model used when a request does not name one
    pub default_model: String,
    /// Aspect ratio used when a request does not name one
    pub default_aspect_ratio: AspectRatio,
    /// Temperature used when a request does not supply one
    pub default_temperature: f64,
    /// Safety preset used when a request does not name one
    pub safety_setting: SafetyPreset,
    /// Directory generated and edited images are written to
    pub output_dir: PathBuf,
    /// Default tracing level
    pub log_level: LogLevel,
    /// Server name reported to clients
    pub server_name: String,
    /// Server version reported to clients
    pub server_version: String,
    /// Root of the vendor REST API
    pub api_base_url: String,
}

impl Settings {
    /// Settings with built-in defaults and the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: ApiKey::new(api_key),
            default_model: DEFAULT_MODEL.to_string(),
            default_aspect_ratio: AspectRatio::default(),
            default_temperature: DEFAULT_TEMPERATURE,
            safety_setting: SafetyPreset::default(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            log_level: LogLevel::default(),
            server_name: DEFAULT_SERVER_NAME.to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    /// Load settings from the process environment, `.env`, and the config file.
    ///
    /// `config_path` falls back to `DEFAULT_CONFIG_PATH`; a missing file is
    /// not an error.
    ///
    /// # Errors
    /// Returns `ConfigError::MissingApiKey` if none of `API_KEY_ENV_VARS` is
    /// set, or another `ConfigError` if a value is invalid.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let path = config_path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
        let file = FileConfig::load(path)?;

        Self::resolve(file.unwrap_or_default(), |name| std::env::var(name).ok())
    }

    /// Merge `env` over `file` over defaults.
    ///
    /// `env` is a variable lookup so resolution can be exercised without
    /// touching the process environment. Empty values count as unset.
    pub fn resolve<F>(file: FileConfig, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| env(name).filter(|v| !v.trim().is_empty());

        let api_key = API_KEY_ENV_VARS
            .iter()
            .find_map(|name| lookup(*name))
            .ok_or_else(|| ConfigError::missing_api_key(&API_KEY_ENV_VARS))?;

        let mut settings = Self::new(api_key.trim());
        let FileConfig { imagen, storage, server } = file;

        if let Some((source, model)) = layer(lookup(ENV_DEFAULT_MODEL), ENV_DEFAULT_MODEL, imagen.default_model, "imagen.default_model") {
            let model = model.trim();
            if model.is_empty() {
                return Err(ConfigError::invalid_value(source, "model name cannot be empty"));
            }
            settings.default_model = model.to_string();
        }

        if let Some((source, ratio)) = layer(lookup(ENV_DEFAULT_ASPECT_RATIO), ENV_DEFAULT_ASPECT_RATIO, imagen.default_aspect_ratio, "imagen.default_aspect_ratio") {
            settings.default_aspect_ratio = ratio
                .trim()
                .parse()
                .map_err(|reason: String| ConfigError::invalid_value(source, reason))?;
        }

        let temperature = match lookup(ENV_DEFAULT_TEMPERATURE) {
            Some(raw) => {
                let value = raw.trim().parse::<f64>().map_err(|_| {
                    ConfigError::invalid_value(ENV_DEFAULT_TEMPERATURE, format!("'{}' is not a number", raw))
                })?;
                Some((ENV_DEFAULT_TEMPERATURE, value))
            }
            None => imagen.default_temperature.map(|v| ("imagen.default_temperature", v)),
        };
        if let Some((source, value)) = temperature {
            settings.default_temperature =
                check_temperature(value).map_err(|reason| ConfigError::invalid_value(source, reason))?;
        }

        if let Some((source, preset)) = layer(lookup(ENV_SAFETY_SETTING), ENV_SAFETY_SETTING, imagen.safety_setting, "imagen.safety_setting") {
            settings.safety_setting = preset
                .trim()
                .parse()
                .map_err(|reason: String| ConfigError::invalid_value(source, reason))?;
        }

        if let Some((_, url)) = layer(lookup(ENV_API_BASE_URL), ENV_API_BASE_URL, imagen.api_base_url, "imagen.api_base_url") {
            settings.api_base_url = url.trim().trim_end_matches('/').to_string();
        }

        let file_output_dir = storage
            .output_dir
            .filter(|p| !p.as_os_str().is_empty());
        if let Some(dir) = lookup(ENV_OUTPUT_DIR).map(PathBuf::from).or(file_output_dir) {
            settings.output_dir = dir;
        }

        if let Some((source, level)) = layer(lookup(ENV_LOG_LEVEL), ENV_LOG_LEVEL, server.log_level, "server.log_level") {
            settings.log_level = level
                .parse()
                .map_err(|reason: String| ConfigError::invalid_value(source, reason))?;
        }

        if let Some(name) = server.name.filter(|n| !n.trim().is_empty()) {
            settings.server_name = name.trim().to_string();
        }

        Ok(settings)
    }

    /// The generateContent endpoint for a model.
    ///
    /// The API key travels in a header, so this URL is safe to log and to
    /// embed in error messages. The model is percent-encoded as a single
    /// path segment, so a name containing `/` or `..` cannot leave
    /// `models/`.
    pub fn generate_content_endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base_url,
            urlencoding::encode(model)
        )
    }
}

/// Pick the environment value if present, else the file value, tagged
/// with the name of the source it came from.
fn layer(
    env_value: Option<String>,
    env_name: &'static str,
    file_value: Option<String>,
    file_key: &'static str,
) -> Option<(&'static str, String)> {
    env_value
        .map(|v| (env_name, v))
        .or_else(|| file_value.map(|v| (file_key, v)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_debug_is_redacted() {
        let key = ApiKey::new("super-secret-value");
        let debug = format!("{:?}", key);
        assert!(!debug.contains("super-secret-value"));
        assert_eq!(key.expose(), "super-secret-value");
    }

    #[test]
    fn test_settings_debug_hides_key() {
        let settings = Settings::new("AIza-secret");
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("AIza-secret"));
        assert!(debug.contains("gemini-2.5-flash-image"));
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!("INFO".parse::<LogLevel>(), Ok(LogLevel::Info));
        assert_eq!("Warning".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!("CRITICAL".parse::<LogLevel>(), Ok(LogLevel::Error));
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_generate_content_endpoint() {
        let settings = Settings::new("k");
        assert_eq!(
            settings.generate_content_endpoint("gemini-2.5-flash-image"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-image:generateContent"
        );
    }

    #[test]
    fn test_generate_content_endpoint_encodes_model_as_one_segment() {
        let mut settings = Settings::new("k");
        settings.api_base_url = "http://localhost/v1beta".to_string();
        assert_eq!(
            settings.generate_content_endpoint("../tunedModels/evil"),
            "http://localhost/v1beta/models/..%2FtunedModels%2Fevil:generateContent"
        );
        assert_eq!(
            settings.generate_content_endpoint("a b?c#d"),
            "http://localhost/v1beta/models/a%20b%3Fc%23d:generateContent"
        );
    }
}
