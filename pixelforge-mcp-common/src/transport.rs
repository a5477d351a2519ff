//! MCP transport selection.
//!
//! The server speaks MCP either over stdin/stdout (the default, for clients
//! that spawn it as a subprocess) or over streamable HTTP. `sse` is accepted
//! on the command line as an alias for `http`, since the streamable HTTP
//! transport already streams responses as server-sent events.
//!
//! # Example
//!
//! ```
//! use clap::Parser;
//! use pixelforge_mcp_common::transport::TransportArgs;
//!
//! #[derive(Parser)]
//! struct Args {
//!     #[command(flatten)]
//!     transport: TransportArgs,
//! }
//!
//! let args = Args::parse_from(["pixelforge-mcp", "--transport", "http", "--port", "9000"]);
//! let transport = args.transport.into_transport();
//! assert_eq!(transport.to_string(), "http (127.0.0.1:9000)");
//! ```

use clap::{Args, ValueEnum};
use std::fmt;

/// Default bind host for the HTTP transport.
pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";

/// Default port for the HTTP transport.
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Resolved transport for the MCP service.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Transport {
    /// Standard input/output transport (default).
    #[default]
    Stdio,
    /// Streamable HTTP transport served under `/mcp`.
    Http {
        /// Interface to bind
        host: String,
        /// Port to listen on
        port: u16,
    },
}

impl Transport {
    /// Create a new stdio transport.
    pub fn stdio() -> Self {
        Transport::Stdio
    }

    /// Create a new HTTP transport on the given host and port.
    pub fn http(host: impl Into<String>, port: u16) -> Self {
        Transport::Http {
            host: host.into(),
            port,
        }
    }

    /// Check if this is a stdio transport.
    pub fn is_stdio(&self) -> bool {
        matches!(self, Transport::Stdio)
    }

    /// The `host:port` bind address, for network transports.
    pub fn bind_addr(&self) -> Option<String> {
        match self {
            Transport::Stdio => None,
            Transport::Http { host, port } => Some(format!("{}:{}", host, port)),
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Stdio => write!(f, "stdio"),
            Transport::Http { host, port } => write!(f, "http ({}:{})", host, port),
        }
    }
}

/// Transport mode as written on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransportMode {
    #[default]
    Stdio,
    #[value(alias = "sse")]
    Http,
}

/// Command-line arguments for transport configuration.
#[derive(Args, Debug, Clone)]
pub struct TransportArgs {
    /// Transport mode: stdio or http (sse is accepted as http)
    #[arg(long, value_enum, ignore_case = true, default_value_t = TransportMode::Stdio)]
    pub transport: TransportMode,

    /// Interface to bind for the HTTP transport
    #[arg(long, env = "PIXELFORGE_HOST", default_value = DEFAULT_HTTP_HOST)]
    pub host: String,

    /// Port for the HTTP transport
    #[arg(long, env = "PORT", default_value_t = DEFAULT_HTTP_PORT)]
    pub port: u16,
}

impl TransportArgs {
    /// Convert command-line arguments into a Transport configuration.
    pub fn into_transport(self) -> Transport {
        match self.transport {
            TransportMode::Stdio => Transport::Stdio,
            TransportMode::Http => Transport::Http {
                host: self.host,
                port: self.port,
            },
        }
    }
}

impl Default for TransportArgs {
    fn default() -> Self {
        Self {
            transport: TransportMode::Stdio,
            host: DEFAULT_HTTP_HOST.to_string(),
            port: DEFAULT_HTTP_PORT,
        }
    }
}
