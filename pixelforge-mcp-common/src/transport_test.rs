//! Unit tests for transport configuration.

use super::transport::{Transport, TransportArgs, TransportMode};
use clap::Parser;

#[derive(Parser, Debug)]
struct TestCli {
    #[command(flatten)]
    transport: TransportArgs,
}

#[test]
fn test_transport_default_is_stdio() {
    let transport = Transport::default();
    assert!(transport.is_stdio());
    assert_eq!(transport.bind_addr(), None);
    assert_eq!(transport.to_string(), "stdio");
}

#[test]
fn test_transport_http_constructor() {
    let transport = Transport::http("0.0.0.0", 3000);
    assert!(!transport.is_stdio());
    assert_eq!(transport.bind_addr().as_deref(), Some("0.0.0.0:3000"));
    assert_eq!(transport.to_string(), "http (0.0.0.0:3000)");
}

#[test]
fn test_transport_args_default() {
    let args = TransportArgs::default();
    assert_eq!(args.transport, TransportMode::Stdio);
    assert_eq!(args.host, "127.0.0.1");
    assert_eq!(args.port, 8080);
}

#[test]
fn test_stdio_ignores_port() {
    let args = TransportArgs {
        transport: TransportMode::Stdio,
        host: "0.0.0.0".to_string(),
        port: 9000,
    };
    assert_eq!(args.into_transport(), Transport::Stdio);
}

#[test]
fn test_http_keeps_host_and_port() {
    let args = TransportArgs {
        transport: TransportMode::Http,
        host: "0.0.0.0".to_string(),
        port: 9000,
    };
    assert_eq!(args.into_transport(), Transport::http("0.0.0.0", 9000));
}

#[test]
fn test_cli_parses_http() {
    let cli = TestCli::try_parse_from(["pixelforge-mcp", "--transport", "http", "--port", "3001"])
        .unwrap();
    assert_eq!(cli.transport.transport, TransportMode::Http);
    assert_eq!(cli.transport.port, 3001);
}

#[test]
fn test_cli_accepts_sse_alias_and_case() {
    let cli = TestCli::try_parse_from(["pixelforge-mcp", "--transport", "sse"]).unwrap();
    assert_eq!(cli.transport.transport, TransportMode::Http);

    let cli = TestCli::try_parse_from(["pixelforge-mcp", "--transport", "STDIO"]).unwrap();
    assert_eq!(cli.transport.transport, TransportMode::Stdio);
}

#[test]
fn test_cli_rejects_unknown_mode() {
    let result = TestCli::try_parse_from(["pixelforge-mcp", "--transport", "websocket"]);
    assert!(result.is_err());
}
