//! Configuration for the OpenOCD RPC client and command line tool

use std::path::PathBuf;
use std::time::Duration;
use clap::Parser;

/// OpenOCD's default Tcl RPC port
pub const DEFAULT_TCL_PORT: u16 = 6666;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "openocd-rpc")]
#[command(about = "Send Tcl commands to OpenOCD's RPC server")]
#[command(version)]
pub struct Args {
    /// OpenOCD host
    #[arg(long, default_value = "localhost")]
    pub host: String,

    /// OpenOCD Tcl RPC port
    #[arg(long, default_value_t = DEFAULT_TCL_PORT)]
    pub port: u16,

    /// Connect timeout in milliseconds (no timeout if omitted)
    #[arg(long)]
    pub connect_timeout_ms: Option<u64>,

    /// Per-command response timeout in milliseconds (no timeout if omitted)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log file path (defaults to stderr)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Commands to send in order; read from stdin, one per line, if empty
    pub commands: Vec<String>,
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Bound on DNS resolution plus TCP handshake
    pub connect_timeout: Option<Duration>,
    /// Bound on one request/response exchange
    pub response_timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: None,
            response_timeout: None,
        }
    }

    pub fn from_args(args: &Args) -> Self {
        Self {
            host: args.host.clone(),
            port: args.port,
            connect_timeout: args.connect_timeout_ms.map(Duration::from_millis),
            response_timeout: args.timeout_ms.map(Duration::from_millis),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = Some(timeout);
        self
    }

    /// `host:port`, for logs and error messages
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("localhost", DEFAULT_TCL_PORT)
    }
}
