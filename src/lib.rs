//! OpenOCD Tcl RPC client
//!
//! A client for OpenOCD's Tcl RPC server (TCP port 6666 by default).
//! Commands and replies are UTF-8 text, each terminated by a single 0x1a byte.
//! Replies are returned as opaque strings.

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod frame;
pub mod transport;

pub use client::RpcClient;
pub use config::{Args, ClientConfig, DEFAULT_TCL_PORT};
pub use error::{ErrorKind, Result, RpcError};
pub use events::{ClientEvent, EventObserver, TracingObserver};
pub use frame::SENTINEL;
pub use transport::{Connector, TcpConnector};
