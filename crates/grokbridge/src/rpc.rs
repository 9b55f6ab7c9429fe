//! MCP stdio bridge: JSON-RPC in on stdin, tool calls forwarded over HTTP.
pub mod catalog;
pub mod dispatch;
pub mod jsonrpc;
pub mod transport;

pub use dispatch::{BridgeConfig, Dispatcher};
pub use transport::{run_stdio, ServeOptions, StdioTransport};
