pub mod client;
pub mod registry;
pub mod server;
pub mod tools;
pub mod transport;
pub mod types;

pub use client::McpClient;
pub use registry::{ToolArguments, ToolRegistry};
pub use server::{McpServer, ServerState};
pub use tools::{get_lifelogs_descriptor, lifelog_server, GET_LIFELOGS};
pub use transport::{InProcessTransport, StdioTransport, Transport};
pub use types::{McpTool, McpToolCall, McpToolResult, RpcError};
