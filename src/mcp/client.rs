use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

use super::server::McpServer;
use super::transport::{InProcessTransport, StdioTransport, Transport};
use super::types::{
    notification, request, InitializeResult, McpTool, McpToolCall, McpToolResult, ServerInfo,
    ToolListResponse, MCP_PROTOCOL_VERSION,
};
use crate::config::ServerCommand;
use crate::error::{LifelogError, Result};

const CLIENT_NAME: &str = "lifelog-mcp-client";
const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// One client session over a [`Transport`]. Calls take `&mut self`, so a session
/// never has more than one request in flight.
pub struct McpClient {
    transport: Option<Box<dyn Transport>>,
    next_id: u64,
    server_info: Option<ServerInfo>,
}

impl McpClient {
    /// Run the `initialize` handshake over `transport`. The transport is closed if
    /// the handshake fails.
    pub async fn connect(transport: Box<dyn Transport>) -> Result<Self> {
        let mut client = Self {
            transport: Some(transport),
            next_id: 1,
            server_info: None,
        };

        if let Err(e) = client.initialize().await {
            let _ = client.close_transport().await;
            return Err(e);
        }

        Ok(client)
    }

    /// Spawn `command` as a child process and connect over its stdio.
    pub async fn spawn(command: &ServerCommand) -> Result<Self> {
        let transport = StdioTransport::spawn(command)?;
        Self::connect(Box::new(transport)).await
    }

    /// Connect to a server running in this process.
    pub async fn in_process(server: Arc<McpServer>) -> Result<Self> {
        let transport = InProcessTransport::start(server).await?;
        Self::connect(Box::new(transport)).await
    }

    async fn initialize(&mut self) -> Result<()> {
        let init_params = json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": CLIENT_NAME,
                "version": CLIENT_VERSION
            }
        });

        let response = self.send_request("initialize", Some(init_params)).await?;
        let init_result: InitializeResult = serde_json::from_value(response)?;

        info!(
            server = %init_result.server_info.name,
            version = %init_result.server_info.version,
            "connected to MCP server"
        );
        self.server_info = Some(init_result.server_info);

        self.transport_mut()?
            .send(notification("notifications/initialized", None))
            .await
    }

    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.server_info.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.transport.is_none()
    }

    fn transport_mut(&mut self) -> Result<&mut Box<dyn Transport>> {
        self.transport.as_mut().ok_or(LifelogError::SessionClosed)
    }

    async fn send_request(&mut self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id;
        self.next_id += 1;

        debug!(id, method, "sending request");
        let response = self
            .transport_mut()?
            .request(request(id, method, params))
            .await?;

        if let Some(result) = response.get("result") {
            return Ok(result.clone());
        }

        if let Some(error) = response.get("error") {
            return Err(LifelogError::Rpc {
                code: error.get("code").and_then(Value::as_i64).unwrap_or(0),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
            });
        }

        Err(LifelogError::Transport(format!(
            "Malformed response to '{}': {}",
            method, response
        )))
    }

    pub async fn list_tools(&mut self) -> Result<Vec<McpTool>> {
        let response = self.send_request("tools/list", None).await?;
        let tool_list: ToolListResponse = serde_json::from_value(response)?;
        Ok(tool_list.tools)
    }

    /// Call a tool by name. The name is sent as-is; the server rejects unknown tools.
    pub async fn call_tool(&mut self, tool_call: &McpToolCall) -> Result<McpToolResult> {
        let params = json!({
            "name": tool_call.name,
            "arguments": tool_call.arguments,
        });

        let response = self.send_request("tools/call", Some(params)).await?;
        let result: McpToolResult = serde_json::from_value(response)?;
        Ok(result)
    }

    /// Ask the server to shut down and release the transport. Calling it again is a no-op.
    pub async fn close(&mut self) -> Result<()> {
        if self.transport.is_none() {
            return Ok(());
        }

        if let Err(e) = self.send_request("shutdown", None).await {
            debug!(error = %e, "shutdown request failed");
        }

        self.close_transport().await
    }

    async fn close_transport(&mut self) -> Result<()> {
        match self.transport.take() {
            Some(mut transport) => transport.close().await,
            None => Ok(()),
        }
    }
}
