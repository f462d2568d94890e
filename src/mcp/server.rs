use serde_json::{json, Value};
use std::future::Future;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::registry::{ToolArguments, ToolRegistry};
use super::types::{
    error_response, success_response, InitializeResult, McpTool, McpToolResult, RpcError,
    ServerCapabilities, ServerInfo, ToolsCapability, JSONRPC_VERSION, MCP_PROTOCOL_VERSION,
};
use crate::error::{LifelogError, Result};

/// Lifecycle of a server. Tool calls are only accepted while `Serving`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Uninitialized,
    Registered,
    Serving,
    Terminated,
}

pub struct McpServer {
    info: ServerInfo,
    registry: ToolRegistry,
    state: RwLock<ServerState>,
}

impl McpServer {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            info: ServerInfo {
                name: name.into(),
                version: version.into(),
            },
            registry: ToolRegistry::new(),
            state: RwLock::new(ServerState::Uninitialized),
        }
    }

    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    pub fn register_tool<A, F, Fut>(&mut self, descriptor: McpTool, handler: F) -> Result<()>
    where
        A: ToolArguments,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = McpToolResult> + Send + 'static,
    {
        let state = self.state.get_mut();
        if matches!(*state, ServerState::Serving | ServerState::Terminated) {
            return Err(LifelogError::Config(
                "Tools must be registered before serving".to_string(),
            ));
        }

        debug!(tool = %descriptor.name, "registering tool");
        self.registry.register(descriptor, handler)?;
        *state = ServerState::Registered;
        Ok(())
    }

    pub fn tools(&self) -> Vec<McpTool> {
        self.registry.list()
    }

    pub async fn state(&self) -> ServerState {
        *self.state.read().await
    }

    /// Move to `Serving`. Fails when no tool is registered or the server already ended.
    pub async fn begin_serving(&self) -> Result<()> {
        let mut state = self.state.write().await;
        match *state {
            ServerState::Registered | ServerState::Serving => {
                *state = ServerState::Serving;
                Ok(())
            }
            ServerState::Uninitialized => Err(LifelogError::Config(
                "Cannot serve without any registered tool".to_string(),
            )),
            ServerState::Terminated => Err(LifelogError::Transport(
                "Server has already terminated".to_string(),
            )),
        }
    }

    pub async fn terminate(&self) {
        *self.state.write().await = ServerState::Terminated;
    }

    /// Serve line-delimited JSON-RPC on this process's stdin/stdout.
    pub async fn serve_stdio(&self) -> Result<()> {
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Read one JSON-RPC message per line from `reader` and answer on `writer` until
    /// EOF or `shutdown`. I/O failures end the loop and are returned.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        self.begin_serving().await?;
        info!(server = %self.info.name, version = %self.info.version, "serving tools");

        let mut lines = reader.lines();
        let outcome = loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("input closed");
                    break Ok(());
                }
                Err(e) => break Err(LifelogError::Io(e)),
            };

            if line.trim().is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<Value>(&line) {
                Ok(message) => self.handle_message(message).await,
                Err(e) => {
                    warn!(error = %e, "unparseable message");
                    Some(error_response(
                        Value::Null,
                        RpcError::parse_error(format!("Parse error: {}", e)),
                    ))
                }
            };

            if let Some(response) = response {
                if let Err(e) = write_message(&mut writer, &response).await {
                    break Err(e);
                }
            }

            if self.state().await == ServerState::Terminated {
                break Ok(());
            }
        };

        self.terminate().await;
        info!(server = %self.info.name, "server stopped");
        outcome
    }

    /// Handle one decoded message. Returns the response for requests, `None` for
    /// notifications and stray responses.
    pub async fn handle_message(&self, message: Value) -> Option<Value> {
        let Some(obj) = message.as_object() else {
            return Some(error_response(
                Value::Null,
                RpcError::invalid_request("Request must be a JSON object"),
            ));
        };

        if obj.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
            let id = obj.get("id").cloned().unwrap_or(Value::Null);
            return Some(error_response(
                id,
                RpcError::invalid_request("jsonrpc must be '2.0'"),
            ));
        }

        let id = obj.get("id").cloned();
        let Some(method) = obj.get("method").and_then(Value::as_str) else {
            // Only genuine responses are dropped; anything carrying an id gets a reply.
            let is_response = obj.contains_key("result") || obj.contains_key("error");
            return match id {
                Some(id) if !is_response => Some(error_response(
                    id,
                    RpcError::invalid_request("method must be a string"),
                )),
                _ => None,
            };
        };
        let params = obj.get("params").cloned().unwrap_or(Value::Null);

        match id {
            Some(id) => {
                debug!(method, "request");
                Some(match self.handle_request(method, params).await {
                    Ok(result) => success_response(id, result),
                    Err(err) => error_response(id, err),
                })
            }
            None => {
                debug!(method, "notification");
                None
            }
        }
    }

    async fn handle_request(&self, method: &str, params: Value) -> std::result::Result<Value, RpcError> {
        if self.state().await != ServerState::Serving {
            return Err(RpcError::not_serving());
        }

        match method {
            "initialize" => self.initialize_payload(),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.registry.list() })),
            "tools/call" => self.handle_tools_call(params).await,
            "shutdown" => {
                self.terminate().await;
                Ok(json!({}))
            }
            _ => Err(RpcError::method_not_found(method)),
        }
    }

    fn initialize_payload(&self) -> std::result::Result<Value, RpcError> {
        let result = InitializeResult {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            server_info: self.info.clone(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: Some(false),
                }),
            },
        };
        serde_json::to_value(result).map_err(|e| RpcError::internal(e.to_string()))
    }

    async fn handle_tools_call(&self, params: Value) -> std::result::Result<Value, RpcError> {
        let params = params
            .as_object()
            .ok_or_else(|| RpcError::invalid_params("tools/call params must be an object"))?;

        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::invalid_params("tools/call requires string field 'name'"))?;

        let arguments = match params.get("arguments") {
            Some(Value::Object(map)) => Value::Object(map.clone()),
            Some(Value::Null) | None => json!({}),
            Some(_) => {
                return Err(RpcError::invalid_params(
                    "tools/call 'arguments' must be an object",
                ))
            }
        };

        let result = self.registry.call(name, arguments).await?;
        if result.is_error() {
            warn!(tool = name, "tool call failed");
        } else {
            info!(tool = name, "tool call succeeded");
        }

        serde_json::to_value(result).map_err(|e| RpcError::internal(e.to_string()))
    }
}

async fn write_message<W>(writer: &mut W, message: &Value) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_server() -> McpServer {
        let mut server = McpServer::new("test-server", "0.0.1");
        server
            .register_tool(
                McpTool {
                    name: "echo".to_string(),
                    description: "Echo".to_string(),
                    input_schema: json!({ "type": "object" }),
                },
                |args: Value| async move { McpToolResult::success(args.to_string()) },
            )
            .unwrap();
        server
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let server = echo_server();
        assert_eq!(server.state().await, ServerState::Registered);

        server.begin_serving().await.unwrap();
        assert_eq!(server.state().await, ServerState::Serving);

        server.terminate().await;
        assert_eq!(server.state().await, ServerState::Terminated);
        assert!(server.begin_serving().await.is_err());
    }

    #[tokio::test]
    async fn test_cannot_serve_without_tools() {
        let server = McpServer::new("empty", "0.0.1");
        assert_eq!(server.state().await, ServerState::Uninitialized);
        assert!(server.begin_serving().await.is_err());
    }

    #[tokio::test]
    async fn test_requests_rejected_before_serving() {
        let server = echo_server();
        let response = server
            .handle_message(json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list" }))
            .await
            .unwrap();
        assert_eq!(response["error"]["code"], RpcError::NOT_SERVING);
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let server = echo_server();
        server.begin_serving().await.unwrap();
        let response = server
            .handle_message(json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }))
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let server = echo_server();
        server.begin_serving().await.unwrap();
        let response = server
            .handle_message(json!({ "jsonrpc": "2.0", "id": 7, "method": "resources/list" }))
            .await
            .unwrap();
        assert_eq!(response["id"], 7);
        assert_eq!(response["error"]["code"], RpcError::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stray_responses_are_ignored() {
        let server = echo_server();
        server.begin_serving().await.unwrap();
        let response = server
            .handle_message(json!({ "jsonrpc": "2.0", "id": 4, "result": {} }))
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_wrong_jsonrpc_version() {
        let server = echo_server();
        server.begin_serving().await.unwrap();
        let response = server
            .handle_message(json!({ "jsonrpc": "1.0", "id": 3, "method": "ping" }))
            .await
            .unwrap();
        assert_eq!(response["error"]["code"], RpcError::INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_registration_after_serving_fails() {
        let mut server = echo_server();
        server.begin_serving().await.unwrap();
        let result = server.register_tool(
            McpTool {
                name: "late".to_string(),
                description: String::new(),
                input_schema: json!({ "type": "object" }),
            },
            |_: Value| async { McpToolResult::success("") },
        );
        assert!(result.is_err());
    }
}
