use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::{timeout, Duration};
use tracing::{debug, trace, warn};

use super::server::McpServer;
use crate::config::ServerCommand;
use crate::error::{LifelogError, Result};

/// How long a child gets to exit on its own after stdin closes before it is killed.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// A bidirectional JSON-RPC channel to one server.
///
/// Implementations carry one request at a time; callers serialize through `&mut self`.
#[async_trait]
pub trait Transport: Send {
    /// Write one message without waiting for a reply.
    async fn send(&mut self, message: Value) -> Result<()>;

    /// Write a request and wait for the response with the same `id`.
    async fn request(&mut self, message: Value) -> Result<Value>;

    /// Release the channel. Must tolerate being called after a failure.
    async fn close(&mut self) -> Result<()>;
}

/// Talks to a server child process over its stdin/stdout.
pub struct StdioTransport {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl StdioTransport {
    pub fn spawn(command: &ServerCommand) -> Result<Self> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        // Values are never logged; they include the API key.
        for (key, value) in &command.env {
            trace!(key = %key, "setting child env var (value hidden)");
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(|e| {
            LifelogError::Transport(format!(
                "Failed to start server '{}': {}",
                command.program, e
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| LifelogError::Transport("Server stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| LifelogError::Transport("Server stdout unavailable".to_string()))?;

        debug!(program = %command.program, pid = ?child.id(), "spawned server");

        Ok(Self {
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout).lines(),
        })
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn send(&mut self, message: Value) -> Result<()> {
        let stdin = self.stdin.as_mut().ok_or(LifelogError::SessionClosed)?;

        let mut line = serde_json::to_string(&message)?;
        line.push('\n');
        stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| LifelogError::Transport(format!("Failed to write to server: {}", e)))?;
        stdin
            .flush()
            .await
            .map_err(|e| LifelogError::Transport(format!("Failed to write to server: {}", e)))?;
        Ok(())
    }

    async fn request(&mut self, message: Value) -> Result<Value> {
        let id = message.get("id").cloned().unwrap_or(Value::Null);
        self.send(message).await?;

        loop {
            let line = self
                .stdout
                .next_line()
                .await
                .map_err(|e| LifelogError::Transport(format!("Failed to read from server: {}", e)))?
                .ok_or_else(|| {
                    LifelogError::Transport("Server closed the connection".to_string())
                })?;

            if line.trim().is_empty() {
                continue;
            }

            let response: Value = serde_json::from_str(&line)?;
            if response.get("id") == Some(&id) {
                return Ok(response);
            }
            trace!(message = %line, "skipping unrelated message");
        }
    }

    async fn close(&mut self) -> Result<()> {
        // Closing stdin is the server's cue to stop.
        drop(self.stdin.take());

        match timeout(CLOSE_GRACE, self.child.wait()).await {
            Ok(Ok(status)) => {
                debug!(%status, "server exited");
                Ok(())
            }
            Ok(Err(e)) => Err(LifelogError::Io(e)),
            Err(_) => {
                warn!("server did not exit in time, killing it");
                self.child.kill().await?;
                Ok(())
            }
        }
    }
}

/// Dispatches straight into a server living in the same process.
pub struct InProcessTransport {
    server: Arc<McpServer>,
    open: bool,
}

impl InProcessTransport {
    pub async fn start(server: Arc<McpServer>) -> Result<Self> {
        server.begin_serving().await?;
        Ok(Self { server, open: true })
    }
}

#[async_trait]
impl Transport for InProcessTransport {
    async fn send(&mut self, message: Value) -> Result<()> {
        if !self.open {
            return Err(LifelogError::SessionClosed);
        }
        self.server.handle_message(message).await;
        Ok(())
    }

    async fn request(&mut self, message: Value) -> Result<Value> {
        if !self.open {
            return Err(LifelogError::SessionClosed);
        }
        self.server
            .handle_message(message)
            .await
            .ok_or_else(|| LifelogError::Transport("Server sent no response".to_string()))
    }

    async fn close(&mut self) -> Result<()> {
        self.open = false;
        Ok(())
    }
}
