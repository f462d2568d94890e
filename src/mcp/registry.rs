use jsonschema::{Draft, JSONSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use super::types::{McpTool, McpToolResult, RpcError};
use crate::error::{LifelogError, Result};

type ToolFuture = Pin<Box<dyn Future<Output = McpToolResult> + Send>>;

/// Type-erased handler: turns validated raw arguments into a pending result, or
/// reports why the arguments were rejected.
type ErasedHandler =
    Box<dyn Fn(Value) -> std::result::Result<ToolFuture, Vec<String>> + Send + Sync>;

/// Typed tool arguments, decoded from the raw JSON before the handler runs.
pub trait ToolArguments: DeserializeOwned + Send + 'static {
    /// Semantic validation and normalization after decoding.
    fn prepare(self) -> std::result::Result<Self, Vec<String>> {
        Ok(self)
    }
}

impl ToolArguments for Value {}

struct RegisteredTool {
    descriptor: McpTool,
    schema: JSONSchema,
    handler: ErasedHandler,
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `descriptor.name`. The descriptor's input schema is
    /// compiled once here and checked on every call before `handler` runs.
    pub fn register<A, F, Fut>(&mut self, descriptor: McpTool, handler: F) -> Result<()>
    where
        A: ToolArguments,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = McpToolResult> + Send + 'static,
    {
        if self.tools.contains_key(&descriptor.name) {
            return Err(LifelogError::Config(format!(
                "Tool '{}' is already registered",
                descriptor.name
            )));
        }

        let schema = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&descriptor.input_schema)
            .map_err(|e| {
                LifelogError::Config(format!(
                    "Invalid input schema for tool '{}': {}",
                    descriptor.name, e
                ))
            })?;

        let erased: ErasedHandler = Box::new(
            move |arguments: Value| -> std::result::Result<ToolFuture, Vec<String>> {
                let args = serde_json::from_value::<A>(arguments)
                    .map_err(|e| vec![e.to_string()])?
                    .prepare()?;
                Ok(Box::pin(handler(args)))
            },
        );

        self.tools.insert(
            descriptor.name.clone(),
            RegisteredTool {
                descriptor,
                schema,
                handler: erased,
            },
        );

        Ok(())
    }

    /// Descriptors sorted by name.
    pub fn list(&self) -> Vec<McpTool> {
        let mut tools: Vec<McpTool> = self
            .tools
            .values()
            .map(|tool| tool.descriptor.clone())
            .collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    pub fn validate_arguments(&self, tool_name: &str, arguments: &Value) -> std::result::Result<(), String> {
        let tool = self
            .tools
            .get(tool_name)
            .ok_or_else(|| format!("Tool '{}' not found", tool_name))?;

        if let Err(errors) = tool.schema.validate(arguments) {
            let error_messages: Vec<String> = errors
                .map(|e| format!("{}: {}", e.instance_path, e))
                .collect();
            return Err(error_messages.join("; "));
        }

        Ok(())
    }

    /// Validate `arguments` and run the tool. Unknown tools and rejected arguments are
    /// protocol errors; everything the handler reports travels inside the result.
    pub async fn call(&self, tool_name: &str, arguments: Value) -> std::result::Result<McpToolResult, RpcError> {
        let tool = self
            .tools
            .get(tool_name)
            .ok_or_else(|| RpcError::invalid_params(format!("Unknown tool: {}", tool_name)))?;

        self.validate_arguments(tool_name, &arguments)
            .map_err(|e| invalid_arguments(tool_name, &e))?;

        let pending = (tool.handler)(arguments)
            .map_err(|problems| invalid_arguments(tool_name, &problems.join("; ")))?;

        Ok(pending.await)
    }
}

fn invalid_arguments(tool_name: &str, detail: &str) -> RpcError {
    RpcError::invalid_params(format!(
        "Invalid arguments for tool '{}': {}",
        tool_name, detail
    ))
}
