use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use super::registry::ToolArguments;
use super::server::McpServer;
use super::types::{McpTool, McpToolResult};
use crate::api::{LifelogQuery, LimitlessClient};
use crate::error::Result;

pub const GET_LIFELOGS: &str = "getLifelogs";
pub const SERVER_NAME: &str = "lifelog-mcp";

pub fn get_lifelogs_descriptor() -> McpTool {
    McpTool {
        name: GET_LIFELOGS.to_string(),
        description: "Retrieve a list of lifelogs".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "timezone": {
                    "type": "string",
                    "description": "IANA timezone specifier. If missing, UTC is used"
                },
                "date": {
                    "type": "string",
                    "description": "Will return all entries beginning on a date in the given timezone (YYYY-MM-DD)"
                },
                "start": {
                    "type": "string",
                    "description": "Start datetime in modified ISO-8601 format (YYYY-MM-DD or YYYY-MM-DD HH:mm:SS)"
                },
                "end": {
                    "type": "string",
                    "description": "End datetime in modified ISO-8601 format (YYYY-MM-DD or YYYY-MM-DD HH:mm:SS)"
                },
                "cursor": {
                    "type": "string",
                    "description": "Cursor for pagination to retrieve the next set of entries"
                },
                "direction": {
                    "type": "string",
                    "enum": ["asc", "desc"],
                    "default": "desc",
                    "description": "Sort direction for entries"
                },
                "includeMarkdown": {
                    "type": "boolean",
                    "default": true,
                    "description": "Whether to include markdown content in the response"
                },
                "includeHeadings": {
                    "type": "boolean",
                    "default": true,
                    "description": "Whether to include headings in the response"
                },
                "limit": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "Maximum number of entries to return"
                }
            },
            "additionalProperties": false
        }),
    }
}

impl ToolArguments for LifelogQuery {
    fn prepare(self) -> std::result::Result<Self, Vec<String>> {
        self.validate()?;
        Ok(self.with_defaults())
    }
}

/// Fetch lifelogs and wrap the outcome. Never fails: gateway errors become an
/// error-flagged result.
pub async fn get_lifelogs(client: &LimitlessClient, query: LifelogQuery) -> McpToolResult {
    let outcome = client
        .list_lifelogs(&query)
        .await
        .and_then(|document| Ok(serde_json::to_string_pretty(&document)?));

    match outcome {
        Ok(text) => McpToolResult::success(text),
        Err(e) => {
            warn!(error = %e, "fetching lifelogs failed");
            McpToolResult::failure(format!("Error fetching lifelogs: {}", e))
        }
    }
}

/// Server exposing `getLifelogs`, backed by `client`.
pub fn lifelog_server(client: LimitlessClient) -> Result<McpServer> {
    let mut server = McpServer::new(SERVER_NAME, env!("CARGO_PKG_VERSION"));
    let client = Arc::new(client);

    server.register_tool(get_lifelogs_descriptor(), move |query: LifelogQuery| {
        let client = Arc::clone(&client);
        async move { get_lifelogs(&client, query).await }
    })?;

    Ok(server)
}
