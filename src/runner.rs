use colored::*;
use serde_json::{json, Value};
use std::io::{self, Write};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::api::LimitlessClient;
use crate::config::Config;
use crate::error::{LifelogError, Result};
use crate::mcp::{lifelog_server, McpClient, McpToolCall, GET_LIFELOGS};
use crate::ui::{format_tool_result, format_tools};

/// Serve `getLifelogs` on stdio until the client goes away.
pub async fn run_server(config: &Config) -> Result<()> {
    let client = LimitlessClient::new(&config.api)?;
    let server = lifelog_server(client)?;
    server.serve_stdio().await
}

/// Spawn a server, call `getLifelogs` with no arguments and print the result.
pub async fn run_client(config: &Config) -> Result<()> {
    let mut client = McpClient::spawn(&config.server_command()?).await?;

    let outcome = fetch_once(&mut client, &mut io::stdout()).await;
    let closed = client.close().await;
    outcome.and(closed)
}

/// Spawn a server and prompt for tool calls on stdin.
pub async fn run_interactive(config: &Config) -> Result<()> {
    let mut client = McpClient::spawn(&config.server_command()?).await?;

    let input = BufReader::new(tokio::io::stdin());
    let outcome = interactive_loop(&mut client, input, &mut io::stdout()).await;
    let closed = client.close().await;
    outcome.and(closed)
}

/// List the server's tools, then call `getLifelogs` once with `{}`.
pub async fn fetch_once<W: Write>(client: &mut McpClient, out: &mut W) -> Result<()> {
    let tools = client.list_tools().await?;
    write!(out, "{}", format_tools(&tools))?;

    let result = client
        .call_tool(&McpToolCall::new(GET_LIFELOGS, json!({})))
        .await?;
    write!(out, "{}", format_tool_result(GET_LIFELOGS, &result))?;
    out.flush()?;
    Ok(())
}

/// Prompt for a tool name and a JSON arguments object until `exit`, `quit` or EOF.
///
/// Malformed arguments and server-side rejections are reported and the loop goes on;
/// transport failures end it.
pub async fn interactive_loop<R, W>(client: &mut McpClient, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    writeln!(
        out,
        "{}",
        "Interactive mode. Type 'list' to show tools, 'exit' to quit.".cyan()
    )?;

    loop {
        prompt(out, "Tool name: ")?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let name = line.trim();

        match name {
            "" => continue,
            "exit" | "quit" => break,
            "list" => {
                let tools = client.list_tools().await?;
                write!(out, "{}", format_tools(&tools))?;
                continue;
            }
            _ => {}
        }

        prompt(out, "Arguments (JSON object, empty for {}): ")?;
        let Some(raw) = lines.next_line().await? else {
            break;
        };

        let arguments = match parse_arguments(&raw) {
            Ok(arguments) => arguments,
            Err(e) => {
                writeln!(out, "{} {}", "Error:".red(), e)?;
                continue;
            }
        };

        debug!(tool = name, "calling tool");
        match client.call_tool(&McpToolCall::new(name, arguments)).await {
            Ok(result) => writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?,
            Err(e @ LifelogError::Rpc { .. }) => writeln!(out, "{} {}", "Error:".red(), e)?,
            Err(e) => return Err(e),
        }
    }

    writeln!(out, "{}", "Goodbye.".dimmed())?;
    Ok(())
}

/// Parse an arguments line. Empty input means `{}`; anything but a JSON object is rejected.
pub fn parse_arguments(raw: &str) -> Result<Value> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(json!({}));
    }

    let value: Value = serde_json::from_str(raw)
        .map_err(|e| LifelogError::Input(format!("arguments are not valid JSON: {}", e)))?;

    if !value.is_object() {
        return Err(LifelogError::Input(
            "arguments must be a JSON object".to_string(),
        ));
    }

    Ok(value)
}

fn prompt<W: Write>(out: &mut W, label: &str) -> io::Result<()> {
    write!(out, "{}", label.bold())?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_arguments_are_an_empty_object() {
        assert_eq!(parse_arguments("   ").unwrap(), json!({}));
    }

    #[test]
    fn test_malformed_arguments_are_input_errors() {
        let err = parse_arguments("not-json").unwrap_err();
        assert!(matches!(err, LifelogError::Input(_)));
    }

    #[test]
    fn test_non_object_arguments_are_rejected() {
        let err = parse_arguments("[1, 2]").unwrap_err();
        assert!(err.to_string().contains("JSON object"));
    }

    #[test]
    fn test_object_arguments_pass_through() {
        assert_eq!(
            parse_arguments(r#"{"limit": 3}"#).unwrap(),
            json!({ "limit": 3 })
        );
    }
}
