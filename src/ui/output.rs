use colored::*;

use super::highlight::Highlighter;
use crate::mcp::{McpTool, McpToolResult};

const RULE: &str = "──────────────────────────────────────────────────";
const FOOTER: &str = "└──────────────────────────────────────────────────────────";

pub fn format_tools(tools: &[McpTool]) -> String {
    if tools.is_empty() {
        return format!("{}\n", "No tools available.".yellow());
    }

    let mut output = format!("{}\n", "Available tools:".cyan());
    for tool in tools {
        output.push_str(&format!(
            "  - {} {}\n",
            tool.name.bold(),
            format!("- {}", tool.description).dimmed()
        ));
    }
    output
}

/// Boxed rendering of a tool result. JSON payloads are syntax highlighted when the
/// terminal takes colour.
pub fn format_tool_result(name: &str, result: &McpToolResult) -> String {
    let text = result.text();
    let sep = if text.ends_with('\n') { "" } else { "\n" };

    let (label, body) = if result.is_error() {
        (format!("TOOL ERROR: {}", name).red(), text.red().to_string())
    } else if colored::control::SHOULD_COLORIZE.should_colorize()
        && serde_json::from_str::<serde_json::Value>(&text).is_ok()
    {
        (
            format!("TOOL: {}", name).cyan(),
            Highlighter::shared().highlight(&text, "json"),
        )
    } else {
        (format!("TOOL: {}", name).cyan(), text.clone())
    };

    format!(
        "{}[{}]{}\n{}{}{}\n",
        "┌─".dimmed(),
        label,
        RULE.dimmed(),
        body,
        sep,
        FOOTER.dimmed()
    )
}
