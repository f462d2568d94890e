#![allow(dead_code)]

use lifelog_mcp::api::LimitlessClient;
use lifelog_mcp::config::ApiSettings;
use lifelog_mcp::mcp::{lifelog_server, McpServer};
use serde_json::Value;

pub const TEST_API_KEY: &str = "test-key";

pub fn api_settings(base_url: &str) -> ApiSettings {
    ApiSettings::new(TEST_API_KEY, base_url)
}

pub fn gateway(base_url: &str) -> LimitlessClient {
    LimitlessClient::new(&api_settings(base_url)).expect("gateway should build")
}

/// `getLifelogs` server pointed at `base_url`.
pub fn server_for(base_url: &str) -> McpServer {
    lifelog_server(gateway(base_url)).expect("server should build")
}

/// Parse newline-delimited JSON written by the server.
pub fn parse_lines(output: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(output)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).expect("server wrote invalid JSON"))
        .collect()
}
