pub const API_KEY_ENV: &str = "LIMITLESS_API_KEY";
pub const API_URL_ENV: &str = "LIMITLESS_API_URL";
pub const VERBOSE_ENV: &str = "LIFELOG_MCP_VERBOSE";

pub fn default_base_url() -> String {
    "https://api.limitless.ai".to_string()
}

/// Argument passed to the spawned child so it starts in server mode.
pub fn default_server_args() -> Vec<String> {
    vec!["server".to_string()]
}

pub fn is_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}
