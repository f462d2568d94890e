use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `client` section of the config file: how the client launches its server.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub server_command: Option<String>,
    #[serde(default)]
    pub server_args: Option<Vec<String>>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// Resolved command line for the spawned server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerCommand {
    pub program: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
}
