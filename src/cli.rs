use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "lifelog-mcp")]
#[command(about = "Expose the Limitless lifelogs API as an MCP tool, or call it as a client", long_about = None)]
pub struct Args {
    #[arg(value_enum, help = "Run mode")]
    pub mode: Mode,

    #[arg(
        long = "api-url",
        help = "Base URL of the lifelogs API (e.g., https://api.limitless.ai)"
    )]
    pub api_url: Option<String>,

    #[arg(long = "config", help = "Path to a YAML or JSON config file")]
    pub config: Option<PathBuf>,

    #[arg(short = 'v', long = "verbose", help = "Enable debug logging on stderr")]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Serve the getLifelogs tool over stdio
    Server,
    /// Spawn a server, call getLifelogs once and print the result
    Client,
    /// Spawn a server and prompt for tool calls
    Interactive,
}
