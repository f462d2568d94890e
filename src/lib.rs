pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod mcp;
pub mod runner;
pub mod ui;

pub use error::{LifelogError, Result};
