pub mod highlight;
pub mod output;

pub use output::{format_tool_result, format_tools};
