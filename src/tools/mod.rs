// Tool layer - the seven application tool sets behind one registry
#![allow(unused_imports)]

pub mod apps;
pub mod config;
pub mod error;
pub mod registry;
pub mod tool;
pub mod types;

pub use config::ToolsConfig;
pub use error::{Result, ToolError};
pub use registry::Toolbox;
pub use tool::ToolSet;
pub use types::{ActionResult, ToolDefinition, ToolOutput};
