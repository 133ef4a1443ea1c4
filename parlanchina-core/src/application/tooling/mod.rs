//! Tool catalogue: built-in tools, MCP servers and the merged registry.

mod interface;
mod internal;
mod manager;
mod naming;
mod registry;

pub use crate::infrastructure::mcp::ToolInvokeError;
pub use interface::ToolServerInterface;
pub use internal::{IMAGE_TOOL_ID, InternalToolCatalog, InternalToolExecutor};
pub use manager::{ConnectionManager, serialize_result};
pub use naming::{ToolNameMap, safe_tool_name};
pub use registry::{ResolvedTools, ToolRegistry};
