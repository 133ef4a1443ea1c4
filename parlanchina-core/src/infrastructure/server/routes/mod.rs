pub mod chat;
pub mod mcp;
pub mod sessions;
pub mod tools;
