pub mod mcp;
pub mod model;
#[cfg(feature = "http-server")]
pub mod server;
pub mod storage;
