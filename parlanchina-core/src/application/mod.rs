//! Orchestration: tools, agent loop, gateway, event streaming and chat runs.

pub mod agent;
pub mod chat;
pub mod gateway;
pub mod stream;
pub mod tooling;

#[cfg(test)]
pub(crate) mod test_support;

pub use agent::{AgentLoop, AgentOutcome, AgentRequest};
pub use chat::{ChatError, ChatService, OutputStream};
pub use gateway::{EventStream, ModelGateway, StreamRequest};
pub use stream::{EventMultiplexer, OutputEvent, StreamSummary};
