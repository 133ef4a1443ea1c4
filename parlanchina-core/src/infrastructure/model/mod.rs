//! Model infrastructure module
//!
//! # Structure
//! - `types` - assistant turn, image and error types
//! - `traits` - the `ModelProvider` trait
//! - `adapter` - message format and stream event adapters
//! - `factory` - provider factory for creating clients
//! - `clients` - OpenAI / Azure OpenAI client

pub mod adapter;
pub mod clients;
pub mod factory;
pub mod traits;
pub mod types;

pub use adapter::ResponsesStreamAdapter;
pub use factory::ProviderFactory;
pub use traits::{ModelEventStream, ModelProvider};
pub use types::{AssistantTurn, GeneratedImage, ModelError};
