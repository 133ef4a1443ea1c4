//! Bounded multi-turn tool loop driving the model to a final answer.

mod evidence;
mod instructions;
mod models;
mod runner;


pub use instructions::LOOP_ENDED_TEXT;
pub use models::{AgentOutcome, AgentRequest};
pub use runner::AgentLoop;
