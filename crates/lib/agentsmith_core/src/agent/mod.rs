//! Agent generation and execution.
//!
//! Turns a natural-language agent idea into a blueprint (use case, tools,
//! system prompt, interface code) and runs generated agents against platform
//! tools with an LLM in a bounded tool-calling loop.

pub mod generate;
pub mod llm;
pub mod prompts;
pub mod run;

#[cfg(test)]
pub(crate) mod testing;

use thiserror::Error;

use crate::toolkit::ToolkitError;
use llm::LlmError;

/// Errors surfaced by agent generation and runs.
///
/// Missing connections, failed tool executions and everything else stay
/// distinguishable so callers can route the user to the right fix.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Some tools require connected accounts. Please connect the required services first.")]
    ConnectionRequired { tools: Vec<String> },

    #[error(
        "The agent tried to use {tool} but no connected accounts were found. Please connect your {toolkit} account first."
    )]
    NoConnectedAccount { tool: String, toolkit: String },

    #[error("Failed to execute {tool}: {message}")]
    ToolExecution { tool: String, message: String },

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Platform(#[from] ToolkitError),
}

/// Whether a platform message reports a missing connected account.
pub fn mentions_missing_connection(message: &str) -> bool {
    message.to_lowercase().contains("no connected account")
}
