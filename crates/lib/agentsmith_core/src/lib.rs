//! # agentsmith_core
//!
//! Core domain logic for Agentsmith.
//!
//! - [`toolkit`]: toolkit metadata, auth config resolution, connection
//!   initiation and completion polling against the integration platform.
//! - [`agent`]: LLM access, agent generation and agent runs over platform
//!   tools.

pub mod agent;
pub mod credential;
pub mod toolkit;

pub use credential::ApiCredential;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
