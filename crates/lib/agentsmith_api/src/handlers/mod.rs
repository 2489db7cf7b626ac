//! Request handlers.

pub mod agents;
pub mod callback;
pub mod connections;
pub mod health;
pub mod toolkits;

use agentsmith_core::ApiCredential;

use crate::error::{AppError, AppResult};

/// A required, non-blank request field.
fn required(value: Option<String>, message: &str) -> AppResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(message.to_string()))
}

/// The caller's key, or the server default when one is configured.
fn credential(
    value: Option<&str>,
    fallback: Option<&ApiCredential>,
    message: &str,
) -> AppResult<ApiCredential> {
    ApiCredential::from_optional(value)
        .or_else(|| fallback.cloned())
        .ok_or_else(|| AppError::Validation(message.to_string()))
}
