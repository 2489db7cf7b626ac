//! Agent blueprint generation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::AgentError;
use super::llm::{ChatModel, generate_text};
use super::prompts;
use crate::credential::ApiCredential;
use crate::toolkit::models::ToolQuery;
use crate::toolkit::platform::ToolkitPlatform;

/// Tools kept from discovery.
pub const MAX_DISCOVERED_TOOLS: usize = 5;

/// Models used for generation.
#[derive(Debug, Clone)]
pub struct GenerationModels {
    /// Use-case extraction and the generated agent's own runs.
    pub agent: String,
    /// System prompt and interface code.
    pub utility: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintMetadata {
    pub agent_idea: String,
    pub tool_count: usize,
    pub generated_at: DateTime<Utc>,
}

/// Everything needed to ship and test-run a generated agent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentBlueprint {
    pub use_case: String,
    pub discovered_tools: Vec<String>,
    pub system_prompt: String,
    pub frontend: String,
    pub backend: String,
    pub metadata: BlueprintMetadata,
}

/// Search the platform for tools matching `use_case`.
///
/// Discovery is advisory: a failed search yields no tools rather than an error.
async fn discover_tools(
    platform: &dyn ToolkitPlatform,
    credential: &ApiCredential,
    use_case: &str,
) -> Vec<String> {
    let query = ToolQuery::Search {
        query: use_case.to_string(),
        limit: MAX_DISCOVERED_TOOLS,
    };
    match platform.list_tools(credential, &query).await {
        Ok(tools) => {
            let mut slugs: Vec<String> = Vec::new();
            for tool in tools {
                let slug = tool.slug.to_uppercase();
                if !slug.is_empty() && !slugs.contains(&slug) {
                    slugs.push(slug);
                }
            }
            slugs.truncate(MAX_DISCOVERED_TOOLS);
            slugs
        }
        Err(e) => {
            warn!("tool discovery failed, continuing without tools: {e}");
            Vec::new()
        }
    }
}

/// Generate a blueprint for `agent_idea`.
pub async fn generate_agent(
    llm: &dyn ChatModel,
    platform: &dyn ToolkitPlatform,
    llm_key: &ApiCredential,
    platform_key: &ApiCredential,
    models: &GenerationModels,
    agent_idea: &str,
) -> Result<AgentBlueprint, AgentError> {
    let agent_idea = agent_idea.trim();
    if agent_idea.is_empty() {
        return Err(AgentError::Validation("Agent idea is required".into()));
    }

    let use_case = generate_text(llm, llm_key, &models.agent, prompts::use_case(agent_idea), 100).await?;
    let discovered_tools = discover_tools(platform, platform_key, &use_case).await;

    let system_prompt = generate_text(
        llm,
        llm_key,
        &models.utility,
        prompts::system_prompt(agent_idea, &discovered_tools),
        300,
    )
    .await?;

    let frontend = generate_text(
        llm,
        llm_key,
        &models.utility,
        prompts::frontend(agent_idea, &discovered_tools, &system_prompt),
        4000,
    )
    .await?;

    let backend = prompts::backend(
        agent_idea,
        &use_case,
        &discovered_tools,
        &system_prompt,
        &models.agent,
    );

    info!(
        tools = discovered_tools.len(),
        use_case = %use_case,
        "agent blueprint generated"
    );

    Ok(AgentBlueprint {
        metadata: BlueprintMetadata {
            agent_idea: agent_idea.to_string(),
            tool_count: discovered_tools.len(),
            generated_at: Utc::now(),
        },
        use_case,
        discovered_tools,
        system_prompt,
        frontend,
        backend,
    })
}
