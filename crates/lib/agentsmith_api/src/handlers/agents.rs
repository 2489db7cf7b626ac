//! Agent generation and test runs.

use agentsmith_core::agent::generate::{AgentBlueprint, GenerationModels, generate_agent};
use agentsmith_core::agent::run::{AgentRun, run_agent};
use axum::Json;
use axum::extract::State;
use chrono::Utc;
use tracing::info;

use super::{credential, required};
use crate::AppState;
use crate::error::AppResult;
use crate::models::{
    ExecuteAgentMetadata, ExecuteAgentRequest, ExecuteAgentResponse, GenerateAgentRequest,
};

/// `POST /api/generate-agent`
pub async fn generate_agent_handler(
    State(state): State<AppState>,
    Json(body): Json<GenerateAgentRequest>,
) -> AppResult<Json<AgentBlueprint>> {
    let idea = required(body.agent_idea, "Agent idea is required")?;
    let llm_key = credential(
        body.llm_api_key.as_deref(),
        state.config.llm_api_key.as_ref(),
        "LLM API key is required",
    )?;
    let platform_key = credential(
        body.platform_api_key.as_deref(),
        state.config.platform_api_key.as_ref(),
        "Platform API key is required",
    )?;

    let models = GenerationModels {
        agent: state.config.agent_model.clone(),
        utility: state.config.utility_model.clone(),
    };
    info!(idea = %idea, "generating agent");
    let blueprint = generate_agent(
        &*state.llm,
        &*state.platform,
        &llm_key,
        &platform_key,
        &models,
        &idea,
    )
    .await?;
    Ok(Json(blueprint))
}

/// `POST /api/execute-generated-agent`
///
/// Runs a generated agent once. A tool without a connected account fails
/// with `account_connection_required` and names the toolkit to connect.
pub async fn execute_agent_handler(
    State(state): State<AppState>,
    Json(body): Json<ExecuteAgentRequest>,
) -> AppResult<Json<ExecuteAgentResponse>> {
    let llm_key = credential(body.llm_api_key.as_deref(), None, "Missing required fields")?;
    let platform_key = credential(body.platform_api_key.as_deref(), None, "Missing required fields")?;
    let prompt = required(body.prompt, "Missing required fields")?;

    let run = AgentRun {
        prompt,
        system_prompt: body.system_prompt,
        tools: body.discovered_tools,
        user_id: body
            .user_id
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| "default".to_string()),
        model: state.config.agent_model.clone(),
    };
    let reply = run_agent(&*state.llm, &*state.platform, &llm_key, &platform_key, &run).await?;

    Ok(Json(ExecuteAgentResponse {
        response: reply.response,
        success: true,
        metadata: ExecuteAgentMetadata {
            tools_used: reply.tools_used,
            system_prompt: reply.system_prompt,
            steps: reply.steps,
            timestamp: Utc::now(),
        },
    }))
}
