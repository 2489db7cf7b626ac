//! Generated agent runs.
//!
//! The model is given the agent's platform tools and may call them for up to
//! [`MAX_STEPS`] turns. A tool call that finds no connected account ends the
//! run immediately; nothing is retried.

use serde::Serialize;
use tracing::{debug, info};

use super::llm::{ChatMessage, ChatModel, ChatRequest, ToolCall};
use super::{AgentError, mentions_missing_connection};
use crate::credential::ApiCredential;
use crate::toolkit::ToolkitError;
use crate::toolkit::models::{ToolQuery, ToolSchema};
use crate::toolkit::naming::extract_toolkit_slug;
use crate::toolkit::platform::ToolkitPlatform;

pub const MAX_STEPS: u32 = 5;

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful AI agent. Use the available tools to assist the user.";

/// One run of a generated agent.
#[derive(Debug, Clone)]
pub struct AgentRun {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub tools: Vec<String>,
    pub user_id: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentReply {
    pub response: String,
    pub tools_used: Vec<String>,
    pub system_prompt: String,
    pub steps: u32,
}

fn tool_failure(tool: &str, message: String) -> AgentError {
    if mentions_missing_connection(&message) {
        AgentError::NoConnectedAccount {
            tool: tool.to_string(),
            toolkit: extract_toolkit_slug(tool),
        }
    } else {
        AgentError::ToolExecution {
            tool: tool.to_string(),
            message,
        }
    }
}

async fn load_tools(
    platform: &dyn ToolkitPlatform,
    credential: &ApiCredential,
    slugs: &[String],
) -> Result<Vec<ToolSchema>, AgentError> {
    let query = ToolQuery::Slugs(slugs.iter().map(|s| s.to_uppercase()).collect());
    match platform.list_tools(credential, &query).await {
        Ok(tools) => Ok(tools),
        Err(ToolkitError::Upstream { body, .. }) if mentions_missing_connection(&body) => {
            Err(AgentError::ConnectionRequired {
                tools: slugs.to_vec(),
            })
        }
        Err(e) => Err(e.into()),
    }
}

async fn execute_call(
    platform: &dyn ToolkitPlatform,
    credential: &ApiCredential,
    tools: &[ToolSchema],
    user_id: &str,
    call: &ToolCall,
) -> Result<String, AgentError> {
    if !tools.iter().any(|t| t.slug.eq_ignore_ascii_case(&call.name)) {
        return Err(AgentError::ToolExecution {
            tool: call.name.clone(),
            message: "tool is not available to this agent".into(),
        });
    }

    debug!(tool = %call.name, "agent tool call");
    match platform
        .execute_tool(credential, &call.name, user_id, &call.arguments)
        .await
    {
        Ok(exec) if exec.successful => Ok(exec.data.to_string()),
        Ok(exec) => Err(tool_failure(
            &call.name,
            exec.error
                .unwrap_or_else(|| "tool reported failure".to_string()),
        )),
        Err(ToolkitError::Upstream { body, .. }) => Err(tool_failure(&call.name, body)),
        Err(e) => Err(tool_failure(&call.name, e.to_string())),
    }
}

/// Run a generated agent for one prompt.
pub async fn run_agent(
    llm: &dyn ChatModel,
    platform: &dyn ToolkitPlatform,
    llm_key: &ApiCredential,
    platform_key: &ApiCredential,
    run: &AgentRun,
) -> Result<AgentReply, AgentError> {
    if run.prompt.trim().is_empty() {
        return Err(AgentError::Validation("Missing required fields".into()));
    }
    if run.tools.is_empty() {
        return Err(AgentError::Validation(
            "No tools discovered for this agent".into(),
        ));
    }

    let system_prompt = run
        .system_prompt
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_SYSTEM_PROMPT)
        .to_string();

    let tools = load_tools(platform, platform_key, &run.tools).await?;
    debug!(tools = tools.len(), "agent tools loaded");

    let mut request = ChatRequest {
        model: run.model.clone(),
        messages: vec![
            ChatMessage::System(system_prompt.clone()),
            ChatMessage::User(run.prompt.clone()),
        ],
        tools,
        max_tokens: None,
    };

    let mut last_text = None;
    let mut steps = 0;
    while steps < MAX_STEPS {
        steps += 1;
        let turn = llm.complete(llm_key, &request).await?;
        if turn.tool_calls.is_empty() {
            last_text = turn.text;
            break;
        }

        last_text = turn.text.clone();
        request.messages.push(ChatMessage::Assistant {
            content: turn.text,
            tool_calls: turn.tool_calls.clone(),
        });
        for call in &turn.tool_calls {
            let output =
                execute_call(platform, platform_key, &request.tools, &run.user_id, call).await?;
            request.messages.push(ChatMessage::Tool {
                call_id: call.id.clone(),
                content: output,
            });
        }
    }

    info!(steps, tools = run.tools.len(), "agent run finished");
    Ok(AgentReply {
        response: last_text.unwrap_or_default(),
        tools_used: run.tools.clone(),
        system_prompt,
        steps,
    })
}
