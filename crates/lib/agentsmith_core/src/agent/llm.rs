//! LLM text generation.
//!
//! [`ChatModel`] is the seam; [`OpenAiChat`] calls an OpenAI-compatible
//! `/chat/completions` endpoint with function tools.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{debug, warn};

use crate::credential::ApiCredential;
use crate::toolkit::models::ToolSchema;

/// LLM provider errors.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM provider returned HTTP {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("LLM request failed: {0}")]
    Transport(String),

    #[error("LLM response parse error: {0}")]
    InvalidResponse(String),
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatMessage {
    System(String),
    User(String),
    Assistant {
        content: Option<String>,
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        call_id: String,
        content: String,
    },
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolSchema>,
    pub max_tokens: Option<u32>,
}

/// One model turn: final text, tool calls, or both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatTurn {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        credential: &ApiCredential,
        request: &ChatRequest,
    ) -> Result<ChatTurn, LlmError>;
}

/// Single-prompt generation without tools. Returns trimmed text.
pub async fn generate_text(
    llm: &dyn ChatModel,
    credential: &ApiCredential,
    model: &str,
    prompt: String,
    max_tokens: u32,
) -> Result<String, LlmError> {
    let request = ChatRequest {
        model: model.to_string(),
        messages: vec![ChatMessage::User(prompt)],
        tools: Vec::new(),
        max_tokens: Some(max_tokens),
    };
    let turn = llm.complete(credential, &request).await?;
    Ok(turn.text.unwrap_or_default().trim().to_string())
}

// =============================================================================
// OpenAI-compatible client
// =============================================================================

#[derive(Deserialize)]
struct CompletionWire {
    choices: Vec<ChoiceWire>,
}

#[derive(Deserialize)]
struct ChoiceWire {
    message: MessageWire,
}

#[derive(Deserialize)]
struct MessageWire {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCallWire>,
}

#[derive(Deserialize)]
struct ToolCallWire {
    id: String,
    function: FunctionWire,
}

#[derive(Deserialize)]
struct FunctionWire {
    name: String,
    #[serde(default)]
    arguments: String,
}

fn message_to_wire(message: &ChatMessage) -> Value {
    match message {
        ChatMessage::System(content) => json!({ "role": "system", "content": content }),
        ChatMessage::User(content) => json!({ "role": "user", "content": content }),
        ChatMessage::Assistant {
            content,
            tool_calls,
        } => {
            let mut msg = Map::new();
            msg.insert("role".into(), json!("assistant"));
            msg.insert("content".into(), json!(content));
            if !tool_calls.is_empty() {
                let calls: Vec<Value> = tool_calls
                    .iter()
                    .map(|c| {
                        json!({
                            "id": c.id,
                            "type": "function",
                            "function": { "name": c.name, "arguments": c.arguments.to_string() },
                        })
                    })
                    .collect();
                msg.insert("tool_calls".into(), Value::Array(calls));
            }
            Value::Object(msg)
        }
        ChatMessage::Tool { call_id, content } => {
            json!({ "role": "tool", "tool_call_id": call_id, "content": content })
        }
    }
}

fn tool_to_wire(tool: &ToolSchema) -> Value {
    let parameters = if tool.input_parameters.is_object() {
        tool.input_parameters.clone()
    } else {
        json!({ "type": "object", "properties": {} })
    };
    json!({
        "type": "function",
        "function": {
            "name": tool.slug,
            "description": tool.description,
            "parameters": parameters,
        },
    })
}

fn request_body(request: &ChatRequest) -> Value {
    let mut body = Map::new();
    body.insert("model".into(), json!(request.model));
    body.insert(
        "messages".into(),
        Value::Array(request.messages.iter().map(message_to_wire).collect()),
    );
    if !request.tools.is_empty() {
        body.insert(
            "tools".into(),
            Value::Array(request.tools.iter().map(tool_to_wire).collect()),
        );
    }
    if let Some(max) = request.max_tokens {
        body.insert("max_tokens".into(), json!(max));
    }
    Value::Object(body)
}

fn parse_arguments(tool: &str, raw: &str) -> Value {
    if raw.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!(tool, "unparseable tool arguments: {e}");
        json!({})
    })
}

/// OpenAI chat completions client.
#[derive(Clone, Debug)]
pub struct OpenAiChat {
    http: Client,
    base_url: String,
}

impl OpenAiChat {
    /// `base_url` is the API root, e.g. `https://api.openai.com/v1`.
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(
        &self,
        credential: &ApiCredential,
        request: &ChatRequest,
    ) -> Result<ChatTurn, LlmError> {
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "chat completion"
        );
        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", credential.expose()))
            .json(&request_body(request))
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(LlmError::Provider { status, body });
        }

        let completion: CompletionWire = resp
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        let message = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("empty choices array".to_string()))?
            .message;

        Ok(ChatTurn {
            text: message.content.filter(|c| !c.is_empty()),
            tool_calls: message
                .tool_calls
                .into_iter()
                .map(|c| ToolCall {
                    arguments: parse_arguments(&c.function.name, &c.function.arguments),
                    id: c.id,
                    name: c.function.name,
                })
                .collect(),
        })
    }
}
