//! Scripted LLM double for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::llm::{ChatModel, ChatRequest, ChatTurn, LlmError};
use crate::credential::ApiCredential;

/// Replays queued turns and records every request it receives.
#[derive(Default)]
pub struct ScriptedChat {
    turns: Mutex<VecDeque<ChatTurn>>,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_text(self, text: &str) -> Self {
        self.turns.lock().unwrap().push_back(ChatTurn {
            text: Some(text.to_string()),
            tool_calls: Vec::new(),
        });
        self
    }

    pub fn then_turn(self, turn: ChatTurn) -> Self {
        self.turns.lock().unwrap().push_back(turn);
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    async fn complete(
        &self,
        _credential: &ApiCredential,
        request: &ChatRequest,
    ) -> Result<ChatTurn, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.turns
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LlmError::InvalidResponse("script exhausted".into()))
    }
}
