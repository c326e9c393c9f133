// src/oracle/http.rs
//! OpenAI-compatible chat-completions adapter
//!
//! Default oracle for the binary. Any endpoint speaking the chat-completions
//! wire format works (OpenAI, DeepSeek, local proxies); the model tag comes
//! from the player's agent binding.

use crate::oracle::{AgentOracle, ChatTurn, OracleError, OracleRequest, Speaker};
use crate::utils::config::OracleConfig;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

pub struct HttpOracle {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpOracle {
    pub fn new(config: &OracleConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env).ok();

        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

/// Map a system prompt plus conversation onto chat-completions messages
fn build_messages(system: &str, conversation: &[ChatTurn]) -> Vec<Value> {
    let mut messages = Vec::with_capacity(conversation.len() + 1);
    messages.push(json!({ "role": "system", "content": system }));

    for turn in conversation {
        let role = match turn.speaker {
            Speaker::Game => "user",
            Speaker::Player => "assistant",
        };
        messages.push(json!({ "role": role, "content": turn.text }));
    }

    messages
}

#[async_trait]
impl AgentOracle for HttpOracle {
    async fn respond(&self, request: OracleRequest<'_>) -> Result<String, OracleError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": request.agent,
            "max_completion_tokens": request.max_tokens,
            "messages": build_messages(request.system, request.conversation),
        });

        debug!(player = request.player_index, model = request.agent, "oracle call");

        let mut http_request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            http_request = http_request.bearer_auth(key);
        }

        let response = http_request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(OracleError::Provider(format!("{status}: {detail}")));
        }

        let payload: Value = response.json().await?;
        let content = payload["choices"][0]["message"]["content"].as_str().unwrap_or("");
        if content.is_empty() {
            return Err(OracleError::MalformedResponse(format!(
                "empty completion for model {}",
                request.agent
            )));
        }

        Ok(content.to_string())
    }
}
