use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::{GenerateError, PlanGenerator};
use crate::plan::{PlanDocument, SYSTEM_PROMPT, build_user_message, parse_plan_reply};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Connection settings for an OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    /// Base URL without the trailing `/chat/completions`.
    pub base_url: String,
    pub model: String,
    /// Overall request timeout.
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// [`PlanGenerator`] backed by `POST {base_url}/chat/completions`.
#[derive(Debug, Clone)]
pub struct OpenAiPlanGenerator {
    client: Client,
    config: LlmConfig,
}

impl OpenAiPlanGenerator {
    pub fn new(config: LlmConfig) -> Result<Self, GenerateError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(config.timeout)
            .build()
            .map_err(|e| GenerateError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl PlanGenerator for OpenAiPlanGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, user_data: &serde_json::Value) -> Result<PlanDocument, GenerateError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(GenerateError::MissingApiKey)?;

        let user_message = build_user_message(user_data);
        let request = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_message,
                },
            ],
        };

        info!(model = %self.config.model, "requesting plan from language model");

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "language model request failed");
                GenerateError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %body, "language model returned an error");
            return Err(GenerateError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = response.json().await.map_err(|e| {
            error!(error = %e, "language model response is not a chat completion");
            GenerateError::Transport(e.to_string())
        })?;

        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GenerateError::EmptyReply)?;

        debug!(bytes = content.len(), "received plan reply");

        parse_plan_reply(&content).map_err(|e| {
            error!(error = %e, "language model reply is not a valid plan");
            GenerateError::DataFormat(e.to_string())
        })
    }
}
