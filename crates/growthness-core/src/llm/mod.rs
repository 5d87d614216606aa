//! Plan generators: the seam between the plan flow and a language model.
//!
//! [`OpenAiPlanGenerator`] talks to any OpenAI-compatible chat-completions
//! endpoint. Tests substitute their own [`PlanGenerator`].

mod openai;

pub use openai::{
    DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS, LlmConfig, OpenAiPlanGenerator,
};

use async_trait::async_trait;

use crate::plan::PlanDocument;

/// Errors from a single generation attempt.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// No API key was configured.
    #[error("no API key configured for the language model")]
    MissingApiKey,

    /// The request never produced an HTTP response.
    #[error("request to language model failed: {0}")]
    Transport(String),

    /// The endpoint answered with a non-success status.
    #[error("language model returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response carried no message content.
    #[error("language model reply had no content")]
    EmptyReply,

    /// The content was not a plan document.
    #[error("language model reply is not a valid plan: {0}")]
    DataFormat(String),
}

/// Produces a plan from the raw request body of the user.
#[async_trait]
pub trait PlanGenerator: Send + Sync {
    /// Short name for logs (e.g. `"openai"`).
    fn name(&self) -> &str;

    /// Generate a plan. One attempt, no retries.
    async fn generate(&self, user_data: &serde_json::Value) -> Result<PlanDocument, GenerateError>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn PlanGenerator) {}
};
