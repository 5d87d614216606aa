use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use growthness_core::llm::{GenerateError, PlanGenerator};
use growthness_core::plan::PlanDocument;

enum Reply {
    Plan(PlanDocument),
    Fail(fn() -> GenerateError),
}

/// [`PlanGenerator`] returning a fixed reply and counting its calls.
pub struct StubGenerator {
    reply: Reply,
    calls: AtomicUsize,
    last_request: Mutex<Option<serde_json::Value>>,
}

impl StubGenerator {
    /// Always answer with `plan`.
    pub fn returning(plan: PlanDocument) -> Self {
        Self::new(Reply::Plan(plan))
    }

    /// Always fail with the error built by `make_error`.
    pub fn failing(make_error: fn() -> GenerateError) -> Self {
        Self::new(Reply::Fail(make_error))
    }

    fn new(reply: Reply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Number of `generate` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The request body of the most recent call.
    pub fn last_request(&self) -> Option<serde_json::Value> {
        self.last_request.lock().expect("stub mutex poisoned").clone()
    }
}

#[async_trait]
impl PlanGenerator for StubGenerator {
    fn name(&self) -> &str {
        "stub"
    }

    async fn generate(&self, user_data: &serde_json::Value) -> Result<PlanDocument, GenerateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().expect("stub mutex poisoned") = Some(user_data.clone());
        match &self.reply {
            Reply::Plan(plan) => Ok(plan.clone()),
            Reply::Fail(make_error) => Err(make_error()),
        }
    }
}
