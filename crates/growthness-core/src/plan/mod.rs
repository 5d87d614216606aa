//! AI plan flow: document schema, prompt, cache-or-generate service and
//! materialization into relational rows.

pub mod document;
pub mod error;
pub mod materialize;
pub mod prompt;
pub mod service;

pub use document::{PlanDocument, parse_plan_reply};
pub use error::PlanError;
pub use materialize::{MaterializeSummary, materialize_plan, translate_day};
pub use prompt::{SYSTEM_PROMPT, build_user_message};
pub use service::{PlanOutcome, PlanSource, generate_plan_for_user, get_or_generate_plan, goal_of};
