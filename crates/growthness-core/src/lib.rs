//! Domain logic for growthness: the AI plan flow (cache, generation,
//! materialization), access tokens, password hashing and routine rules.

pub mod llm;
pub mod password;
pub mod plan;
pub mod routine;
pub mod token;
