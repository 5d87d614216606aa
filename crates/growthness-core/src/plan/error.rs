use crate::llm::GenerateError;

/// Terminal failures of the plan flow. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The request had no usable `goal`.
    #[error("Insufficient data.")]
    MissingGoal,

    /// The model (or the cache) produced JSON that is not a plan.
    #[error("plan data is malformed: {0}")]
    DataFormat(String),

    /// The model could not be reached or answered with an error.
    #[error("plan generation failed: {0}")]
    Generation(String),

    /// A habit asked for a frequency that does not exist.
    #[error("Invalid frequency: {0}")]
    InvalidFrequency(String),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<GenerateError> for PlanError {
    fn from(err: GenerateError) -> Self {
        match err {
            GenerateError::DataFormat(msg) => Self::DataFormat(msg),
            other => Self::Generation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_errors_split_into_format_and_generation() {
        let fmt: PlanError = GenerateError::DataFormat("expected value".into()).into();
        assert!(matches!(fmt, PlanError::DataFormat(_)));

        let gen_err: PlanError = GenerateError::EmptyReply.into();
        assert!(matches!(gen_err, PlanError::Generation(_)));
    }

    #[test]
    fn invalid_frequency_message_names_the_frequency() {
        let err = PlanError::InvalidFrequency("hourly".into());
        assert_eq!(err.to_string(), "Invalid frequency: hourly");
    }
}
