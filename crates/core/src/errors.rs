use thiserror::Error;

use crate::domain::job::JobStatus;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid job transition from {from:?} to {to:?}")]
    InvalidJobTransition { from: JobStatus, to: JobStatus },
    #[error("price breakdown for job {job_id} is frozen in terminal state {status:?}")]
    FrozenBreakdown { job_id: String, status: JobStatus },
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl ApplicationError {
    /// Whether the condition is expected to clear on retry without operator action.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_) | Self::Integration(_))
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::job::JobStatus;
    use crate::errors::{ApplicationError, DomainError};

    #[test]
    fn domain_errors_wrap_into_application_errors() {
        let error = ApplicationError::from(DomainError::InvalidJobTransition {
            from: JobStatus::Completed,
            to: JobStatus::Draft,
        });

        assert!(matches!(error, ApplicationError::Domain(_)));
        assert!(!error.is_retryable());
    }

    #[test]
    fn transient_failures_are_retryable() {
        assert!(ApplicationError::Persistence("database lock timeout".to_owned()).is_retryable());
        assert!(ApplicationError::Integration("routing service 503".to_owned()).is_retryable());
        assert!(!ApplicationError::Configuration("missing vat rate".to_owned()).is_retryable());
    }
}
