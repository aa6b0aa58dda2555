use std::fmt;

use thiserror::Error;

use crate::shared::config::ConfigError;

/// Result of feeding one sample to an enrollment session.
#[derive(Clone, Debug, PartialEq)]
pub enum SubmitOutcome<T, S> {
    /// Sample accepted; the session needs more.
    Continue { accepted: usize },
    Success(T),
    Failed(S),
}

impl<T, S> SubmitOutcome<T, S> {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SubmitOutcome::Continue { .. })
    }
}

/// Lifecycle of an enrollment session.
///
/// `Collecting → Finalizing → {Succeeded | Failed}`. Both end states are
/// terminal; a retry needs a new session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnrollmentState<S> {
    Collecting { accepted: usize },
    Finalizing,
    Succeeded,
    Failed(S),
}

impl<S> EnrollmentState<S> {
    pub fn is_terminal(&self) -> bool {
        matches!(self, EnrollmentState::Succeeded | EnrollmentState::Failed(_))
    }
}

impl<S: fmt::Display> fmt::Display for EnrollmentState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnrollmentState::Collecting { accepted } => write!(f, "collecting ({accepted} accepted)"),
            EnrollmentState::Finalizing => write!(f, "finalizing"),
            EnrollmentState::Succeeded => write!(f, "succeeded"),
            EnrollmentState::Failed(status) => write!(f, "failed: {status}"),
        }
    }
}

/// Misuse of the session API, as opposed to an enrollment outcome.
#[derive(Error, Debug)]
pub enum EnrollmentError {
    #[error("enrollment session for {identity:?} is closed ({state})")]
    SessionClosed { identity: String, state: String },
    #[error("enrollment identity must not be empty")]
    EmptyIdentity,
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!EnrollmentState::<u8>::Collecting { accepted: 2 }.is_terminal());
        assert!(!EnrollmentState::<u8>::Finalizing.is_terminal());
        assert!(EnrollmentState::<u8>::Succeeded.is_terminal());
        assert!(EnrollmentState::Failed(1u8).is_terminal());
    }

    #[test]
    fn test_outcome_terminality() {
        assert!(!SubmitOutcome::<(), ()>::Continue { accepted: 1 }.is_terminal());
        assert!(SubmitOutcome::<(), ()>::Failed(()).is_terminal());
    }

    #[test]
    fn test_state_display() {
        let s: EnrollmentState<&str> = EnrollmentState::Collecting { accepted: 3 };
        assert_eq!(s.to_string(), "collecting (3 accepted)");
        assert_eq!(EnrollmentState::Failed("no face").to_string(), "failed: no face");
    }
}
