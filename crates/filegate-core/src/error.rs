//! Error types for the Filegate workflow core.
//!
//! Errors fall into two groups:
//!
//! - **Recoverable**: validation, configuration and session errors. They block
//!   the attempted transition and are surfaced as field-level messages; the
//!   workflow stays usable.
//! - **Defects**: transition errors. The rendering surface asked for something
//!   the state machine never allows (for example a second active candidate).
//!   The transition is refused and the state machine stays consistent, but the
//!   caller has a bug.

use crate::candidate::CandidateId;
use thiserror::Error;

/// Candidate validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Declared media type is not in the allow-list
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    /// File exceeds the size ceiling
    #[error("file too large: {size} bytes exceeds the {limit} byte limit")]
    TooLarge {
        /// Declared size of the file
        size: u64,
        /// Configured ceiling
        limit: u64,
    },
}

/// Processing configuration failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// Encryption requested without an acceptable passphrase
    #[error("password must be at least {min_len} characters")]
    WeakPassword {
        /// Minimum accepted length in characters
        min_len: usize,
    },

    /// Output name is empty
    #[error("output name must not be empty")]
    EmptyOutputName,

    /// Output name is a dot segment and cannot address a file
    #[error("output name '{0}' is reserved")]
    ReservedOutputName(String),
}

/// Transfer failures recorded by a tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransferError {
    /// Transfer was aborted before completion
    #[error("transfer aborted")]
    Aborted,

    /// Reserved for real network transfers; the simulated tracker never raises it
    #[error("network failure")]
    NetworkSimulated,
}

/// Workflow invariant violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// Event is not allowed in the current stage
    #[error("invalid transition: {event} not allowed in {stage}")]
    InvalidTransition {
        /// Stage the controller was in
        stage: &'static str,
        /// Event that was refused
        event: &'static str,
    },

    /// Event names a candidate the intake collection does not hold
    #[error("unknown candidate: {0}")]
    UnknownCandidate(CandidateId),

    /// Candidate has not finished its transfer
    #[error("candidate {0} has not finished transferring")]
    CandidateNotReady(CandidateId),

    /// A submission is already being processed
    #[error("submission already in progress")]
    SubmissionInProgress,
}

/// Session gate failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    /// No authenticated session is present
    #[error("not authenticated")]
    NotAuthenticated,
}

/// Artifact reference failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtifactError {
    /// Base locator cannot carry path segments
    #[error("invalid artifact base url: {0}")]
    InvalidBase(String),
}

/// Umbrella error returned by the workflow controller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// Candidate rejected by the validator
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Draft configuration not submittable
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Refused state transition
    #[error("transition error: {0}")]
    Transition(#[from] TransitionError),

    /// Session gate closed
    #[error("session error: {0}")]
    Session(#[from] SessionError),
}

impl WorkflowError {
    /// Returns true if the error should be surfaced to the user as a field-level
    /// message and the workflow can continue
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            WorkflowError::Validation(_)
                | WorkflowError::Configuration(_)
                | WorkflowError::Session(_)
        )
    }

    /// Returns true if the error indicates a caller bug (invariant violation)
    #[must_use]
    pub fn is_defect(&self) -> bool {
        matches!(self, WorkflowError::Transition(_))
    }

    /// Shorthand for an invalid transition error
    #[must_use]
    pub const fn invalid_transition(stage: &'static str, event: &'static str) -> Self {
        WorkflowError::Transition(TransitionError::InvalidTransition { stage, event })
    }
}

/// Failures reported by a workflow runtime handle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Runtime task has stopped (session ended or runtime dropped)
    #[error("workflow runtime closed")]
    Closed,

    /// Event was refused by the controller
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

impl RuntimeError {
    /// Controller error behind this failure, if any
    #[must_use]
    pub fn workflow(&self) -> Option<&WorkflowError> {
        match self {
            RuntimeError::Workflow(err) => Some(err),
            RuntimeError::Closed => None,
        }
    }
}

/// Result type for workflow operations
pub type Result<T> = std::result::Result<T, WorkflowError>;
