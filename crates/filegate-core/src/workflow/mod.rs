//! Workflow state machine.
//!
//! The [`WorkflowController`] sequences validation, transfer tracking,
//! configuration and completion for the candidates of one session.
//!
//! ```text
//!              designate(Succeeded)            submit + latency
//!   Intake  ------------------------>  Configuring  ----------------> Completed
//!     ^                                    |                             |
//!     +---------------- cancel ------------+                             |
//!     +------------------------- restart ("process another") -----------+
//!
//!   logout (any stage): all state discarded, session ends
//! ```
//!
//! Transitions are synchronous: `handle(session, event)` either applies the
//! event and returns a [`Transition`] (notifications for the rendering surface
//! plus timer [`Effect`]s for the runtime), or returns an error and leaves the
//! state untouched. The controller never sleeps; timers are the runtime's job.

mod controller;

pub use controller::WorkflowController;

use crate::artifact::ArtifactReference;
use crate::candidate::{CandidateId, FileCandidate, FileDescriptor};
use crate::error::{ValidationError, WorkflowError};
use crate::processing::{
    CompressionEstimate, Passphrase, ProcessingConfig, ProcessingDraft, TransformStep,
};
use crate::tracker::{ProgressUpdate, TransferTicket};
use std::fmt;

/// Coarse workflow phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    /// Selecting and transferring candidates
    #[default]
    Intake,
    /// Editing the processing configuration of the active candidate
    Configuring,
    /// Processing finished, artifact available
    Completed,
}

impl Stage {
    /// Stage name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Intake => "Intake",
            Self::Configuring => "Configuring",
            Self::Completed => "Completed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single source of truth for the current phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorkflowState {
    /// Current stage
    pub stage: Stage,
    /// Candidate in `Configuring` or `Completed`
    pub active_candidate: Option<CandidateId>,
}

/// Identity of one scheduled processing run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessingTicket {
    /// Candidate being processed
    pub candidate: CandidateId,
    /// Schedule epoch
    pub epoch: u64,
}

/// User intents and timer callbacks fed into the controller
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    /// Offer a file for intake
    SelectFile(FileDescriptor),
    /// Scheduled transfer progress tick
    TransferTick(TransferTicket),
    /// Abort a running transfer, keeping the candidate listed as failed
    AbortTransfer(CandidateId),
    /// Remove a candidate, aborting its transfer if still running
    RemoveCandidate(CandidateId),
    /// Choose a succeeded candidate for configuration
    Designate(CandidateId),
    /// Toggle compression
    SetCompress(bool),
    /// Toggle encryption
    SetEncrypt(bool),
    /// Set or clear the passphrase
    SetPassword(Option<Passphrase>),
    /// Override the output name
    SetOutputName(String),
    /// Submit the draft configuration
    Submit,
    /// Scheduled end of processing latency
    ProcessingFinished(ProcessingTicket),
    /// Leave configuration and return to intake
    Cancel,
    /// "Process another": clear everything and return to intake
    Restart,
    /// End the session
    Logout,
}

impl WorkflowEvent {
    /// Event name used in logs and errors
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SelectFile(_) => "SelectFile",
            Self::TransferTick(_) => "TransferTick",
            Self::AbortTransfer(_) => "AbortTransfer",
            Self::RemoveCandidate(_) => "RemoveCandidate",
            Self::Designate(_) => "Designate",
            Self::SetCompress(_) => "SetCompress",
            Self::SetEncrypt(_) => "SetEncrypt",
            Self::SetPassword(_) => "SetPassword",
            Self::SetOutputName(_) => "SetOutputName",
            Self::Submit => "Submit",
            Self::ProcessingFinished(_) => "ProcessingFinished",
            Self::Cancel => "Cancel",
            Self::Restart => "Restart",
            Self::Logout => "Logout",
        }
    }

    /// Whether the event originates from a timer rather than the user
    #[must_use]
    pub const fn is_scheduled(&self) -> bool {
        matches!(
            self,
            Self::TransferTick(_) | Self::ProcessingFinished(_)
        )
    }
}

/// Display view of the draft configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftSummary {
    /// Candidate being configured
    pub candidate: CandidateId,
    /// Compression toggled on
    pub compress_enabled: bool,
    /// Encryption toggled on
    pub encrypt_enabled: bool,
    /// A passphrase has been entered
    pub has_password: bool,
    /// Current output name
    pub output_name: String,
    /// Pipeline the current flags produce
    pub steps: Vec<TransformStep>,
    /// Illustrative compressed size
    pub estimate: Option<CompressionEstimate>,
    /// Submission would succeed
    pub submittable: bool,
}

impl From<&ProcessingDraft> for DraftSummary {
    fn from(draft: &ProcessingDraft) -> Self {
        Self {
            candidate: draft.candidate(),
            compress_enabled: draft.compress_enabled(),
            encrypt_enabled: draft.encrypt_enabled(),
            has_password: draft.has_password(),
            output_name: draft.output_name().to_string(),
            steps: draft.steps(),
            estimate: draft.estimate(),
            submittable: draft.is_submittable(),
        }
    }
}

/// Result of a successful workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedArtifact {
    /// Processed candidate
    pub candidate: FileCandidate,
    /// Submitted configuration
    pub config: ProcessingConfig,
    /// Access reference for the scannable code
    pub reference: ArtifactReference,
}

/// Observable change for the rendering surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Candidate passed validation and started transferring
    CandidateAccepted(FileCandidate),
    /// Offered file failed validation and was not added
    Rejected {
        /// File as offered
        descriptor: FileDescriptor,
        /// First rule it broke
        reason: ValidationError,
    },
    /// Transfer progress changed
    Progress(ProgressUpdate),
    /// Candidate was removed from intake
    CandidateRemoved(CandidateId),
    /// Stage or active candidate changed
    StageChanged(WorkflowState),
    /// Draft configuration changed
    DraftChanged(DraftSummary),
    /// Submission accepted, processing under way
    ProcessingStarted(CandidateId),
    /// Processing finished
    Completed(CompletedArtifact),
    /// Session ended, all workflow state discarded
    SessionEnded,
}

impl Notification {
    /// Rejection notice for a refused selection
    ///
    /// Returns `None` unless `err` is a validation failure.
    #[must_use]
    pub fn rejected(descriptor: FileDescriptor, err: &WorkflowError) -> Option<Self> {
        match err {
            WorkflowError::Validation(reason) => Some(Self::Rejected {
                descriptor,
                reason: reason.clone(),
            }),
            _ => None,
        }
    }
}

/// Scheduling request for the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Start ticking a transfer
    StartTransfer(TransferTicket),
    /// Stop ticking a transfer
    StopTransfer(TransferTicket),
    /// Deliver `ProcessingFinished` after the processing latency
    ScheduleProcessing(ProcessingTicket),
    /// Drop a scheduled processing completion
    CancelProcessing(ProcessingTicket),
    /// End the session
    EndSession,
}

/// Outcome of an applied event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    /// Changes to show
    pub notifications: Vec<Notification>,
    /// Timers to start or stop
    pub effects: Vec<Effect>,
}

impl Transition {
    /// Transition with no observable change
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Check if nothing changed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty() && self.effects.is_empty()
    }

    fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    fn effect(&mut self, effect: Effect) {
        self.effects.push(effect);
    }
}
