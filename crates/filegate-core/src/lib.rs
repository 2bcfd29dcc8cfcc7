//! # Filegate Core
//!
//! Workflow core for Filegate, a guided file-intake flow: a signed-in user
//! offers files, each file is validated and transferred, one transferred file
//! is configured (compress, encrypt, rename) and processed, and the result is
//! handed back as a shareable reference.
//!
//! This crate provides:
//! - Candidate validation against type and size allow-lists
//! - Simulated transfer tracking with abort
//! - Processing configuration drafts and validation
//! - The workflow state machine and its async runtime
//! - Artifact reference generation
//! - Error types and handling
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      WorkflowRuntime                             │
//! │   (tokio actor: timers, state watch, notification broadcast)    │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                     WorkflowController                           │
//! │   (Intake -> Configuring -> Completed, session gate)            │
//! ├──────────────┬──────────────────┬─────────────────┬─────────────┤
//! │  Validator   │ TransferTracker  │ ProcessingDraft │  Reference  │
//! │              │  (per candidate) │                 │  Generator  │
//! └──────────────┴──────────────────┴─────────────────┴─────────────┘
//! ```
//!
//! The controller is synchronous and never sleeps. Time only enters through
//! the runtime, which turns timer [`Effect`]s into scheduled events.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod artifact;
pub mod candidate;
pub mod config;
pub mod error;
pub mod processing;
pub mod runtime;
pub mod session;
pub mod tracker;
pub mod validator;
pub mod workflow;

pub use artifact::{ArtifactReference, CodeImage, CodeImageEncoder, ReferenceGenerator};
pub use candidate::{CandidateId, FileCandidate, FileDescriptor};
pub use config::{ProcessingSettings, TransferSettings, WorkflowConfig};
pub use error::{
    ArtifactError, ConfigurationError, RuntimeError, SessionError, TransferError,
    TransitionError, ValidationError, WorkflowError,
};
pub use processing::{
    CompressionEstimate, Passphrase, ProcessingConfig, ProcessingDraft, ProcessingRules,
    TransformStep,
};
pub use runtime::{WorkflowHandle, WorkflowRuntime};
pub use session::{SessionProvider, SessionState};
pub use tracker::{CandidateStatus, ProgressUpdate, TransferTicket, TransferTracker};
pub use validator::IntakePolicy;
pub use workflow::{
    CompletedArtifact, DraftSummary, Effect, Notification, ProcessingTicket, Stage, Transition,
    WorkflowController, WorkflowEvent, WorkflowState,
};
