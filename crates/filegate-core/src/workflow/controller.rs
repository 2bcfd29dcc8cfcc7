//! Workflow controller

use super::{
    CompletedArtifact, DraftSummary, Effect, Notification, ProcessingTicket, Stage, Transition,
    WorkflowEvent, WorkflowState,
};
use crate::candidate::{CandidateId, FileCandidate, FileDescriptor};
use crate::config::WorkflowConfig;
use crate::error::{Result, SessionError, TransitionError, ValidationError, WorkflowError};
use crate::processing::{ProcessingConfig, ProcessingDraft};
use crate::session::SessionState;
use crate::tracker::{CandidateStatus, ProgressUpdate, TransferTicket, TransferTracker};
use std::collections::BTreeMap;

/// Candidate in the intake collection
#[derive(Debug, Clone)]
struct IntakeEntry {
    candidate: FileCandidate,
    tracker: TransferTracker,
}

/// Submitted configuration waiting for the processing latency to elapse
#[derive(Debug, Clone)]
struct PendingSubmission {
    ticket: ProcessingTicket,
    config: ProcessingConfig,
}

/// Top-level workflow state machine
///
/// Owns the intake collection, the draft of the active candidate and the
/// completed artifact. Only one candidate can be configured or completed at a
/// time; the others keep transferring independently in the intake
/// collection.
pub struct WorkflowController {
    /// Workflow configuration
    config: WorkflowConfig,
    /// Current stage
    stage: Stage,
    /// Candidates in intake (`candidate_id` -> entry)
    intake: BTreeMap<CandidateId, IntakeEntry>,
    /// Draft of the active candidate while configuring
    draft: Option<ProcessingDraft>,
    /// Submission being processed
    pending: Option<PendingSubmission>,
    /// Result once completed
    completed: Option<CompletedArtifact>,
    /// Next candidate ID to allocate
    next_candidate: u64,
    /// Next schedule epoch to allocate
    next_epoch: u64,
}

impl WorkflowController {
    /// Create a controller in `Intake` with no candidates
    #[must_use]
    pub fn new(config: WorkflowConfig) -> Self {
        Self {
            config,
            stage: Stage::Intake,
            intake: BTreeMap::new(),
            draft: None,
            pending: None,
            completed: None,
            next_candidate: 1,
            next_epoch: 1,
        }
    }

    /// Workflow configuration
    #[must_use]
    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Current stage and active candidate
    #[must_use]
    pub fn state(&self) -> WorkflowState {
        WorkflowState {
            stage: self.stage,
            active_candidate: self.active_candidate(),
        }
    }

    /// Current stage
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Candidate in `Configuring` or `Completed`
    #[must_use]
    pub fn active_candidate(&self) -> Option<CandidateId> {
        self.draft
            .as_ref()
            .map(ProcessingDraft::candidate)
            .or_else(|| self.pending.as_ref().map(|p| p.ticket.candidate))
            .or_else(|| self.completed.as_ref().map(|c| c.candidate.id()))
    }

    /// Number of candidates in intake
    #[must_use]
    pub fn candidate_count(&self) -> usize {
        self.intake.len()
    }

    /// Candidates in intake with their current progress, ordered by ID
    pub fn candidates(&self) -> impl Iterator<Item = (&FileCandidate, ProgressUpdate)> + '_ {
        self.intake
            .values()
            .map(|entry| (&entry.candidate, entry.tracker.snapshot()))
    }

    /// Look up a candidate
    #[must_use]
    pub fn candidate(&self, id: CandidateId) -> Option<&FileCandidate> {
        self.intake.get(&id).map(|entry| &entry.candidate)
    }

    /// Transfer tracker of a candidate
    #[must_use]
    pub fn tracker(&self, id: CandidateId) -> Option<&TransferTracker> {
        self.intake.get(&id).map(|entry| &entry.tracker)
    }

    /// Draft being edited
    #[must_use]
    pub fn draft(&self) -> Option<&ProcessingDraft> {
        self.draft.as_ref()
    }

    /// Completed artifact
    #[must_use]
    pub fn completed(&self) -> Option<&CompletedArtifact> {
        self.completed.as_ref()
    }

    /// Check if a submission is being processed
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.pending.is_some()
    }

    /// Validate a profile-image upload against the profile policy
    ///
    /// Profile images bypass the workflow; only the validation rules are
    /// shared.
    ///
    /// # Errors
    ///
    /// Returns the first failing [`ValidationError`].
    pub fn validate_profile_image(
        &self,
        descriptor: &FileDescriptor,
    ) -> std::result::Result<(), ValidationError> {
        self.config.profile_image.validate(descriptor)
    }

    /// Apply an event
    ///
    /// User intents require an authenticated session; scheduled callbacks and
    /// `Logout` do not. On error the controller state is unchanged.
    ///
    /// # Errors
    ///
    /// - `SessionError::NotAuthenticated` for user intents without a session
    /// - `ValidationError` when a selected file is rejected
    /// - `ConfigurationError` when submitting an unsubmittable draft
    /// - `TransitionError` when the event is not allowed in the current state
    pub fn handle(&mut self, session: &SessionState, event: WorkflowEvent) -> Result<Transition> {
        let name = event.name();
        if !session.authenticated && !event.is_scheduled() && !matches!(event, WorkflowEvent::Logout)
        {
            tracing::warn!("Rejected {} without an authenticated session", name);
            return Err(SessionError::NotAuthenticated.into());
        }

        let from = self.stage;
        let result = self.apply(event);

        match &result {
            Ok(_) if from != self.stage => {
                tracing::debug!("Workflow transition: {:?} -> {:?} ({})", from, self.stage, name);
            }
            Ok(_) => {}
            Err(err) if err.is_defect() => {
                tracing::error!("Refused {} in {:?}: {}", name, from, err);
            }
            Err(err) => {
                tracing::debug!("{} rejected: {}", name, err);
            }
        }

        result
    }

    fn apply(&mut self, event: WorkflowEvent) -> Result<Transition> {
        match event {
            WorkflowEvent::SelectFile(descriptor) => self.select_file(descriptor),
            WorkflowEvent::TransferTick(ticket) => Ok(self.transfer_tick(ticket)),
            WorkflowEvent::AbortTransfer(id) => self.abort_transfer(id),
            WorkflowEvent::RemoveCandidate(id) => self.remove_candidate(id),
            WorkflowEvent::Designate(id) => self.designate(id),
            WorkflowEvent::SetCompress(enabled) => {
                self.edit_draft("SetCompress", |d| d.set_compress(enabled))
            }
            WorkflowEvent::SetEncrypt(enabled) => {
                self.edit_draft("SetEncrypt", |d| d.set_encrypt(enabled))
            }
            WorkflowEvent::SetPassword(password) => {
                self.edit_draft("SetPassword", |d| d.set_passphrase(password))
            }
            WorkflowEvent::SetOutputName(name) => {
                self.edit_draft("SetOutputName", |d| d.set_output_name(name))
            }
            WorkflowEvent::Submit => self.submit(),
            WorkflowEvent::ProcessingFinished(ticket) => self.processing_finished(ticket),
            WorkflowEvent::Cancel => self.cancel(),
            WorkflowEvent::Restart => self.restart(),
            WorkflowEvent::Logout => Ok(self.logout()),
        }
    }

    fn require_stage(&self, stage: Stage, event: &'static str) -> Result<()> {
        if self.stage == stage {
            Ok(())
        } else {
            Err(WorkflowError::invalid_transition(self.stage.as_str(), event))
        }
    }

    fn allocate_candidate_id(&mut self) -> CandidateId {
        let id = CandidateId::new(self.next_candidate);
        self.next_candidate += 1;
        id
    }

    fn allocate_epoch(&mut self) -> u64 {
        let epoch = self.next_epoch;
        self.next_epoch += 1;
        epoch
    }

    fn select_file(&mut self, descriptor: FileDescriptor) -> Result<Transition> {
        self.require_stage(Stage::Intake, "SelectFile")?;
        self.config.intake.validate(&descriptor)?;

        let id = self.allocate_candidate_id();
        let ticket = TransferTicket {
            candidate: id,
            epoch: self.allocate_epoch(),
        };
        let candidate = FileCandidate::new(id, descriptor);
        let tracker = TransferTracker::new(ticket, self.config.transfer.progress_step);

        tracing::info!(
            "Accepted candidate {} ({}, {} bytes, {})",
            id,
            candidate.name(),
            candidate.byte_size(),
            candidate.media_type()
        );

        let mut transition = Transition::none();
        transition.notify(Notification::CandidateAccepted(candidate.clone()));
        transition.notify(Notification::Progress(tracker.snapshot()));
        transition.effect(Effect::StartTransfer(ticket));

        self.intake.insert(id, IntakeEntry { candidate, tracker });
        Ok(transition)
    }

    fn transfer_tick(&mut self, ticket: TransferTicket) -> Transition {
        let mut transition = Transition::none();

        let Some(entry) = self.intake.get_mut(&ticket.candidate) else {
            tracing::trace!("Ignoring tick for discarded candidate {}", ticket.candidate);
            return transition;
        };

        if let Some(update) = entry.tracker.on_tick(ticket) {
            transition.notify(Notification::Progress(update));
            if update.status.is_terminal() {
                transition.effect(Effect::StopTransfer(ticket));
            }
        }

        transition
    }

    fn abort_transfer(&mut self, id: CandidateId) -> Result<Transition> {
        self.require_stage(Stage::Intake, "AbortTransfer")?;
        let entry = self
            .intake
            .get_mut(&id)
            .ok_or(TransitionError::UnknownCandidate(id))?;

        let mut transition = Transition::none();
        if let Some(update) = entry.tracker.abort() {
            transition.notify(Notification::Progress(update));
            transition.effect(Effect::StopTransfer(entry.tracker.ticket()));
        }
        Ok(transition)
    }

    fn remove_candidate(&mut self, id: CandidateId) -> Result<Transition> {
        self.require_stage(Stage::Intake, "RemoveCandidate")?;
        let mut entry = self
            .intake
            .remove(&id)
            .ok_or(TransitionError::UnknownCandidate(id))?;

        let mut transition = Transition::none();
        if let Some(update) = entry.tracker.abort() {
            transition.notify(Notification::Progress(update));
            transition.effect(Effect::StopTransfer(entry.tracker.ticket()));
        }
        transition.notify(Notification::CandidateRemoved(id));

        tracing::debug!("Removed candidate {} ({})", id, entry.candidate.name());
        Ok(transition)
    }

    fn designate(&mut self, id: CandidateId) -> Result<Transition> {
        // Outside Intake another candidate already holds the active slot
        self.require_stage(Stage::Intake, "Designate")?;
        let entry = self
            .intake
            .get(&id)
            .ok_or(TransitionError::UnknownCandidate(id))?;
        if entry.tracker.status() != CandidateStatus::Succeeded {
            return Err(TransitionError::CandidateNotReady(id).into());
        }

        let draft = ProcessingDraft::new(&entry.candidate, self.config.processing.rules);
        let summary = DraftSummary::from(&draft);
        self.draft = Some(draft);
        self.stage = Stage::Configuring;

        let mut transition = Transition::none();
        transition.notify(Notification::StageChanged(self.state()));
        transition.notify(Notification::DraftChanged(summary));
        Ok(transition)
    }

    fn edit_draft(
        &mut self,
        event: &'static str,
        edit: impl FnOnce(&mut ProcessingDraft),
    ) -> Result<Transition> {
        self.require_stage(Stage::Configuring, event)?;
        if self.pending.is_some() {
            return Err(TransitionError::SubmissionInProgress.into());
        }
        let draft = self
            .draft
            .as_mut()
            .ok_or(WorkflowError::invalid_transition(Stage::Configuring.as_str(), event))?;

        edit(draft);

        let mut transition = Transition::none();
        transition.notify(Notification::DraftChanged(DraftSummary::from(&*draft)));
        Ok(transition)
    }

    fn submit(&mut self) -> Result<Transition> {
        self.require_stage(Stage::Configuring, "Submit")?;
        if self.pending.is_some() {
            return Err(TransitionError::SubmissionInProgress.into());
        }
        let draft = self
            .draft
            .as_ref()
            .ok_or(WorkflowError::invalid_transition(Stage::Configuring.as_str(), "Submit"))?;

        let config = draft.build()?;
        let ticket = ProcessingTicket {
            candidate: config.candidate(),
            epoch: self.allocate_epoch(),
        };

        tracing::info!(
            "Processing {} as '{}' (steps: {:?})",
            ticket.candidate,
            config.output_name(),
            config.steps()
        );

        self.draft = None;
        self.pending = Some(PendingSubmission { ticket, config });

        let mut transition = Transition::none();
        transition.notify(Notification::ProcessingStarted(ticket.candidate));
        transition.effect(Effect::ScheduleProcessing(ticket));
        Ok(transition)
    }

    fn processing_finished(&mut self, ticket: ProcessingTicket) -> Result<Transition> {
        if self.pending.as_ref().map(|p| p.ticket) != Some(ticket) {
            tracing::trace!("Ignoring stale processing completion for {}", ticket.candidate);
            return Ok(Transition::none());
        }

        let candidate = self
            .intake
            .get(&ticket.candidate)
            .map(|entry| entry.candidate.clone())
            .ok_or(TransitionError::UnknownCandidate(ticket.candidate))?;
        let Some(pending) = self.pending.take() else {
            return Ok(Transition::none());
        };

        let reference = self.config.artifact.reference(&candidate, &pending.config);
        tracing::info!("Completed {} -> {}", candidate.id(), reference);

        let artifact = CompletedArtifact {
            candidate,
            config: pending.config,
            reference,
        };
        self.completed = Some(artifact.clone());
        self.stage = Stage::Completed;

        let mut transition = Transition::none();
        transition.notify(Notification::StageChanged(self.state()));
        transition.notify(Notification::Completed(artifact));
        Ok(transition)
    }

    fn cancel(&mut self) -> Result<Transition> {
        self.require_stage(Stage::Configuring, "Cancel")?;

        let mut transition = Transition::none();
        self.draft = None;
        if let Some(pending) = self.pending.take() {
            tracing::debug!("Cancelled processing of {}", pending.ticket.candidate);
            transition.effect(Effect::CancelProcessing(pending.ticket));
        }
        self.stage = Stage::Intake;

        transition.notify(Notification::StageChanged(self.state()));
        Ok(transition)
    }

    fn restart(&mut self) -> Result<Transition> {
        self.require_stage(Stage::Completed, "Restart")?;

        let mut transition = self.clear_intake();
        self.completed = None;
        self.stage = Stage::Intake;

        transition.notify(Notification::StageChanged(self.state()));
        Ok(transition)
    }

    fn logout(&mut self) -> Transition {
        let mut transition = self.clear_intake();
        if let Some(pending) = self.pending.take() {
            transition.effect(Effect::CancelProcessing(pending.ticket));
        }
        self.draft = None;
        self.completed = None;
        self.stage = Stage::Intake;

        tracing::info!("Session ended, workflow state discarded");

        transition.notify(Notification::SessionEnded);
        transition.effect(Effect::EndSession);
        transition
    }

    /// Abort running transfers and drop every candidate
    fn clear_intake(&mut self) -> Transition {
        let mut transition = Transition::none();
        for (id, mut entry) in std::mem::take(&mut self.intake) {
            if entry.tracker.abort().is_some() {
                transition.effect(Effect::StopTransfer(entry.tracker.ticket()));
            }
            transition.notify(Notification::CandidateRemoved(id));
        }
        transition
    }
}

impl Default for WorkflowController {
    fn default() -> Self {
        Self::new(WorkflowConfig::default())
    }
}
