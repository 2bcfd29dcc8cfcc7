//! Integration tests for the Filegate workflow.
//!
//! Drives the controller through complete intake sessions, checking the
//! interplay of validation, transfer tracking, configuration and completion.

use filegate_core::validator::{self, GENERAL_MAX_BYTES};
use filegate_core::{
    CandidateStatus, ConfigurationError, Effect, FileDescriptor, Notification, Passphrase,
    ProcessingDraft, ProcessingRules, SessionError, Stage, TransferError, TransformStep,
    TransitionError, ValidationError, WorkflowError, WorkflowEvent, WorkflowState,
};
use filegate_integration_tests::{Harness, MIB, png};

// ============================================================================
// End-to-end Scenarios
// ============================================================================

/// Accepted image, transferred, submitted without flags, completed.
#[test]
fn test_scenario_plain_image() {
    let descriptor = png("a.png", 1024);
    assert_eq!(validator::validate(&descriptor), Ok(()));

    let mut harness = Harness::new();
    let ticket = harness.select(descriptor).unwrap();
    harness.complete_transfer(ticket);

    let tracker = harness.controller.tracker(ticket.candidate).unwrap();
    assert_eq!(tracker.status(), CandidateStatus::Succeeded);
    assert_eq!(tracker.progress(), 100);

    harness
        .send(WorkflowEvent::Designate(ticket.candidate))
        .unwrap();
    let artifact = harness.submit_and_finish().unwrap();

    assert_eq!(artifact.config.output_name(), "a.png");
    assert!(artifact.config.steps().is_empty());
    assert!(artifact.config.password().is_none());
    assert_eq!(
        harness.controller.state(),
        WorkflowState {
            stage: Stage::Completed,
            active_candidate: Some(ticket.candidate),
        }
    );
}

/// Executable is rejected and the workflow never leaves intake.
#[test]
fn test_scenario_unsupported_type() {
    let descriptor = FileDescriptor::new("x.exe", 1024, "application/x-msdownload");
    assert_eq!(
        validator::validate(&descriptor),
        Err(ValidationError::UnsupportedType(
            "application/x-msdownload".to_string()
        ))
    );

    let mut harness = Harness::new();
    let err = harness.select(descriptor.clone()).unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Validation(ValidationError::UnsupportedType(_))
    ));
    assert_eq!(harness.controller.stage(), Stage::Intake);
    assert_eq!(harness.controller.candidate_count(), 0);

    // The rendering surface is told which file was refused and why
    assert_eq!(
        Notification::rejected(descriptor.clone(), &err),
        Some(Notification::Rejected {
            descriptor,
            reason: ValidationError::UnsupportedType("application/x-msdownload".to_string()),
        })
    );
}

/// Weak password blocks submission until a long enough one is entered.
#[test]
fn test_scenario_weak_then_strong_password() {
    let mut harness = Harness::new();
    let id = harness.ready(png("secret.png", 4096));
    harness.send(WorkflowEvent::Designate(id)).unwrap();
    harness.send(WorkflowEvent::SetEncrypt(true)).unwrap();
    harness
        .send(WorkflowEvent::SetPassword(Some(Passphrase::new("abc"))))
        .unwrap();

    let err = harness.submit().unwrap_err();
    assert_eq!(
        err,
        WorkflowError::Configuration(ConfigurationError::WeakPassword { min_len: 6 })
    );
    assert_eq!(harness.controller.stage(), Stage::Configuring);

    harness
        .send(WorkflowEvent::SetPassword(Some(Passphrase::new("abcdef"))))
        .unwrap();
    let artifact = harness.submit_and_finish().unwrap();

    assert!(artifact.config.encrypt_enabled());
    assert_eq!(artifact.config.password().unwrap().expose(), "abcdef");
    assert_eq!(artifact.config.steps(), &[TransformStep::Encrypt]);
}

/// The same rules hold on a bare draft.
#[test]
fn test_scenario_weak_password_on_draft() {
    let mut harness = Harness::new();
    let id = harness.ready(png("a.png", 10));
    let candidate = harness.controller.candidate(id).unwrap().clone();

    let mut draft = ProcessingDraft::new(&candidate, ProcessingRules::default());
    draft.set_encrypt(true);
    draft.set_password(Some("abc".to_string()));
    assert_eq!(
        draft.build(),
        Err(ConfigurationError::WeakPassword { min_len: 6 })
    );

    draft.set_password(Some("abcdef".to_string()));
    assert!(draft.build().is_ok());
}

/// One byte over the general ceiling is rejected.
#[test]
fn test_scenario_too_large() {
    let descriptor = FileDescriptor::new("big.pdf", 10 * MIB + 1, "application/pdf");
    assert_eq!(
        validator::validate(&descriptor),
        Err(ValidationError::TooLarge {
            size: 10 * MIB + 1,
            limit: GENERAL_MAX_BYTES,
        })
    );

    let mut harness = Harness::new();
    assert!(harness.select(descriptor).is_err());

    // Exactly at the limit is fine
    assert!(
        harness
            .select(FileDescriptor::new("edge.pdf", 10 * MIB, "application/pdf"))
            .is_ok()
    );
}

// ============================================================================
// Restart and Session Lifecycle
// ============================================================================

/// "Process another" always lands in an empty intake.
#[test]
fn test_restart_idempotence() {
    let configs: [&[WorkflowEvent]; 3] = [
        &[],
        &[WorkflowEvent::SetCompress(true)],
        &[
            WorkflowEvent::SetCompress(true),
            WorkflowEvent::SetEncrypt(true),
            WorkflowEvent::SetPassword(Some(Passphrase::new("correct horse"))),
            WorkflowEvent::SetOutputName("renamed.png".to_string()),
        ],
    ];

    let mut harness = Harness::new();
    for edits in configs {
        let id = harness.ready(png("a.png", 2048));
        let _pending = harness.select(png("b.png", 2048)).unwrap();
        harness.send(WorkflowEvent::Designate(id)).unwrap();
        for edit in edits {
            harness.send(edit.clone()).unwrap();
        }
        harness.submit_and_finish().unwrap();

        harness.send(WorkflowEvent::Restart).unwrap();

        assert_eq!(harness.controller.state(), WorkflowState::default());
        assert_eq!(harness.controller.candidate_count(), 0);
        assert!(harness.controller.draft().is_none());
        assert!(harness.controller.completed().is_none());
        assert!(!harness.controller.is_processing());
    }
}

/// Restart stops transfers that were still running.
#[test]
fn test_restart_stops_running_transfers() {
    let mut harness = Harness::new();
    let id = harness.ready(png("a.png", 1));
    let running = harness.select(png("b.png", 1)).unwrap();
    harness.send(WorkflowEvent::Designate(id)).unwrap();
    harness.submit_and_finish().unwrap();

    let transition = harness.send(WorkflowEvent::Restart).unwrap();
    assert!(transition.effects.contains(&Effect::StopTransfer(running)));

    // Late tick for the discarded transfer
    let transition = harness.send(WorkflowEvent::TransferTick(running)).unwrap();
    assert!(transition.is_empty());
}

/// Logout discards everything and later intents need a new session.
#[test]
fn test_logout_then_signed_out() {
    let mut harness = Harness::new();
    let id = harness.ready(png("a.png", 1));
    harness.send(WorkflowEvent::Designate(id)).unwrap();

    harness.session = filegate_core::SessionState::anonymous();
    let transition = harness.send(WorkflowEvent::Logout).unwrap();
    assert!(transition.effects.contains(&Effect::EndSession));
    assert_eq!(harness.controller.state(), WorkflowState::default());

    let err = harness.select(png("b.png", 1)).unwrap_err();
    assert_eq!(err, WorkflowError::Session(SessionError::NotAuthenticated));
}

// ============================================================================
// Transfer Interleaving
// ============================================================================

/// Trackers advance independently and abort only affects its own candidate.
#[test]
fn test_concurrent_transfers() {
    let mut harness = Harness::new();
    let a = harness.select(png("a.png", 1)).unwrap();
    let b = harness.select(png("b.png", 1)).unwrap();
    let c = harness.select(png("c.png", 1)).unwrap();

    for _ in 0..3 {
        harness.send(WorkflowEvent::TransferTick(a)).unwrap();
        harness.send(WorkflowEvent::TransferTick(c)).unwrap();
    }
    harness.send(WorkflowEvent::TransferTick(b)).unwrap();
    harness
        .send(WorkflowEvent::AbortTransfer(b.candidate))
        .unwrap();
    harness.complete_transfer(c);

    let status = |h: &Harness, id| h.controller.tracker(id).unwrap().status();
    assert_eq!(status(&harness, a.candidate), CandidateStatus::Uploading);
    assert_eq!(
        status(&harness, b.candidate),
        CandidateStatus::Failed(TransferError::Aborted)
    );
    assert_eq!(status(&harness, c.candidate), CandidateStatus::Succeeded);
    assert_eq!(
        harness.controller.tracker(a.candidate).unwrap().progress(),
        30
    );
    assert_eq!(
        harness.controller.tracker(b.candidate).unwrap().progress(),
        10
    );

    // Aborting again and aborting a finished transfer are no-ops
    assert!(
        harness
            .send(WorkflowEvent::AbortTransfer(b.candidate))
            .unwrap()
            .is_empty()
    );
    assert!(
        harness
            .send(WorkflowEvent::AbortTransfer(c.candidate))
            .unwrap()
            .is_empty()
    );
}

/// Only one candidate can be active; the rest keep transferring.
#[test]
fn test_single_active_candidate() {
    let mut harness = Harness::new();
    let a = harness.ready(png("a.png", 1));
    let b = harness.select(png("b.png", 1)).unwrap();

    harness.send(WorkflowEvent::Designate(a)).unwrap();

    let err = harness
        .send(WorkflowEvent::Designate(b.candidate))
        .unwrap_err();
    assert!(err.is_defect());
    assert_eq!(harness.controller.active_candidate(), Some(a));

    // Background transfer still completes while configuring
    harness.complete_transfer(b);
    assert_eq!(
        harness.controller.tracker(b.candidate).unwrap().status(),
        CandidateStatus::Succeeded
    );
}

// ============================================================================
// Configuration
// ============================================================================

/// Encrypt-then-compress regardless of the order the flags were set.
#[test]
fn test_pipeline_ordering_through_controller() {
    for flags in [
        [WorkflowEvent::SetCompress(true), WorkflowEvent::SetEncrypt(true)],
        [WorkflowEvent::SetEncrypt(true), WorkflowEvent::SetCompress(true)],
    ] {
        let mut harness = Harness::new();
        let id = harness.ready(png("a.png", 1));
        harness.send(WorkflowEvent::Designate(id)).unwrap();
        for flag in flags {
            harness.send(flag).unwrap();
        }
        harness
            .send(WorkflowEvent::SetPassword(Some(Passphrase::new("s3cret!"))))
            .unwrap();

        let artifact = harness.submit_and_finish().unwrap();
        assert_eq!(
            artifact.config.steps(),
            &[TransformStep::Encrypt, TransformStep::Compress]
        );
    }
}

/// Reference follows the output name, escaped as one path segment.
#[test]
fn test_reference_uses_output_name() {
    let mut harness = Harness::new();
    let id = harness.ready(png("a.png", 1));
    harness.send(WorkflowEvent::Designate(id)).unwrap();
    harness
        .send(WorkflowEvent::SetOutputName("holiday photo.png".to_string()))
        .unwrap();

    let artifact = harness.submit_and_finish().unwrap();
    assert_eq!(
        artifact.reference.as_str(),
        "https://filegate.local/files/holiday%20photo.png"
    );
}

/// Blank output name is refused and the draft stays editable.
#[test]
fn test_empty_output_name() {
    let mut harness = Harness::new();
    let id = harness.ready(png("a.png", 1));
    harness.send(WorkflowEvent::Designate(id)).unwrap();
    harness
        .send(WorkflowEvent::SetOutputName("   ".to_string()))
        .unwrap();

    assert_eq!(
        harness.submit().unwrap_err(),
        WorkflowError::Configuration(ConfigurationError::EmptyOutputName)
    );

    harness
        .send(WorkflowEvent::SetOutputName("b.png".to_string()))
        .unwrap();
    assert!(harness.submit().is_ok());
}

/// Cancel returns to intake and the candidate can be configured again.
#[test]
fn test_cancel_and_reconfigure() {
    let mut harness = Harness::new();
    let id = harness.ready(png("a.png", 1));
    harness.send(WorkflowEvent::Designate(id)).unwrap();
    harness.send(WorkflowEvent::SetCompress(true)).unwrap();

    let transition = harness.send(WorkflowEvent::Cancel).unwrap();
    assert!(transition.notifications.contains(&Notification::StageChanged(
        WorkflowState::default()
    )));
    assert!(harness.controller.draft().is_none());

    harness.send(WorkflowEvent::Designate(id)).unwrap();
    assert!(!harness.controller.draft().unwrap().compress_enabled());
}

// ============================================================================
// Defensive Checks
// ============================================================================

/// Events outside their stage are refused and change nothing.
#[test]
fn test_invalid_transitions_leave_state() {
    let mut harness = Harness::new();

    for event in [
        WorkflowEvent::Submit,
        WorkflowEvent::Restart,
        WorkflowEvent::Cancel,
        WorkflowEvent::SetEncrypt(true),
    ] {
        let name = event.name();
        let err = harness.send(event).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::Transition(TransitionError::InvalidTransition {
                stage: "Intake",
                event: name,
            })
        );
        assert_eq!(harness.controller.state(), WorkflowState::default());
    }

    let id = harness.ready(png("a.png", 1));
    harness.send(WorkflowEvent::Designate(id)).unwrap();
    harness.submit_and_finish().unwrap();

    for event in [
        WorkflowEvent::Designate(id),
        WorkflowEvent::Submit,
        WorkflowEvent::RemoveCandidate(id),
        WorkflowEvent::SelectFile(png("c.png", 1)),
    ] {
        assert!(harness.send(event).unwrap_err().is_defect());
        assert_eq!(harness.controller.stage(), Stage::Completed);
    }
}

/// Unknown candidate IDs are reported, not ignored.
#[test]
fn test_unknown_candidate() {
    let mut harness = Harness::new();
    let id = harness.ready(png("a.png", 1));
    harness.send(WorkflowEvent::RemoveCandidate(id)).unwrap();

    assert_eq!(
        harness.send(WorkflowEvent::Designate(id)).unwrap_err(),
        WorkflowError::Transition(TransitionError::UnknownCandidate(id))
    );
    assert_eq!(
        harness.send(WorkflowEvent::AbortTransfer(id)).unwrap_err(),
        WorkflowError::Transition(TransitionError::UnknownCandidate(id))
    );
}

/// Profile images use the narrower policy.
#[test]
fn test_profile_image_rules() {
    let harness = Harness::new();
    assert!(
        harness
            .controller
            .validate_profile_image(&png("me.png", 5 * MIB))
            .is_ok()
    );
    assert_eq!(
        harness
            .controller
            .validate_profile_image(&png("me.png", 5 * MIB + 1)),
        Err(ValidationError::TooLarge {
            size: 5 * MIB + 1,
            limit: 5 * MIB,
        })
    );
    assert!(matches!(
        harness
            .controller
            .validate_profile_image(&FileDescriptor::new("me.svg", 1, "image/svg+xml")),
        Err(ValidationError::UnsupportedType(_))
    ));
}
