//! Runtime tests with virtual time.
//!
//! Every test runs on a paused tokio clock, so the 150 ms ticks and the
//! processing latency elapse instantly and deterministically.

use filegate_core::{
    CandidateId, CandidateStatus, Notification, SessionState, Stage, TransferSettings,
    WorkflowConfig, WorkflowEvent, WorkflowHandle, WorkflowRuntime,
};
use filegate_integration_tests::png;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

fn spawn(config: WorkflowConfig) -> (WorkflowHandle, tokio::task::JoinHandle<()>) {
    let (runtime, handle) = WorkflowRuntime::new(config, SessionState::authenticated("tester"));
    (handle, tokio::spawn(runtime.run()))
}

fn drain(rx: &mut broadcast::Receiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(notification) = rx.try_recv() {
        out.push(notification);
    }
    out
}

fn accepted_ids(notifications: &[Notification]) -> Vec<CandidateId> {
    notifications
        .iter()
        .filter_map(|n| match n {
            Notification::CandidateAccepted(candidate) => Some(candidate.id()),
            _ => None,
        })
        .collect()
}

/// Transfers started together finish together; progress arrives in order.
#[tokio::test(start_paused = true)]
async fn test_parallel_transfers_complete() {
    let (handle, _task) = spawn(WorkflowConfig::default());
    let mut rx = handle.subscribe();

    for name in ["a.png", "b.png", "c.png"] {
        handle.dispatch(WorkflowEvent::SelectFile(png(name, 1))).await.unwrap();
    }
    tokio::time::sleep(Duration::from_millis(1600)).await;

    let notifications = drain(&mut rx);
    let ids = accepted_ids(&notifications);
    assert_eq!(ids.len(), 3);

    for id in ids {
        let progress: Vec<u8> = notifications
            .iter()
            .filter_map(|n| match n {
                Notification::Progress(update) if update.candidate == id => Some(update.progress),
                _ => None,
            })
            .collect();
        assert_eq!(progress, vec![0, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100]);
    }
}

/// Tick interval and step come from the configuration.
#[tokio::test(start_paused = true)]
async fn test_custom_transfer_settings() {
    let config = WorkflowConfig {
        transfer: TransferSettings {
            tick_interval: Duration::from_millis(50),
            progress_step: 25,
        },
        ..WorkflowConfig::default()
    };
    let (handle, _task) = spawn(config);
    let mut rx = handle.subscribe();
    let started = Instant::now();

    handle.dispatch(WorkflowEvent::SelectFile(png("a.png", 1))).await.unwrap();

    loop {
        if let Notification::Progress(update) = rx.recv().await.unwrap() {
            if update.status == CandidateStatus::Succeeded {
                break;
            }
        }
    }
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(200), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(250), "{elapsed:?}");
}

/// Removing a candidate mid-transfer silences it.
#[tokio::test(start_paused = true)]
async fn test_remove_mid_transfer() {
    let (handle, _task) = spawn(WorkflowConfig::default());
    let mut rx = handle.subscribe();

    handle.dispatch(WorkflowEvent::SelectFile(png("a.png", 1))).await.unwrap();
    let id = accepted_ids(&drain(&mut rx))[0];

    tokio::time::sleep(Duration::from_millis(460)).await;
    handle.dispatch(WorkflowEvent::RemoveCandidate(id)).await.unwrap();
    let before = drain(&mut rx);
    assert!(before.contains(&Notification::CandidateRemoved(id)));

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(drain(&mut rx).is_empty());
}

/// Cancel and resubmit: only the second submission completes.
#[tokio::test(start_paused = true)]
async fn test_resubmit_after_cancel() {
    let (handle, _task) = spawn(WorkflowConfig::default());
    let mut rx = handle.subscribe();

    handle.dispatch(WorkflowEvent::SelectFile(png("a.png", 1))).await.unwrap();
    let id = accepted_ids(&drain(&mut rx))[0];
    tokio::time::sleep(Duration::from_secs(2)).await;

    handle.dispatch(WorkflowEvent::Designate(id)).await.unwrap();
    handle.dispatch(WorkflowEvent::Submit).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1000)).await;
    handle.dispatch(WorkflowEvent::Cancel).await.unwrap();

    handle.dispatch(WorkflowEvent::Designate(id)).await.unwrap();
    handle
        .dispatch(WorkflowEvent::SetOutputName("second.png".to_string()))
        .await
        .unwrap();
    handle.dispatch(WorkflowEvent::Submit).await.unwrap();
    drain(&mut rx);

    tokio::time::sleep(Duration::from_secs(5)).await;
    let completed: Vec<_> = drain(&mut rx)
        .into_iter()
        .filter_map(|n| match n {
            Notification::Completed(artifact) => Some(artifact),
            _ => None,
        })
        .collect();

    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].config.output_name(), "second.png");
    assert_eq!(handle.state().stage, Stage::Completed);
}

/// Logout ends the runtime and cancels pending work.
#[tokio::test(start_paused = true)]
async fn test_logout_mid_processing() {
    let (handle, task) = spawn(WorkflowConfig::default());
    let mut rx = handle.subscribe();

    handle.dispatch(WorkflowEvent::SelectFile(png("a.png", 1))).await.unwrap();
    let id = accepted_ids(&drain(&mut rx))[0];
    tokio::time::sleep(Duration::from_secs(2)).await;
    handle.dispatch(WorkflowEvent::Designate(id)).await.unwrap();
    handle.dispatch(WorkflowEvent::Submit).await.unwrap();

    handle.dispatch(WorkflowEvent::Logout).await.unwrap();
    task.await.unwrap();

    let notifications = drain(&mut rx);
    assert!(notifications.contains(&Notification::SessionEnded));
    assert!(
        !notifications
            .iter()
            .any(|n| matches!(n, Notification::Completed(_)))
    );
    assert!(handle.is_closed());
}
