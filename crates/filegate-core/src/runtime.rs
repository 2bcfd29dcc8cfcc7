//! Async driver for the workflow controller.
//!
//! [`WorkflowRuntime`] owns one [`WorkflowController`] and runs it as an actor:
//!
//! ```text
//!   WorkflowHandle ──dispatch──► mpsc ──► WorkflowRuntime ──► WorkflowController
//!         ▲                       ▲              │
//!         │                       │              ├── watch<WorkflowState>
//!         │                 timer tasks ◄────────┤   (StartTransfer, ScheduleProcessing)
//!         │              (TransferTick,          │
//!         │            ProcessingFinished)       └── broadcast<Notification>
//!         └───────────────── subscribe / state ◄─────────┘
//! ```
//!
//! Every scheduled timer gets its own [`CancellationToken`]. Stop and cancel
//! effects cancel the token so the timer task exits; a callback already queued
//! in the channel carries a stale ticket and the controller ignores it.
//!
//! Timer tasks only hold weak senders. The runtime stops once every
//! [`WorkflowHandle`] is dropped, or after the session ends.

use crate::config::WorkflowConfig;
use crate::error::{RuntimeError, WorkflowError};
use crate::session::SessionState;
use crate::tracker::TransferTicket;
use crate::workflow::{
    Effect, Notification, ProcessingTicket, WorkflowController, WorkflowEvent, WorkflowState,
};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

/// Queued commands before `dispatch` waits
const COMMAND_CAPACITY: usize = 64;

/// Notifications buffered per subscriber before it lags
const NOTIFICATION_CAPACITY: usize = 256;

/// Shortest accepted tick interval
const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

enum Command {
    Dispatch {
        event: WorkflowEvent,
        reply: oneshot::Sender<Result<(), WorkflowError>>,
    },
    Scheduled(WorkflowEvent),
    SetSession(SessionState),
}

/// Actor owning a workflow controller
pub struct WorkflowRuntime {
    controller: WorkflowController,
    session: SessionState,
    commands: mpsc::Receiver<Command>,
    scheduler: mpsc::WeakSender<Command>,
    state_tx: watch::Sender<WorkflowState>,
    notify_tx: broadcast::Sender<Notification>,
    transfers: HashMap<TransferTicket, CancellationToken>,
    processing: Option<(ProcessingTicket, CancellationToken)>,
    shutdown: CancellationToken,
}

impl WorkflowRuntime {
    /// Create a runtime and the first handle to it
    ///
    /// The runtime does nothing until [`run`](Self::run) is polled, usually
    /// via `tokio::spawn(runtime.run())`.
    #[must_use]
    pub fn new(config: WorkflowConfig, session: SessionState) -> (Self, WorkflowHandle) {
        let controller = WorkflowController::new(config);
        let (command_tx, commands) = mpsc::channel(COMMAND_CAPACITY);
        let (state_tx, state_rx) = watch::channel(controller.state());
        let (notify_tx, notify_rx) = broadcast::channel(NOTIFICATION_CAPACITY);

        let runtime = Self {
            controller,
            session,
            commands,
            scheduler: command_tx.downgrade(),
            state_tx,
            notify_tx,
            transfers: HashMap::new(),
            processing: None,
            shutdown: CancellationToken::new(),
        };

        let handle = WorkflowHandle {
            commands: command_tx,
            state: state_rx,
            notifications: notify_rx,
        };

        (runtime, handle)
    }

    /// Process commands until the session ends or every handle is dropped
    pub async fn run(mut self) {
        tracing::debug!("Workflow runtime started for '{}'", self.session.user_label);

        while let Some(command) = self.commands.recv().await {
            match command {
                Command::Dispatch { event, reply } => {
                    let result = self.apply(event);
                    // Caller may have stopped waiting
                    let _ = reply.send(result);
                }
                Command::Scheduled(event) => self.apply_scheduled(event),
                Command::SetSession(session) => {
                    tracing::debug!(
                        "Session changed: authenticated={} user='{}'",
                        session.authenticated,
                        session.user_label
                    );
                    self.session = session;
                }
            }

            if self.shutdown.is_cancelled() {
                break;
            }
        }

        self.shutdown.cancel();
        tracing::debug!("Workflow runtime stopped");
    }

    fn apply(&mut self, event: WorkflowEvent) -> Result<(), WorkflowError> {
        let offered = match &event {
            WorkflowEvent::SelectFile(descriptor) => Some(descriptor.clone()),
            _ => None,
        };

        let transition = match self.controller.handle(&self.session, event) {
            Ok(transition) => transition,
            Err(err) => {
                if let Some(rejected) = offered.and_then(|d| Notification::rejected(d, &err)) {
                    let _ = self.notify_tx.send(rejected);
                }
                return Err(err);
            }
        };

        for effect in transition.effects {
            self.execute(effect);
        }

        let state = self.controller.state();
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });

        for notification in transition.notifications {
            // No subscribers is fine
            let _ = self.notify_tx.send(notification);
        }

        Ok(())
    }

    fn apply_scheduled(&mut self, event: WorkflowEvent) {
        // The timer task has finished once its completion is delivered
        if let WorkflowEvent::ProcessingFinished(ticket) = &event {
            if self.processing.as_ref().is_some_and(|(t, _)| t == ticket) {
                self.processing = None;
            }
        }

        let name = event.name();
        if let Err(err) = self.apply(event) {
            tracing::warn!("Scheduled {} failed: {}", name, err);
        }
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::StartTransfer(ticket) => self.start_transfer(ticket),
            Effect::StopTransfer(ticket) => {
                if let Some(token) = self.transfers.remove(&ticket) {
                    token.cancel();
                }
            }
            Effect::ScheduleProcessing(ticket) => self.schedule_processing(ticket),
            Effect::CancelProcessing(ticket) => {
                if self.processing.as_ref().is_some_and(|(t, _)| *t == ticket) {
                    if let Some((_, token)) = self.processing.take() {
                        token.cancel();
                    }
                }
            }
            Effect::EndSession => {
                for (_, token) in self.transfers.drain() {
                    token.cancel();
                }
                self.processing = None;
                self.shutdown.cancel();
            }
        }
    }

    fn start_transfer(&mut self, ticket: TransferTicket) {
        let token = self.shutdown.child_token();
        self.transfers.insert(ticket, token.clone());

        let sender = self.scheduler.clone();
        let period = self
            .controller
            .config()
            .transfer
            .tick_interval
            .max(MIN_TICK_INTERVAL);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // First tick completes immediately
            interval.tick().await;

            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = interval.tick() => {
                        let Some(sender) = sender.upgrade() else {
                            break;
                        };
                        let event = WorkflowEvent::TransferTick(ticket);
                        if sender.send(Command::Scheduled(event)).await.is_err() {
                            break;
                        }
                    }
                }
            }

            tracing::trace!("Transfer timer for {} exited", ticket.candidate);
        });
    }

    fn schedule_processing(&mut self, ticket: ProcessingTicket) {
        let token = self.shutdown.child_token();
        if let Some((_, previous)) = self.processing.replace((ticket, token.clone())) {
            previous.cancel();
        }

        let sender = self.scheduler.clone();
        let latency = self.controller.config().processing.latency;

        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {
                    tracing::trace!("Processing timer for {} cancelled", ticket.candidate);
                }
                () = tokio::time::sleep(latency) => {
                    if let Some(sender) = sender.upgrade() {
                        let event = WorkflowEvent::ProcessingFinished(ticket);
                        let _ = sender.send(Command::Scheduled(event)).await;
                    }
                }
            }
        });
    }
}

/// Cloneable handle for driving a [`WorkflowRuntime`]
pub struct WorkflowHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<WorkflowState>,
    notifications: broadcast::Receiver<Notification>,
}

impl WorkflowHandle {
    /// Send a user intent and wait for the controller's verdict
    ///
    /// # Errors
    ///
    /// - `RuntimeError::Closed` if the runtime has stopped
    /// - `RuntimeError::Workflow` if the controller refused the event
    pub async fn dispatch(&self, event: WorkflowEvent) -> Result<(), RuntimeError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Dispatch { event, reply })
            .await
            .map_err(|_| RuntimeError::Closed)?;

        response.await.map_err(|_| RuntimeError::Closed)??;
        Ok(())
    }

    /// Replace the session snapshot used for subsequent events
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::Closed` if the runtime has stopped.
    pub async fn set_session(&self, session: SessionState) -> Result<(), RuntimeError> {
        self.commands
            .send(Command::SetSession(session))
            .await
            .map_err(|_| RuntimeError::Closed)
    }

    /// Latest published workflow state
    #[must_use]
    pub fn state(&self) -> WorkflowState {
        *self.state.borrow()
    }

    /// Receiver notified on every state change
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<WorkflowState> {
        self.state.clone()
    }

    /// Subscribe to notifications published from now on
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.resubscribe()
    }

    /// Check if the runtime has stopped
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

impl Clone for WorkflowHandle {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
            state: self.state.clone(),
            notifications: self.notifications.resubscribe(),
        }
    }
}
