//! Simulated transfer tracking.
//!
//! Every accepted candidate gets a [`TransferTracker`]. The tracker starts in
//! `Uploading` at 0 % and is advanced by timer ticks in fixed increments until
//! it reaches 100 % and becomes `Succeeded`. `abort()` forces `Failed(Aborted)`
//! at any point before success.
//!
//! ```text
//! Uploading(0) --tick--> Uploading(n) --tick--> ... --tick--> Succeeded(100)
//!      |                      |
//!      +------abort()---------+-----> Failed(Aborted)  (progress frozen)
//! ```
//!
//! Terminal states never emit further updates, and ticks carrying a ticket
//! from a different schedule are ignored.

use crate::candidate::CandidateId;
use crate::error::TransferError;

/// Transfer status of a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateStatus {
    /// Transfer in progress
    Uploading,
    /// Transfer finished, candidate can be configured
    Succeeded,
    /// Transfer failed; the candidate has to be offered again
    Failed(TransferError),
}

impl CandidateStatus {
    /// Check if no further transitions are possible
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, CandidateStatus::Uploading)
    }
}

impl std::fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uploading => write!(f, "Uploading"),
            Self::Succeeded => write!(f, "Succeeded"),
            Self::Failed(err) => write!(f, "Failed ({err})"),
        }
    }
}

/// Identity of one scheduled transfer
///
/// Timer callbacks carry the ticket they were scheduled with. A tick is only
/// applied when both the candidate and the epoch match the live tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransferTicket {
    /// Candidate being transferred
    pub candidate: CandidateId,
    /// Schedule epoch
    pub epoch: u64,
}

/// Observable progress change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// Candidate the update belongs to
    pub candidate: CandidateId,
    /// Progress percentage (0-100)
    pub progress: u8,
    /// Status after the update
    pub status: CandidateStatus,
}

/// Per-candidate transfer state machine
#[derive(Debug, Clone)]
pub struct TransferTracker {
    ticket: TransferTicket,
    step: u8,
    progress: u8,
    status: CandidateStatus,
}

impl TransferTracker {
    /// Create a tracker in `Uploading(0)`
    ///
    /// `step` is the progress increment per tick and is clamped to `1..=100`.
    #[must_use]
    pub fn new(ticket: TransferTicket, step: u8) -> Self {
        Self {
            ticket,
            step: step.clamp(1, 100),
            progress: 0,
            status: CandidateStatus::Uploading,
        }
    }

    /// Ticket this tracker accepts ticks for
    #[must_use]
    pub fn ticket(&self) -> TransferTicket {
        self.ticket
    }

    /// Current progress percentage
    #[must_use]
    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Current status
    #[must_use]
    pub fn status(&self) -> CandidateStatus {
        self.status
    }

    /// Check if the tracker reached a terminal state
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Current progress as an update value
    #[must_use]
    pub fn snapshot(&self) -> ProgressUpdate {
        ProgressUpdate {
            candidate: self.ticket.candidate,
            progress: self.progress,
            status: self.status,
        }
    }

    /// Apply a scheduled tick
    ///
    /// Returns `None` for ticks from another schedule and for terminal
    /// trackers.
    pub fn on_tick(&mut self, ticket: TransferTicket) -> Option<ProgressUpdate> {
        if ticket != self.ticket {
            tracing::trace!(
                "Ignoring stale tick for {} (epoch {}, live epoch {})",
                ticket.candidate,
                ticket.epoch,
                self.ticket.epoch
            );
            return None;
        }
        self.advance()
    }

    /// Advance progress by one step
    ///
    /// Reaching 100 % switches the tracker to `Succeeded` in the same update.
    pub fn advance(&mut self) -> Option<ProgressUpdate> {
        if self.is_terminal() {
            return None;
        }

        self.progress = self.progress.saturating_add(self.step).min(100);
        if self.progress == 100 {
            self.status = CandidateStatus::Succeeded;
            tracing::debug!("Transfer {} succeeded", self.ticket.candidate);
        }

        Some(self.snapshot())
    }

    /// Abort the transfer
    ///
    /// Forces `Failed(Aborted)` and freezes progress. Returns the resulting
    /// update, or `None` if the tracker was already terminal.
    pub fn abort(&mut self) -> Option<ProgressUpdate> {
        if self.is_terminal() {
            return None;
        }

        self.status = CandidateStatus::Failed(TransferError::Aborted);
        tracing::debug!(
            "Transfer {} aborted at {}%",
            self.ticket.candidate,
            self.progress
        );
        Some(self.snapshot())
    }
}
