//! Transfer progress display with progress bars.

use filegate_core::{CandidateStatus, ProgressUpdate};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress bar for one candidate's transfer
pub struct TransferProgress {
    bar: ProgressBar,
}

impl TransferProgress {
    /// Create a new progress bar (0-100 %)
    #[must_use]
    pub fn new(filename: &str, byte_size: u64) -> Self {
        let bar = ProgressBar::new(100);

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos:>3}%")
                .expect("Invalid progress bar template")
                .progress_chars("#>-"),
        );

        bar.set_message(format!(
            "Transferring: {filename} ({})",
            format_bytes(byte_size)
        ));

        Self { bar }
    }

    /// Apply a tracker update
    pub fn update(&self, update: &ProgressUpdate) {
        self.bar.set_position(u64::from(update.progress));

        match update.status {
            CandidateStatus::Uploading => {}
            CandidateStatus::Succeeded => self.bar.finish_with_message("Transfer complete"),
            CandidateStatus::Failed(err) => {
                self.bar.abandon_with_message(format!("Transfer failed: {err}"));
            }
        }
    }

    /// Check if the bar reached a terminal state
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.bar.is_finished()
    }
}

/// Spinner shown while a submission is processed
pub struct ProcessingSpinner {
    bar: ProgressBar,
}

impl ProcessingSpinner {
    /// Start spinning with `msg`
    #[must_use]
    pub fn start(msg: String) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed}]")
                .expect("Invalid spinner template"),
        );
        bar.set_message(msg);
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Stop with a final message
    pub fn finish_with_message(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }

    /// Stop and remove the spinner (for errors)
    pub fn abandon(&self) {
        self.bar.abandon();
    }
}

/// Format bytes in human-readable format
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    format!("{size:.2} {}", UNITS[unit_idx])
}

/// Format duration in human-readable format
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs < 60 {
        format!("{:.1}s", duration.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}
