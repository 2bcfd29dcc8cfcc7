//! Workflow configuration

use crate::artifact::ReferenceGenerator;
use crate::processing::ProcessingRules;
use crate::validator::IntakePolicy;
use std::time::Duration;

/// Workflow configuration
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Rules for general intake
    pub intake: IntakePolicy,

    /// Rules for profile-image uploads
    pub profile_image: IntakePolicy,

    /// Simulated transfer timing
    pub transfer: TransferSettings,

    /// Processing rules and latency
    pub processing: ProcessingSettings,

    /// Reference generation for completed files
    pub artifact: ReferenceGenerator,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            intake: IntakePolicy::general(),
            profile_image: IntakePolicy::profile_image(),
            transfer: TransferSettings::default(),
            processing: ProcessingSettings::default(),
            artifact: ReferenceGenerator::default(),
        }
    }
}

/// Simulated transfer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferSettings {
    /// Delay between progress ticks
    pub tick_interval: Duration,

    /// Progress increment per tick (percent)
    pub progress_step: u8,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(150),
            progress_step: 10,
        }
    }
}

/// Processing configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingSettings {
    /// Simulated processing latency between submission and completion
    pub latency: Duration,

    /// Draft validation rules
    pub rules: ProcessingRules,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(1500),
            rules: ProcessingRules::default(),
        }
    }
}
