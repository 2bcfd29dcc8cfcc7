//! Configuration system for Filegate CLI.

use filegate_core::processing::ProcessingRules;
use filegate_core::validator::IntakePolicy;
use filegate_core::{ProcessingSettings, ReferenceGenerator, TransferSettings, WorkflowConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Filegate configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Session configuration
    #[serde(default)]
    pub session: SessionConfig,
    /// Intake limits
    #[serde(default)]
    pub intake: IntakeConfig,
    /// Simulated transfer timing
    #[serde(default)]
    pub transfer: TransferConfig,
    /// Processing configuration
    #[serde(default)]
    pub processing: ProcessingConfig,
    /// Artifact reference configuration
    #[serde(default)]
    pub artifact: ArtifactConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionConfig {
    /// User label; falls back to `$USER`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// Intake limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeConfig {
    /// Size ceiling for general files in bytes
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    /// Size ceiling for profile images in bytes
    #[serde(default = "default_profile_image_max_bytes")]
    pub profile_image_max_bytes: u64,
}

/// Simulated transfer timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Delay between progress ticks in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Progress increment per tick (percent)
    #[serde(default = "default_progress_step")]
    pub progress_step: u8,
}

/// Processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Simulated processing latency in milliseconds
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
    /// Minimum passphrase length in characters
    #[serde(default = "default_min_password_len")]
    pub min_password_len: usize,
    /// Size reduction shown as the compression estimate (percent)
    #[serde(default = "default_compression_estimate_percent")]
    pub compression_estimate_percent: u8,
}

/// Artifact reference configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Base URL references are built under
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Minimum edge length of exported QR images in pixels
    #[serde(default = "default_qr_size")]
    pub qr_size: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default values

fn default_max_bytes() -> u64 {
    IntakePolicy::general().max_bytes
}

fn default_profile_image_max_bytes() -> u64 {
    IntakePolicy::profile_image().max_bytes
}

fn default_tick_interval_ms() -> u64 {
    150
}

fn default_progress_step() -> u8 {
    10
}

fn default_latency_ms() -> u64 {
    1500
}

fn default_min_password_len() -> usize {
    ProcessingRules::default().min_password_len
}

fn default_compression_estimate_percent() -> u8 {
    ProcessingRules::default().compression_estimate_percent
}

fn default_base_url() -> String {
    filegate_core::artifact::DEFAULT_BASE_URL.to_string()
}

fn default_qr_size() -> u32 {
    256
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            profile_image_max_bytes: default_profile_image_max_bytes(),
        }
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            progress_step: default_progress_step(),
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            latency_ms: default_latency_ms(),
            min_password_len: default_min_password_len(),
            compression_estimate_percent: default_compression_estimate_percent(),
        }
    }
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            qr_size: default_qr_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, contents)?;
        Ok(())
    }

    /// Get default config path
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("filegate/config.toml")
    }

    /// Load config from `path`, falling back to defaults if it doesn't exist
    ///
    /// Nothing is written on first use; `filegate config init` creates the
    /// file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.intake.max_bytes == 0 || self.intake.profile_image_max_bytes == 0 {
            anyhow::bail!("Intake size limits must be greater than zero");
        }

        if self.transfer.tick_interval_ms == 0 || self.transfer.tick_interval_ms > 60_000 {
            anyhow::bail!("Tick interval must be between 1 and 60000 ms");
        }

        if self.transfer.progress_step == 0 || self.transfer.progress_step > 100 {
            anyhow::bail!("Progress step must be between 1 and 100");
        }

        if self.processing.min_password_len == 0 {
            anyhow::bail!("Minimum password length must be at least 1");
        }

        if self.processing.compression_estimate_percent > 100 {
            anyhow::bail!("Compression estimate must be between 0 and 100 percent");
        }

        if self.artifact.qr_size == 0 {
            anyhow::bail!("QR size must be greater than zero");
        }

        ReferenceGenerator::new(&self.artifact.base_url)?;

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!(
                "Invalid log level: {}. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            );
        }

        Ok(())
    }

    /// Build the core workflow configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact base URL is invalid.
    pub fn to_workflow_config(&self) -> anyhow::Result<WorkflowConfig> {
        let mut intake = IntakePolicy::general();
        intake.max_bytes = self.intake.max_bytes;

        let mut profile_image = IntakePolicy::profile_image();
        profile_image.max_bytes = self.intake.profile_image_max_bytes;

        Ok(WorkflowConfig {
            intake,
            profile_image,
            transfer: TransferSettings {
                tick_interval: Duration::from_millis(self.transfer.tick_interval_ms),
                progress_step: self.transfer.progress_step,
            },
            processing: ProcessingSettings {
                latency: Duration::from_millis(self.processing.latency_ms),
                rules: ProcessingRules {
                    min_password_len: self.processing.min_password_len,
                    compression_estimate_percent: self.processing.compression_estimate_percent,
                },
            },
            artifact: ReferenceGenerator::new(&self.artifact.base_url)?,
        })
    }
}
