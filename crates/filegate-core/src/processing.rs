//! Processing configuration for the active candidate.
//!
//! The user edits a [`ProcessingDraft`]; [`ProcessingDraft::build`] validates
//! it and produces the immutable [`ProcessingConfig`] handed to the external
//! processor. No encryption or compression happens here, only the declared
//! intents and their order.
//!
//! When both transforms are enabled the pipeline is always
//! `Encrypt -> Compress`, independent of the order the flags were toggled in.

use crate::candidate::{CandidateId, FileCandidate};
use crate::error::ConfigurationError;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Minimum passphrase length in characters
pub const MIN_PASSWORD_LEN: usize = 6;

/// Illustrative size reduction shown when compression is enabled (percent)
pub const COMPRESSION_ESTIMATE_PERCENT: u8 = 40;

/// Passphrase for the encryption intent
///
/// Wiped from memory on drop; `Debug` never prints the content.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Passphrase(String);

impl Passphrase {
    /// Wrap a passphrase
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Borrow the secret
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Length in characters (Unicode scalar values)
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passphrase(***)")
    }
}

impl PartialEq for Passphrase {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Passphrase {}

/// Transform applied by the downstream processor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformStep {
    /// Encrypt with the configured passphrase
    Encrypt,
    /// Compress the (possibly encrypted) content
    Compress,
}

impl fmt::Display for TransformStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encrypt => write!(f, "encrypt"),
            Self::Compress => write!(f, "compress"),
        }
    }
}

/// Rules the draft is validated against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingRules {
    /// Minimum passphrase length in characters
    pub min_password_len: usize,
    /// Illustrative compression reduction in percent (0-100)
    pub compression_estimate_percent: u8,
}

impl Default for ProcessingRules {
    fn default() -> Self {
        Self {
            min_password_len: MIN_PASSWORD_LEN,
            compression_estimate_percent: COMPRESSION_ESTIMATE_PERCENT,
        }
    }
}

/// Illustrative size after compression
///
/// This is a fixed-factor display estimate, not a measured compression ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionEstimate {
    /// Size of the original file
    pub original_bytes: u64,
    /// Estimated size after compression
    pub estimated_bytes: u64,
    /// Reduction factor the estimate assumes (percent)
    pub reduction_percent: u8,
}

impl CompressionEstimate {
    /// Compute `floor(original * (1 - percent / 100))`
    #[must_use]
    pub fn for_size(original_bytes: u64, reduction_percent: u8) -> Self {
        let percent = u128::from(reduction_percent.min(100));
        let estimated = u128::from(original_bytes) * (100 - percent) / 100;
        Self {
            original_bytes,
            // estimated <= original_bytes, so the conversion cannot fail
            estimated_bytes: u64::try_from(estimated).unwrap_or(original_bytes),
            reduction_percent: reduction_percent.min(100),
        }
    }
}

/// Finalized processing configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingConfig {
    candidate: CandidateId,
    compress_enabled: bool,
    encrypt_enabled: bool,
    password: Option<Passphrase>,
    output_name: String,
    steps: Vec<TransformStep>,
}

impl ProcessingConfig {
    /// Candidate this configuration applies to
    #[must_use]
    pub fn candidate(&self) -> CandidateId {
        self.candidate
    }

    /// Whether compression was requested
    #[must_use]
    pub fn compress_enabled(&self) -> bool {
        self.compress_enabled
    }

    /// Whether encryption was requested
    #[must_use]
    pub fn encrypt_enabled(&self) -> bool {
        self.encrypt_enabled
    }

    /// Passphrase for encryption (present iff encryption is enabled)
    #[must_use]
    pub fn password(&self) -> Option<&Passphrase> {
        self.password.as_ref()
    }

    /// Name of the produced file
    #[must_use]
    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    /// Transforms in the order the processor must run them
    #[must_use]
    pub fn steps(&self) -> &[TransformStep] {
        &self.steps
    }
}

/// Editable configuration for the active candidate
#[derive(Debug, Clone)]
pub struct ProcessingDraft {
    candidate: CandidateId,
    original_size: u64,
    compress_enabled: bool,
    encrypt_enabled: bool,
    password: Option<Passphrase>,
    output_name: String,
    rules: ProcessingRules,
}

impl ProcessingDraft {
    /// Create an empty draft for a candidate
    ///
    /// Both transforms start disabled and the output name defaults to the
    /// candidate's name.
    #[must_use]
    pub fn new(candidate: &FileCandidate, rules: ProcessingRules) -> Self {
        Self {
            candidate: candidate.id(),
            original_size: candidate.byte_size(),
            compress_enabled: false,
            encrypt_enabled: false,
            password: None,
            output_name: candidate.name().to_string(),
            rules,
        }
    }

    /// Candidate being configured
    #[must_use]
    pub fn candidate(&self) -> CandidateId {
        self.candidate
    }

    /// Whether compression is toggled on
    #[must_use]
    pub fn compress_enabled(&self) -> bool {
        self.compress_enabled
    }

    /// Whether encryption is toggled on
    #[must_use]
    pub fn encrypt_enabled(&self) -> bool {
        self.encrypt_enabled
    }

    /// Current output name
    #[must_use]
    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    /// Whether a passphrase has been entered
    #[must_use]
    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    /// Toggle compression
    pub fn set_compress(&mut self, enabled: bool) {
        self.compress_enabled = enabled;
    }

    /// Toggle encryption
    pub fn set_encrypt(&mut self, enabled: bool) {
        self.encrypt_enabled = enabled;
    }

    /// Set or clear the passphrase
    pub fn set_password(&mut self, password: Option<String>) {
        self.set_passphrase(password.map(Passphrase::new));
    }

    /// Set or clear an already wrapped passphrase
    pub fn set_passphrase(&mut self, password: Option<Passphrase>) {
        self.password = password;
    }

    /// Override the output name
    pub fn set_output_name(&mut self, name: impl Into<String>) {
        self.output_name = name.into();
    }

    /// Estimated compressed size, when compression is enabled
    #[must_use]
    pub fn estimate(&self) -> Option<CompressionEstimate> {
        self.compress_enabled.then(|| {
            CompressionEstimate::for_size(
                self.original_size,
                self.rules.compression_estimate_percent,
            )
        })
    }

    /// Pipeline the current flags would produce
    #[must_use]
    pub fn steps(&self) -> Vec<TransformStep> {
        let mut steps = Vec::with_capacity(2);
        if self.encrypt_enabled {
            steps.push(TransformStep::Encrypt);
        }
        if self.compress_enabled {
            steps.push(TransformStep::Compress);
        }
        steps
    }

    /// Check the draft without building it
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::WeakPassword` if encryption is enabled
    /// without a long enough passphrase, otherwise
    /// `ConfigurationError::EmptyOutputName` for a blank output name or
    /// `ConfigurationError::ReservedOutputName` for `.` and `..`.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.encrypt_enabled {
            let long_enough = self
                .password
                .as_ref()
                .is_some_and(|p| p.char_len() >= self.rules.min_password_len);
            if !long_enough {
                return Err(ConfigurationError::WeakPassword {
                    min_len: self.rules.min_password_len,
                });
            }
        }

        if self.output_name.trim().is_empty() {
            return Err(ConfigurationError::EmptyOutputName);
        }

        // Dot segments vanish from the reference path
        if matches!(self.output_name.as_str(), "." | "..") {
            return Err(ConfigurationError::ReservedOutputName(
                self.output_name.clone(),
            ));
        }

        Ok(())
    }

    /// Check if [`build`](Self::build) would succeed
    #[must_use]
    pub fn is_submittable(&self) -> bool {
        self.validate().is_ok()
    }

    /// Validate and produce the final configuration
    ///
    /// Does not modify the draft; calling it again without edits yields an
    /// equal result.
    ///
    /// # Errors
    ///
    /// See [`validate`](Self::validate).
    pub fn build(&self) -> Result<ProcessingConfig, ConfigurationError> {
        self.validate()?;

        Ok(ProcessingConfig {
            candidate: self.candidate,
            compress_enabled: self.compress_enabled,
            encrypt_enabled: self.encrypt_enabled,
            password: if self.encrypt_enabled {
                self.password.clone()
            } else {
                None
            },
            output_name: self.output_name.clone(),
            steps: self.steps(),
        })
    }
}
