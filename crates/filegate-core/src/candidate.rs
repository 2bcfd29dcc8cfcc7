//! File candidates offered for intake.

use std::fmt;

/// Identifier for a candidate within one workflow controller.
///
/// Identifiers are allocated monotonically and never reused, so a timer
/// callback scheduled for a discarded candidate can never address a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CandidateId(u64);

impl CandidateId {
    /// Create a candidate ID from its raw value
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw `u64` value
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// File as described by the rendering surface, before validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// File name including extension
    pub name: String,
    /// Size in bytes
    pub byte_size: u64,
    /// Declared media type (e.g. `image/png`)
    pub media_type: String,
}

impl FileDescriptor {
    /// Create a new descriptor
    pub fn new(name: impl Into<String>, byte_size: u64, media_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            byte_size,
            media_type: media_type.into(),
        }
    }
}

/// Accepted file candidate
///
/// Immutable once created; a candidate that failed or was removed has to be
/// offered again as a new candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    id: CandidateId,
    name: String,
    byte_size: u64,
    media_type: String,
}

impl FileCandidate {
    /// Create a candidate from a validated descriptor
    #[must_use]
    pub fn new(id: CandidateId, descriptor: FileDescriptor) -> Self {
        Self {
            id,
            name: descriptor.name,
            byte_size: descriptor.byte_size,
            media_type: descriptor.media_type,
        }
    }

    /// Candidate identifier
    #[must_use]
    pub fn id(&self) -> CandidateId {
        self.id
    }

    /// Original file name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size in bytes
    #[must_use]
    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    /// Declared media type
    #[must_use]
    pub fn media_type(&self) -> &str {
        &self.media_type
    }
}
