//! Terminal artifact and its access reference.
//!
//! The reference is a URL built from the configured base and the output name
//! of the processed file. It is name-addressed, not content-addressed: two
//! runs that produce the same output name yield the same reference.
//!
//! Turning the reference into a scannable image is an external concern, see
//! [`CodeImageEncoder`].

use crate::candidate::FileCandidate;
use crate::error::ArtifactError;
use crate::processing::ProcessingConfig;
use std::fmt;
use url::Url;

/// Base locator used when none is configured
pub const DEFAULT_BASE_URL: &str = "https://filegate.local/files/";

/// Stable locator for a completed file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactReference(Url);

impl ArtifactReference {
    /// Locator as a string
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Locator as a parsed URL
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.0
    }
}

impl fmt::Display for ArtifactReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Builds artifact references under a base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceGenerator {
    base: Url,
}

impl ReferenceGenerator {
    /// Create a generator for `base`
    ///
    /// # Errors
    ///
    /// Returns `ArtifactError::InvalidBase` if `base` does not parse or cannot
    /// carry path segments (e.g. `mailto:` or `data:` URLs).
    pub fn new(base: &str) -> Result<Self, ArtifactError> {
        let url =
            Url::parse(base).map_err(|e| ArtifactError::InvalidBase(format!("{base}: {e}")))?;
        if url.cannot_be_a_base() {
            return Err(ArtifactError::InvalidBase(base.to_string()));
        }
        Ok(Self { base: url })
    }

    /// Base URL references are built under
    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Reference for a processed candidate
    ///
    /// Uses the configuration's output name, which may differ from the
    /// candidate's original name.
    #[must_use]
    pub fn reference(
        &self,
        _candidate: &FileCandidate,
        config: &ProcessingConfig,
    ) -> ArtifactReference {
        self.reference_for_name(config.output_name())
    }

    /// Reference for an output name
    ///
    /// The name becomes a single percent-encoded path segment. The dot
    /// segments `.` and `..` cannot be addressed and are refused by
    /// [`ProcessingDraft::build`](crate::processing::ProcessingDraft::build).
    #[must_use]
    pub fn reference_for_name(&self, name: &str) -> ArtifactReference {
        let mut url = self.base.clone();
        // Cannot fail: `new` rejects cannot-be-a-base URLs
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(name);
        }
        ArtifactReference(url)
    }
}

impl Default for ReferenceGenerator {
    fn default() -> Self {
        Self {
            base: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
        }
    }
}

/// Scannable rendering of a reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeImage {
    /// Text rendering for immediate display
    pub preview: String,
    /// Downloadable image bytes
    pub export: Vec<u8>,
    /// Media type of `export` (e.g. `image/svg+xml`)
    pub export_media_type: &'static str,
}

/// External encoder turning a reference into a scannable code
pub trait CodeImageEncoder {
    /// Encoding failure
    type Error;

    /// Encode `reference` as a scannable image
    ///
    /// # Errors
    ///
    /// Implementation specific, e.g. when the reference is too long for the
    /// code format.
    fn encode(&self, reference: &str) -> Result<CodeImage, Self::Error>;
}
