//! Candidate validation.
//!
//! Validation is a pure function of the descriptor and the policy. Rules are
//! checked in order and the first failure wins:
//!
//! 1. the media type must be on the policy's allow-list
//! 2. the size must not exceed the policy's ceiling

use crate::candidate::FileDescriptor;
use crate::error::ValidationError;

/// One mebibyte
pub const MIB: u64 = 1024 * 1024;

/// Size ceiling for general intake (10 MiB)
pub const GENERAL_MAX_BYTES: u64 = 10 * MIB;

/// Size ceiling for profile images (5 MiB)
pub const PROFILE_IMAGE_MAX_BYTES: u64 = 5 * MIB;

/// Media types accepted for general intake
pub const GENERAL_MEDIA_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
    "application/zip",
    "application/x-zip-compressed",
];

/// Raster image types accepted for profile images
pub const PROFILE_IMAGE_MEDIA_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Intake rules: allow-list plus size ceiling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakePolicy {
    /// Maximum accepted size in bytes (inclusive)
    pub max_bytes: u64,
    /// Accepted media types, lower-case without parameters
    pub allowed_media_types: Vec<String>,
}

impl IntakePolicy {
    /// Policy for general file intake
    #[must_use]
    pub fn general() -> Self {
        Self::from_static(GENERAL_MAX_BYTES, GENERAL_MEDIA_TYPES)
    }

    /// Stricter policy for profile-image uploads
    #[must_use]
    pub fn profile_image() -> Self {
        Self::from_static(PROFILE_IMAGE_MAX_BYTES, PROFILE_IMAGE_MEDIA_TYPES)
    }

    fn from_static(max_bytes: u64, types: &[&str]) -> Self {
        Self {
            max_bytes,
            allowed_media_types: types.iter().map(|t| (*t).to_string()).collect(),
        }
    }

    /// Check whether a media type is on the allow-list
    ///
    /// Comparison ignores ASCII case and any `;`-separated parameters.
    #[must_use]
    pub fn allows(&self, media_type: &str) -> bool {
        let essence = essence(media_type);
        self.allowed_media_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(essence))
    }

    /// Validate a descriptor against this policy
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnsupportedType` if the media type is not
    /// allowed, otherwise `ValidationError::TooLarge` if the size exceeds the
    /// ceiling.
    pub fn validate(&self, descriptor: &FileDescriptor) -> Result<(), ValidationError> {
        if !self.allows(&descriptor.media_type) {
            return Err(ValidationError::UnsupportedType(
                descriptor.media_type.clone(),
            ));
        }

        if descriptor.byte_size > self.max_bytes {
            return Err(ValidationError::TooLarge {
                size: descriptor.byte_size,
                limit: self.max_bytes,
            });
        }

        Ok(())
    }
}

impl Default for IntakePolicy {
    fn default() -> Self {
        Self::general()
    }
}

/// Validate a descriptor for general intake
///
/// # Errors
///
/// See [`IntakePolicy::validate`].
pub fn validate(descriptor: &FileDescriptor) -> Result<(), ValidationError> {
    IntakePolicy::general().validate(descriptor)
}

/// Validate a descriptor for a profile-image upload
///
/// # Errors
///
/// See [`IntakePolicy::validate`].
pub fn validate_profile_image(descriptor: &FileDescriptor) -> Result<(), ValidationError> {
    IntakePolicy::profile_image().validate(descriptor)
}

fn essence(media_type: &str) -> &str {
    media_type
        .split(';')
        .next()
        .unwrap_or(media_type)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(size: u64, media_type: &str) -> FileDescriptor {
        FileDescriptor::new("file", size, media_type)
    }

    #[test]
    fn test_accepts_allowed_types() {
        for media_type in GENERAL_MEDIA_TYPES {
            assert_eq!(validate(&desc(1024, media_type)), Ok(()), "{media_type}");
        }
    }

    #[test]
    fn test_rejects_unsupported_type() {
        let result = validate(&desc(1024, "application/x-msdownload"));
        assert_eq!(
            result,
            Err(ValidationError::UnsupportedType(
                "application/x-msdownload".to_string()
            ))
        );
    }

    #[test]
    fn test_type_checked_before_size() {
        // Oversized and unsupported: type rule wins
        let result = validate(&desc(GENERAL_MAX_BYTES * 4, "video/mp4"));
        assert!(matches!(result, Err(ValidationError::UnsupportedType(_))));
    }

    #[test]
    fn test_size_boundary() {
        assert_eq!(validate(&desc(GENERAL_MAX_BYTES, "application/pdf")), Ok(()));
        assert_eq!(
            validate(&desc(GENERAL_MAX_BYTES + 1, "application/pdf")),
            Err(ValidationError::TooLarge {
                size: GENERAL_MAX_BYTES + 1,
                limit: GENERAL_MAX_BYTES,
            })
        );
    }

    #[test]
    fn test_zero_byte_file_accepted() {
        assert_eq!(validate(&desc(0, "text/plain")), Ok(()));
    }

    #[test]
    fn test_media_type_case_and_parameters() {
        assert_eq!(validate(&desc(10, "Image/PNG")), Ok(()));
        assert_eq!(validate(&desc(10, "text/plain; charset=utf-8")), Ok(()));
    }

    #[test]
    fn test_profile_image_policy() {
        assert_eq!(validate_profile_image(&desc(1024, "image/png")), Ok(()));

        // PDF is fine for general intake but not for a profile image
        assert!(matches!(
            validate_profile_image(&desc(1024, "application/pdf")),
            Err(ValidationError::UnsupportedType(_))
        ));

        // SVG is not a raster type
        assert!(matches!(
            validate_profile_image(&desc(1024, "image/svg+xml")),
            Err(ValidationError::UnsupportedType(_))
        ));

        // 6 MiB passes general intake but exceeds the profile ceiling
        let six_mib = desc(6 * MIB, "image/jpeg");
        assert_eq!(validate(&six_mib), Ok(()));
        assert_eq!(
            validate_profile_image(&six_mib),
            Err(ValidationError::TooLarge {
                size: 6 * MIB,
                limit: PROFILE_IMAGE_MAX_BYTES,
            })
        );
    }

    #[test]
    fn test_custom_policy() {
        let policy = IntakePolicy {
            max_bytes: 100,
            allowed_media_types: vec!["text/csv".to_string()],
        };

        assert_eq!(policy.validate(&desc(100, "text/csv")), Ok(()));
        assert!(policy.validate(&desc(101, "text/csv")).is_err());
        assert!(policy.validate(&desc(1, "text/plain")).is_err());
    }
}
