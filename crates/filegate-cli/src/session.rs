//! Local session provider.

use filegate_core::SessionProvider;

/// Session backed by the local user account
///
/// The terminal user counts as signed in whenever a label can be resolved,
/// either from configuration or from the environment.
#[derive(Debug, Clone, Default)]
pub struct LocalSession {
    label: Option<String>,
}

impl LocalSession {
    /// Session for a configured user, falling back to `$USER` / `$USERNAME`
    #[must_use]
    pub fn new(configured: Option<&str>) -> Self {
        let label = configured
            .map(str::to_string)
            .or_else(|| std::env::var("USER").ok())
            .or_else(|| std::env::var("USERNAME").ok())
            .unwrap_or_default();

        Self::with_label(label.trim())
    }

    /// Session for an explicit label
    #[must_use]
    pub fn with_label(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            label: (!label.trim().is_empty()).then_some(label),
        }
    }
}

impl SessionProvider for LocalSession {
    fn is_authenticated(&self) -> bool {
        self.label.is_some()
    }

    fn current_user_label(&self) -> String {
        self.label.clone().unwrap_or_default()
    }
}
