//! Session gate.
//!
//! Credential checks live outside the core. The controller only reads the
//! [`SessionState`] value it is handed with every event: a boolean gate and a
//! display label.

/// External session provider
pub trait SessionProvider {
    /// Whether a user is currently signed in
    fn is_authenticated(&self) -> bool;

    /// Label shown for the signed-in user
    fn current_user_label(&self) -> String;
}

/// Snapshot of the session passed into the workflow controller
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    /// Whether a user is signed in
    pub authenticated: bool,
    /// Display label of the user
    pub user_label: String,
}

impl SessionState {
    /// Authenticated session for `label`
    pub fn authenticated(label: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            user_label: label.into(),
        }
    }

    /// Signed-out session
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Read the current session from a provider
    pub fn from_provider<P: SessionProvider + ?Sized>(provider: &P) -> Self {
        Self {
            authenticated: provider.is_authenticated(),
            user_label: provider.current_user_label(),
        }
    }
}
