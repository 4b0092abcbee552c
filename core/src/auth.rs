//! Read access to the session's bearer token and locale preference.
//!
//! The client only ever reads through `AuthProvider`; whoever owns the login
//! flow writes to a `SessionStore` (or supplies its own provider backed by a
//! keychain, a preferences file, etc.).

use std::sync::RwLock;

/// Locale sent when none is stored or when the default is forced.
pub const DEFAULT_LOCALE: &str = "en-US";

/// Read-only view of the process-wide auth state.
///
/// Read once per request; implementations must be cheap and non-blocking.
pub trait AuthProvider: Send + Sync {
    /// The bearer token, if a session is active.
    fn token(&self) -> Option<String>;

    /// The stored locale tag, if one was chosen.
    fn locale(&self) -> Option<String>;
}

/// A snapshot of the auth state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub token: Option<String>,
    pub locale: Option<String>,
}

impl AuthState {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            locale: None,
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }
}

impl AuthProvider for AuthState {
    fn token(&self) -> Option<String> {
        non_empty(self.token.as_deref())
    }

    fn locale(&self) -> Option<String> {
        non_empty(self.locale.as_deref())
    }
}

/// Mutable auth state shared between the session owner and the client.
#[derive(Debug, Default)]
pub struct SessionStore {
    state: RwLock<AuthState>,
}

impl SessionStore {
    pub fn new(state: AuthState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    pub fn set_token(&self, token: impl Into<String>) {
        self.write().token = Some(token.into());
    }

    pub fn clear_token(&self) {
        self.write().token = None;
    }

    pub fn set_locale(&self, locale: impl Into<String>) {
        self.write().locale = Some(locale.into());
    }

    pub fn snapshot(&self) -> AuthState {
        self.read().clone()
    }

    // A panic while holding the lock cannot leave `AuthState` half-written,
    // so a poisoned lock is still safe to use.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, AuthState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, AuthState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl AuthProvider for SessionStore {
    fn token(&self) -> Option<String> {
        non_empty(self.read().token.as_deref())
    }

    fn locale(&self) -> Option<String> {
        non_empty(self.read().locale.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}
