//! Per-request header composition.

use std::sync::Arc;

use reqwest::header::{ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_TYPE};

use crate::auth::{AuthProvider, DEFAULT_LOCALE};
use crate::http::HeaderSet;

/// Derives the header set for every outgoing request.
///
/// Headers are recomputed on each call from the current auth state, so a
/// login or logout takes effect on the next request without rebuilding the
/// client.
#[derive(Clone)]
pub struct HeaderBuilder {
    auth: Arc<dyn AuthProvider>,
    force_default_locale: bool,
}

impl HeaderBuilder {
    pub fn new(auth: Arc<dyn AuthProvider>, force_default_locale: bool) -> Self {
        Self {
            auth,
            force_default_locale,
        }
    }

    pub fn build(&self) -> HeaderSet {
        let mut headers = HeaderSet::with_capacity(3);
        if let Some(token) = self.auth.token() {
            headers.push((AUTHORIZATION.as_str().to_string(), format!("Bearer {token}")));
        }
        headers.push((CONTENT_TYPE.as_str().to_string(), "application/json".to_string()));
        headers.push((ACCEPT_LANGUAGE.as_str().to_string(), self.locale()));
        headers
    }

    fn locale(&self) -> String {
        if self.force_default_locale {
            return DEFAULT_LOCALE.to_string();
        }
        self.auth
            .locale()
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string())
    }
}

impl std::fmt::Debug for HeaderBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeaderBuilder")
            .field("force_default_locale", &self.force_default_locale)
            .finish_non_exhaustive()
    }
}
