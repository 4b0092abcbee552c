//! Request execution: build, send, validate, decode.
//!
//! # Design
//! Building (`build`) and parsing (`parse`) are pure and mirror each other
//! around the single suspension point in `execute`. Every path out of
//! `execute` yields exactly one `Result`, and every failure passes through
//! the `ErrorExtractor`.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{instrument, Span};

use crate::error::{ServiceResult, TransportError};
use crate::extract::ErrorExtractor;
use crate::headers::HeaderBuilder;
use crate::http::{
    append_query, encode_form, BodyFormat, HttpRequest, HttpResponse, ParameterEncoding, RequestSpec,
};
use crate::transport::Transport;

/// Runs one `RequestSpec` to a typed result. No retries.
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    headers: HeaderBuilder,
    extractor: ErrorExtractor,
    body_format: BodyFormat,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn Transport>, headers: HeaderBuilder, extractor: ErrorExtractor) -> Self {
        Self {
            transport,
            headers,
            extractor,
            body_format: BodyFormat::default(),
        }
    }

    pub fn with_body_format(mut self, body_format: BodyFormat) -> Self {
        self.body_format = body_format;
        self
    }

    /// Turn a spec into the request that goes on the wire.
    pub fn build(&self, spec: &RequestSpec) -> ServiceResult<HttpRequest> {
        let headers = self.headers.build();
        let (url, body) = match (&spec.parameters, spec.encoding) {
            (None, _) => (spec.url.clone(), None),
            (Some(params), ParameterEncoding::QueryString) => (append_query(&spec.url, params), None),
            (Some(params), ParameterEncoding::Body) => {
                let body = match self.body_format {
                    BodyFormat::Form => encode_form(params),
                    BodyFormat::Json => serde_json::to_string(params)
                        .map_err(|e| TransportError::InvalidRequest(e.to_string()))?,
                };
                (spec.url.clone(), Some(body))
            }
        };
        Ok(HttpRequest {
            method: spec.method,
            url,
            headers,
            body,
        })
    }

    /// Validate the status and decode the body as `T`.
    ///
    /// Only 200..300 is accepted. An empty 204/205 body decodes as JSON
    /// `null`, which suits `()` and `Option<_>`.
    pub fn parse<T: DeserializeOwned>(&self, response: &HttpResponse) -> ServiceResult<T> {
        if !response.is_success() {
            let failure = TransportError::UnacceptableStatus {
                status: response.status,
            };
            return Err(self.extractor.extract(failure, Some(response)));
        }

        let body: &[u8] = if response.body.is_empty() && matches!(response.status, 204 | 205) {
            b"null"
        } else {
            &response.body
        };
        serde_json::from_slice(body).map_err(|e| {
            self.extractor
                .extract(TransportError::Decode(e.to_string()), Some(response))
        })
    }

    /// Issue the call and await its typed result.
    #[instrument(
        name = "service_request",
        skip(self, spec),
        fields(
            http.method = %spec.method,
            http.url = %spec.url,
            http.status_code = tracing::field::Empty,
        )
    )]
    pub async fn execute<T: DeserializeOwned>(&self, spec: RequestSpec) -> ServiceResult<T> {
        let request = self.build(&spec)?;
        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(failure) => return Err(self.extractor.extract(failure, None)),
        };
        Span::current().record("http.status_code", response.status);
        self.parse(&response)
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("headers", &self.headers)
            .field("extractor", &self.extractor)
            .field("body_format", &self.body_format)
            .finish_non_exhaustive()
    }
}
