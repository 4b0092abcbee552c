//! Error normalization for failed calls.
//!
//! # Design
//! A failed call always has an underlying `TransportError`. When a response
//! body is available it is also inspected for a structured error payload:
//!
//! 1. no body bytes: nothing to inspect, the transport failure stands;
//! 2. body is not a JSON object: same;
//! 3. status in 400..=598, or 0: an `ApiError` carrying whichever of
//!    `errorCode` / `message` are present;
//! 4. any other status: an unexpected-status diagnosis.
//!
//! The diagnosis is always logged. Whether it replaces the transport failure
//! as the returned error is governed by `ErrorSurfacing`.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::ErrorSurfacing;
use crate::error::{ApiError, ServiceError, TransportError};
use crate::http::HttpResponse;

/// What a failed response's body says about the failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnosis {
    Api(ApiError),
    UnexpectedStatus { status: u16 },
}

impl From<Diagnosis> for ServiceError {
    fn from(diagnosis: Diagnosis) -> Self {
        match diagnosis {
            Diagnosis::Api(e) => ServiceError::Api(e),
            Diagnosis::UnexpectedStatus { status } => ServiceError::UnexpectedStatus { status },
        }
    }
}

/// Status codes whose JSON bodies are read as application errors.
pub fn is_application_failure(status: u16) -> bool {
    status == 0 || (400..=598).contains(&status)
}

/// Parse a structured error payload out of `response`, if it has one.
pub fn diagnose(response: &HttpResponse) -> Option<Diagnosis> {
    if response.body.is_empty() {
        return None;
    }
    let json: Map<String, Value> = serde_json::from_slice(&response.body).ok()?;
    debug!(status = response.status, body = ?json, "failed response body");

    if !is_application_failure(response.status) {
        return Some(Diagnosis::UnexpectedStatus {
            status: response.status,
        });
    }
    Some(Diagnosis::Api(ApiError {
        status: response.status,
        error_code: json.get("errorCode").and_then(Value::as_i64),
        message: json
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
    }))
}

/// Turns a failed call into the single error its caller receives.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorExtractor {
    surfacing: ErrorSurfacing,
}

impl ErrorExtractor {
    pub fn new(surfacing: ErrorSurfacing) -> Self {
        Self { surfacing }
    }

    /// `response` is `None` when the call never produced one (connection
    /// failure, timeout).
    pub fn extract(&self, failure: TransportError, response: Option<&HttpResponse>) -> ServiceError {
        let Some(response) = response else {
            debug!(error = %failure, "call failed without a response");
            return failure.into();
        };

        let Some(diagnosis) = diagnose(response) else {
            debug!(status = response.status, error = %failure, "failed response carried no JSON payload");
            return failure.into();
        };

        match &diagnosis {
            Diagnosis::Api(api) => warn!(
                status = api.status,
                error_code = ?api.error_code,
                message = ?api.message,
                "api error response"
            ),
            Diagnosis::UnexpectedStatus { status } => warn!(status, "unexpected status"),
        }

        match self.surfacing {
            ErrorSurfacing::Transport => failure.into(),
            ErrorSurfacing::Structured => diagnosis.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn not_found() -> HttpResponse {
        HttpResponse::new(404, r#"{"errorCode":404,"message":"Not found"}"#)
    }

    #[test]
    fn diagnose_reads_both_fields() {
        let diagnosis = diagnose(&not_found()).unwrap();
        assert_eq!(
            diagnosis,
            Diagnosis::Api(ApiError {
                status: 404,
                error_code: Some(404),
                message: Some("Not found".to_string()),
            })
        );
    }

    #[test]
    fn diagnose_tolerates_missing_fields() {
        let diagnosis = diagnose(&HttpResponse::new(422, r#"{"detail":"bad"}"#)).unwrap();
        assert_eq!(
            diagnosis,
            Diagnosis::Api(ApiError {
                status: 422,
                error_code: None,
                message: None,
            })
        );
    }

    #[test]
    fn diagnose_ignores_mistyped_fields() {
        let diagnosis =
            diagnose(&HttpResponse::new(400, r#"{"errorCode":"E12","message":7}"#)).unwrap();
        assert_eq!(
            diagnosis,
            Diagnosis::Api(ApiError {
                status: 400,
                error_code: None,
                message: None,
            })
        );
    }

    #[test]
    fn diagnose_treats_status_zero_as_application_failure() {
        let diagnosis = diagnose(&HttpResponse::new(0, r#"{"message":"offline"}"#)).unwrap();
        assert!(matches!(diagnosis, Diagnosis::Api(ApiError { status: 0, .. })));
    }

    #[test]
    fn diagnose_flags_statuses_outside_failure_range() {
        for status in [200, 302, 599] {
            let diagnosis = diagnose(&HttpResponse::new(status, "{}")).unwrap();
            assert_eq!(diagnosis, Diagnosis::UnexpectedStatus { status });
        }
    }

    #[test]
    fn diagnose_needs_a_json_object() {
        assert_eq!(diagnose(&HttpResponse::new(500, "")), None);
        assert_eq!(diagnose(&HttpResponse::new(500, "<html>oops</html>")), None);
        assert_eq!(diagnose(&HttpResponse::new(500, "[1,2]")), None);
    }

    #[test]
    fn failure_range_bounds() {
        assert!(is_application_failure(400));
        assert!(is_application_failure(598));
        assert!(is_application_failure(0));
        assert!(!is_application_failure(399));
        assert!(!is_application_failure(599));
    }

    #[test]
    #[traced_test]
    fn default_surfacing_keeps_transport_failure_and_logs_payload() {
        let failure = TransportError::UnacceptableStatus { status: 404 };
        let err = ErrorExtractor::default().extract(failure.clone(), Some(&not_found()));
        assert_eq!(err, ServiceError::Transport(failure));
        assert!(logs_contain("api error response"));
        assert!(logs_contain("Not found"));
    }

    #[test]
    #[traced_test]
    fn diagnose_logs_the_parsed_body() {
        diagnose(&HttpResponse::new(503, r#"{"message":"maintenance"}"#)).unwrap();
        assert!(logs_contain("failed response body"));
        assert!(logs_contain("maintenance"));
    }

    #[test]
    fn structured_surfacing_promotes_payload() {
        let failure = TransportError::UnacceptableStatus { status: 404 };
        let err = ErrorExtractor::new(ErrorSurfacing::Structured).extract(failure, Some(&not_found()));
        assert_eq!(
            err,
            ServiceError::Api(ApiError {
                status: 404,
                error_code: Some(404),
                message: Some("Not found".to_string()),
            })
        );
    }

    #[test]
    fn structured_surfacing_falls_back_without_payload() {
        let failure = TransportError::UnacceptableStatus { status: 500 };
        let response = HttpResponse::new(500, "Internal Server Error");
        let err = ErrorExtractor::new(ErrorSurfacing::Structured).extract(failure.clone(), Some(&response));
        assert_eq!(err, ServiceError::Transport(failure));
    }

    #[test]
    fn missing_response_surfaces_transport_failure() {
        let err = ErrorExtractor::new(ErrorSurfacing::Structured).extract(TransportError::Timeout, None);
        assert!(err.is_timeout());
    }
}
