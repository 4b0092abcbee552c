//! Typed async HTTP client core for the app's backend API.
//!
//! # Overview
//! Turns a (method, path, parameters) triple into a typed asynchronous
//! result: headers are composed from the current session, parameters are
//! encoded per verb, success bodies decode into the caller's type and every
//! failure is normalized into a single `ServiceError`.
//!
//! # Design
//! - `ServiceClient` is the facade; it owns one `RequestExecutor` and one
//!   transport for its whole lifetime.
//! - Requests and responses are plain data (`HttpRequest`, `HttpResponse`),
//!   so building and parsing are testable without a server.
//! - Session state is read through the `AuthProvider` trait, never from a
//!   global.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod extract;
pub mod headers;
pub mod http;
pub mod transport;
pub mod types;

pub use auth::{AuthProvider, AuthState, SessionStore, DEFAULT_LOCALE};
pub use client::ServiceClient;
pub use config::{ClientConfig, ErrorSurfacing};
pub use error::{ApiError, ConfigError, ServiceError, ServiceResult, TransportError};
pub use executor::RequestExecutor;
pub use extract::{diagnose, Diagnosis, ErrorExtractor};
pub use headers::HeaderBuilder;
pub use http::{
    encode_form, to_parameters, BodyFormat, HeaderSet, HttpMethod, HttpRequest, HttpResponse,
    ParameterEncoding, Parameters, RequestSpec,
};
pub use transport::{ReqwestTransport, Transport};
pub use types::Pagination;
