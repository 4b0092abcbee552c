//! Public client surface: one method per HTTP verb.
//!
//! # Design
//! `ServiceClient` resolves `base_api_url + path` by plain concatenation and
//! picks the parameter encoding for each verb: GET uses the query string,
//! every other verb uses the body, form encoded unless `ClientConfig`
//! selects JSON. Everything else is delegated to the
//! `RequestExecutor`. The client holds no per-call state, so a single
//! instance can serve concurrent calls.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::auth::AuthProvider;
use crate::config::ClientConfig;
use crate::error::{ConfigError, ServiceResult};
use crate::executor::RequestExecutor;
use crate::extract::ErrorExtractor;
use crate::headers::HeaderBuilder;
use crate::http::{HttpMethod, ParameterEncoding, Parameters, RequestSpec};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::Pagination;

/// Typed async client for the backend API.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    config: ClientConfig,
    executor: RequestExecutor,
}

impl ServiceClient {
    /// Build a client backed by a pooled reqwest transport.
    pub fn new(config: ClientConfig, auth: Arc<dyn AuthProvider>) -> Result<Self, ConfigError> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self::with_transport(config, auth, Arc::new(transport)))
    }

    /// Build a client on top of any transport.
    pub fn with_transport(
        config: ClientConfig,
        auth: Arc<dyn AuthProvider>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let headers = HeaderBuilder::new(auth, config.force_default_locale);
        let extractor = ErrorExtractor::new(config.error_surfacing);
        Self {
            executor: RequestExecutor::new(transport, headers, extractor)
                .with_body_format(config.body_format),
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `base_api_url` followed by `path`, verbatim.
    pub fn full_url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_api_url)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, params: Option<Parameters>) -> ServiceResult<T> {
        self.request(HttpMethod::Get, path, params, ParameterEncoding::QueryString)
            .await
    }

    /// GET one page of a listing. `page` and `size` replace any same-named
    /// keys in `params`.
    pub async fn get_pagination<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Option<Parameters>,
        pagination: Pagination,
    ) -> ServiceResult<T> {
        let mut params = params.unwrap_or_default();
        pagination.apply(&mut params);
        self.request(HttpMethod::Get, path, Some(params), ParameterEncoding::QueryString)
            .await
    }

    pub async fn post<T: DeserializeOwned>(&self, path: &str, params: Option<Parameters>) -> ServiceResult<T> {
        self.request(HttpMethod::Post, path, params, ParameterEncoding::Body)
            .await
    }

    pub async fn put<T: DeserializeOwned>(&self, path: &str, params: Parameters) -> ServiceResult<T> {
        self.request(HttpMethod::Put, path, Some(params), ParameterEncoding::Body)
            .await
    }

    pub async fn patch<T: DeserializeOwned>(&self, path: &str, params: Parameters) -> ServiceResult<T> {
        self.request(HttpMethod::Patch, path, Some(params), ParameterEncoding::Body)
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str, params: Option<Parameters>) -> ServiceResult<T> {
        self.request(HttpMethod::Delete, path, params, ParameterEncoding::Body)
            .await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        parameters: Option<Parameters>,
        encoding: ParameterEncoding,
    ) -> ServiceResult<T> {
        let spec = RequestSpec {
            method,
            url: self.full_url(path),
            parameters,
            encoding,
        };
        self.executor.execute(spec).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthState;
    use crate::http::BodyFormat;
    use crate::transport::testing::StubTransport;
    use serde_json::{json, Value};

    const BASE_URL: &str = "https://api.test/v1";

    fn client(stub: Arc<StubTransport>) -> ServiceClient {
        client_with(ClientConfig::new(BASE_URL), stub)
    }

    fn client_with(config: ClientConfig, stub: Arc<StubTransport>) -> ServiceClient {
        ServiceClient::with_transport(config, Arc::new(AuthState::anonymous()), stub)
    }

    fn params(value: Value) -> Parameters {
        value.as_object().cloned().unwrap()
    }

    fn body_of(stub: &StubTransport) -> Option<String> {
        stub.last().body
    }

    #[test]
    fn full_url_concatenates_verbatim() {
        let c = client(Arc::new(StubTransport::default()));
        assert_eq!(c.full_url("/users"), "https://api.test/v1/users");
        assert_eq!(c.full_url("users"), "https://api.test/v1users");
    }

    #[tokio::test]
    async fn get_sends_parameters_in_query() {
        let stub = Arc::new(StubTransport::default());
        let _: Value = client(stub.clone())
            .get("/users", Some(params(json!({"role": "admin"}))))
            .await
            .unwrap();
        let req = stub.last();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "https://api.test/v1/users?role=admin");
        assert_eq!(req.body, None);
    }

    #[tokio::test]
    async fn get_without_parameters_has_no_query() {
        let stub = Arc::new(StubTransport::default());
        let _: Value = client(stub.clone()).get("/users", None).await.unwrap();
        assert_eq!(stub.last().url, "https://api.test/v1/users");
    }

    #[tokio::test]
    async fn pagination_keys_win_over_caller_keys() {
        let stub = Arc::new(StubTransport::default());
        let _: Value = client(stub.clone())
            .get_pagination(
                "/orders",
                Some(params(json!({"page": 40, "size": 1, "status": "open"}))),
                Pagination::new(2, 5),
            )
            .await
            .unwrap();
        assert_eq!(stub.last().url, "https://api.test/v1/orders?page=2&size=5&status=open");
    }

    #[tokio::test]
    async fn pagination_defaults_to_first_page_of_twenty() {
        let stub = Arc::new(StubTransport::default());
        let _: Value = client(stub.clone())
            .get_pagination("/orders", None, Pagination::default())
            .await
            .unwrap();
        assert_eq!(stub.last().url, "https://api.test/v1/orders?page=0&size=20");
    }

    #[tokio::test]
    async fn body_verbs_never_touch_the_query() {
        let stub = Arc::new(StubTransport::default());
        let c = client(stub.clone());
        let payload = params(json!({"name": "Ada", "age": 36}));

        let _: Value = c.post("/users", Some(payload.clone())).await.unwrap();
        assert_eq!(stub.last().method, HttpMethod::Post);
        assert_eq!(stub.last().url, "https://api.test/v1/users");
        assert_eq!(body_of(&stub).as_deref(), Some("age=36&name=Ada"));

        let _: Value = c.put("/users/1", payload.clone()).await.unwrap();
        assert_eq!(stub.last().method, HttpMethod::Put);
        assert_eq!(stub.last().url, "https://api.test/v1/users/1");

        let _: Value = c.patch("/users/1", params(json!({"age": 37}))).await.unwrap();
        assert_eq!(stub.last().method, HttpMethod::Patch);
        assert_eq!(body_of(&stub).as_deref(), Some("age=37"));

        let _: Value = c
            .delete("/users/1", Some(params(json!({"reason": "dup"}))))
            .await
            .unwrap();
        assert_eq!(stub.last().method, HttpMethod::Delete);
        assert_eq!(stub.last().url, "https://api.test/v1/users/1");
        assert_eq!(body_of(&stub).as_deref(), Some("reason=dup"));
    }

    #[tokio::test]
    async fn json_body_format_comes_from_config() {
        let stub = Arc::new(StubTransport::default());
        let c = client_with(ClientConfig::new(BASE_URL).body_format(BodyFormat::Json), stub.clone());
        assert_eq!(c.config().body_format, BodyFormat::Json);

        let _: Value = c
            .post("/login", Some(params(json!({"email": "a@b.c", "remember": true}))))
            .await
            .unwrap();
        let body: Value = serde_json::from_str(&body_of(&stub).unwrap()).unwrap();
        assert_eq!(body, json!({"email": "a@b.c", "remember": true}));
    }

    #[test]
    fn config_is_kept_as_given() {
        let config = ClientConfig::new(BASE_URL).error_surfacing(crate::config::ErrorSurfacing::Structured);
        let c = client_with(config.clone(), Arc::new(StubTransport::default()));
        assert_eq!(c.config(), &config);
        assert_eq!(c.config().body_format, BodyFormat::Form);
    }

    #[tokio::test]
    async fn every_call_produces_exactly_one_outcome() {
        let stub = Arc::new(StubTransport::default());
        stub.push(Ok(crate::http::HttpResponse::new(200, r#"{"ok":true}"#)));
        stub.push(Ok(crate::http::HttpResponse::new(500, "boom")));
        stub.push(Err(crate::error::TransportError::Timeout));
        let c = client(stub.clone());

        let first: ServiceResult<Value> = c.get("/a", None).await;
        let second: ServiceResult<Value> = c.get("/b", None).await;
        let third: ServiceResult<Value> = c.get("/c", None).await;

        assert!(first.is_ok());
        assert!(second.is_err());
        assert!(third.unwrap_err().is_timeout());
        assert_eq!(stub.sent().len(), 3);
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = ClientConfig::new("");
        assert!(ServiceClient::new(config, Arc::new(AuthState::anonymous())).is_err());
    }
}
