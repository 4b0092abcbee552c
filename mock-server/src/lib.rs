//! In-memory backend used to exercise the service client over real HTTP.
//!
//! Routes:
//! - `/items`, `/items/{id}`: CRUD store; `GET /items` is paginated by the
//!   `page` and `size` query parameters. Missing items answer 404 with an
//!   `{ "errorCode", "message" }` payload.
//! - `/echo`: any method; reflects the method, selected headers, query and
//!   body back as JSON. A body that is not JSON is read as form pairs.
//! - `/status/{code}`: replies `code` with an error payload;
//!   `/status/{code}/text` replies `code` with a plain-text body.
//! - `/slow/{ms}`: sleeps before replying.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::Duration,
};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use url::form_urlencoded;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct CreateItem {
    pub name: String,
    #[serde(default)]
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct ReplaceItem {
    pub name: String,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct PatchItem {
    pub name: Option<String>,
    pub quantity: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub page: usize,
    pub size: usize,
    pub total: usize,
    pub items: Vec<T>,
}

#[derive(Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: usize,
    #[serde(default = "default_size")]
    pub size: usize,
}

fn default_size() -> usize {
    20
}

/// Failure reply carrying the backend's error payload.
#[derive(Debug)]
pub struct ApiFailure {
    pub status: StatusCode,
    pub error_code: i64,
    pub message: String,
}

impl ApiFailure {
    fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error_code: 404,
            message: "Not found".to_string(),
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let body = json!({ "errorCode": self.error_code, "message": self.message });
        (self.status, Json(body)).into_response()
    }
}

/// Items ordered by insertion, so pages are stable.
#[derive(Default)]
pub struct Store {
    order: Vec<Uuid>,
    items: HashMap<Uuid, Item>,
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route(
            "/items/{id}",
            get(get_item)
                .put(replace_item)
                .patch(patch_item)
                .delete(delete_item),
        )
        .route("/echo", any(echo))
        .route("/status/{code}", any(status_json))
        .route("/status/{code}/text", any(status_text))
        .route("/slow/{ms}", any(slow))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock server listening");
    }
    axum::serve(listener, app()).await
}

async fn list_items(State(db): State<Db>, Query(query): Query<PageQuery>) -> Json<Page<Item>> {
    let store = db.read().await;
    let items = store
        .order
        .iter()
        .skip(query.page.saturating_mul(query.size))
        .take(query.size)
        .filter_map(|id| store.items.get(id).cloned())
        .collect();
    Json(Page {
        page: query.page,
        size: query.size,
        total: store.order.len(),
        items,
    })
}

async fn create_item(State(db): State<Db>, Json(input): Json<CreateItem>) -> (StatusCode, Json<Item>) {
    let item = Item {
        id: Uuid::new_v4(),
        name: input.name,
        quantity: input.quantity,
    };
    let mut store = db.write().await;
    store.order.push(item.id);
    store.items.insert(item.id, item.clone());
    debug!(id = %item.id, "item created");
    (StatusCode::CREATED, Json(item))
}

async fn get_item(State(db): State<Db>, Path(id): Path<Uuid>) -> Result<Json<Item>, ApiFailure> {
    let store = db.read().await;
    store.items.get(&id).cloned().map(Json).ok_or_else(ApiFailure::not_found)
}

async fn replace_item(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<ReplaceItem>,
) -> Result<Json<Item>, ApiFailure> {
    let mut store = db.write().await;
    let item = store.items.get_mut(&id).ok_or_else(ApiFailure::not_found)?;
    item.name = input.name;
    item.quantity = input.quantity;
    Ok(Json(item.clone()))
}

async fn patch_item(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<PatchItem>,
) -> Result<Json<Item>, ApiFailure> {
    let mut store = db.write().await;
    let item = store.items.get_mut(&id).ok_or_else(ApiFailure::not_found)?;
    if let Some(name) = input.name {
        item.name = name;
    }
    if let Some(quantity) = input.quantity {
        item.quantity = quantity;
    }
    Ok(Json(item.clone()))
}

async fn delete_item(State(db): State<Db>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiFailure> {
    let mut store = db.write().await;
    store.items.remove(&id).ok_or_else(ApiFailure::not_found)?;
    store.order.retain(|existing| *existing != id);
    Ok(StatusCode::NO_CONTENT)
}

/// What `/echo` saw of a request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    /// The body when it parses as JSON, `null` otherwise.
    pub body: Value,
    /// The body's `key=value` pairs when it is not JSON.
    pub form: BTreeMap<String, String>,
}

const ECHOED_HEADERS: [&str; 3] = ["authorization", "accept-language", "content-type"];

async fn echo(
    method: Method,
    headers: HeaderMap,
    Query(query): Query<BTreeMap<String, String>>,
    body: Bytes,
) -> Json<Echo> {
    let headers = ECHOED_HEADERS
        .iter()
        .filter_map(|name| {
            headers
                .get(*name)
                .and_then(|v| v.to_str().ok())
                .map(|v| (name.to_string(), v.to_string()))
        })
        .collect();
    let (body, form) = match serde_json::from_slice(&body) {
        Ok(json) => (json, BTreeMap::new()),
        Err(_) => (Value::Null, form_urlencoded::parse(&body).into_owned().collect()),
    };
    Json(Echo {
        method: method.to_string(),
        headers,
        query,
        body,
        form,
    })
}

fn parse_status(code: u16) -> Result<StatusCode, StatusCode> {
    StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)
}

async fn status_json(Path(code): Path<u16>) -> Result<ApiFailure, StatusCode> {
    let status = parse_status(code)?;
    Ok(ApiFailure {
        status,
        error_code: i64::from(code),
        message: status.canonical_reason().unwrap_or("Unknown").to_string(),
    })
}

async fn status_text(Path(code): Path<u16>) -> Result<(StatusCode, &'static str), StatusCode> {
    Ok((parse_status(code)?, "something went wrong"))
}

async fn slow(Path(ms): Path<u64>) -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    Json(json!({ "slept_ms": ms }))
}
