//! Stand-in for the dummy integration's remote service.
//!
//! Everything lives under `/api/v1`: a CRUD collection at `/dummy/`, the
//! same collection behind a token at `/auth/dummy/`, and a few fixed
//! endpoints (`/empty/`, `/text/`, `/binary/`, `/echo/`) for exercising
//! response handling.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{OriginalUri, Path, Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

/// Token accepted by the `/auth/` routes, sent as `DummyToken <token>`.
pub const DUMMY_TOKEN: &str = "dummy-secret-token";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dummy {
    pub pk: i64,
    pub name: String,
}

#[derive(Deserialize)]
pub struct CreateDummy {
    pub name: String,
}

#[derive(Deserialize)]
pub struct UpdateDummy {
    pub name: String,
}

#[derive(Debug)]
pub struct Store {
    dummies: BTreeMap<i64, Dummy>,
    next_pk: i64,
}

impl Store {
    /// Store holding `Dummy 1` and `Dummy 2`.
    pub fn seeded() -> Self {
        let dummies = [(1, "Dummy 1"), (2, "Dummy 2")]
            .into_iter()
            .map(|(pk, name)| {
                (
                    pk,
                    Dummy {
                        pk,
                        name: name.to_string(),
                    },
                )
            })
            .collect();
        Self { dummies, next_pk: 3 }
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::seeded()));
    let api = Router::new()
        .merge(dummy_routes("/dummy"))
        .merge(dummy_routes("/auth/dummy").route_layer(middleware::from_fn(require_token)))
        .route("/empty/", any(empty))
        .route("/text/", any(text))
        .route("/binary/", get(binary))
        .route("/echo/", any(echo));
    Router::new().nest("/api/v1", api).with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn dummy_routes(prefix: &str) -> Router<Db> {
    Router::new()
        .route(&format!("{prefix}/"), get(list_dummies).post(create_dummy))
        .route(
            &format!("{prefix}/{{pk}}/"),
            get(get_dummy).put(update_dummy).delete(delete_dummy),
        )
}

async fn require_token(request: Request, next: Next) -> Result<Response, StatusCode> {
    let expected = format!("DummyToken {DUMMY_TOKEN}");
    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    if provided == Some(expected.as_str()) {
        Ok(next.run(request).await)
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

async fn list_dummies(State(db): State<Db>) -> Json<Vec<Dummy>> {
    let store = db.read().await;
    Json(store.dummies.values().cloned().collect())
}

async fn create_dummy(State(db): State<Db>, Json(input): Json<CreateDummy>) -> (StatusCode, Json<Dummy>) {
    let mut store = db.write().await;
    let dummy = Dummy {
        pk: store.next_pk,
        name: input.name,
    };
    store.next_pk += 1;
    store.dummies.insert(dummy.pk, dummy.clone());
    debug!(pk = dummy.pk, "dummy created");
    (StatusCode::CREATED, Json(dummy))
}

async fn get_dummy(State(db): State<Db>, Path(pk): Path<i64>) -> Result<Json<Dummy>, StatusCode> {
    let store = db.read().await;
    store.dummies.get(&pk).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_dummy(
    State(db): State<Db>,
    Path(pk): Path<i64>,
    Json(input): Json<UpdateDummy>,
) -> Result<Json<Dummy>, StatusCode> {
    let mut store = db.write().await;
    let dummy = store.dummies.get_mut(&pk).ok_or(StatusCode::NOT_FOUND)?;
    dummy.name = input.name;
    Ok(Json(dummy.clone()))
}

async fn delete_dummy(State(db): State<Db>, Path(pk): Path<i64>) -> Result<StatusCode, StatusCode> {
    let mut store = db.write().await;
    store.dummies.remove(&pk).map(|_| StatusCode::NO_CONTENT).ok_or(StatusCode::NOT_FOUND)
}

async fn empty() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn text() -> &'static str {
    "this is not json"
}

/// Body that is not valid UTF-8.
pub const BINARY_BODY: [u8; 4] = [0xff, 0xfe, 0x00, 0x89];

async fn binary() -> ([(header::HeaderName, &'static str); 1], Vec<u8>) {
    ([(header::CONTENT_TYPE, "application/octet-stream")], BINARY_BODY.to_vec())
}

/// Describe the incoming request as JSON.
async fn echo(method: Method, OriginalUri(uri): OriginalUri, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let headers: BTreeMap<String, String> = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query().unwrap_or_default(),
        "headers": headers,
        "body": String::from_utf8_lossy(&body),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_store_has_two_dummies() {
        let store = Store::seeded();
        assert_eq!(store.dummies.len(), 2);
        assert_eq!(store.dummies[&1].name, "Dummy 1");
        assert_eq!(store.dummies[&2].name, "Dummy 2");
        assert_eq!(store.next_pk, 3);
    }

    #[test]
    fn dummy_serializes_to_json() {
        let dummy = Dummy {
            pk: 7,
            name: "Test".to_string(),
        };
        assert_eq!(serde_json::to_value(&dummy).unwrap(), json!({"pk": 7, "name": "Test"}));
    }

    #[test]
    fn create_dummy_rejects_missing_name() {
        let result: Result<CreateDummy, _> = serde_json::from_str(r#"{"pk": 1}"#);
        assert!(result.is_err());
    }
}
