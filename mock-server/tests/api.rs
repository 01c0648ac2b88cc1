use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Dummy, BINARY_BODY, DUMMY_TOKEN};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder().method(method).uri(uri).body(String::new()).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn with_token(mut request: Request<String>, token: &str) -> Request<String> {
    request.headers_mut().insert(
        http::header::AUTHORIZATION,
        format!("DummyToken {token}").parse().unwrap(),
    );
    request
}

// --- public collection ---

#[tokio::test]
async fn list_returns_seeded_dummies() {
    let resp = app().oneshot(empty_request("GET", "/api/v1/dummy/")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let dummies: Vec<Dummy> = body_json(resp).await;
    let names: Vec<&str> = dummies.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["Dummy 1", "Dummy 2"]);
}

#[tokio::test]
async fn create_returns_201_with_new_pk() {
    let resp = app()
        .oneshot(json_request("POST", "/api/v1/dummy/", r#"{"name":"x"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let dummy: Dummy = body_json(resp).await;
    assert_eq!(dummy.pk, 3);
    assert_eq!(dummy.name, "x");
}

#[tokio::test]
async fn create_without_name_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/api/v1/dummy/", r#"{"title":1}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn get_unknown_returns_404() {
    let resp = app().oneshot(empty_request("GET", "/api/v1/dummy/99/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_non_numeric_pk_returns_400() {
    let resp = app().oneshot(empty_request("GET", "/api/v1/dummy/abc/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_unknown_returns_404() {
    let resp = app().oneshot(empty_request("DELETE", "/api/v1/dummy/99/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_then_delete() {
    use tower::Service;

    let mut app = app().into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("PUT", "/api/v1/dummy/1/", r#"{"name":"Renamed"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Dummy = body_json(resp).await;
    assert_eq!(updated, Dummy { pk: 1, name: "Renamed".to_string() });

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("DELETE", "/api/v1/dummy/1/"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/api/v1/dummy/1/"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- token-protected collection ---

#[tokio::test]
async fn auth_routes_reject_missing_token() {
    let resp = app().oneshot(empty_request("GET", "/api/v1/auth/dummy/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn auth_routes_reject_wrong_token() {
    let request = with_token(empty_request("GET", "/api/v1/auth/dummy/1/"), "wrong");
    let resp = app().oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn auth_routes_accept_token() {
    let request = with_token(empty_request("GET", "/api/v1/auth/dummy/2/"), DUMMY_TOKEN);
    let resp = app().oneshot(request).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let dummy: Dummy = body_json(resp).await;
    assert_eq!(dummy.name, "Dummy 2");
}

// --- fixed endpoints ---

#[tokio::test]
async fn empty_returns_204_for_any_method() {
    for method in ["GET", "POST", "DELETE"] {
        let resp = app().oneshot(empty_request(method, "/api/v1/empty/")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT, "{method}");
    }
}

#[tokio::test]
async fn text_is_not_json() {
    let resp = app().oneshot(empty_request("GET", "/api/v1/text/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_bytes(resp).await;
    assert!(serde_json::from_slice::<Value>(&body).is_err());
}

#[tokio::test]
async fn binary_returns_raw_bytes() {
    let resp = app().oneshot(empty_request("GET", "/api/v1/binary/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[http::header::CONTENT_TYPE], "application/octet-stream");
    assert_eq!(body_bytes(resp).await.as_ref(), BINARY_BODY);
}

#[tokio::test]
async fn echo_describes_the_request() {
    let request = Request::builder()
        .method("PATCH")
        .uri("/api/v1/echo/?a=1&b=two")
        .header("x-trace", "abc")
        .body("payload".to_string())
        .unwrap();
    let resp = app().oneshot(request).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Value = body_json(resp).await;
    assert_eq!(echo["method"], "PATCH");
    assert_eq!(echo["path"], "/api/v1/echo/");
    assert_eq!(echo["query"], "a=1&b=two");
    assert_eq!(echo["headers"]["x-trace"], "abc");
    assert_eq!(echo["body"], "payload");
}
