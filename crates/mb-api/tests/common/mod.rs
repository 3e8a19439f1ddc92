//! Shared helpers for API tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, Response, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use mb_api::{create_router, AppState, BoardPolicy};
use mb_core::{ThreadService, WriteConcern};
use mb_db_memory::MemoryThreadRepo;
use serde_json::Value;
use tower::ServiceExt;

pub fn create_test_app() -> Router {
    create_router(AppState {
        service: ThreadService::new(Arc::new(MemoryThreadRepo::new()), WriteConcern::default()),
        boards: BoardPolicy::open(),
    })
}

pub async fn send(app: &Router, method: Method, uri: &str, form: &str) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, mime::APPLICATION_WWW_FORM_URLENCODED.as_ref())
        .body(Body::from(form.to_string()))
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn text(response: Response<Body>) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(body.to_vec()).unwrap()
}

pub async fn json(response: Response<Body>) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).expect("body is not JSON")
}

/// Sends a mutation and returns `(status, body)`.
pub async fn send_text(app: &Router, method: Method, uri: &str, form: &str) -> (StatusCode, String) {
    let response = send(app, method, uri, form).await;
    let status = response.status();
    (status, text(response).await)
}

/// Creates a thread on `board` and returns its id as listed.
pub async fn create_thread(app: &Router, board: &str, text: &str, password: &str) -> String {
    let response = send(
        app,
        Method::POST,
        &format!("/api/threads/{board}"),
        &format!("text={text}&delete_password={password}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let listed = json(get(app, &format!("/api/threads/{board}")).await).await;
    listed
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["text"] == text)
        .map(|t| t["_id"].as_str().unwrap().to_string())
        .expect("created thread is listed")
}

/// Posts a reply and returns its id, read back from the full thread.
pub async fn create_reply(app: &Router, board: &str, thread_id: &str, text: &str, password: &str) -> String {
    let response = send(
        app,
        Method::POST,
        &format!("/api/replies/{board}"),
        &format!("thread_id={thread_id}&text={text}&delete_password={password}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let thread = json(get(app, &format!("/api/replies/{board}?thread_id={thread_id}")).await).await;
    thread["replies"]
        .as_array()
        .unwrap()
        .iter()
        .rev()
        .find(|r| r["text"] == text)
        .map(|r| r["_id"].as_str().unwrap().to_string())
        .expect("created reply is in the thread")
}
