// tests/api_replies.rs
mod common;

use axum::http::{header, Method, StatusCode};
use common::{create_reply, create_test_app, create_thread, get, json, send, send_text};

const MISSING_ID: &str = "0190a5a0-0000-7000-8000-000000000000";

#[tokio::test]
async fn post_reply_redirects_to_thread() {
    let app = create_test_app();
    let thread_id = create_thread(&app, "g", "op", "x").await;

    let response = send(
        &app,
        Method::POST,
        "/api/replies/g",
        &format!("thread_id={thread_id}&text=hi&delete_password=pw"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], format!("/b/g/{thread_id}").as_str());
}

#[tokio::test]
async fn reply_to_missing_thread_is_bad_request() {
    let app = create_test_app();

    let (status, body) = send_text(
        &app,
        Method::POST,
        "/api/replies/g",
        &format!("thread_id={MISSING_ID}&text=hi&delete_password=pw"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains(MISSING_ID));
}

#[tokio::test]
async fn full_thread_has_every_reply_in_order() {
    let app = create_test_app();
    let thread_id = create_thread(&app, "g", "op", "x").await;
    for i in 0..5 {
        create_reply(&app, "g", &thread_id, &format!("r{i}"), "pw").await;
    }

    let response = get(&app, &format!("/api/replies/g?thread_id={thread_id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let thread = json(response).await;

    let mut keys: Vec<_> = thread.as_object().unwrap().keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["_id", "bumped_on", "created_on", "replies", "text"]);

    let texts: Vec<_> = thread["replies"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, ["r0", "r1", "r2", "r3", "r4"]);

    let mut reply_keys: Vec<_> = thread["replies"][0].as_object().unwrap().keys().map(String::as_str).collect();
    reply_keys.sort_unstable();
    assert_eq!(reply_keys, ["_id", "created_on", "text"]);
}

#[tokio::test]
async fn fetching_a_missing_thread_is_bad_request() {
    let app = create_test_app();

    let response = get(&app, &format!("/api/replies/g?thread_id={MISSING_ID}")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reply_bumps_thread() {
    let app = create_test_app();
    let thread_id = create_thread(&app, "g", "op", "x").await;
    let before = json(get(&app, &format!("/api/replies/g?thread_id={thread_id}")).await).await;

    create_reply(&app, "g", &thread_id, "bump", "pw").await;
    let after = json(get(&app, &format!("/api/replies/g?thread_id={thread_id}")).await).await;

    assert_eq!(before["created_on"], after["created_on"]);
    assert_ne!(before["bumped_on"], after["bumped_on"]);
    assert_eq!(after["bumped_on"], after["replies"][0]["created_on"]);
}

#[tokio::test]
async fn soft_delete_keeps_reply_in_place() {
    let app = create_test_app();
    let thread_id = create_thread(&app, "g", "op", "x").await;
    create_reply(&app, "g", &thread_id, "first", "a").await;
    let target = create_reply(&app, "g", &thread_id, "second", "b").await;
    create_reply(&app, "g", &thread_id, "third", "c").await;

    let uri = format!("/api/replies/g?thread_id={thread_id}");
    let before = json(get(&app, &uri).await).await;

    let form = format!("thread_id={thread_id}&reply_id={target}&delete_password=b");
    let (status, body) = send_text(&app, Method::DELETE, "/api/replies/g", &form).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "success");

    let after = json(get(&app, &uri).await).await;
    assert_eq!(after["replies"].as_array().unwrap().len(), 3);
    assert_eq!(after["replies"][1]["_id"], target.as_str());
    assert_eq!(after["replies"][1]["text"], "[deleted]");
    assert_eq!(after["replies"][1]["created_on"], before["replies"][1]["created_on"]);
    assert_eq!(after["replies"][0]["text"], "first");
    assert_eq!(after["replies"][2]["text"], "third");

    let (status, body) = send_text(&app, Method::DELETE, "/api/replies/g", &form).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Reply is already deleted.");
}

#[tokio::test]
async fn delete_reply_with_wrong_password() {
    let app = create_test_app();
    let thread_id = create_thread(&app, "g", "op", "x").await;
    let reply_id = create_reply(&app, "g", &thread_id, "keep me", "right").await;

    let (status, body) = send_text(
        &app,
        Method::DELETE,
        "/api/replies/g",
        &format!("thread_id={thread_id}&reply_id={reply_id}&delete_password=wrong"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "incorrect password");

    let thread = json(get(&app, &format!("/api/replies/g?thread_id={thread_id}")).await).await;
    assert_eq!(thread["replies"][0]["text"], "keep me");
}

#[tokio::test]
async fn delete_reply_with_unknown_ids() {
    let app = create_test_app();
    let thread_id = create_thread(&app, "g", "op", "x").await;

    let (status, body) = send_text(
        &app,
        Method::DELETE,
        "/api/replies/g",
        &format!("thread_id={thread_id}&reply_id={MISSING_ID}&delete_password=x"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Incorrect thread_id or reply_id");
}

#[tokio::test]
async fn report_reply() {
    let app = create_test_app();
    let thread_id = create_thread(&app, "g", "op", "x").await;
    let reply_id = create_reply(&app, "g", &thread_id, "spam", "pw").await;
    let uri = format!("/api/replies/g?thread_id={thread_id}");
    let before = json(get(&app, &uri).await).await;

    let form = format!("thread_id={thread_id}&reply_id={reply_id}");
    for _ in 0..2 {
        let (status, body) = send_text(&app, Method::PUT, "/api/replies/g", &form).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "success");
    }
    assert_eq!(json(get(&app, &uri).await).await, before);

    let (status, body) = send_text(
        &app,
        Method::PUT,
        "/api/replies/g",
        &format!("thread_id={thread_id}&reply_id={MISSING_ID}"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Incorrect thread_id or reply_id");
}

#[tokio::test]
async fn reply_ids_do_not_cross_threads() {
    let app = create_test_app();
    let first = create_thread(&app, "g", "one", "x").await;
    let second = create_thread(&app, "g", "two", "x").await;
    let reply_id = create_reply(&app, "g", &first, "mine", "pw").await;

    let (_, body) = send_text(
        &app,
        Method::PUT,
        "/api/replies/g",
        &format!("thread_id={second}&reply_id={reply_id}"),
    )
    .await;
    assert_eq!(body, "Incorrect thread_id or reply_id");
}
