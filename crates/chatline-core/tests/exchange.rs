use std::sync::Arc;

use axum::{http::StatusCode, routing::post, Json, Router};
use chatline_core::error::ERROR_PREFIX;
use chatline_core::{ChatController, HttpTransport, Sender, SubmitOutcome};
use serde_json::{json, Value};

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/api/chat", addr)
}

fn controller_for(url: &str) -> ChatController {
    let transport = HttpTransport::new(url, None).unwrap();
    ChatController::new(Arc::new(transport))
}

fn tail(controller: &ChatController) -> Vec<(Sender, String)> {
    let messages = controller.transcript().as_slice();
    messages[messages.len().saturating_sub(2)..]
        .iter()
        .map(|m| (m.sender(), m.text().to_string()))
        .collect()
}

#[tokio::test]
async fn hello_reply_is_rendered() {
    let router = Router::new().route(
        "/api/chat",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body, json!({ "message": "Hi" }));
            Json(json!({ "reply": "Hello!" }))
        }),
    );
    let mut controller = controller_for(&serve(router).await);

    controller.set_input("Hi");
    assert_eq!(controller.submit().await, SubmitOutcome::Replied);

    assert_eq!(
        tail(&controller),
        vec![
            (Sender::User, "Hi".to_string()),
            (Sender::Remote, "Hello!".to_string()),
        ]
    );
    assert!(controller.view().input_enabled);
    assert!(!controller.view().indicator_visible);
}

#[tokio::test]
async fn server_error_is_rendered_with_status() {
    let router = Router::new().route(
        "/api/chat",
        post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let mut controller = controller_for(&serve(router).await);

    controller.set_input("Test");
    assert_eq!(controller.submit().await, SubmitOutcome::Failed);

    let rows = tail(&controller);
    assert_eq!(rows[0], (Sender::User, "Test".to_string()));
    assert_eq!(rows[1].0, Sender::Remote);
    assert!(rows[1].1.starts_with(ERROR_PREFIX));
    assert!(rows[1].1.contains("500"));
    assert!(controller.view().send_enabled);
}

#[tokio::test]
async fn refused_connection_is_rendered_with_description() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/api/chat", listener.local_addr().unwrap());
    drop(listener);
    let mut controller = controller_for(&url);

    controller.set_input("Test2");
    assert_eq!(controller.submit().await, SubmitOutcome::Failed);

    let rows = tail(&controller);
    assert_eq!(rows[0], (Sender::User, "Test2".to_string()));
    assert_eq!(rows[1].0, Sender::Remote);
    assert!(rows[1].1.starts_with(ERROR_PREFIX));
    assert!(rows[1].1.contains("could not reach"));
    assert!(rows[1].1.contains(&url));
    assert!(rows[1].1.to_lowercase().contains("connection refused"));
    assert!(controller.view().input_enabled);
}

#[tokio::test]
async fn conversation_keeps_working_after_a_failure() {
    let router = Router::new().route(
        "/api/chat",
        post(|Json(body): Json<Value>| async move {
            match body["message"].as_str() {
                Some("fail") => (StatusCode::SERVICE_UNAVAILABLE, Json(json!({}))),
                Some(other) => (StatusCode::OK, Json(json!({ "reply": other.to_uppercase() }))),
                None => (StatusCode::BAD_REQUEST, Json(json!({ "error": "missing" }))),
            }
        }),
    );
    let mut controller = controller_for(&serve(router).await);

    for input in ["first", "fail", "  last  "] {
        controller.set_input(input);
        controller.submit().await;
    }

    let texts: Vec<&str> = controller.transcript().iter().map(|m| m.text()).collect();
    assert_eq!(texts.len(), 6);
    assert_eq!(texts[0..2], ["first", "FIRST"]);
    assert!(texts[3].contains("503"));
    assert_eq!(texts[4..6], ["last", "LAST"]);
}
