use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::ChatError;

/// Anything that can carry one message to the chat endpoint and bring a reply back
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, message: &str) -> Result<String, ChatError>;

    /// Human-readable target shown in the UI header
    fn describe(&self) -> String;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// JSON-over-HTTP transport: POST `{"message": ...}`, read `{"reply": ...}`
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
    timeout: Option<Duration>,
}

impl HttpTransport {
    pub fn new(endpoint: &str, timeout: Option<Duration>) -> Result<Self, ChatError> {
        let endpoint = parse_endpoint(endpoint)?;
        Ok(Self {
            client: Client::new(),
            endpoint,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Accept only absolute http(s) URLs
pub fn parse_endpoint(raw: &str) -> Result<Url, ChatError> {
    let url = Url::parse(raw.trim()).map_err(|_| ChatError::InvalidEndpoint(raw.to_string()))?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(ChatError::InvalidEndpoint(raw.to_string())),
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send(&self, message: &str) -> Result<String, ChatError> {
        let url = self.endpoint.as_str();
        debug!(%url, chars = message.chars().count(), "posting chat message");

        let mut request = self.client.post(self.endpoint.clone()).json(&ChatRequest { message });
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| self.map_reqwest(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_reqwest(e))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .map(|b| b.error)
                .filter(|e| !e.is_empty());
            return Err(ChatError::Status { status, detail });
        }

        let body: Value = serde_json::from_str(&body)?;
        debug!(%status, "chat reply received");
        Ok(reply_text(&body))
    }

    fn describe(&self) -> String {
        self.endpoint.to_string()
    }
}

/// Text of the `reply` field. Missing or null is blank, other non-strings show as JSON.
fn reply_text(body: &Value) -> String {
    match body.get("reply") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

impl HttpTransport {
    fn map_reqwest(&self, err: reqwest::Error) -> ChatError {
        let url = self.endpoint.to_string();
        match self.timeout {
            Some(after) if err.is_timeout() => ChatError::Timeout { url, after },
            _ => ChatError::Transport { url, source: err },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::json;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/api/chat", addr)
    }

    #[test]
    fn test_parse_endpoint_accepts_http_and_https() {
        assert!(parse_endpoint("http://localhost:5000/api/chat").is_ok());
        assert!(parse_endpoint("https://example.com/chat").is_ok());
        assert!(parse_endpoint("  http://localhost:5000/api/chat  ").is_ok());
    }

    #[test]
    fn test_parse_endpoint_rejects_other_schemes() {
        assert!(matches!(
            parse_endpoint("ftp://example.com"),
            Err(ChatError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            parse_endpoint("localhost:5000"),
            Err(ChatError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            parse_endpoint(""),
            Err(ChatError::InvalidEndpoint(_))
        ));
    }

    #[tokio::test]
    async fn test_posts_message_field_and_reads_reply() {
        let router = Router::new().route(
            "/api/chat",
            post(|Json(body): Json<Value>| async move {
                let message = body["message"].as_str().unwrap_or_default().to_string();
                Json(json!({ "reply": format!("echo: {message}") }))
            }),
        );
        let transport = HttpTransport::new(&serve(router).await, None).unwrap();

        let reply = transport.send("Hi").await.unwrap();
        assert_eq!(reply, "echo: Hi");
    }

    #[tokio::test]
    async fn test_missing_reply_is_blank() {
        let router = Router::new().route(
            "/api/chat",
            post(|| async { Json(json!({ "answer": "wrong field" })) }),
        );
        let transport = HttpTransport::new(&serve(router).await, None).unwrap();

        assert_eq!(transport.send("Hi").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_unexpected_json_shapes_render_without_failing() {
        let cases = [
            ("null", ""),
            ("[]", ""),
            ("\"hi\"", ""),
            (r#"{"reply": null}"#, ""),
            (r#"{"reply": 42}"#, "42"),
            (r#"{"reply": true}"#, "true"),
            (r#"{"reply": ["a", 1]}"#, r#"["a",1]"#),
        ];
        for (body, expected) in cases {
            let router = Router::new().route(
                "/api/chat",
                post(move || async move {
                    ([(axum::http::header::CONTENT_TYPE, "application/json")], body)
                }),
            );
            let transport = HttpTransport::new(&serve(router).await, None).unwrap();

            let reply = transport.send("Hi").await.unwrap();
            assert_eq!(reply, expected, "body {body}");
        }
    }

    #[test]
    fn test_reply_text_shapes() {
        assert_eq!(reply_text(&json!({ "reply": "Hello!" })), "Hello!");
        assert_eq!(reply_text(&json!({ "answer": "x" })), "");
        assert_eq!(reply_text(&json!({ "reply": 4.5 })), "4.5");
        assert_eq!(reply_text(&json!("top-level string")), "");
    }

    #[tokio::test]
    async fn test_server_error_status() {
        let router = Router::new().route(
            "/api/chat",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let transport = HttpTransport::new(&serve(router).await, None).unwrap();

        let err = transport.send("Test").await.unwrap_err();
        match &err {
            ChatError::Status { status, detail } => {
                assert_eq!(status.as_u16(), 500);
                assert!(detail.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_error_field_is_surfaced() {
        let router = Router::new().route(
            "/api/chat",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "Missing 'message' field in request" })),
                )
            }),
        );
        let transport = HttpTransport::new(&serve(router).await, None).unwrap();

        let err = transport.send("x").await.unwrap_err();
        assert!(err.to_string().contains("400"));
        assert!(err.to_string().contains("Missing 'message' field"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let router = Router::new().route("/api/chat", post(|| async { "not json" }));
        let transport = HttpTransport::new(&serve(router).await, None).unwrap();

        let err = transport.send("Hi").await.unwrap_err();
        assert!(matches!(err, ChatError::Decode(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/api/chat", listener.local_addr().unwrap());
        drop(listener);

        let transport = HttpTransport::new(&url, None).unwrap();
        let err = transport.send("Test2").await.unwrap_err();
        assert!(matches!(err, ChatError::Transport { .. }));
        assert!(err.to_string().starts_with("could not reach"));
        assert!(err.to_string().to_lowercase().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_slow_endpoint_times_out() {
        let router = Router::new().route(
            "/api/chat",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({ "reply": "late" }))
            }),
        );
        let transport =
            HttpTransport::new(&serve(router).await, Some(Duration::from_millis(100))).unwrap();

        let err = transport.send("Hi").await.unwrap_err();
        assert!(matches!(err, ChatError::Timeout { .. }));
    }
}
