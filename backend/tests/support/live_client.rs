//! HTTP and event-stream client helpers for tests against a spawned server.
//!
//! Integration tests compile as separate crates, so each one pulls this file
//! in with `#[path]`.

use std::time::Duration;

use actix_web::http::{StatusCode, header};
use actix_web::web::Bytes;
use awc::Client;
use awc::error::PayloadError;
use citizens_backend::test_support::TestServer;
use futures::{Stream, StreamExt};
use serde_json::{Value, json};
use tokio::time::{Instant, timeout};

/// Register an account and return `(token, user)`.
pub async fn register(client: &Client, server: &TestServer, email: &str) -> (String, Value) {
    let mut response = client
        .post(server.url("/auth/register"))
        .send_json(&json!({"email": email, "password": "correct horse"}))
        .await
        .expect("register request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let session: Value = response.json().await.expect("session body");
    let token = session["token"].as_str().expect("token").to_owned();
    (token, session["user"].clone())
}

/// Create an incident from a JSON body, optionally authenticated.
pub async fn create_incident(
    client: &Client,
    server: &TestServer,
    token: Option<&str>,
    body: Value,
) -> Value {
    let mut request = client.post(server.url("/api/incidents"));
    if let Some(token) = token {
        request = request.insert_header((header::AUTHORIZATION, format!("Bearer {token}")));
    }
    let mut response = request.send_json(&body).await.expect("create request");
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("incident body")
}

/// Reads a `text/event-stream` body one frame at a time.
pub struct EventReader<S> {
    body: S,
    buffer: String,
}

impl<S> EventReader<S>
where
    S: Stream<Item = Result<Bytes, PayloadError>> + Unpin,
{
    pub fn new(body: S) -> Self {
        Self {
            body,
            buffer: String::new(),
        }
    }

    /// Next complete frame without its blank-line terminator, or `None` if
    /// nothing arrives within `wait`.
    pub async fn next_frame(&mut self, wait: Duration) -> Option<String> {
        let deadline = Instant::now() + wait;
        loop {
            if let Some(end) = self.buffer.find("\n\n") {
                let frame = self.buffer[..end].to_owned();
                self.buffer.drain(..end + 2);
                return Some(frame);
            }
            let remaining = deadline.checked_duration_since(Instant::now())?;
            match timeout(remaining, self.body.next()).await {
                Ok(Some(chunk)) => {
                    let chunk = chunk.expect("stream chunk");
                    self.buffer
                        .push_str(std::str::from_utf8(&chunk).expect("utf-8 frame"));
                }
                Ok(None) | Err(_) => return None,
            }
        }
    }

    /// Next `data:` frame's JSON payload, skipping comments and `retry:`.
    pub async fn next_event(&mut self, wait: Duration) -> Option<(String, Value)> {
        let deadline = Instant::now() + wait;
        loop {
            let remaining = deadline.checked_duration_since(Instant::now())?;
            let frame = self.next_frame(remaining).await?;
            if let Some(raw) = frame.strip_prefix("data: ") {
                let value = serde_json::from_str(raw).expect("event JSON");
                return Some((raw.to_owned(), value));
            }
        }
    }
}

/// Open the live feed and consume its `retry:` preamble.
pub async fn subscribe(
    client: &Client,
    server: &TestServer,
) -> EventReader<impl Stream<Item = Result<Bytes, PayloadError>> + Unpin + use<>> {
    let response = client
        .get(server.url("/api/incidents/stream"))
        .insert_header((header::ACCEPT, "text/event-stream"))
        .send()
        .await
        .expect("stream request");
    assert_eq!(response.status(), StatusCode::OK);
    let mut reader = EventReader::new(response);
    let preamble = reader
        .next_frame(Duration::from_secs(2))
        .await
        .expect("retry preamble");
    assert!(preamble.starts_with("retry: "), "unexpected preamble {preamble:?}");
    reader
}
