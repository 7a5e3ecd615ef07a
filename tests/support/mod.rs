#![allow(dead_code)]

use std::collections::VecDeque;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use portpicker::pick_unused_port;
use reqwest::Client;
use tokio::net::TcpListener;
use tokio::time::sleep;

pub const BIN: &str = "leaderboard-watch";

pub struct TestServer {
    child: Child,
    base_url: String,
}

impl TestServer {
    pub async fn spawn(envs: &[(&str, &str)]) -> Self {
        let port = pick_unused_port().expect("free port");
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin(BIN));
        cmd.env("PORT", port.to_string())
            .env("RUST_LOG", "warn")
            .envs(envs.iter().copied())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let child = cmd.spawn().expect("spawn leaderboard-watch");
        let base_url = format!("http://127.0.0.1:{}", port);
        wait_for_ready(&base_url).await;

        Self { child, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

async fn wait_for_ready(base_url: &str) {
    let client = Client::new();
    let health_url = format!("{}/health", base_url);
    for _ in 0..50 {
        if let Ok(response) = client.get(&health_url).send().await {
            if response.status().is_success() {
                return;
            }
        }
        sleep(Duration::from_millis(100)).await;
    }
    panic!("server did not become ready at {}", health_url);
}

/// Fake leaderboard API. Replies are served in order; once they run out the
/// last one repeats.
pub struct Upstream {
    api_base: String,
    hits: Arc<Mutex<Vec<String>>>,
}

#[derive(Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub retry_after: Option<&'static str>,
    pub body: serde_json::Value,
}

impl Reply {
    pub fn ok(body: serde_json::Value) -> Self {
        Self {
            status: StatusCode::OK,
            retry_after: None,
            body,
        }
    }

    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            retry_after: None,
            body: serde_json::json!({ "error": "Player not found" }),
        }
    }

    pub fn rate_limited(retry_after: &'static str) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            retry_after: Some(retry_after),
            body: serde_json::json!({ "error": "Rate limit exceeded. Please try again later." }),
        }
    }
}

impl Upstream {
    pub async fn spawn(replies: Vec<Reply>) -> Self {
        let queue = Arc::new(Mutex::new(VecDeque::from(replies)));
        let hits = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&hits);
        let app = Router::new().fallback(move |uri: axum::http::Uri| {
            let queue = Arc::clone(&queue);
            let seen = Arc::clone(&seen);
            async move {
                seen.lock().expect("hits").push(uri.path().to_string());
                let reply = {
                    let mut queue = queue.lock().expect("queue");
                    if queue.len() > 1 {
                        queue.pop_front()
                    } else {
                        queue.front().cloned()
                    }
                };
                into_response(reply)
            }
        });

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind upstream");
        let addr = listener.local_addr().expect("upstream addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("upstream server");
        });

        Self {
            api_base: format!("http://{}/api", addr),
            hits,
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().expect("hits").clone()
    }
}

fn into_response(reply: Option<Reply>) -> Response {
    let reply = match reply {
        Some(reply) => reply,
        None => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };
    let mut response = (reply.status, axum::Json(reply.body)).into_response();
    if let Some(retry_after) = reply.retry_after {
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from_static(retry_after));
    }
    response
}

pub fn leaderboard_body() -> serde_json::Value {
    serde_json::json!({
        "leaderboard": [
            { "rank": 1, "username": "alice", "total_score": 500 },
            { "rank": 2, "username": "bob", "total_score": 300 }
        ],
        "count": 2
    })
}
