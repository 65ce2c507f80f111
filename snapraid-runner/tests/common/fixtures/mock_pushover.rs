//! Mock Pushover endpoint for testing notification delivery

use serde_json::Value;
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

pub struct MockPushoverServer {
    pub server: MockServer,
}

impl MockPushoverServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn messages_url(&self) -> String {
        format!("{}/1/messages.json", self.server.uri())
    }

    /// Accept every message like the real API does
    pub async fn mock_success(&self) {
        Mock::given(method("POST"))
            .and(path("/1/messages.json"))
            .and(header("content-type", "application/json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"status": 1, "request": "test-request"})),
            )
            .mount(&self.server)
            .await;
    }

    /// Reject every message with `status_code`
    pub async fn mock_failure(&self, status_code: u16) {
        Mock::given(method("POST"))
            .and(path("/1/messages.json"))
            .respond_with(
                ResponseTemplate::new(status_code)
                    .set_body_json(serde_json::json!({"status": 0, "errors": ["invalid token"]})),
            )
            .mount(&self.server)
            .await;
    }

    /// Bodies of every request received so far
    pub async fn received_bodies(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|request| request.body_json::<Value>().ok())
            .collect()
    }
}
