#![allow(dead_code)]

use httpmock::MockServer;
use marconi_client::{ClientId, MessageApi, MockQueue, ReqwestTransport, StaticTokenAuth};
use std::sync::Arc;

/// Tenant-scoped base path the mock server answers under.
pub const BASE_URI: &str = "/v1/da0d12be20394afb851716e10a49e4a7";
pub const AUTH_TOKEN: &str = "b3b4f4b6c1ba4ff1a2a3aa1d1ae4d0c8";
pub const CLIENT_ID: &str = "3381af92-2b9e-11e3-b191-71861300734c";
pub const OTHER_CLIENT_ID: &str = "8a7c2bdc-2b9e-11e3-b191-71861300734c";

pub fn client_id() -> ClientId {
    CLIENT_ID.parse().expect("fixture client id should parse")
}

pub fn other_client_id() -> ClientId {
    OTHER_CLIENT_ID.parse().expect("fixture client id should parse")
}

/// Wire-level harness: a real HTTP mock server plus a `MessageApi` bound to
/// one queue under [`BASE_URI`], authenticated with a static token.
pub struct MockApiHarness {
    pub server: MockServer,
    pub queue: String,
}

impl MockApiHarness {
    pub async fn start(queue: &str) -> Self {
        Self {
            server: MockServer::start_async().await,
            queue: queue.to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        self.server.url(BASE_URI)
    }

    pub fn messages_path(&self) -> String {
        format!("{BASE_URI}/queues/{}/messages", self.queue)
    }

    pub fn message_path(&self, id: &str) -> String {
        format!("{}/{id}", self.messages_path())
    }

    pub fn message_href(&self, id: &str) -> String {
        self.message_path(id)
    }

    pub fn api(&self) -> MessageApi {
        MessageApi::new(
            Arc::new(ReqwestTransport::new()),
            &self.endpoint(),
            &self.queue,
        )
        .with_filter(Arc::new(StaticTokenAuth::new(AUTH_TOKEN)))
    }
}

/// Semantic harness: an in-memory service with one existing queue.
pub fn mock_queue_api(queue: &str) -> (MockQueue, MessageApi) {
    let mock = MockQueue::new();
    mock.create_queue(queue);
    let api = MessageApi::new(Arc::new(mock.clone()), mock.endpoint(), queue);
    (mock, api)
}
