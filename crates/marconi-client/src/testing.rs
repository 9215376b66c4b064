use crate::binders::CLIENT_ID_HEADER;
use crate::errors::{QueueClientError, QueueClientResult};
use crate::transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use crate::types::MessageDraft;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Instant;

pub const MOCK_ENDPOINT: &str = "http://marconi.mock/v1";
pub const DEFAULT_STREAM_LIMIT: usize = 10;
pub const MAX_STREAM_LIMIT: usize = 20;
pub const MAX_MESSAGES_PER_POST: usize = 10;
pub const MIN_TTL: u32 = 60;
pub const MAX_TTL: u32 = 1_209_600;

/// In-memory stand-in for a Marconi v1 message service.
///
/// Implements [`HttpTransport`] so a [`crate::MessageApi`] can run against it
/// unchanged. Queues must be created up front; requests for unknown queues
/// and messages answer 404 the way the real service does.
#[derive(Clone, Debug)]
pub struct MockQueue {
    endpoint: String,
    inner: Arc<Mutex<MockQueueState>>,
}

#[derive(Debug, Default)]
struct MockQueueState {
    next_message_id: u64,
    queues: BTreeMap<String, Vec<StoredMessage>>,
    requests: Vec<HttpRequest>,
    injected: VecDeque<u16>,
}

#[derive(Clone, Debug)]
struct StoredMessage {
    id: String,
    ttl: u32,
    body: Value,
    client_id: String,
    created_at: Instant,
}

impl StoredMessage {
    fn age(&self) -> u64 {
        self.created_at.elapsed().as_secs()
    }

    fn is_live(&self) -> bool {
        self.age() < u64::from(self.ttl)
    }
}

impl Default for MockQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MockQueue {
    pub fn new() -> Self {
        Self::with_endpoint(MOCK_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            inner: Arc::new(Mutex::new(MockQueueState::default())),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn create_queue(&self, name: &str) {
        if let Ok(mut state) = self.inner.lock() {
            state.queues.entry(name.to_string()).or_default();
        }
    }

    pub fn delete_queue(&self, name: &str) {
        if let Ok(mut state) = self.inner.lock() {
            state.queues.remove(name);
        }
    }

    /// Number of live messages in `queue`, or `None` if it does not exist.
    pub fn message_count(&self, queue: &str) -> Option<usize> {
        let state = self.inner.lock().ok()?;
        state
            .queues
            .get(queue)
            .map(|messages| messages.iter().filter(|message| message.is_live()).count())
    }

    /// Makes the next request answer with `status` instead of being served.
    pub fn fail_next(&self, status: u16) {
        if let Ok(mut state) = self.inner.lock() {
            state.injected.push_back(status);
        }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.inner
            .lock()
            .map(|state| state.requests.clone())
            .unwrap_or_default()
    }

    fn href_prefix(&self) -> &str {
        let without_scheme = self
            .endpoint
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.endpoint);
        without_scheme
            .find('/')
            .map(|index| &without_scheme[index..])
            .unwrap_or("")
    }

    fn message_href(&self, queue: &str, id: &str) -> String {
        format!("{}/queues/{queue}/messages/{id}", self.href_prefix())
    }

    fn message_json(&self, queue: &str, message: &StoredMessage) -> Value {
        json!({
            "href": self.message_href(queue, &message.id),
            "ttl": message.ttl,
            "age": message.age(),
            "body": message.body,
        })
    }

    fn route(&self, request: &HttpRequest) -> Option<(String, Option<String>)> {
        let path = request.url.strip_prefix(&self.endpoint)?;
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        match segments.as_slice() {
            ["queues", queue, "messages"] => Some((queue.to_string(), None)),
            ["queues", queue, "messages", id] => Some((queue.to_string(), Some(id.to_string()))),
            _ => None,
        }
    }

    fn serve(&self, state: &mut MockQueueState, request: &HttpRequest) -> HttpResponse {
        let Some((queue, message_id)) = self.route(request) else {
            return HttpResponse::new(404, "no such resource");
        };
        let Some(client_id) = request.header(CLIENT_ID_HEADER).map(str::to_string) else {
            return HttpResponse::new(400, "missing Client-ID header");
        };
        if !state.queues.contains_key(&queue) {
            return HttpResponse::new(404, "queue not found");
        }

        match (request.method, message_id) {
            (HttpMethod::Post, None) => self.post_messages(state, &queue, &client_id, request),
            (HttpMethod::Get, Some(id)) => self.get_message(state, &queue, &id),
            (HttpMethod::Get, None) if request.query_value("ids").is_some() => {
                self.list_messages(state, &queue, request)
            }
            (HttpMethod::Get, None) => self.stream_messages(state, &queue, &client_id, request),
            (HttpMethod::Delete, None) => self.delete_messages(state, &queue, request),
            _ => HttpResponse::new(405, "method not allowed"),
        }
    }

    fn post_messages(
        &self,
        state: &mut MockQueueState,
        queue: &str,
        client_id: &str,
        request: &HttpRequest,
    ) -> HttpResponse {
        let drafts: Vec<MessageDraft> = match request
            .body
            .as_deref()
            .map(serde_json::from_slice::<Vec<MessageDraft>>)
            .transpose()
        {
            Ok(Some(drafts)) => drafts,
            Ok(None) => return HttpResponse::new(400, "missing body"),
            Err(err) => return HttpResponse::new(400, format!("malformed body: {err}")),
        };
        if drafts.is_empty() || drafts.len() > MAX_MESSAGES_PER_POST {
            return HttpResponse::new(
                400,
                format!("between 1 and {MAX_MESSAGES_PER_POST} messages per request"),
            );
        }
        if let Some(draft) = drafts
            .iter()
            .find(|draft| !(MIN_TTL..=MAX_TTL).contains(&draft.ttl))
        {
            return HttpResponse::new(400, format!("ttl {} out of range", draft.ttl));
        }

        let mut resources = Vec::with_capacity(drafts.len());
        for draft in drafts {
            state.next_message_id += 1;
            let id = format!("{:024x}", state.next_message_id);
            resources.push(self.message_href(queue, &id));
            if let Some(messages) = state.queues.get_mut(queue) {
                messages.push(StoredMessage {
                    id,
                    ttl: draft.ttl,
                    body: draft.body,
                    client_id: client_id.to_string(),
                    created_at: Instant::now(),
                });
            }
        }
        HttpResponse::json(201, &json!({"partial": false, "resources": resources}))
    }

    fn get_message(&self, state: &MockQueueState, queue: &str, id: &str) -> HttpResponse {
        state
            .queues
            .get(queue)
            .and_then(|messages| {
                messages
                    .iter()
                    .find(|message| message.id == id && message.is_live())
            })
            .map(|message| HttpResponse::json(200, &self.message_json(queue, message)))
            .unwrap_or_else(|| HttpResponse::new(404, "message not found"))
    }

    fn list_messages(
        &self,
        state: &MockQueueState,
        queue: &str,
        request: &HttpRequest,
    ) -> HttpResponse {
        let ids = request.query_value("ids").unwrap_or_default();
        let messages = state.queues.get(queue).map(Vec::as_slice).unwrap_or(&[]);
        let found: Vec<Value> = ids
            .split(',')
            .filter_map(|id| {
                messages
                    .iter()
                    .find(|message| message.id == id && message.is_live())
            })
            .map(|message| self.message_json(queue, message))
            .collect();
        if found.is_empty() {
            return HttpResponse::empty(204);
        }
        HttpResponse::json(200, &Value::Array(found))
    }

    fn stream_messages(
        &self,
        state: &MockQueueState,
        queue: &str,
        client_id: &str,
        request: &HttpRequest,
    ) -> HttpResponse {
        let limit = match request.query_value("limit").map(str::parse::<usize>) {
            None => DEFAULT_STREAM_LIMIT,
            Some(Ok(limit)) if (1..=MAX_STREAM_LIMIT).contains(&limit) => limit,
            Some(_) => {
                return HttpResponse::new(400, format!("limit must be 1..={MAX_STREAM_LIMIT}"));
            }
        };
        let echo = request.query_value("echo") == Some("true");
        let marker = request.query_value("marker").unwrap_or_default();

        let messages = state.queues.get(queue).map(Vec::as_slice).unwrap_or(&[]);
        let page: Vec<&StoredMessage> = messages
            .iter()
            .filter(|message| message.is_live())
            .filter(|message| message.id.as_str() > marker)
            .filter(|message| echo || message.client_id != client_id)
            .take(limit)
            .collect();
        let Some(last) = page.last() else {
            return HttpResponse::empty(204);
        };

        let next = format!(
            "{}/queues/{queue}/messages?marker={}&limit={limit}&echo={echo}",
            self.href_prefix(),
            urlencoding::encode(&last.id)
        );
        let messages: Vec<Value> = page
            .iter()
            .map(|message| self.message_json(queue, message))
            .collect();
        HttpResponse::json(
            200,
            &json!({
                "links": [{"rel": "next", "href": next}],
                "messages": messages,
            }),
        )
    }

    fn delete_messages(
        &self,
        state: &mut MockQueueState,
        queue: &str,
        request: &HttpRequest,
    ) -> HttpResponse {
        let Some(ids) = request.query_value("ids") else {
            return HttpResponse::new(400, "ids query parameter is required");
        };
        let ids: Vec<&str> = ids.split(',').collect();
        if let Some(messages) = state.queues.get_mut(queue) {
            messages.retain(|message| !ids.contains(&message.id.as_str()));
        }
        HttpResponse::empty(204)
    }
}

#[async_trait]
impl HttpTransport for MockQueue {
    async fn send(&self, request: HttpRequest) -> QueueClientResult<HttpResponse> {
        let mut state = self
            .inner
            .lock()
            .map_err(|_| QueueClientError::Transport("mock queue mutex poisoned".to_string()))?;
        state.requests.push(request.clone());
        if let Some(status) = state.injected.pop_front() {
            return Ok(HttpResponse::new(status, "injected failure"));
        }
        Ok(self.serve(&mut state, &request))
    }
}
