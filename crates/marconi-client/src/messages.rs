use crate::auth::RequestFilter;
use crate::binders::Bindings;
use crate::errors::QueueClientResult;
use crate::fallback::FromFallback;
use crate::operation::{
    MESSAGE_CREATE, MESSAGE_DELETE, MESSAGE_GET, MESSAGE_LIST, MESSAGE_STREAM,
    OperationDescriptor, execute,
};
use crate::transport::HttpTransport;
use crate::types::{ClientId, Message, MessageDraft, MessageStream, MessagesCreated, StreamOptions};
use std::sync::Arc;

/// Message operations for a single queue.
///
/// Requests go to `{endpoint}/queues/{queue}/messages`. Every call is one
/// HTTP round trip; a 404 from the service yields the operation's empty
/// value rather than an error.
#[derive(Clone)]
pub struct MessageApi {
    transport: Arc<dyn HttpTransport>,
    filters: Vec<Arc<dyn RequestFilter>>,
    queue_url: String,
}

impl MessageApi {
    pub fn new(transport: Arc<dyn HttpTransport>, endpoint: &str, queue: &str) -> Self {
        Self::with_queue_url(transport, queue_url(endpoint, queue))
    }

    pub fn with_queue_url(transport: Arc<dyn HttpTransport>, queue_url: impl Into<String>) -> Self {
        Self {
            transport,
            filters: Vec::new(),
            queue_url: queue_url.into(),
        }
    }

    pub fn with_filter(mut self, filter: Arc<dyn RequestFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn add_filter(&mut self, filter: Arc<dyn RequestFilter>) {
        self.filters.push(filter);
    }

    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }

    /// Posts `messages` in one request. `None` means the queue does not exist.
    ///
    /// The per-request message limit is a provider setting and is enforced
    /// by the service, not here.
    pub async fn create(
        &self,
        client_id: ClientId,
        messages: &[MessageDraft],
    ) -> QueueClientResult<Option<MessagesCreated>> {
        let bindings = Bindings::for_client(client_id).json(messages)?;
        self.run(&MESSAGE_CREATE, bindings).await
    }

    /// Fetches one page of messages. Continue with
    /// [`MessageStream::next_options`]; this call never loops.
    pub async fn stream(
        &self,
        client_id: ClientId,
        options: Option<&StreamOptions>,
    ) -> QueueClientResult<MessageStream> {
        let bindings = Bindings::for_client(client_id).stream_options(options);
        self.run(&MESSAGE_STREAM, bindings).await
    }

    /// Fetches specific messages, including ones this client posted.
    pub async fn list<I, S>(&self, client_id: ClientId, ids: I) -> QueueClientResult<Vec<Message>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let bindings = Bindings::for_client(client_id).ids(ids);
        self.run(&MESSAGE_LIST, bindings).await
    }

    pub async fn get(&self, client_id: ClientId, id: &str) -> QueueClientResult<Option<Message>> {
        let bindings = Bindings::for_client(client_id).path_param("message_id", id);
        self.run(&MESSAGE_GET, bindings).await
    }

    /// Bulk delete. Unknown or malformed ids are skipped by the service;
    /// `false` only when the queue itself is not found.
    pub async fn delete<I, S>(&self, client_id: ClientId, ids: I) -> QueueClientResult<bool>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let bindings = Bindings::for_client(client_id).ids(ids);
        self.run(&MESSAGE_DELETE, bindings).await
    }

    async fn run<T: FromFallback>(
        &self,
        descriptor: &OperationDescriptor<T>,
        bindings: Bindings,
    ) -> QueueClientResult<T> {
        execute(
            self.transport.as_ref(),
            &self.filters,
            &self.queue_url,
            descriptor,
            bindings,
        )
        .await
    }
}

impl std::fmt::Debug for MessageApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageApi")
            .field("queue_url", &self.queue_url)
            .field("filters", &self.filters.len())
            .finish()
    }
}

pub fn queue_url(endpoint: &str, queue: &str) -> String {
    format!("{}/queues/{}", endpoint.trim_end_matches('/'), queue)
}
