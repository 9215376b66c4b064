//! Static operation table and the generic execute routine.
//!
//! Each message operation is a const [`OperationDescriptor`]: HTTP method,
//! path template relative to the queue, response parser and not-found
//! fallback. [`execute`] is the only place that talks to the transport.

use crate::auth::RequestFilter;
use crate::binders::{Bindings, expand_path};
use crate::errors::{QueueClientError, QueueClientResult};
use crate::fallback::{Fallback, FromFallback};
use crate::parsers;
use crate::transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use crate::types::{Message, MessageStream, MessagesCreated};
use std::sync::Arc;

pub type ResponseParser<T> = fn(HttpResponse) -> QueueClientResult<T>;

#[derive(Debug)]
pub struct OperationDescriptor<T> {
    pub name: &'static str,
    pub method: HttpMethod,
    pub path: &'static str,
    pub fallback: Fallback,
    pub parser: ResponseParser<T>,
}

pub const MESSAGE_CREATE: OperationDescriptor<Option<MessagesCreated>> = OperationDescriptor {
    name: "message:create",
    method: HttpMethod::Post,
    path: "/messages",
    fallback: Fallback::Null,
    parser: parsers::parse_messages_created,
};

pub const MESSAGE_STREAM: OperationDescriptor<MessageStream> = OperationDescriptor {
    name: "message:stream",
    method: HttpMethod::Get,
    path: "/messages",
    fallback: Fallback::EmptyPage,
    parser: parsers::parse_message_stream,
};

pub const MESSAGE_LIST: OperationDescriptor<Vec<Message>> = OperationDescriptor {
    name: "message:list",
    method: HttpMethod::Get,
    path: "/messages",
    fallback: Fallback::EmptyList,
    parser: parsers::parse_message_list,
};

pub const MESSAGE_GET: OperationDescriptor<Option<Message>> = OperationDescriptor {
    name: "message:get",
    method: HttpMethod::Get,
    path: "/messages/{message_id}",
    fallback: Fallback::Null,
    parser: parsers::parse_message,
};

pub const MESSAGE_DELETE: OperationDescriptor<bool> = OperationDescriptor {
    name: "message:delete",
    method: HttpMethod::Delete,
    path: "/messages",
    fallback: Fallback::False,
    parser: parsers::parse_accepted,
};

/// Builds the request for `descriptor`, runs the filters, sends it and maps
/// the response. A 404 becomes the descriptor's fallback value; any other
/// non-2xx status is returned as [`QueueClientError::Status`].
pub async fn execute<T: FromFallback>(
    transport: &dyn HttpTransport,
    filters: &[Arc<dyn RequestFilter>],
    base_url: &str,
    descriptor: &OperationDescriptor<T>,
    bindings: Bindings,
) -> QueueClientResult<T> {
    let url = format!(
        "{}{}",
        base_url.trim_end_matches('/'),
        expand_path(descriptor.path, &bindings.path_params)
    );
    let mut request = HttpRequest::new(descriptor.method, url);
    request.set_header("Accept", "application/json");
    bindings.bind(&mut request);

    for filter in filters {
        filter.filter(&mut request).await?;
    }

    tracing::debug!(
        operation = descriptor.name,
        method = %request.method,
        url = %request.url,
        "sending queue request"
    );
    let response = transport.send(request).await?;

    if response.is_not_found() {
        tracing::debug!(
            operation = descriptor.name,
            fallback = ?descriptor.fallback,
            "not found, applying fallback"
        );
        return descriptor.fallback.apply(descriptor.name);
    }
    if !response.is_success() {
        tracing::warn!(
            operation = descriptor.name,
            status = response.status,
            "queue request failed"
        );
        return Err(QueueClientError::Status {
            status: response.status,
            body: response.text(),
        });
    }

    (descriptor.parser)(response)
}
