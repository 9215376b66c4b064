use crate::errors::{QueueClientError, QueueClientResult};
use crate::transport::HttpResponse;
use crate::types::{Link, Message, MessageStream, MessagesCreated, id_from_href};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    id: Option<String>,
    href: String,
    #[serde(default)]
    ttl: u32,
    #[serde(default)]
    age: u64,
    #[serde(default)]
    body: Value,
}

impl From<WireMessage> for Message {
    fn from(wire: WireMessage) -> Self {
        let id = wire
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| id_from_href(&wire.href));
        Message {
            id,
            href: wire.href,
            ttl: wire.ttl,
            age: wire.age,
            body: wire.body,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireMessagesCreated {
    #[serde(default)]
    partial: bool,
    #[serde(default)]
    resources: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WireMessageStream {
    #[serde(default)]
    links: Vec<Link>,
    #[serde(default)]
    messages: Vec<WireMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireMessageList {
    Bare(Vec<WireMessage>),
    Wrapped { messages: Vec<WireMessage> },
}

fn decode<T: DeserializeOwned>(response: &HttpResponse, what: &str) -> QueueClientResult<T> {
    serde_json::from_slice(&response.body)
        .map_err(|err| QueueClientError::Decode(format!("{what}: {err}")))
}

fn has_no_content(response: &HttpResponse) -> bool {
    response.status == 204 || response.body.iter().all(u8::is_ascii_whitespace)
}

pub fn parse_messages_created(
    response: HttpResponse,
) -> QueueClientResult<Option<MessagesCreated>> {
    let created: WireMessagesCreated = decode(&response, "messages created")?;
    let ids = created
        .resources
        .iter()
        .map(|href| id_from_href(href))
        .collect();
    Ok(Some(MessagesCreated {
        ids,
        resources: created.resources,
        partial: created.partial,
    }))
}

pub fn parse_message(response: HttpResponse) -> QueueClientResult<Option<Message>> {
    let message: WireMessage = decode(&response, "message")?;
    Ok(Some(message.into()))
}

pub fn parse_message_list(response: HttpResponse) -> QueueClientResult<Vec<Message>> {
    if has_no_content(&response) {
        return Ok(Vec::new());
    }
    let messages = match decode::<WireMessageList>(&response, "message list")? {
        WireMessageList::Bare(messages) | WireMessageList::Wrapped { messages } => messages,
    };
    Ok(messages.into_iter().map(Message::from).collect())
}

pub fn parse_message_stream(response: HttpResponse) -> QueueClientResult<MessageStream> {
    if has_no_content(&response) {
        return Ok(MessageStream::empty());
    }
    let page: WireMessageStream = decode(&response, "message stream")?;
    Ok(MessageStream {
        messages: page.messages.into_iter().map(Message::from).collect(),
        links: page.links,
    })
}

/// Delete carries no payload; any 2xx means the request was accepted.
pub fn parse_accepted(_response: HttpResponse) -> QueueClientResult<bool> {
    Ok(true)
}
