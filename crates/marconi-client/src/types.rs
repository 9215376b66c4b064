use crate::errors::{QueueClientError, QueueClientResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

/// Per-process client identity sent as the `Client-ID` header.
///
/// The service uses it to keep a client's own posts out of its stream unless
/// echo is requested. Generate it once and reuse it across restarts via
/// [`ClientId::load_or_create`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(Uuid);

impl ClientId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn load_or_create<P: AsRef<Path>>(path: P) -> QueueClientResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            let raw = fs::read_to_string(path).map_err(|err| {
                QueueClientError::InvalidInput(format!(
                    "read client id file '{}' failed: {err}",
                    path.display()
                ))
            })?;
            return raw.trim().parse();
        }

        let client_id = Self::generate();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                QueueClientError::InvalidInput(format!(
                    "create client id directory '{}' failed: {err}",
                    parent.display()
                ))
            })?;
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, format!("{client_id}\n")).map_err(|err| {
            QueueClientError::InvalidInput(format!("write client id file failed: {err}"))
        })?;
        fs::rename(&tmp, path).map_err(|err| {
            QueueClientError::InvalidInput(format!("rename client id file failed: {err}"))
        })?;
        tracing::debug!(client_id = %client_id, path = %path.display(), "persisted new client id");
        Ok(client_id)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for ClientId {
    type Err = QueueClientError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value).map(Self).map_err(|err| {
            QueueClientError::InvalidInput(format!("client id must be a canonical UUID: {err}"))
        })
    }
}

/// A message to be posted. Only lives for the duration of a create call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessageDraft {
    pub ttl: u32,
    pub body: Value,
}

impl MessageDraft {
    pub fn new(body: impl Into<Value>, ttl: u32) -> Self {
        Self {
            ttl,
            body: body.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub href: String,
    pub ttl: u32,
    pub age: u64,
    pub body: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
}

impl Link {
    /// Percent-decoded value of `key` in the href's query string.
    pub fn query_value(&self, key: &str) -> Option<String> {
        let (_, query) = self.href.split_once('?')?;
        let query = query.split('#').next().unwrap_or(query);
        query.split('&').find_map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            (name == key).then(|| {
                urlencoding::decode(value)
                    .map(|decoded| decoded.into_owned())
                    .unwrap_or_else(|_| value.to_string())
            })
        })
    }
}

/// One page of a queue's messages plus the links to continue from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageStream {
    pub messages: Vec<Message>,
    pub links: Vec<Link>,
}

impl MessageStream {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn next_link(&self) -> Option<&Link> {
        self.links.iter().find(|link| link.rel == "next")
    }

    /// Marker of the newer side of this page, if the service returned one.
    pub fn next_marker(&self) -> Option<String> {
        self.next_link()
            .and_then(|link| link.query_value("marker"))
            .filter(|marker| !marker.is_empty())
    }

    /// Options for requesting the page after this one. Falls back to the
    /// given options unchanged when there is no next marker.
    pub fn next_options(&self, current: &StreamOptions) -> StreamOptions {
        match self.next_marker() {
            Some(marker) => current.clone().marker(marker),
            None => current.clone(),
        }
    }
}

impl IntoIterator for MessageStream {
    type Item = Message;
    type IntoIter = std::vec::IntoIter<Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.into_iter()
    }
}

/// Identifiers assigned to freshly created messages, in submission order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagesCreated {
    pub ids: Vec<String>,
    pub resources: Vec<String>,
    pub partial: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamOptions {
    pub limit: Option<u32>,
    pub marker: Option<String>,
    pub echo: Option<bool>,
    pub include_claimed: Option<bool>,
}

impl StreamOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = Some(marker.into());
        self
    }

    pub fn echo(mut self, echo: bool) -> Self {
        self.echo = Some(echo);
        self
    }

    pub fn include_claimed(mut self, include_claimed: bool) -> Self {
        self.include_claimed = Some(include_claimed);
        self
    }

    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(marker) = &self.marker {
            pairs.push(("marker".to_string(), marker.clone()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(echo) = self.echo {
            pairs.push(("echo".to_string(), echo.to_string()));
        }
        if let Some(include_claimed) = self.include_claimed {
            pairs.push(("include_claimed".to_string(), include_claimed.to_string()));
        }
        pairs
    }
}

/// Last path segment of a resource href, without any query string.
pub fn id_from_href(href: &str) -> String {
    let path = href.split(['?', '#']).next().unwrap_or(href);
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}
