use crate::errors::{QueueClientError, QueueClientResult};
use crate::transport::HttpRequest;
use crate::types::{ClientId, StreamOptions};
use serde::Serialize;

pub const CLIENT_ID_HEADER: &str = "Client-ID";
pub const IDS_QUERY_PARAM: &str = "ids";

/// Parameter bindings for one operation call.
///
/// Each field maps onto exactly one part of the outgoing request; the
/// execute routine applies them in a fixed order.
#[derive(Clone, Debug, Default)]
pub struct Bindings {
    pub client_id: Option<ClientId>,
    pub path_params: Vec<(&'static str, String)>,
    pub query: Vec<(String, String)>,
    pub json_body: Option<Vec<u8>>,
}

impl Bindings {
    pub fn for_client(client_id: ClientId) -> Self {
        Self {
            client_id: Some(client_id),
            ..Self::default()
        }
    }

    pub fn path_param(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.path_params.push((name, value.into()));
        self
    }

    pub fn ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.query
            .push((IDS_QUERY_PARAM.to_string(), join_ids(ids)));
        self
    }

    pub fn stream_options(mut self, options: Option<&StreamOptions>) -> Self {
        if let Some(options) = options {
            self.query.extend(options.to_query_pairs());
        }
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, payload: &T) -> QueueClientResult<Self> {
        let body = serde_json::to_vec(payload)
            .map_err(|err| QueueClientError::Serialization(err.to_string()))?;
        self.json_body = Some(body);
        Ok(self)
    }

    pub(crate) fn bind(self, request: &mut HttpRequest) {
        if let Some(client_id) = self.client_id {
            request.set_header(CLIENT_ID_HEADER, client_id.to_string());
        }
        request.query.extend(self.query);
        if let Some(body) = self.json_body {
            request.set_header("Content-Type", "application/json");
            request.body = Some(body);
        }
    }
}

/// Joins identifiers into the comma-separated form the service expects.
/// Identifiers are passed through untouched; the service validates them.
pub fn join_ids<I, S>(ids: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    ids.into_iter()
        .map(|id| id.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Substitutes `{name}` placeholders in a path template.
pub fn expand_path(template: &str, params: &[(&'static str, String)]) -> String {
    let mut path = template.to_string();
    for (name, value) in params {
        path = path.replace(&format!("{{{name}}}"), &urlencoding::encode(value));
    }
    path
}
