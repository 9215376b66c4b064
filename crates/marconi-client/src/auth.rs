use crate::errors::{QueueClientError, QueueClientResult};
use crate::transport::{HttpMethod, HttpRequest, HttpTransport};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::Mutex;

pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Pre-send hook run on every request, in registration order.
#[async_trait]
pub trait RequestFilter: Send + Sync {
    async fn filter(&self, request: &mut HttpRequest) -> QueueClientResult<()>;
}

#[async_trait]
impl<T> RequestFilter for Arc<T>
where
    T: RequestFilter + ?Sized,
{
    async fn filter(&self, request: &mut HttpRequest) -> QueueClientResult<()> {
        (**self).filter(request).await
    }
}

/// For standalone deployments without an identity service.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAuth;

#[async_trait]
impl RequestFilter for NoAuth {
    async fn filter(&self, _request: &mut HttpRequest) -> QueueClientResult<()> {
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct StaticTokenAuth {
    token: String,
}

impl StaticTokenAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl RequestFilter for StaticTokenAuth {
    async fn filter(&self, request: &mut HttpRequest) -> QueueClientResult<()> {
        request.set_header(AUTH_TOKEN_HEADER, self.token.clone());
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PasswordCredentials {
    pub username: String,
    pub password: String,
    pub tenant_name: Option<String>,
}

/// Keystone v2.0 password authentication with a cached token.
///
/// The first filtered request triggers `POST {identity_url}/tokens`; later
/// requests reuse the token until [`KeystoneV2Auth::invalidate`] is called.
pub struct KeystoneV2Auth {
    transport: Arc<dyn HttpTransport>,
    identity_url: String,
    credentials: PasswordCredentials,
    token: Mutex<Option<String>>,
}

impl KeystoneV2Auth {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        identity_url: impl Into<String>,
        credentials: PasswordCredentials,
    ) -> Self {
        Self {
            transport,
            identity_url: identity_url.into(),
            credentials,
            token: Mutex::new(None),
        }
    }

    pub async fn invalidate(&self) {
        *self.token.lock().await = None;
    }

    pub async fn token(&self) -> QueueClientResult<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }
        let token = self.authenticate().await?;
        *cached = Some(token.clone());
        Ok(token)
    }

    async fn authenticate(&self) -> QueueClientResult<String> {
        let mut auth = json!({
            "passwordCredentials": {
                "username": self.credentials.username,
                "password": self.credentials.password,
            }
        });
        if let Some(tenant_name) = &self.credentials.tenant_name {
            auth["tenantName"] = Value::String(tenant_name.clone());
        }
        let body = serde_json::to_vec(&json!({ "auth": auth }))
            .map_err(|err| QueueClientError::Serialization(err.to_string()))?;

        let url = format!("{}/tokens", self.identity_url.trim_end_matches('/'));
        let mut request = HttpRequest::new(HttpMethod::Post, url);
        request.set_header("Accept", "application/json");
        request.set_header("Content-Type", "application/json");
        request.body = Some(body);

        tracing::debug!(identity_url = %self.identity_url, "requesting keystone token");
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(QueueClientError::Auth(format!(
                "identity service returned {}: {}",
                response.status,
                response.text()
            )));
        }

        let payload: Value = serde_json::from_slice(&response.body)
            .map_err(|err| QueueClientError::Auth(format!("token response decode failed: {err}")))?;
        payload
            .pointer("/access/token/id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                QueueClientError::Auth("token response missing access.token.id".to_string())
            })
    }
}

impl std::fmt::Debug for KeystoneV2Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeystoneV2Auth")
            .field("identity_url", &self.identity_url)
            .field("username", &self.credentials.username)
            .field("tenant_name", &self.credentials.tenant_name)
            .finish()
    }
}

#[async_trait]
impl RequestFilter for KeystoneV2Auth {
    async fn filter(&self, request: &mut HttpRequest) -> QueueClientResult<()> {
        let token = self.token().await?;
        request.set_header(AUTH_TOKEN_HEADER, token);
        Ok(())
    }
}
