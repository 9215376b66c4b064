use crate::auth::{KeystoneV2Auth, NoAuth, PasswordCredentials, RequestFilter, StaticTokenAuth};
use crate::errors::{QueueClientError, QueueClientResult};
use crate::messages::MessageApi;
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::types::ClientId;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_MARCONI_ENDPOINT: &str = "http://127.0.0.1:8888/v1";
pub const DEFAULT_CLIENT_ID_FILE: &str = ".marconi-client-id";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthConfig {
    None,
    Token(String),
    Keystone {
        identity_url: String,
        credentials: PasswordCredentials,
    },
}

/// Connection settings for the message bindings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueClientConfig {
    pub endpoint: String,
    pub queue: Option<String>,
    pub client_id_file: PathBuf,
    pub auth: AuthConfig,
    pub timeout: Option<Duration>,
}

impl Default for QueueClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_MARCONI_ENDPOINT.to_string(),
            queue: None,
            client_id_file: PathBuf::from(DEFAULT_CLIENT_ID_FILE),
            auth: AuthConfig::None,
            timeout: None,
        }
    }
}

impl QueueClientConfig {
    pub fn from_env() -> QueueClientResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings through `lookup`; blank values count as unset.
    ///
    /// `OS_AUTH_TOKEN` wins over keystone credentials. Keystone needs
    /// `OS_AUTH_URL`, `OS_USERNAME` and `OS_PASSWORD` together.
    pub fn from_lookup<F>(lookup: F) -> QueueClientResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(endpoint) = get("MARCONI_ENDPOINT") {
            config.endpoint = endpoint;
        }
        config.queue = get("MARCONI_QUEUE");
        if let Some(path) = get("MARCONI_CLIENT_ID_FILE") {
            config.client_id_file = PathBuf::from(path);
        }
        if let Some(raw) = get("MARCONI_TIMEOUT_SECS") {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                QueueClientError::InvalidInput(format!(
                    "MARCONI_TIMEOUT_SECS must be a whole number of seconds: {raw}"
                ))
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }

        config.auth = if let Some(token) = get("OS_AUTH_TOKEN") {
            AuthConfig::Token(token)
        } else {
            match (get("OS_AUTH_URL"), get("OS_USERNAME"), get("OS_PASSWORD")) {
                (Some(identity_url), Some(username), Some(password)) => AuthConfig::Keystone {
                    identity_url,
                    credentials: PasswordCredentials {
                        username,
                        password,
                        tenant_name: get("OS_TENANT_NAME"),
                    },
                },
                (None, None, None) => AuthConfig::None,
                _ => {
                    return Err(QueueClientError::InvalidInput(
                        "OS_AUTH_URL, OS_USERNAME and OS_PASSWORD must be set together"
                            .to_string(),
                    ));
                }
            }
        };

        Ok(config)
    }

    pub fn client_id(&self) -> QueueClientResult<ClientId> {
        ClientId::load_or_create(&self.client_id_file)
    }

    pub fn transport(&self) -> QueueClientResult<Arc<dyn HttpTransport>> {
        let transport = match self.timeout {
            Some(timeout) => ReqwestTransport::with_timeout(timeout)?,
            None => ReqwestTransport::new(),
        };
        Ok(Arc::new(transport))
    }

    pub fn request_filter(&self, transport: Arc<dyn HttpTransport>) -> Arc<dyn RequestFilter> {
        match &self.auth {
            AuthConfig::None => Arc::new(NoAuth),
            AuthConfig::Token(token) => Arc::new(StaticTokenAuth::new(token.clone())),
            AuthConfig::Keystone {
                identity_url,
                credentials,
            } => Arc::new(KeystoneV2Auth::new(
                transport,
                identity_url.clone(),
                credentials.clone(),
            )),
        }
    }

    /// Builds a [`MessageApi`] for the configured queue over `reqwest`.
    pub fn message_api(&self) -> QueueClientResult<MessageApi> {
        let queue = self.queue.as_deref().ok_or_else(|| {
            QueueClientError::InvalidInput("no queue configured (set MARCONI_QUEUE)".to_string())
        })?;
        let transport = self.transport()?;
        let filter = self.request_filter(transport.clone());
        Ok(MessageApi::new(transport, &self.endpoint, queue).with_filter(filter))
    }
}
