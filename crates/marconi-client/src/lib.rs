#![doc = r#"
Client bindings for the message resources of an OpenStack Marconi (Cloud
Queues) v1 service.

Operation mapping:

| Method | Descriptor | HTTP | Not found |
| --- | --- | --- | --- |
| `MessageApi::create` | `message:create` | `POST /queues/:queue/messages` | `None` |
| `MessageApi::stream` | `message:stream` | `GET /queues/:queue/messages?limit&marker&echo` | empty page |
| `MessageApi::list` | `message:list` | `GET /queues/:queue/messages?ids=a,b` | empty `Vec` |
| `MessageApi::get` | `message:get` | `GET /queues/:queue/messages/:message_id` | `None` |
| `MessageApi::delete` | `message:delete` | `DELETE /queues/:queue/messages?ids=a,b` | `false` |

Implementation notes:
- Every request carries the caller's `Client-ID` header in canonical UUID form.
- Request filters (authentication) run before every request, in order.
- A 404 is never an error; other non-2xx statuses surface as `QueueClientError::Status`.
- `stream` returns a single page. Chain pages with `MessageStream::next_options`.
"#]

pub mod auth;
pub mod binders;
pub mod config;
pub mod errors;
pub mod fallback;
pub mod messages;
pub mod operation;
pub mod parsers;
pub mod testing;
pub mod transport;
pub mod types;

pub use auth::{
    AUTH_TOKEN_HEADER, KeystoneV2Auth, NoAuth, PasswordCredentials, RequestFilter,
    StaticTokenAuth,
};
pub use binders::{Bindings, CLIENT_ID_HEADER};
pub use config::{AuthConfig, DEFAULT_CLIENT_ID_FILE, DEFAULT_MARCONI_ENDPOINT, QueueClientConfig};
pub use errors::{QueueClientError, QueueClientResult};
pub use fallback::{Fallback, FromFallback};
pub use messages::MessageApi;
pub use operation::{OperationDescriptor, execute};
pub use testing::MockQueue;
pub use transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use types::{
    ClientId, Link, Message, MessageDraft, MessageStream, MessagesCreated, StreamOptions,
};
