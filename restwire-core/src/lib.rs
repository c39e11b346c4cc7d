//! restwire core: container, endpoint providers, qualifier resolution, HTTP transport.

pub mod container;
pub mod endpoint;
pub mod http;
pub mod qualifier;
pub mod resolver;

pub use container::{Container, ContainerError, ProviderRegistration};
pub use endpoint::{EndpointProvider, RoundRobinEndpointProvider, StaticEndpointProvider};
pub use http::{
    HttpClient, HttpRequest, HttpResponse, HttpTransport, HyperTransport, JsonCodec, MessageCodec,
};
pub use qualifier::Qualifier;
pub use resolver::ProviderResolver;

use ::http::StatusCode;
use thiserror::Error;

/// Start-up failures. Any of these aborts the registration pass.
#[derive(Error, Debug)]
pub enum WiringError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("no endpoint provider found for {0}")]
    ProviderNotFound(String),
    #[error("cannot resolve client type {type_name}: {reason}")]
    ClientResolution { type_name: String, reason: String },
    #[error("qualifier mismatch: {0}")]
    QualifierMismatch(String),
    #[error(transparent)]
    Container(#[from] ContainerError),
}

/// Per-call failures, returned to the caller of a client method. Never retried.
#[derive(Error, Debug)]
pub enum CallError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("[{status}] {body}")]
    Remote { status: StatusCode, body: String },
    #[error("cannot encode request body: {0}")]
    Encode(String),
    #[error("cannot decode response body: {0}")]
    Decode(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl CallError {
    /// Status of a remote error; `None` for local failures.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            CallError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}
