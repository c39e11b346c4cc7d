//! HTTP transport contract, JSON codec and the default blocking client on tokio + hyper.

use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use http::{Method, Request, Response, StatusCode};
use hyper::body::Incoming;
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde_json::Value;
use tokio::runtime::{Handle, Runtime};

use crate::{CallError, WiringError};

// -----------------------------------------------------------------------------
// Request / response
// -----------------------------------------------------------------------------

/// A fully resolved request: absolute URL, headers and encoded body.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// First header value with this name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

// -----------------------------------------------------------------------------
// Contracts
// -----------------------------------------------------------------------------

/// Executes one request and waits for the whole response. Any status is a valid response;
/// only failures to complete the exchange are errors.
pub trait HttpTransport: Send + Sync {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, CallError>;
}

/// Body encoding used for requests and responses.
pub trait MessageCodec: Send + Sync {
    fn content_type(&self) -> &str;
    fn encode(&self, value: &Value) -> Result<Vec<u8>, CallError>;
    fn decode(&self, body: &[u8]) -> Result<Value, CallError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl MessageCodec for JsonCodec {
    fn content_type(&self) -> &str {
        "application/json"
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, CallError> {
        serde_json::to_vec(value).map_err(|e| CallError::Encode(e.to_string()))
    }

    fn decode(&self, body: &[u8]) -> Result<Value, CallError> {
        serde_json::from_slice(body).map_err(|e| CallError::Decode(e.to_string()))
    }
}

/// Transport plus codec, shared by every dispatcher built in one registration pass.
#[derive(Clone)]
pub struct HttpClient {
    transport: Arc<dyn HttpTransport>,
    codec: Arc<dyn MessageCodec>,
}

impl HttpClient {
    /// JSON client over the given transport.
    pub fn new(transport: impl HttpTransport + 'static) -> Self {
        Self::from_shared(Arc::new(transport), Arc::new(JsonCodec))
    }

    pub fn with_codec(
        transport: impl HttpTransport + 'static,
        codec: impl MessageCodec + 'static,
    ) -> Self {
        Self::from_shared(Arc::new(transport), Arc::new(codec))
    }

    pub fn from_shared(transport: Arc<dyn HttpTransport>, codec: Arc<dyn MessageCodec>) -> Self {
        Self { transport, codec }
    }

    /// Hyper transport with the JSON codec installed.
    pub fn default_json() -> Result<Self, WiringError> {
        Ok(Self::new(HyperTransport::new()?))
    }

    pub fn codec(&self) -> &dyn MessageCodec {
        self.codec.as_ref()
    }

    pub fn execute(&self, request: HttpRequest) -> Result<HttpResponse, CallError> {
        self.transport.execute(request)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("content_type", &self.codec.content_type())
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// Hyper transport
// -----------------------------------------------------------------------------

/// Blocking HTTP/1 client: owns a multi-threaded tokio runtime and drives each request
/// with `block_on`. Called from inside another runtime, the request is driven from a
/// helper thread so the caller's runtime is never re-entered.
pub struct HyperTransport {
    runtime: Option<Runtime>,
    handle: Handle,
    client: Client<HttpConnector, Full<Bytes>>,
}

impl HyperTransport {
    pub fn new() -> Result<Self, WiringError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("restwire-http")
            .build()
            .map_err(|e| WiringError::Configuration(format!("cannot start HTTP runtime: {e}")))?;
        let handle = runtime.handle().clone();
        let client = Client::builder(TokioExecutor::new()).build_http();
        Ok(Self {
            runtime: Some(runtime),
            handle,
            client,
        })
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, CallError> {
        let mut builder = Request::builder().method(request.method).uri(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let req = builder
            .body(Full::new(request.body.unwrap_or_default()))
            .map_err(|e| CallError::InvalidRequest(e.to_string()))?;
        let response: Response<Incoming> = self
            .client
            .request(req)
            .await
            .map_err(|e| CallError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| CallError::Transport(e.to_string()))?
            .to_bytes();
        Ok(HttpResponse { status, body })
    }
}

impl HttpTransport for HyperTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, CallError> {
        if Handle::try_current().is_err() {
            return self.handle.block_on(self.send(request));
        }
        thread::scope(|scope| {
            scope
                .spawn(|| self.handle.block_on(self.send(request)))
                .join()
                .unwrap_or_else(|_| Err(CallError::Transport("HTTP worker thread panicked".into())))
        })
    }
}

impl Drop for HyperTransport {
    fn drop(&mut self) {
        // Dropping a runtime blocks, which panics inside another runtime.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport").finish_non_exhaustive()
    }
}
