//! Dispatch: turns a client method call into one HTTP exchange against one endpoint.

mod call;

pub use call::Call;

use std::sync::Arc;

use restwire_core::{CallError, EndpointProvider, HttpClient, HttpResponse};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Shared by one client adapter. Every invocation picks a fresh endpoint from the bound
/// provider and performs exactly one round trip; nothing is cached or retried.
#[derive(Clone)]
pub struct ClientDispatcher {
    type_name: Arc<str>,
    provider: Arc<dyn EndpointProvider>,
    http: HttpClient,
}

impl ClientDispatcher {
    pub fn new(
        type_name: impl Into<Arc<str>>,
        provider: Arc<dyn EndpointProvider>,
        http: HttpClient,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            provider,
            http,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Decode the response into `R`. An empty body decodes as `null`.
    pub fn invoke<R: DeserializeOwned>(&self, call: Call) -> Result<R, CallError> {
        let value = self.invoke_value(call)?;
        serde_json::from_value(value).map_err(|e| CallError::Decode(e.to_string()))
    }

    pub fn invoke_value(&self, call: Call) -> Result<Value, CallError> {
        let response = self.exchange(call)?;
        if response.body.is_empty() {
            return Ok(Value::Null);
        }
        self.http.codec().decode(&response.body)
    }

    /// For methods without a return value: the response body is discarded.
    pub fn invoke_unit(&self, call: Call) -> Result<(), CallError> {
        self.exchange(call).map(drop)
    }

    fn exchange(&self, call: Call) -> Result<HttpResponse, CallError> {
        if let Some(placeholder) = call.unresolved_placeholder() {
            return Err(CallError::InvalidRequest(format!(
                "{} has no value for {placeholder} in {}",
                self.type_name,
                call.path()
            )));
        }
        let endpoint = self.provider.next();
        let request = call.into_request(&endpoint, self.http.codec())?;
        debug!(
            client = %self.type_name,
            endpoint = %endpoint,
            method = %request.method,
            url = %request.url,
            "dispatching call"
        );
        let response = self.http.execute(request)?;
        if !response.is_success() {
            debug!(client = %self.type_name, status = %response.status, "remote error");
            return Err(CallError::Remote {
                status: response.status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            });
        }
        Ok(response)
    }
}

impl std::fmt::Debug for ClientDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientDispatcher")
            .field("type_name", &self.type_name)
            .field("http", &self.http)
            .finish_non_exhaustive()
    }
}
