#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use restwire::http::StatusCode;
use restwire::{CallError, HttpClient, HttpRequest, HttpResponse, HttpTransport, JsonCodec};

type Reply = Box<dyn Fn(&HttpRequest) -> Result<HttpResponse, CallError> + Send + Sync>;

/// Transport that records every request and answers from a closure.
pub struct FakeTransport {
    requests: Mutex<Vec<HttpRequest>>,
    reply: Reply,
}

impl FakeTransport {
    pub fn replying(status: StatusCode, body: &'static str) -> Arc<Self> {
        Self::with(move |_| HttpResponse::new(status, body))
    }

    pub fn with(reply: impl Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static) -> Arc<Self> {
        Self::answering(move |request| Ok(reply(request)))
    }

    /// Every exchange fails with `CallError::Transport(message)`.
    pub fn failing(message: &'static str) -> Arc<Self> {
        Self::answering(move |_| Err(CallError::Transport(message.to_string())))
    }

    fn answering(
        reply: impl Fn(&HttpRequest) -> Result<HttpResponse, CallError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            reply: Box::new(reply),
        })
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }

    pub fn client(self: &Arc<Self>) -> HttpClient {
        HttpClient::from_shared(Arc::clone(self) as Arc<dyn HttpTransport>, Arc::new(JsonCodec))
    }
}

impl HttpTransport for FakeTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, CallError> {
        let response = (self.reply)(&request);
        self.requests.lock().unwrap().push(request);
        response
    }
}
