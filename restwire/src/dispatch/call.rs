//! Call: one method invocation described as verb, path template, query, headers and body.

use std::fmt::Display;

use http::Method;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use restwire_core::{CallError, HttpRequest, MessageCodec};
use serde::Serialize;
use serde_json::Value;

/// Request description produced by a client adapter. The endpoint is chosen later, by the
/// dispatcher, so a `Call` can be built and inspected without any network.
///
/// Path parameters are percent-encoded as single segments and substituted into the
/// `{name}` placeholders of the template in one pass; query pairs are form-urlencoded.
#[derive(Clone, Debug)]
pub struct Call {
    method: Method,
    path: String,
    params: Vec<(String, String)>,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<Value>,
}

impl Call {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Value for the `{name}` placeholder. Setting a name twice keeps the last value.
    pub fn path_param<T: Display + ?Sized>(mut self, name: &str, value: &T) -> Self {
        let encoded = utf8_percent_encode(&value.to_string(), PATH_SEGMENT).to_string();
        match self.params.iter_mut().find(|(n, _)| n == name) {
            Some(param) => param.1 = encoded,
            None => self.params.push((name.to_string(), encoded)),
        }
        self
    }

    pub fn query<T: Display + ?Sized>(mut self, name: &str, value: &T) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    /// Adds the pair only when a value is present.
    pub fn query_opt<T: Display + ?Sized>(self, name: &str, value: Option<&T>) -> Self {
        match value {
            Some(value) => self.query(name, value),
            None => self,
        }
    }

    pub fn header<T: Display + ?Sized>(mut self, name: &str, value: &T) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn json_body<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, CallError> {
        let value = serde_json::to_value(body).map_err(|e| CallError::Encode(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The path template, placeholders included.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// First `{placeholder}` of the template without a value, if any.
    pub fn unresolved_placeholder(&self) -> Option<&str> {
        placeholders(&self.path)
            .into_iter()
            .map(|(start, end)| &self.path[start..end])
            .find(|placeholder| self.param(&placeholder[1..placeholder.len() - 1]).is_none())
    }

    fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn rendered_path(&self) -> String {
        let mut rendered = String::with_capacity(self.path.len());
        let mut from = 0;
        for (start, end) in placeholders(&self.path) {
            rendered.push_str(&self.path[from..start]);
            let placeholder = &self.path[start..end];
            rendered.push_str(self.param(&placeholder[1..placeholder.len() - 1]).unwrap_or(placeholder));
            from = end;
        }
        rendered.push_str(&self.path[from..]);
        rendered
    }

    /// Absolute URL of this call against `endpoint`.
    pub fn url(&self, endpoint: &str) -> Result<String, CallError> {
        let path = self.rendered_path();
        let mut url = endpoint.trim_end_matches('/').to_string();
        if !path.is_empty() && !path.starts_with('/') {
            url.push('/');
        }
        url.push_str(&path);
        if !self.query.is_empty() {
            let encoded = serde_urlencoded::to_string(&self.query)
                .map_err(|e| CallError::InvalidRequest(e.to_string()))?;
            url.push(if self.path.contains('?') { '&' } else { '?' });
            url.push_str(&encoded);
        }
        Ok(url)
    }

    pub(crate) fn into_request(
        self,
        endpoint: &str,
        codec: &dyn MessageCodec,
    ) -> Result<HttpRequest, CallError> {
        let mut request = HttpRequest::new(self.method.clone(), self.url(endpoint)?);
        request
            .headers
            .push(("Accept".to_string(), codec.content_type().to_string()));
        if let Some(body) = &self.body {
            request
                .headers
                .push(("Content-Type".to_string(), codec.content_type().to_string()));
            request.body = Some(codec.encode(body)?.into());
        }
        request.headers.extend(self.headers);
        Ok(request)
    }
}

/// Characters that cannot appear inside one path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Byte ranges of the `{name}` placeholders in `template`, braces included.
fn placeholders(template: &str) -> Vec<(usize, usize)> {
    let mut found = Vec::new();
    let mut from = 0;
    while let Some(open) = template[from..].find('{') {
        let start = from + open;
        let Some(len) = template[start..].find('}') else {
            break;
        };
        let end = start + len + 1;
        found.push((start, end));
        from = end;
    }
    found
}
