//! Endpoint providers: yield one endpoint address per call.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::WiringError;

/// Supplies the base address for the next call. Implementations are shared by every
/// client bound to them and must be callable concurrently; `next` never fails.
pub trait EndpointProvider: Send + Sync {
    fn next(&self) -> String;
}

/// Round-robin over a fixed, non-empty endpoint set.
///
/// The counter is post-incremented before indexing, so a fresh provider starts at index 1.
/// `fetch_add` wraps at `usize::MAX` and the remainder of an unsigned value is always in
/// range, so the counter can run forever without panicking.
#[derive(Debug)]
pub struct RoundRobinEndpointProvider {
    endpoints: Vec<String>,
    counter: AtomicUsize,
}

impl RoundRobinEndpointProvider {
    pub fn new<I, S>(endpoints: I) -> Result<Self, WiringError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::starting_at(endpoints, 0)
    }

    /// Same as [`new`](Self::new) with an explicit initial counter value.
    pub fn starting_at<I, S>(endpoints: I, counter: usize) -> Result<Self, WiringError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let endpoints = validate(endpoints)?;
        Ok(Self {
            endpoints,
            counter: AtomicUsize::new(counter),
        })
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    fn next_index(&self) -> usize {
        let position = self.counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        position % self.endpoints.len()
    }
}

impl EndpointProvider for RoundRobinEndpointProvider {
    fn next(&self) -> String {
        self.endpoints[self.next_index()].clone()
    }
}

/// Always the same endpoint.
#[derive(Clone, Debug)]
pub struct StaticEndpointProvider {
    endpoint: String,
}

impl StaticEndpointProvider {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, WiringError> {
        let mut endpoints = validate([endpoint.into()])?;
        Ok(Self {
            endpoint: endpoints.remove(0),
        })
    }
}

impl EndpointProvider for StaticEndpointProvider {
    fn next(&self) -> String {
        self.endpoint.clone()
    }
}

fn validate<I, S>(endpoints: I) -> Result<Vec<String>, WiringError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let endpoints: Vec<String> = endpoints.into_iter().map(Into::into).collect();
    if endpoints.is_empty() {
        return Err(WiringError::Configuration(
            "endpoint provider needs at least one endpoint".into(),
        ));
    }
    if let Some(position) = endpoints.iter().position(|e| e.trim().is_empty()) {
        return Err(WiringError::Configuration(format!(
            "endpoint #{position} is blank"
        )));
    }
    Ok(endpoints)
}
