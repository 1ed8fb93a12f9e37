//! Mock transport for testing.
//!
//! Answers from a queue and records every request it saw.

use super::{ApiRequest, ApiResponse, Transport, TransportError};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

#[derive(Clone, Debug, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    requests: Vec<ApiRequest>,
    responses: VecDeque<Result<ApiResponse, TransportError>>,
    gate: Option<oneshot::Receiver<()>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockTransportInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn queue_response(&self, status: u16, body: &str) {
        self.lock().responses.push_back(Ok(ApiResponse {
            status,
            body: body.to_owned(),
        }));
    }

    pub fn queue_json<S: Serialize>(&self, status: u16, body: &S) {
        let body = serde_json::to_string(body).unwrap_or_default();
        self.queue_response(status, &body);
    }

    /// Makes a queued request fail in transit.
    pub fn queue_error(&self, error: TransportError) {
        self.lock().responses.push_back(Err(error));
    }

    /// Holds the next request in flight until the returned sender fires or is dropped.
    pub fn hold_next(&self) -> oneshot::Sender<()> {
        let (sender, receiver) = oneshot::channel();
        self.lock().gate = Some(receiver);
        sender
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.lock().requests.clone()
    }

    pub fn last_request(&self) -> Option<ApiRequest> {
        self.lock().requests.last().cloned()
    }

    #[cfg(test)]
    pub(crate) fn pending_responses(&self) -> usize {
        self.lock().responses.len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let gate = {
            let mut inner = self.lock();
            inner.requests.push(request);
            inner.gate.take()
        };

        if let Some(gate) = gate {
            gate.await.ok();
        }

        self.lock()
            .responses
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("no response queued".into())))
    }
}
