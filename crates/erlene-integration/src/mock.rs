//! Scripted transport and recording sleeper for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::retry::Sleeper;
use crate::transport::{
    HttpTransport, TransportError, TransportErrorKind, TransportRequest, TransportResponse,
};

type Reply = Result<TransportResponse, TransportError>;

#[derive(Debug, Default)]
struct MockTransportState {
    script: VecDeque<Reply>,
    fallback: Option<Reply>,
    requests: Vec<(Instant, TransportRequest)>,
}

/// Transport that replays scripted replies and records every request.
///
/// Replies are consumed in order; once the script is empty the fallback
/// reply (if any) is returned for every further request.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockTransportState>>,
}

impl MockTransport {
    /// Creates a transport with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport that always answers with the given response.
    pub fn always(response: TransportResponse) -> Self {
        Self::new().with_fallback(Ok(response))
    }

    /// Appends a response to the script.
    #[must_use]
    pub fn then_respond(self, response: TransportResponse) -> Self {
        self.state().script.push_back(Ok(response));
        self
    }

    /// Appends a transport failure to the script.
    #[must_use]
    pub fn then_fail(self, error: TransportError) -> Self {
        self.state().script.push_back(Err(error));
        self
    }

    /// Sets the reply used once the script is exhausted.
    #[must_use]
    pub fn with_fallback(self, reply: Result<TransportResponse, TransportError>) -> Self {
        self.state().fallback = Some(reply);
        self
    }

    /// Returns every request sent so far.
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.state()
            .requests
            .iter()
            .map(|(_, request)| request.clone())
            .collect()
    }

    /// Returns the instant at which each request was sent.
    pub fn sent_at(&self) -> Vec<Instant> {
        self.state().requests.iter().map(|(at, _)| *at).collect()
    }

    /// Returns the number of requests sent so far.
    pub fn call_count(&self) -> usize {
        self.state().requests.len()
    }

    fn state(&self) -> MutexGuard<'_, MockTransportState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        let mut state = self.state();
        state.requests.push((Instant::now(), request.clone()));

        match state.script.pop_front() {
            Some(reply) => reply,
            None => state.fallback.clone().unwrap_or_else(|| {
                Err(TransportError::new(
                    TransportErrorKind::Other,
                    "no scripted reply left",
                ))
            }),
        }
    }
}

/// Sleeper that records requested delays and returns immediately.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    /// Creates a new recording sleeper.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every delay requested so far.
    pub fn delays(&self) -> Vec<Duration> {
        self.delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait::async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
    }
}
