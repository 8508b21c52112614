//! Scripted transport for store tests

use async_trait::async_trait;
use parking_lot::Mutex;
use recipebook_core::{Method, Transport, TransportError, TransportResult};
use serde_json::Value;
use std::collections::VecDeque;
use tokio::sync::oneshot;

/// A request as the transport saw it
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

enum Scripted {
    Reply(TransportResult),
    Gated(oneshot::Receiver<TransportResult>),
}

/// Answers requests in FIFO order from a script
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an immediate reply
    pub fn reply(&self, result: TransportResult) {
        self.script.lock().push_back(Scripted::Reply(result));
    }

    /// Queue a reply that is held until the returned sender fires
    pub fn gate(&self) -> oneshot::Sender<TransportResult> {
        let (tx, rx) = oneshot::channel();
        self.script.lock().push_back(Scripted::Gated(rx));
        tx
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Yield until at least `n` requests have been issued
    pub async fn wait_for_calls(&self, n: usize) {
        for _ in 0..10_000 {
            if self.calls.lock().len() >= n {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("expected {} calls, saw {}", n, self.calls.lock().len());
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> TransportResult {
        self.calls.lock().push(Call {
            method,
            path: path.to_string(),
            body,
        });

        let next = self.script.lock().pop_front();
        match next {
            Some(Scripted::Reply(result)) => result,
            Some(Scripted::Gated(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(TransportError::server(None, "gate dropped"))),
            None => Err(TransportError::server(None, "no scripted reply")),
        }
    }
}
