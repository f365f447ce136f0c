/// Thread-safe submission of build/removal requests.
///
/// The pass system itself is single-threaded. Other threads push requests
/// through a cloned `PassRequestSender`; they are drained at the start of
/// the next `process_queued_changes`.

use std::sync::{Arc, Mutex};
use crate::engine_warn;
use super::pass::PassKey;

/// Deferred change to apply on the next frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassChangeRequest {
    Build(PassKey),
    Removal(PassKey),
}

#[derive(Debug, Clone, Default)]
pub struct PassRequestSender {
    pending: Arc<Mutex<Vec<PassChangeRequest>>>,
}

impl PassRequestSender {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub fn request_build(&self, key: PassKey) {
        self.push(PassChangeRequest::Build(key));
    }

    pub fn request_removal(&self, key: PassKey) {
        self.push(PassChangeRequest::Removal(key));
    }

    /// Number of requests waiting for the next frame
    pub fn pending_count(&self) -> usize {
        self.pending.lock().map(|pending| pending.len()).unwrap_or(0)
    }

    fn push(&self, request: PassChangeRequest) {
        match self.pending.lock() {
            Ok(mut pending) => pending.push(request),
            Err(_) => {
                engine_warn!("galaxy3d::PassRequestSender",
                    "Request queue lock poisoned, {:?} dropped", request);
            }
        }
    }

    pub(crate) fn drain(&self) -> Vec<PassChangeRequest> {
        match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => {
                engine_warn!("galaxy3d::PassRequestSender",
                    "Request queue lock poisoned, pending requests dropped");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
#[path = "request_queue_tests.rs"]
mod tests;
