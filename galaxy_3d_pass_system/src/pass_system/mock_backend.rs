/// Mock backend for tests and demos (no GPU required)
///
/// Records every commit and release in a shared log so callers can keep a
/// handle after moving the backend into a `PassSystem`.

use std::sync::{Arc, Mutex};
use rustc_hash::FxHashSet;
use crate::error::Result;
use crate::engine_bail;
use super::backend::{PassBackend, PassBindingInfo};
use super::pass::PassKey;

/// What the mock backend has seen so far
#[derive(Debug, Default, Clone)]
pub struct MockBackendLog {
    /// Paths of passes whose commit succeeded, in call order
    pub committed: Vec<String>,
    /// Paths of passes whose commit was rejected
    pub rejected: Vec<String>,
    pub released: Vec<PassKey>,
    /// Resolved binding count per successful commit
    pub binding_counts: Vec<usize>,
}

#[derive(Debug, Default, Clone)]
pub struct MockBackend {
    log: Arc<Mutex<MockBackendLog>>,
    failing_passes: FxHashSet<String>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject commits for passes with this name (or full path)
    pub fn fail_on(mut self, pass: &str) -> Self {
        self.failing_passes.insert(pass.to_string());
        self
    }

    /// Shared handle to the call log
    pub fn log(&self) -> Arc<Mutex<MockBackendLog>> {
        Arc::clone(&self.log)
    }

    fn should_fail(&self, path: &str) -> bool {
        let name = path.rsplit('.').next().unwrap_or(path);
        self.failing_passes.contains(path) || self.failing_passes.contains(name)
    }
}

impl PassBackend for MockBackend {
    fn commit_bindings(&mut self, info: &PassBindingInfo<'_>) -> Result<()> {
        if self.should_fail(info.path) {
            if let Ok(mut log) = self.log.lock() {
                log.rejected.push(info.path.to_string());
            }
            engine_bail!("galaxy3d::MockBackend", "Commit rejected for pass '{}'", info.path);
        }

        if let Ok(mut log) = self.log.lock() {
            log.committed.push(info.path.to_string());
            log.binding_counts.push(info.bindings.iter().filter(|b| b.is_resolved()).count());
        }
        Ok(())
    }

    fn release_bindings(&mut self, key: PassKey) {
        if let Ok(mut log) = self.log.lock() {
            log.released.push(key);
        }
    }
}
