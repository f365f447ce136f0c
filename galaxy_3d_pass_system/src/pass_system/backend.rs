/// Boundary between the pass system and the GPU/frame-graph layer.
///
/// During initialize, each pass commits its resolved bindings to the backend.
/// A failed commit leaves the pass `Built` and is retried on the next
/// explicit rebuild request.

use crate::error::Result;
use super::attachment::AttachmentBinding;
use super::pass::{PassKey, PassKind};

/// Resolved bindings of one pass, handed to `PassBackend::commit_bindings`
#[derive(Debug, Clone, Copy)]
pub struct PassBindingInfo<'a> {
    pub key: PassKey,
    pub path: &'a str,
    pub kind: PassKind,
    pub bindings: &'a [AttachmentBinding],
}

/// Consumer of pass bindings (GPU resource layer)
pub trait PassBackend: Send {
    /// Create/update backend objects for the pass bindings
    fn commit_bindings(&mut self, info: &PassBindingInfo<'_>) -> Result<()>;

    /// Pass was detached; release whatever was committed for it
    fn release_bindings(&mut self, _key: PassKey) {}
}

/// Backend accepting every commit and holding nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBackend;

impl PassBackend for NullBackend {
    fn commit_bindings(&mut self, _info: &PassBindingInfo<'_>) -> Result<()> {
        Ok(())
    }
}
