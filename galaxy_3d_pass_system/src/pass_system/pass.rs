/// Pass node stored in the pass system arena.
///
/// Passes are owned by `PassSystem` and addressed by `PassKey`. A parent holds
/// the keys of its children; a child stores its parent key. All mutation goes
/// through the pass system so the lifecycle state machine stays consistent.

use std::sync::Arc;
use bitflags::bitflags;
use slotmap::new_key_type;
use super::attachment::{
    AttachmentBinding, PassAttachment, PassAttachmentDesc, PassConnection, PassSlot,
};
use super::behavior::PassBehavior;
use super::template::{PassRequest, PassTemplate};

new_key_type! {
    /// Stable generational key for a pass in the pass system arena
    pub struct PassKey;
}

/// What the pass does once executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    Raster,
    Compute,
    Copy,
    /// Container of other passes, executes nothing itself
    Parent,
}

impl PassKind {
    pub fn is_parent(self) -> bool {
        matches!(self, PassKind::Parent)
    }
}

/// Lifecycle state of a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    /// Not built (initial state, after reset, or after a failed build)
    Reset,
    Building,
    Built,
    Initializing,
    /// Ready for execution
    Initialized,
    /// Detached from the hierarchy
    Removed,
}

/// Which phase queue currently holds the pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassQueueState {
    NoQueue,
    QueuedForBuild,
    QueuedForInitialization,
    QueuedForRemoval,
}

bitflags! {
    /// Boolean properties of a pass
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PassFlags: u8 {
        /// Pass itself is enabled (ancestors may still disable it)
        const ENABLED = 1 << 0;
        /// Pass is reachable from the root
        const PART_OF_HIERARCHY = 1 << 1;
        /// Pass was instantiated from a `PassRequest`
        const CREATED_BY_REQUEST = 1 << 2;
        /// Template child requests were already expanded
        const ALREADY_CREATED_CHILDREN = 1 << 3;
    }
}

/// A node of the pass hierarchy
pub struct Pass {
    pub(crate) name: String,
    pub(crate) path: String,
    pub(crate) kind: PassKind,
    pub(crate) parent: Option<PassKey>,
    pub(crate) children: Vec<PassKey>,
    pub(crate) tree_depth: u32,
    pub(crate) creation_index: u64,
    pub(crate) flags: PassFlags,
    pub(crate) state: PassState,
    pub(crate) queue_state: PassQueueState,

    pub(crate) template: Option<Arc<PassTemplate>>,
    pub(crate) request: Option<PassRequest>,
    pub(crate) slots: Vec<PassSlot>,
    pub(crate) connections: Vec<PassConnection>,
    pub(crate) attachment_descs: Vec<PassAttachmentDesc>,
    /// Connections added by the build hook, dropped on reset
    pub(crate) build_connections: Vec<PassConnection>,

    pub(crate) bindings: Vec<AttachmentBinding>,
    pub(crate) owned_attachments: Vec<Arc<PassAttachment>>,
    pub(crate) behavior: Option<Box<dyn PassBehavior>>,

    pub(crate) error_count: u32,
    pub(crate) warning_count: u32,
    pub(crate) error_messages: Vec<String>,
    pub(crate) warning_messages: Vec<String>,
}

impl Pass {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dot-separated path from the root (or from the detached subtree root)
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> PassKind {
        self.kind
    }

    pub fn parent(&self) -> Option<PassKey> {
        self.parent
    }

    pub fn children(&self) -> &[PassKey] {
        &self.children
    }

    pub fn tree_depth(&self) -> u32 {
        self.tree_depth
    }

    pub fn creation_index(&self) -> u64 {
        self.creation_index
    }

    pub fn flags(&self) -> PassFlags {
        self.flags
    }

    pub fn is_part_of_hierarchy(&self) -> bool {
        self.flags.contains(PassFlags::PART_OF_HIERARCHY)
    }

    /// Own enabled flag, ignoring ancestors (see `PassSystem::is_enabled`)
    pub fn is_enabled_self(&self) -> bool {
        self.flags.contains(PassFlags::ENABLED)
    }

    pub fn is_created_by_request(&self) -> bool {
        self.flags.contains(PassFlags::CREATED_BY_REQUEST)
    }

    pub fn state(&self) -> PassState {
        self.state
    }

    pub fn queue_state(&self) -> PassQueueState {
        self.queue_state
    }

    pub fn template(&self) -> Option<&Arc<PassTemplate>> {
        self.template.as_ref()
    }

    pub fn request(&self) -> Option<&PassRequest> {
        self.request.as_ref()
    }

    pub fn slots(&self) -> &[PassSlot] {
        &self.slots
    }

    pub fn connections(&self) -> &[PassConnection] {
        &self.connections
    }

    pub fn bindings(&self) -> &[AttachmentBinding] {
        &self.bindings
    }

    pub fn find_binding(&self, name: &str) -> Option<&AttachmentBinding> {
        self.bindings.iter().find(|b| b.name() == name)
    }

    pub(crate) fn find_binding_index(&self, name: &str) -> Option<usize> {
        self.bindings.iter().position(|b| b.name() == name)
    }

    pub fn owned_attachments(&self) -> &[Arc<PassAttachment>] {
        &self.owned_attachments
    }

    pub fn find_owned_attachment(&self, name: &str) -> Option<&Arc<PassAttachment>> {
        self.owned_attachments.iter().find(|a| a.name() == name)
    }

    /// Errors logged since the last reset
    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    pub fn warning_count(&self) -> u32 {
        self.warning_count
    }

    /// Stored error messages (only kept while validation is enabled)
    pub fn error_messages(&self) -> &[String] {
        &self.error_messages
    }

    pub fn warning_messages(&self) -> &[String] {
        &self.warning_messages
    }

    /// Count an error; keep its message when `keep_message` and below `limit`
    pub(crate) fn record_error(&mut self, message: String, keep_message: bool, limit: usize) {
        self.error_count += 1;
        if keep_message && self.error_messages.len() < limit {
            self.error_messages.push(message);
        }
    }

    pub(crate) fn record_warning(&mut self, message: String, keep_message: bool, limit: usize) {
        self.warning_count += 1;
        if keep_message && self.warning_messages.len() < limit {
            self.warning_messages.push(message);
        }
    }

    pub(crate) fn clear_diagnostics(&mut self) {
        self.error_count = 0;
        self.warning_count = 0;
        self.error_messages.clear();
        self.warning_messages.clear();
    }
}

impl std::fmt::Debug for Pass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pass")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("queue_state", &self.queue_state)
            .field("flags", &self.flags)
            .field("children", &self.children.len())
            .finish()
    }
}
