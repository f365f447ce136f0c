/// Per-pass lifecycle hooks.
///
/// The pass system owns the state machine; a `PassBehavior` only customizes
/// what happens inside each phase. The behavior is taken out of its pass for
/// the duration of a hook call, so hooks get plain `&Pass` access (or a
/// `BuildContext` during build) without aliasing the arena.

use std::sync::Arc;
use crate::error::{Error, Result};
use super::attachment::{AttachmentBinding, PassAttachment, PassAttachmentDesc, PassConnection, PassSlot};
use super::descriptor::PassDescriptor;
use super::pass::{Pass, PassKey};
use super::pass_system::PassSystem;
use super::template::{PassFactory, PassRequest, PassTemplateLibrary};

/// Hooks invoked by the pass system on each lifecycle transition
pub trait PassBehavior: Send {
    /// Pass is about to be rebuilt; drop per-build state
    fn reset(&mut self, _pass: &Pass) {}

    /// Build hook: may add slots/attachments/connections and spawn children.
    ///
    /// Returning an error fails the build; the pass stays in `Reset`.
    fn build(&mut self, _ctx: &mut BuildContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Initialize hook, runs before bindings are committed to the backend
    fn initialize(&mut self, _pass: &Pass) -> Result<()> {
        Ok(())
    }

    /// Broadcast once per frame after the initialize phase if anything changed
    fn on_initialization_finished(&mut self, _pass: &Pass) {}

    /// Pass (or one of its ancestors) was detached from the hierarchy
    fn on_orphan(&mut self, _pass: &Pass) {}
}

/// Behavior that does nothing in every hook
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpBehavior;

impl PassBehavior for NoOpBehavior {}

type BuildFn = Box<dyn FnMut(&mut BuildContext<'_>) -> Result<()> + Send>;

/// Behavior defined by a build closure
///
/// # Example
///
/// ```
/// use galaxy_3d_pass_system::galaxy3d::pass::{CustomBehavior, PassAttachmentDesc};
///
/// let behavior = CustomBehavior::new(|ctx| {
///     ctx.add_attachment(PassAttachmentDesc::buffer("scratch", 256));
///     Ok(())
/// });
/// # let _ = behavior;
/// ```
pub struct CustomBehavior {
    build: BuildFn,
}

impl CustomBehavior {
    pub fn new<F>(build: F) -> Self
    where
        F: FnMut(&mut BuildContext<'_>) -> Result<()> + Send + 'static,
    {
        Self { build: Box::new(build) }
    }
}

impl PassBehavior for CustomBehavior {
    fn build(&mut self, ctx: &mut BuildContext<'_>) -> Result<()> {
        (self.build)(ctx)
    }
}

/// Mutable view of the pass system handed to `PassBehavior::build`
pub struct BuildContext<'a> {
    system: &'a mut PassSystem,
    key: PassKey,
}

impl<'a> BuildContext<'a> {
    pub(crate) fn new(system: &'a mut PassSystem, key: PassKey) -> Self {
        Self { system, key }
    }

    /// Key of the pass being built
    pub fn key(&self) -> PassKey {
        self.key
    }

    /// The pass being built
    pub fn pass(&self) -> &Pass {
        &self.system.passes[self.key]
    }

    /// Any pass of the system (read-only)
    pub fn get_pass(&self, key: PassKey) -> Option<&Pass> {
        self.system.pass(key)
    }

    pub fn templates(&self) -> &PassTemplateLibrary {
        self.system.templates()
    }

    /// Add a slot for this build only; the binding is created immediately
    pub fn add_slot(&mut self, slot: PassSlot) {
        let pass = &mut self.system.passes[self.key];
        pass.bindings.push(AttachmentBinding::from_slot(&slot));
    }

    /// Create an attachment owned by this pass for this build only
    pub fn add_attachment(&mut self, desc: PassAttachmentDesc) -> Arc<PassAttachment> {
        let id = self.system.allocate_attachment_id();
        let attachment = Arc::new(PassAttachment::new(id, &desc, self.key));
        self.system.passes[self.key].owned_attachments.push(Arc::clone(&attachment));
        attachment
    }

    /// Add a connection resolved together with the declared ones after this hook
    pub fn add_connection(&mut self, connection: PassConnection) {
        self.system.passes[self.key].build_connections.push(connection);
    }

    /// Create a pass and attach it as a child of the pass being built.
    ///
    /// The child is queued for build and is built later in the same frame.
    pub fn spawn_child(&mut self, descriptor: PassDescriptor) -> Result<PassKey> {
        let child = self.system.create_pass(descriptor);
        if let Err(error) = self.system.add_child(self.key, child) {
            let _ = self.system.destroy_pass(child);
            return Err(error);
        }
        Ok(child)
    }

    /// Instantiate a child from a template request
    pub fn spawn_child_from_request(&mut self, request: &PassRequest) -> Result<PassKey> {
        let descriptor = self.system.templates().create(request).ok_or_else(|| {
            Error::InvalidPass(format!("Unknown pass template '{}'", request.template_name))
        })?;
        self.spawn_child(descriptor)
    }

    /// Queue a removal, processed by the next `process_queued_changes`.
    ///
    /// Removing the pass currently being built is refused.
    pub fn request_removal(&mut self, key: PassKey) -> Result<()> {
        self.system.request_removal(key)
    }
}
