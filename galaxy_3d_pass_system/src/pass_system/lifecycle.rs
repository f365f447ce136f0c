/// Build and initialize phases of `PassSystem::process_queued_changes`.
///
/// A parent pass never builds its children directly. When its build
/// succeeds it queues every child for build, and the fixed-point loop picks
/// them up in the next snapshot. A parent's build therefore always completes
/// before any child build starts.

use std::mem;
use std::sync::Arc;
use crate::error::Result;
use crate::{engine_error, engine_trace};
use super::attachment::{AttachmentBinding, PassAttachment};
use super::backend::PassBindingInfo;
use super::behavior::BuildContext;
use super::pass::{PassFlags, PassKey, PassQueueState, PassState};
use super::pass_system::{PassSystem, PassSystemState};

impl PassSystem {
    // ===== BUILD =====

    pub(crate) fn build_passes(&mut self) {
        self.state = PassSystemState::BuildingPasses;
        self.requeued_dependents.clear();

        // Terminates because a pass only re-queues its children, which are
        // strictly deeper, template children are expanded once, and a
        // dependent is re-queued at most once per frame
        while !self.build_list.is_empty() {
            let list = mem::take(&mut self.build_list);
            let snapshot = self.snapshot(list, PassQueueState::QueuedForBuild, true);
            if snapshot.is_empty() {
                continue;
            }

            for &key in &snapshot {
                self.reset_pass(key);
            }
            for &key in &snapshot {
                self.build_pass(key);
            }
            self.changed_this_frame = true;
        }
    }

    fn reset_pass(&mut self, key: PassKey) {
        let resettable = matches!(
            self.passes.get(key),
            Some(pass) if matches!(pass.state, PassState::Reset | PassState::Built | PassState::Initialized)
        );
        if resettable {
            self.clear_build_state(key);
        }
    }

    /// Drop bindings, owned attachments and diagnostics; back to `Reset`
    fn clear_build_state(&mut self, key: PassKey) {
        let pass = &mut self.passes[key];
        pass.bindings.clear();
        pass.owned_attachments.clear();
        pass.build_connections.clear();
        pass.clear_diagnostics();
        pass.state = PassState::Reset;

        if let Some(mut behavior) = pass.behavior.take() {
            behavior.reset(pass);
            pass.behavior = Some(behavior);
        }
    }

    fn build_pass(&mut self, key: PassKey) {
        let ready = matches!(
            self.passes.get(key),
            Some(pass) if pass.queue_state == PassQueueState::QueuedForBuild
                && pass.state == PassState::Reset
                && pass.is_part_of_hierarchy()
        );
        if !ready {
            return;
        }

        if let Some(ancestor) = self.unbuilt_ancestor(key) {
            let message = format!("ancestor '{}' is not built", self.passes[ancestor].path);
            self.fail_build(key, message);
            return;
        }

        {
            let pass = &mut self.passes[key];
            pass.state = PassState::Building;
            pass.queue_state = PassQueueState::NoQueue;
            pass.bindings = pass.slots.iter().map(AttachmentBinding::from_slot).collect();
        }

        let descs = self.passes[key].attachment_descs.clone();
        for desc in &descs {
            let id = self.allocate_attachment_id();
            let attachment = Arc::new(PassAttachment::new(id, desc, key));
            self.passes[key].owned_attachments.push(attachment);
        }

        self.building = Some(key);
        let hook_result = match self.passes[key].behavior.take() {
            Some(mut behavior) => {
                let result = behavior.build(&mut BuildContext::new(self, key));
                if let Some(pass) = self.passes.get_mut(key) {
                    pass.behavior = Some(behavior);
                }
                result
            }
            None => Ok(()),
        };
        self.building = None;

        if let Err(error) = hook_result.and_then(|_| self.expand_template(key)) {
            self.fail_build(key, error.to_string());
            return;
        }

        let unresolved = self.resolve_connections(key);
        if !unresolved.is_empty() {
            self.fail_build(key, unresolved.join("; "));
            return;
        }

        self.passes[key].state = PassState::Built;
        engine_trace!("galaxy3d::Pass", "Built pass '{}'", self.passes[key].path);
        self.queue_for_initialization(key);

        if self.passes[key].kind.is_parent() {
            for child in self.passes[key].children.clone() {
                self.request_build(child);
            }
        }
        self.queue_dependents(&[key]);
    }

    /// First ancestor (excluding `key`) that is neither `Built` nor `Initialized`
    fn unbuilt_ancestor(&self, key: PassKey) -> Option<PassKey> {
        self.ancestors_and_self(key)
            .skip(1)
            .find(|&ancestor| !matches!(
                self.passes[ancestor].state,
                PassState::Built | PassState::Initialized
            ))
    }

    /// Log a build failure; the pass stays `Reset` and is not initialized.
    ///
    /// The whole subtree goes back to `Reset` with no queue: descendants
    /// lose the attachments they were bound to and no longer satisfy the
    /// initialize contract. Passes outside the subtree bound through it are
    /// queued for rebuild.
    fn fail_build(&mut self, key: PassKey, message: String) {
        let keep = self.config.validation_enabled;
        let limit = self.config.message_log_limit;

        let pass = &mut self.passes[key];
        engine_error!("galaxy3d::Pass", "Failed to build pass '{}': {}", pass.path, message);
        pass.record_error(message, keep, limit);
        pass.state = PassState::Reset;
        pass.queue_state = PassQueueState::NoQueue;
        let path = pass.path.clone();

        let subtree = self.subtree(key);
        for &descendant in &subtree[1..] {
            let was_built = matches!(
                self.passes[descendant].state,
                PassState::Built | PassState::Initialized
            );
            let was_initialized = self.passes[descendant].state == PassState::Initialized;
            if was_built {
                self.clear_build_state(descendant);
            }
            if was_initialized {
                self.backend.release_bindings(descendant);
            }

            let pass = &mut self.passes[descendant];
            pass.state = PassState::Reset;
            if pass.queue_state != PassQueueState::QueuedForRemoval {
                pass.queue_state = PassQueueState::NoQueue;
            }
            pass.record_error(format!("ancestor '{}' failed to build", path), keep, limit);
        }

        self.queue_dependents(&subtree);
    }

    /// Queue for rebuild every pass outside `sources` holding a binding
    /// resolved through one of them.
    ///
    /// Each pass is queued this way at most once per frame, so mutually
    /// bound siblings cannot keep the build loop alive.
    fn queue_dependents(&mut self, sources: &[PassKey]) {
        let dependents: Vec<PassKey> = self.passes
            .iter()
            .filter(|(key, pass)| pass.is_part_of_hierarchy()
                && !sources.contains(key)
                && pass.bindings.iter().any(|binding| binding
                    .source_pass()
                    .is_some_and(|source| sources.contains(&source))))
            .map(|(key, _)| key)
            .collect();

        for dependent in dependents {
            if self.requeued_dependents.insert(dependent) && self.request_build(dependent) {
                engine_trace!("galaxy3d::Pass", "Pass '{}' queued for rebuild: its source changed",
                    self.passes[dependent].path);
            }
        }
    }

    /// Create template children once per pass lifetime
    fn expand_template(&mut self, key: PassKey) -> Result<()> {
        let pass = &self.passes[key];
        if !pass.kind.is_parent() || pass.flags.contains(PassFlags::ALREADY_CREATED_CHILDREN) {
            return Ok(());
        }
        let Some(template) = pass.template.clone() else {
            return Ok(());
        };
        self.passes[key].flags.insert(PassFlags::ALREADY_CREATED_CHILDREN);

        for request in &template.child_requests {
            let child = self.create_pass_from_request(request)?;
            if let Err(error) = self.add_child(key, child) {
                let _ = self.destroy_pass(child);
                return Err(error);
            }
        }
        engine_trace!("galaxy3d::Pass", "Pass '{}' created {} child(ren) from template '{}'",
            self.passes[key].path, template.child_requests.len(), template.name);
        Ok(())
    }

    // ===== INITIALIZE =====

    pub(crate) fn initialize_passes(&mut self) {
        self.state = PassSystemState::InitializingPasses;

        while !self.initialize_list.is_empty() {
            let list = mem::take(&mut self.initialize_list);
            let snapshot = self.snapshot(list, PassQueueState::QueuedForInitialization, true);
            for key in snapshot {
                self.initialize_pass(key);
            }
        }

        if self.changed_this_frame {
            self.broadcast_initialization_finished();
        }
    }

    fn initialize_pass(&mut self, key: PassKey) {
        let ancestors_ready = self.unbuilt_ancestor(key).is_none();
        let pass = &mut self.passes[key];
        pass.queue_state = PassQueueState::NoQueue;

        if pass.state != PassState::Built || !ancestors_ready {
            debug_assert!(false, "Pass '{}' initialized in state {:?}", pass.path, pass.state);
            engine_error!("galaxy3d::Pass", "Pass '{}' cannot initialize in state {:?}", pass.path, pass.state);
            return;
        }
        pass.state = PassState::Initializing;

        let mut result = match pass.behavior.take() {
            Some(mut behavior) => {
                let result = behavior.initialize(pass);
                pass.behavior = Some(behavior);
                result
            }
            None => Ok(()),
        };

        if result.is_ok() {
            let pass = &self.passes[key];
            let info = PassBindingInfo {
                key,
                path: &pass.path,
                kind: pass.kind,
                bindings: &pass.bindings,
            };
            result = self.backend.commit_bindings(&info);
        }

        let keep = self.config.validation_enabled;
        let limit = self.config.message_log_limit;
        let pass = &mut self.passes[key];
        match result {
            Ok(()) => {
                pass.state = PassState::Initialized;
                engine_trace!("galaxy3d::Pass", "Initialized pass '{}'", pass.path);
            }
            Err(error) => {
                engine_error!("galaxy3d::Pass", "Failed to initialize pass '{}': {}", pass.path, error);
                pass.record_error(format!("initialization failed: {}", error), keep, limit);
                pass.state = PassState::Built;
            }
        }
        self.changed_this_frame = true;
    }

    /// Notify every pass in the hierarchy, parents before children
    fn broadcast_initialization_finished(&mut self) {
        for key in self.subtree(self.root) {
            let pass = &mut self.passes[key];
            if let Some(mut behavior) = pass.behavior.take() {
                behavior.on_initialization_finished(pass);
                pass.behavior = Some(behavior);
            }
        }
    }
}
