/// Hierarchy management: creation, attachment, detachment and traversal.

use crate::error::{Error, Result};
use crate::{engine_debug, engine_trace};
use super::descriptor::PassDescriptor;
use super::pass::{Pass, PassFlags, PassKey, PassQueueState, PassState};
use super::pass_system::PassSystem;
use super::template::{PassFactory, PassRequest};

/// Separates pass names in a path (`Root.Bloom.Downsample`)
pub(crate) const PATH_SEPARATOR: char = '.';

impl PassSystem {
    /// Create a detached pass. Attach it with `add_child` to have it built.
    pub fn create_pass(&mut self, descriptor: PassDescriptor) -> PassKey {
        let creation_index = self.next_creation_index;
        self.next_creation_index += 1;

        let mut flags = PassFlags::empty();
        if descriptor.enabled {
            flags.insert(PassFlags::ENABLED);
        }
        if descriptor.request.is_some() {
            flags.insert(PassFlags::CREATED_BY_REQUEST);
        }

        let pass = Pass {
            path: descriptor.name.clone(),
            name: descriptor.name,
            kind: descriptor.kind,
            parent: None,
            children: Vec::new(),
            tree_depth: 0,
            creation_index,
            flags,
            state: PassState::Reset,
            queue_state: PassQueueState::NoQueue,
            template: descriptor.template,
            request: descriptor.request,
            slots: descriptor.slots,
            connections: descriptor.connections,
            attachment_descs: descriptor.attachments,
            build_connections: Vec::new(),
            bindings: Vec::new(),
            owned_attachments: Vec::new(),
            behavior: descriptor.behavior,
            error_count: 0,
            warning_count: 0,
            error_messages: Vec::new(),
            warning_messages: Vec::new(),
        };

        engine_trace!("galaxy3d::PassSystem", "Created pass '{}' ({:?})", pass.name, pass.kind);
        self.passes.insert(pass)
    }

    /// Create a detached pass from a template request using the system library
    ///
    /// # Errors
    ///
    /// Returns an error if the request names an unknown template
    pub fn create_pass_from_request(&mut self, request: &PassRequest) -> Result<PassKey> {
        self.create_pass_with_factory(request, None)
    }

    /// Create a detached pass from a request using a caller-provided factory
    /// (the system library when `factory` is None)
    pub fn create_pass_with_factory(&mut self, request: &PassRequest, factory: Option<&dyn PassFactory>) -> Result<PassKey> {
        let descriptor = match factory {
            Some(factory) => factory.create(request),
            None => self.library.create(request),
        };
        let descriptor = descriptor.ok_or_else(|| {
            Error::InvalidPass(format!(
                "Unknown pass template '{}' requested for pass '{}'",
                request.template_name, request.pass_name
            ))
        })?;
        Ok(self.create_pass(descriptor))
    }

    /// Attach `child` under `parent`.
    ///
    /// If the parent is part of the hierarchy, the child subtree joins it and
    /// every pass in it is queued for build.
    ///
    /// # Errors
    ///
    /// Returns an error if either key is unknown, `parent` is not a parent
    /// pass, `child` already has a parent or is the root, the parent already
    /// has a child with the same name, the child's name contains `.`, or the
    /// link would create a cycle.
    pub fn add_child(&mut self, parent: PassKey, child: PassKey) -> Result<()> {
        let parent_pass = self.passes.get(parent)
            .ok_or_else(|| Error::InvalidPass("Unknown parent pass key".to_string()))?;
        let child_pass = self.passes.get(child)
            .ok_or_else(|| Error::InvalidPass("Unknown child pass key".to_string()))?;

        if !parent_pass.kind().is_parent() {
            return Err(Error::InvalidHierarchy(format!(
                "Pass '{}' is not a parent pass and cannot hold children", parent_pass.path()
            )));
        }
        if child == self.root {
            return Err(Error::InvalidHierarchy("The root pass cannot be a child".to_string()));
        }
        if child_pass.name().contains(PATH_SEPARATOR) {
            return Err(Error::InvalidHierarchy(format!(
                "Pass name '{}' contains the path separator '{}'", child_pass.name(), PATH_SEPARATOR
            )));
        }
        if child_pass.parent().is_some() {
            return Err(Error::InvalidHierarchy(format!(
                "Pass '{}' already has a parent", child_pass.path()
            )));
        }
        if self.ancestors_and_self(parent).any(|key| key == child) {
            return Err(Error::InvalidHierarchy(format!(
                "Adding '{}' under '{}' would create a cycle", child_pass.name(), parent_pass.path()
            )));
        }
        let duplicate = parent_pass.children().iter()
            .filter_map(|&key| self.passes.get(key))
            .any(|sibling| sibling.name() == child_pass.name());
        if duplicate {
            return Err(Error::InvalidHierarchy(format!(
                "Pass '{}' already has a child named '{}'", parent_pass.path(), child_pass.name()
            )));
        }

        self.passes[parent].children.push(child);
        self.passes[child].parent = Some(parent);
        self.pending_destroy.retain(|&key| key != child);
        self.refresh_subtree(child);
        Ok(())
    }

    /// Recompute depth, path and hierarchy membership for `key` and its
    /// descendants; passes that just joined the hierarchy are queued for build.
    pub(crate) fn refresh_subtree(&mut self, key: PassKey) {
        for node in self.subtree(key) {
            let (depth, path, in_hierarchy) = match self.passes[node].parent {
                Some(parent) => {
                    let parent = &self.passes[parent];
                    (
                        parent.tree_depth + 1,
                        format!("{}{}{}", parent.path, PATH_SEPARATOR, self.passes[node].name),
                        parent.is_part_of_hierarchy(),
                    )
                }
                None => (0, self.passes[node].name.clone(), node == self.root),
            };

            let pass = &mut self.passes[node];
            pass.tree_depth = depth;
            pass.path = path;
            pass.flags.set(PassFlags::PART_OF_HIERARCHY, in_hierarchy);

            if in_hierarchy {
                if pass.state == PassState::Removed {
                    pass.state = PassState::Reset;
                }
                self.request_build(node);
            }
        }
    }

    /// Detach `key` from its parent and orphan its whole subtree.
    ///
    /// Orphaned passes are marked `Removed`, dropped from every queue and
    /// freed at the start of the next frame unless re-attached.
    pub(crate) fn detach(&mut self, key: PassKey) {
        let Some(parent) = self.passes.get(key).map(|pass| pass.parent) else {
            return;
        };
        if let Some(parent) = parent {
            if let Some(parent_pass) = self.passes.get_mut(parent) {
                parent_pass.children.retain(|&child| child != key);
            }
        }
        self.passes[key].parent = None;

        // Deepest first so descendants are orphaned before their ancestors
        let mut nodes = self.subtree(key);
        nodes.reverse();
        for node in nodes {
            self.orphan(node);
        }
        self.refresh_subtree(key);

        if !self.pending_destroy.contains(&key) {
            self.pending_destroy.push(key);
        }
        engine_trace!("galaxy3d::PassSystem", "Detached pass '{}'", self.passes[key].path);
    }

    fn orphan(&mut self, key: PassKey) {
        let pass = &mut self.passes[key];
        pass.flags.remove(PassFlags::PART_OF_HIERARCHY);
        pass.state = PassState::Removed;
        pass.queue_state = PassQueueState::NoQueue;

        if let Some(mut behavior) = pass.behavior.take() {
            behavior.on_orphan(pass);
            pass.behavior = Some(behavior);
        }
        self.backend.release_bindings(key);
    }

    /// Free detached subtrees queued by the previous frame's removals
    pub(crate) fn free_pending_destroy(&mut self) {
        for key in std::mem::take(&mut self.pending_destroy) {
            let detached = matches!(
                self.passes.get(key),
                Some(pass) if pass.parent.is_none() && !pass.is_part_of_hierarchy()
            );
            if detached {
                self.free_subtree(key);
            }
        }
    }

    /// Free a detached pass and its subtree immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the pass is unknown, still has a parent, or is
    /// part of the hierarchy.
    pub fn destroy_pass(&mut self, key: PassKey) -> Result<()> {
        let pass = self.passes.get(key)
            .ok_or_else(|| Error::InvalidPass("Unknown pass key".to_string()))?;
        if pass.parent.is_some() || pass.is_part_of_hierarchy() {
            return Err(Error::InvalidHierarchy(format!(
                "Pass '{}' is still attached; request its removal first", pass.path()
            )));
        }
        self.pending_destroy.retain(|&pending| pending != key);
        self.free_subtree(key);
        Ok(())
    }

    fn free_subtree(&mut self, key: PassKey) {
        let nodes = self.subtree(key);
        for node in &nodes {
            self.passes.remove(*node);
        }
        engine_trace!("galaxy3d::PassSystem", "Freed {} detached pass(es)", nodes.len());
    }

    // ===== ENABLE =====

    /// Set the pass's own enabled flag.
    ///
    /// Disabled passes stay built but are left out of `execution_order` and
    /// dependency computation, along with all their descendants.
    pub fn set_enabled(&mut self, key: PassKey, enabled: bool) -> Result<()> {
        let pass = self.passes.get_mut(key)
            .ok_or_else(|| Error::InvalidPass("Unknown pass key".to_string()))?;
        if pass.is_enabled_self() != enabled {
            pass.flags.set(PassFlags::ENABLED, enabled);
            self.enabled_dirty = true;
        }
        Ok(())
    }

    /// Whether the pass and all its ancestors are enabled
    pub fn is_enabled(&self, key: PassKey) -> bool {
        self.contains(key)
            && self.ancestors_and_self(key).all(|k| self.passes[k].is_enabled_self())
    }

    // ===== TRAVERSAL =====

    /// Children of `key` (empty for unknown keys)
    pub fn children(&self, key: PassKey) -> &[PassKey] {
        self.passes.get(key).map_or(&[], |pass| pass.children())
    }

    /// Iterator from `key` up to its topmost ancestor
    pub fn ancestors_and_self(&self, key: PassKey) -> impl Iterator<Item = PassKey> + '_ {
        std::iter::successors(
            self.passes.contains_key(key).then_some(key),
            move |&current| self.passes.get(current).and_then(|pass| pass.parent),
        )
    }

    /// `key` and its descendants in pre-order
    pub fn subtree(&self, key: PassKey) -> Vec<PassKey> {
        let mut result = Vec::new();
        let mut stack = Vec::new();
        if self.passes.contains_key(key) {
            stack.push(key);
        }
        while let Some(node) = stack.pop() {
            result.push(node);
            if let Some(pass) = self.passes.get(node) {
                stack.extend(pass.children.iter().rev().copied());
            }
        }
        result
    }

    /// Find a pass by dot-separated path starting at the root name (e.g. `Root.Bloom.Blur`)
    pub fn find_pass(&self, path: &str) -> Option<PassKey> {
        let mut names = path.split(PATH_SEPARATOR);
        let mut current = self.root;
        if names.next()? != self.passes[current].name {
            return None;
        }
        for name in names {
            current = *self.passes[current]
                .children
                .iter()
                .find(|&&child| self.passes.get(child).is_some_and(|pass| pass.name == name))?;
        }
        Some(current)
    }

    /// Enabled, initialized leaf passes in pre-order: the order they execute in
    pub fn execution_order(&self) -> Vec<PassKey> {
        let mut order = Vec::new();
        let mut stack = vec![self.root];
        while let Some(key) = stack.pop() {
            let Some(pass) = self.passes.get(key) else {
                continue;
            };
            if !pass.is_enabled_self() {
                continue;
            }
            if pass.kind().is_parent() {
                stack.extend(pass.children.iter().rev().copied());
            } else if pass.state == PassState::Initialized {
                order.push(key);
            }
        }
        order
    }

    /// Indented dump of the hierarchy, one pass per line
    pub fn hierarchy_string(&self) -> String {
        let mut out = String::new();
        for key in self.subtree(self.root) {
            let pass = &self.passes[key];
            let marker = if pass.is_enabled_self() { "" } else { " (disabled)" };
            out.push_str(&format!(
                "{}{} [{:?}, {:?}]{}\n",
                "  ".repeat(pass.tree_depth as usize),
                pass.name,
                pass.kind,
                pass.state,
                marker
            ));
        }
        out
    }

    /// Log the hierarchy dump at debug severity
    pub fn debug_print(&self) {
        engine_debug!("galaxy3d::PassSystem", "Pass hierarchy:\n{}", self.hierarchy_string());
    }
}
