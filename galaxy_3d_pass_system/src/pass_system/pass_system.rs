/// Pass system - owns the pass hierarchy and drives its lifecycle.
///
/// Changes (new passes, rebuilds, removals) are only queued when requested.
/// `process_queued_changes` applies them once per frame in fixed phase
/// order: remove (deepest first), build (fixed-point, shallowest first),
/// initialize, then validate. Each phase works on a snapshot of its queue
/// sorted by `(tree_depth, creation_index)`, and entries whose queue state no
/// longer matches the phase are skipped as stale.

use std::mem;
use slotmap::SlotMap;
use rustc_hash::FxHashSet;
use crate::error::{Error, Result};
use crate::{engine_error, engine_info, engine_trace, engine_warn};
use super::backend::PassBackend;
use super::config::{PassSystemConfig, DEFAULT_ROOT_NAME};
use super::hierarchy::PATH_SEPARATOR;
use super::dependency::PassDependency;
use super::descriptor::PassDescriptor;
use super::pass::{Pass, PassFlags, PassKey, PassKind, PassQueueState};
use super::request_queue::{PassChangeRequest, PassRequestSender};
use super::template::PassTemplateLibrary;
use super::validation::ValidationReport;
use super::attachment::AttachmentId;

/// Phase the pass system is currently executing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassSystemState {
    Idle,
    RemovingPasses,
    BuildingPasses,
    InitializingPasses,
    Validating,
}

/// Owner of every pass and of the per-phase queues
pub struct PassSystem {
    pub(crate) config: PassSystemConfig,
    pub(crate) passes: SlotMap<PassKey, Pass>,
    pub(crate) root: PassKey,

    pub(crate) remove_list: Vec<PassKey>,
    pub(crate) build_list: Vec<PassKey>,
    pub(crate) initialize_list: Vec<PassKey>,
    /// Detached subtree roots, freed next frame unless re-attached
    pub(crate) pending_destroy: Vec<PassKey>,

    pub(crate) state: PassSystemState,
    /// Pass whose build hook is currently running
    pub(crate) building: Option<PassKey>,
    pub(crate) changed_this_frame: bool,
    /// An enabled flag changed since the last frame
    pub(crate) enabled_dirty: bool,
    pub(crate) frame_index: u64,
    pub(crate) next_creation_index: u64,
    pub(crate) next_attachment_id: u64,

    pub(crate) library: PassTemplateLibrary,
    pub(crate) backend: Box<dyn PassBackend>,
    pub(crate) requests: PassRequestSender,
    /// Passes re-queued this frame because a pass they bind through rebuilt
    pub(crate) requeued_dependents: FxHashSet<PassKey>,
    pub(crate) validation_report: ValidationReport,
    pub(crate) dependencies: Vec<PassDependency>,
}

impl PassSystem {
    /// Create a pass system with an empty root pass queued for build
    ///
    /// A root name containing `.` is replaced by the default name.
    pub fn new<B: PassBackend + 'static>(config: PassSystemConfig, backend: B) -> Self {
        let mut system = Self {
            config,
            passes: SlotMap::with_key(),
            root: PassKey::default(),
            remove_list: Vec::new(),
            build_list: Vec::new(),
            initialize_list: Vec::new(),
            pending_destroy: Vec::new(),
            state: PassSystemState::Idle,
            building: None,
            changed_this_frame: false,
            enabled_dirty: false,
            frame_index: 0,
            next_creation_index: 0,
            next_attachment_id: 0,
            library: PassTemplateLibrary::new(),
            backend: Box::new(backend),
            requests: PassRequestSender::new(),
            requeued_dependents: FxHashSet::default(),
            validation_report: ValidationReport::default(),
            dependencies: Vec::new(),
        };

        if system.config.root_name.contains(PATH_SEPARATOR) {
            engine_error!("galaxy3d::PassSystem",
                "Root name '{}' contains the path separator '{}', using '{}'",
                system.config.root_name, PATH_SEPARATOR, DEFAULT_ROOT_NAME);
            system.config.root_name = DEFAULT_ROOT_NAME.to_string();
        }
        let root_name = system.config.root_name.clone();
        let root = system.create_pass(PassDescriptor::new(&root_name, PassKind::Parent));
        system.passes[root].flags.insert(PassFlags::PART_OF_HIERARCHY);
        system.root = root;
        system.request_build(root);

        engine_info!("galaxy3d::PassSystem", "Pass system created (root '{}')", root_name);
        system
    }

    // ===== ACCESSORS =====

    pub fn config(&self) -> &PassSystemConfig {
        &self.config
    }

    pub fn root(&self) -> PassKey {
        self.root
    }

    pub fn pass(&self, key: PassKey) -> Option<&Pass> {
        self.passes.get(key)
    }

    pub fn contains(&self, key: PassKey) -> bool {
        self.passes.contains_key(key)
    }

    /// Number of live passes, detached ones included
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    pub fn state(&self) -> PassSystemState {
        self.state
    }

    /// Number of completed `process_queued_changes` calls
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Whether the last processed frame changed anything
    pub fn changed_this_frame(&self) -> bool {
        self.changed_this_frame
    }

    pub fn templates(&self) -> &PassTemplateLibrary {
        &self.library
    }

    pub fn templates_mut(&mut self) -> &mut PassTemplateLibrary {
        &mut self.library
    }

    /// Cloneable handle for queueing requests from other threads
    pub fn request_sender(&self) -> PassRequestSender {
        self.requests.clone()
    }

    /// Report produced by the last validate phase
    pub fn validation_report(&self) -> &ValidationReport {
        &self.validation_report
    }

    /// Attachment dependencies between enabled leaf passes, in execution order
    pub fn dependencies(&self) -> &[PassDependency] {
        &self.dependencies
    }

    /// Whether any queue holds work for the next frame
    pub fn has_pending_changes(&self) -> bool {
        !self.remove_list.is_empty()
            || !self.build_list.is_empty()
            || !self.initialize_list.is_empty()
            || self.enabled_dirty
            || self.requests.pending_count() > 0
    }

    pub(crate) fn allocate_attachment_id(&mut self) -> AttachmentId {
        let id = AttachmentId(self.next_attachment_id);
        self.next_attachment_id += 1;
        id
    }

    // ===== QUEUEING =====

    /// Queue a pass for (re)build on the next frame.
    ///
    /// Returns false if the pass is unknown, detached, already queued for
    /// build or removal, or currently building.
    pub fn request_build(&mut self, key: PassKey) -> bool {
        let Some(pass) = self.passes.get_mut(key) else {
            return false;
        };
        if !pass.is_part_of_hierarchy() || self.building == Some(key) {
            return false;
        }
        match pass.queue_state {
            PassQueueState::QueuedForBuild | PassQueueState::QueuedForRemoval => false,
            PassQueueState::NoQueue | PassQueueState::QueuedForInitialization => {
                pass.queue_state = PassQueueState::QueuedForBuild;
                self.build_list.push(key);
                true
            }
        }
    }

    /// Queue a pass for removal on the next frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the pass is unknown, is the root, or is the pass
    /// whose build is currently in flight.
    pub fn request_removal(&mut self, key: PassKey) -> Result<()> {
        if key == self.root {
            return Err(Error::InvalidHierarchy("The root pass cannot be removed".to_string()));
        }
        if self.building == Some(key) {
            engine_error!("galaxy3d::PassSystem",
                "Removal of pass '{}' requested while it is building",
                self.passes.get(key).map_or("?", |p| p.path()));
            return Err(Error::InvalidHierarchy(
                "A pass cannot be removed while its build is in flight".to_string()
            ));
        }
        let pass = self.passes.get_mut(key)
            .ok_or_else(|| Error::InvalidPass("Unknown pass key".to_string()))?;

        if pass.queue_state != PassQueueState::QueuedForRemoval {
            pass.queue_state = PassQueueState::QueuedForRemoval;
            self.remove_list.push(key);
        }
        Ok(())
    }

    pub(crate) fn queue_for_initialization(&mut self, key: PassKey) {
        if let Some(pass) = self.passes.get_mut(key) {
            if pass.queue_state == PassQueueState::NoQueue {
                pass.queue_state = PassQueueState::QueuedForInitialization;
                self.initialize_list.push(key);
            }
        }
    }

    /// Filter a queue down to live entries in the `expected` queue state,
    /// sorted by `(tree_depth, creation_index)` and deduplicated.
    pub(crate) fn snapshot(&self, list: Vec<PassKey>, expected: PassQueueState, in_hierarchy_only: bool) -> Vec<PassKey> {
        let mut snapshot: Vec<PassKey> = list
            .into_iter()
            .filter(|&key| match self.passes.get(key) {
                Some(pass) => pass.queue_state == expected
                    && (!in_hierarchy_only || pass.is_part_of_hierarchy()),
                None => false,
            })
            .collect();
        snapshot.sort_by_key(|&key| self.sort_key(key));
        snapshot.dedup();
        snapshot
    }

    fn sort_key(&self, key: PassKey) -> (u32, u64) {
        self.passes
            .get(key)
            .map_or((u32::MAX, u64::MAX), |pass| (pass.tree_depth, pass.creation_index))
    }

    // ===== FRAME PROCESSING =====

    /// Apply every queued change: remove, build, initialize, validate.
    ///
    /// Returns true if anything changed this frame.
    pub fn process_queued_changes(&mut self) -> bool {
        if self.state != PassSystemState::Idle {
            debug_assert!(false, "process_queued_changes re-entered during {:?}", self.state);
            engine_error!("galaxy3d::PassSystem",
                "process_queued_changes re-entered during {:?}, ignored", self.state);
            return false;
        }

        self.changed_this_frame = mem::take(&mut self.enabled_dirty);
        self.free_pending_destroy();
        self.drain_requests();

        self.remove_passes();
        self.build_passes();
        self.initialize_passes();

        if self.changed_this_frame {
            self.dependencies = self.compute_dependencies();
            if self.config.validation_enabled {
                self.state = PassSystemState::Validating;
                self.validation_report = self.validate();
                self.log_validation_summary();
            }
            if self.config.debug_print_hierarchy {
                self.debug_print();
            }
        }

        self.state = PassSystemState::Idle;
        self.frame_index += 1;
        engine_trace!("galaxy3d::PassSystem", "Frame {} processed (changed: {})",
            self.frame_index, self.changed_this_frame);
        self.changed_this_frame
    }

    fn drain_requests(&mut self) {
        for request in self.requests.drain() {
            match request {
                PassChangeRequest::Build(key) => {
                    self.request_build(key);
                }
                PassChangeRequest::Removal(key) => {
                    if let Err(error) = self.request_removal(key) {
                        engine_warn!("galaxy3d::PassSystem", "Queued removal dropped: {}", error);
                    }
                }
            }
        }
    }

    fn remove_passes(&mut self) {
        self.state = PassSystemState::RemovingPasses;
        if self.remove_list.is_empty() {
            return;
        }

        let list = mem::take(&mut self.remove_list);
        let mut snapshot = self.snapshot(list, PassQueueState::QueuedForRemoval, false);
        // Deepest first so children are detached before their parents
        snapshot.reverse();

        for key in snapshot {
            self.detach(key);
            self.changed_this_frame = true;
        }
    }

    fn log_validation_summary(&self) {
        let report = &self.validation_report;
        if report.has_errors() {
            engine_warn!("galaxy3d::PassSystem", "Validation: {} error(s), {} warning(s)",
                report.error_count(), report.warning_count());
        } else {
            engine_trace!("galaxy3d::PassSystem", "Validation: {} warning(s)", report.warning_count());
        }
    }
}

#[cfg(test)]
#[path = "pass_system_tests.rs"]
mod tests;
