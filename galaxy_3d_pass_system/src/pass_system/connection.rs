/// Connection resolution: binds each slot of a building pass to an attachment.
///
/// Targets are searched in order: `This` (attachments owned by the pass),
/// `Parent` (a parent binding, else a parent-owned attachment), then a
/// sibling by name. A binding resolved through the parent or a sibling
/// shares that pass's attachment, so siblings must be built first for a
/// sibling connection to resolve. A sibling whose build failed resolves
/// nothing.

use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::engine_warn;
use super::attachment::{PassAttachment, PassConnection, SlotType, PASS_NAME_PARENT, PASS_NAME_THIS};
use super::pass::{PassKey, PassState};
use super::pass_system::PassSystem;

type Resolved = std::result::Result<(Arc<PassAttachment>, PassKey), String>;

impl PassSystem {
    /// Resolve every connection of `key`.
    ///
    /// Returns the messages for required (Input / InputOutput) bindings left
    /// unresolved; the build fails when this is non-empty. Unresolved Output
    /// bindings and connections naming unknown local slots are only recorded.
    pub(crate) fn resolve_connections(&mut self, key: PassKey) -> Vec<String> {
        let pass = &self.passes[key];
        let connections: Vec<PassConnection> = pass.connections
            .iter()
            .chain(pass.build_connections.iter())
            .cloned()
            .collect();

        let mut failures: FxHashMap<String, String> = FxHashMap::default();
        let mut unknown_slots = Vec::new();

        for connection in &connections {
            let Some(index) = self.passes[key].find_binding_index(&connection.local_slot) else {
                unknown_slots.push(format!(
                    "connection targets unknown local slot '{}'", connection.local_slot
                ));
                continue;
            };

            match self.resolve_connection(key, index, connection) {
                Ok((attachment, source)) => {
                    self.passes[key].bindings[index].bind(attachment, source);
                    failures.remove(&connection.local_slot);
                }
                Err(message) => {
                    failures.insert(connection.local_slot.clone(), message);
                }
            }
        }

        let keep = self.config.validation_enabled;
        let limit = self.config.message_log_limit;
        let pass = &mut self.passes[key];
        let mut required = Vec::new();
        let mut optional = Vec::new();

        for binding in pass.bindings.iter().filter(|b| !b.is_resolved()) {
            let reason = failures
                .get(binding.name())
                .cloned()
                .unwrap_or_else(|| "no connection".to_string());
            let message = format!("{:?} slot '{}' is unresolved: {}", binding.slot_type(), binding.name(), reason);
            match binding.slot_type() {
                SlotType::Input | SlotType::InputOutput => required.push(message),
                SlotType::Output => optional.push(message),
            }
        }

        for message in unknown_slots {
            engine_warn!("galaxy3d::Pass", "Pass '{}': {}", pass.path, message);
            pass.record_error(message, keep, limit);
        }
        for message in optional {
            engine_warn!("galaxy3d::Pass", "Pass '{}': {}", pass.path, message);
            pass.record_warning(message, keep, limit);
        }
        required
    }

    fn resolve_connection(&self, key: PassKey, index: usize, connection: &PassConnection) -> Resolved {
        let pass = &self.passes[key];
        let local_type = pass.bindings[index].slot_type();
        let target = &connection.attachment_ref;

        if target.pass == PASS_NAME_THIS {
            return pass
                .find_owned_attachment(&target.attachment)
                .map(|attachment| (Arc::clone(attachment), key))
                .ok_or_else(|| format!("pass owns no attachment named '{}'", target.attachment));
        }

        let parent_key = pass.parent
            .ok_or_else(|| format!("pass has no parent to resolve '{}'", target.pass))?;
        let parent = &self.passes[parent_key];

        if target.pass == PASS_NAME_PARENT {
            return match parent.find_binding(&target.attachment) {
                Some(binding) => {
                    let mismatch = binding.slot_type() != local_type
                        && binding.slot_type() != SlotType::InputOutput
                        && local_type != SlotType::InputOutput;
                    if mismatch {
                        return Err(format!(
                            "slot type mismatch with parent slot '{}' ({:?} vs {:?})",
                            target.attachment, local_type, binding.slot_type()
                        ));
                    }
                    binding
                        .attachment()
                        .map(|attachment| (Arc::clone(attachment), parent_key))
                        .ok_or_else(|| format!("parent slot '{}' is itself unresolved", target.attachment))
                }
                None => parent
                    .find_owned_attachment(&target.attachment)
                    .map(|attachment| (Arc::clone(attachment), parent_key))
                    .ok_or_else(|| format!("parent has no slot or attachment named '{}'", target.attachment)),
            };
        }

        // A child sharing its parent's name would otherwise find its parent's sibling
        if target.pass == pass.name {
            return Err(format!("pass cannot connect to itself by name '{}'", target.pass));
        }

        let sibling_key = parent
            .children
            .iter()
            .copied()
            .find(|&child| self.passes.get(child).is_some_and(|sibling| sibling.name == target.pass))
            .ok_or_else(|| format!("no sibling pass named '{}'", target.pass))?;
        let sibling = &self.passes[sibling_key];
        if !matches!(sibling.state, PassState::Built | PassState::Initialized) {
            return Err(format!("sibling '{}' is {:?}, not built", target.pass, sibling.state));
        }
        let binding = sibling
            .find_binding(&target.attachment)
            .ok_or_else(|| format!("sibling '{}' has no slot named '{}'", target.pass, target.attachment))?;

        let mismatch = binding.slot_type() == local_type && local_type != SlotType::InputOutput;
        if mismatch {
            return Err(format!(
                "slot type mismatch with sibling slot '{}.{}' (both {:?})",
                target.pass, target.attachment, local_type
            ));
        }
        binding
            .attachment()
            .map(|attachment| (Arc::clone(attachment), sibling_key))
            .ok_or_else(|| format!("sibling slot '{}.{}' is unresolved", target.pass, target.attachment))
    }
}
