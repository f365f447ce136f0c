/// Everything needed to create a pass

use std::sync::Arc;
use super::attachment::{PassAttachmentDesc, PassConnection, PassSlot};
use super::behavior::PassBehavior;
use super::pass::PassKind;
use super::template::{PassRequest, PassTemplate};

/// Creation parameters for `PassSystem::create_pass`
///
/// Built either by hand or from a template (and optionally a request).
pub struct PassDescriptor {
    pub name: String,
    pub kind: PassKind,
    pub enabled: bool,
    pub template: Option<Arc<PassTemplate>>,
    pub request: Option<PassRequest>,
    pub slots: Vec<PassSlot>,
    pub connections: Vec<PassConnection>,
    pub attachments: Vec<PassAttachmentDesc>,
    pub behavior: Option<Box<dyn PassBehavior>>,
}

impl PassDescriptor {
    pub fn new(name: &str, kind: PassKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            enabled: true,
            template: None,
            request: None,
            slots: Vec::new(),
            connections: Vec::new(),
            attachments: Vec::new(),
            behavior: None,
        }
    }

    /// Copy slots, connections and attachments out of `template`
    pub fn from_template(name: &str, template: &Arc<PassTemplate>) -> Self {
        Self {
            name: name.to_string(),
            kind: template.kind,
            enabled: true,
            template: Some(Arc::clone(template)),
            request: None,
            slots: template.slots.clone(),
            connections: template.connections.clone(),
            attachments: template.attachments.clone(),
            behavior: None,
        }
    }

    /// Apply a request: its connections replace those on the same local slot
    pub fn with_request(mut self, request: PassRequest) -> Self {
        for connection in &request.connections {
            self.set_connection(connection.clone());
        }
        self.enabled = request.enabled;
        self.request = Some(request);
        self
    }

    pub fn with_slot(mut self, slot: PassSlot) -> Self {
        self.slots.push(slot);
        self
    }

    /// Add a connection, replacing any earlier one on the same local slot
    pub fn with_connection(mut self, connection: PassConnection) -> Self {
        self.set_connection(connection);
        self
    }

    pub fn with_attachment(mut self, attachment: PassAttachmentDesc) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn with_behavior<B: PassBehavior + 'static>(mut self, behavior: B) -> Self {
        self.behavior = Some(Box::new(behavior));
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    fn set_connection(&mut self, connection: PassConnection) {
        match self.connections.iter_mut().find(|c| c.local_slot == connection.local_slot) {
            Some(existing) => *existing = connection,
            None => self.connections.push(connection),
        }
    }
}
