/// Pass templates, requests and the template library.
///
/// A `PassTemplate` is a shared, immutable blueprint: slots, default
/// connections, owned attachments and (for parent templates) the requests
/// for child passes. A `PassRequest` instantiates a named pass from a
/// template and may override its connections.

use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use super::attachment::{PassAttachmentDesc, PassConnection, PassSlot};
use super::behavior::PassBehavior;
use super::descriptor::PassDescriptor;
use super::pass::PassKind;

/// Blueprint shared by every pass instantiated from it
#[derive(Debug, Clone, PartialEq)]
pub struct PassTemplate {
    pub name: String,
    pub kind: PassKind,
    pub slots: Vec<PassSlot>,
    pub connections: Vec<PassConnection>,
    pub attachments: Vec<PassAttachmentDesc>,
    /// Children created once when a parent pass built from this template first builds
    pub child_requests: Vec<PassRequest>,
}

impl PassTemplate {
    pub fn new(name: &str, kind: PassKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            slots: Vec::new(),
            connections: Vec::new(),
            attachments: Vec::new(),
            child_requests: Vec::new(),
        }
    }

    pub fn with_slot(mut self, slot: PassSlot) -> Self {
        self.slots.push(slot);
        self
    }

    pub fn with_connection(mut self, connection: PassConnection) -> Self {
        self.connections.push(connection);
        self
    }

    pub fn with_attachment(mut self, attachment: PassAttachmentDesc) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn with_child_request(mut self, request: PassRequest) -> Self {
        self.child_requests.push(request);
        self
    }
}

/// Request to instantiate a pass from a template
#[derive(Debug, Clone, PartialEq)]
pub struct PassRequest {
    pub pass_name: String,
    pub template_name: String,
    /// Override template connections with the same local slot
    pub connections: Vec<PassConnection>,
    pub enabled: bool,
}

impl PassRequest {
    pub fn new(pass_name: &str, template_name: &str) -> Self {
        Self {
            pass_name: pass_name.to_string(),
            template_name: template_name.to_string(),
            connections: Vec::new(),
            enabled: true,
        }
    }

    pub fn with_connection(mut self, connection: PassConnection) -> Self {
        self.connections.push(connection);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Turns a request into a pass descriptor
pub trait PassFactory {
    /// Returns None when the request names an unknown template
    fn create(&self, request: &PassRequest) -> Option<PassDescriptor>;
}

type BehaviorFactory = Arc<dyn Fn() -> Box<dyn PassBehavior> + Send + Sync>;

struct TemplateEntry {
    template: Arc<PassTemplate>,
    behavior: Option<BehaviorFactory>,
}

/// Named templates with optional per-template behavior constructors
#[derive(Default)]
pub struct PassTemplateLibrary {
    entries: FxHashMap<String, TemplateEntry>,
}

impl PassTemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template
    ///
    /// # Errors
    ///
    /// Returns an error if a template with the same name already exists
    pub fn add_template(&mut self, template: PassTemplate) -> Result<Arc<PassTemplate>> {
        self.insert(template, None)
    }

    /// Register a template whose passes get a fresh behavior from `factory`
    pub fn add_template_with_behavior<F>(&mut self, template: PassTemplate, factory: F) -> Result<Arc<PassTemplate>>
    where
        F: Fn() -> Box<dyn PassBehavior> + Send + Sync + 'static,
    {
        self.insert(template, Some(Arc::new(factory)))
    }

    fn insert(&mut self, template: PassTemplate, behavior: Option<BehaviorFactory>) -> Result<Arc<PassTemplate>> {
        if self.entries.contains_key(&template.name) {
            return Err(Error::InvalidPass(format!(
                "Template '{}' already registered", template.name
            )));
        }
        let template = Arc::new(template);
        self.entries.insert(template.name.clone(), TemplateEntry {
            template: Arc::clone(&template),
            behavior,
        });
        Ok(template)
    }

    pub fn remove_template(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    pub fn template(&self, name: &str) -> Option<&Arc<PassTemplate>> {
        self.entries.get(name).map(|entry| &entry.template)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn template_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl PassFactory for PassTemplateLibrary {
    fn create(&self, request: &PassRequest) -> Option<PassDescriptor> {
        let entry = self.entries.get(&request.template_name)?;
        let mut descriptor = PassDescriptor::from_template(&request.pass_name, &entry.template)
            .with_request(request.clone());
        if let Some(factory) = &entry.behavior {
            descriptor.behavior = Some(factory());
        }
        Some(descriptor)
    }
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
