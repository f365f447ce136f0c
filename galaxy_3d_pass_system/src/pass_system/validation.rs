/// Validate phase: structural checks over the whole hierarchy.

use rustc_hash::FxHashSet;
use super::attachment::SlotType;
use super::pass::{PassKey, PassState};
use super::pass_system::PassSystem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationSeverity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationEntry {
    pub pass: PassKey,
    pub path: String,
    pub severity: ValidationSeverity,
    pub message: String,
}

/// Findings of the last validate phase, in pre-order of the hierarchy
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    entries: Vec<ValidationEntry>,
}

impl ValidationReport {
    pub fn entries(&self) -> &[ValidationEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn error_count(&self) -> usize {
        self.count(ValidationSeverity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(ValidationSeverity::Warning)
    }

    /// Entries concerning one pass
    pub fn for_pass(&self, key: PassKey) -> impl Iterator<Item = &ValidationEntry> + '_ {
        self.entries.iter().filter(move |entry| entry.pass == key)
    }

    fn count(&self, severity: ValidationSeverity) -> usize {
        self.entries.iter().filter(|entry| entry.severity == severity).count()
    }

    fn push(&mut self, pass: PassKey, path: &str, severity: ValidationSeverity, message: String) {
        self.entries.push(ValidationEntry {
            pass,
            path: path.to_string(),
            severity,
            message,
        });
    }
}

impl PassSystem {
    /// Check every pass reachable from the root.
    ///
    /// Reports unresolved bindings (errors for inputs, warnings for outputs),
    /// bindings whose source pass left the hierarchy or whose attachment was
    /// dropped by a rebuild of its owner, broken parent links,
    /// duplicate child names, passes that did not reach `Initialized`, and
    /// the messages passes logged themselves.
    pub(crate) fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();

        for key in self.subtree(self.root) {
            let pass = &self.passes[key];
            let path = pass.path();

            for binding in pass.bindings() {
                if !binding.is_resolved() {
                    let severity = match binding.slot_type() {
                        SlotType::Input | SlotType::InputOutput => ValidationSeverity::Error,
                        SlotType::Output => ValidationSeverity::Warning,
                    };
                    report.push(key, path, severity,
                        format!("{:?} slot '{}' has no attachment", binding.slot_type(), binding.name()));
                    continue;
                }

                let source_live = binding.source_pass()
                    .and_then(|source| self.passes.get(source))
                    .is_some_and(|source| source.is_part_of_hierarchy());
                if !source_live {
                    report.push(key, path, ValidationSeverity::Error,
                        format!("slot '{}' is bound through a pass no longer in the hierarchy", binding.name()));
                }

                let attachment_live = binding.attachment().is_some_and(|attachment| {
                    self.passes
                        .get(attachment.owner())
                        .is_some_and(|owner| owner.owned_attachments().iter().any(|owned| owned.id() == attachment.id()))
                });
                if !attachment_live {
                    report.push(key, path, ValidationSeverity::Error,
                        format!("slot '{}' is bound to an attachment its owner no longer holds", binding.name()));
                }
            }

            let mut names = FxHashSet::default();
            for &child in pass.children() {
                match self.passes.get(child) {
                    Some(child_pass) => {
                        if child_pass.parent() != Some(key) || !child_pass.is_part_of_hierarchy() {
                            report.push(key, path, ValidationSeverity::Error,
                                format!("child '{}' is not linked back to this pass", child_pass.name()));
                        }
                        if !names.insert(child_pass.name()) {
                            report.push(key, path, ValidationSeverity::Error,
                                format!("duplicate child name '{}'", child_pass.name()));
                        }
                    }
                    None => report.push(key, path, ValidationSeverity::Error,
                        "child key refers to a freed pass".to_string()),
                }
            }

            if pass.state() != PassState::Initialized {
                report.push(key, path, ValidationSeverity::Warning,
                    format!("pass is {:?} instead of Initialized", pass.state()));
            }

            for message in pass.error_messages() {
                report.push(key, path, ValidationSeverity::Error, message.clone());
            }
            for message in pass.warning_messages() {
                report.push(key, path, ValidationSeverity::Warning, message.clone());
            }
        }

        report
    }
}
