//! Pass hierarchy and its queued build/initialize lifecycle

mod attachment;
mod backend;
mod behavior;
mod config;
mod connection;
mod dependency;
mod descriptor;
mod hierarchy;
mod lifecycle;
mod mock_backend;
mod pass;
mod pass_system;
mod request_queue;
mod template;
mod validation;

pub use attachment::{
    AttachmentBinding, AttachmentId, AttachmentKind, AttachmentRef, AttachmentUsage,
    PassAttachment, PassAttachmentDesc, PassConnection, PassSlot, SlotType,
    PASS_NAME_PARENT, PASS_NAME_THIS,
};
pub use backend::{NullBackend, PassBackend, PassBindingInfo};
pub use behavior::{BuildContext, CustomBehavior, NoOpBehavior, PassBehavior};
pub use config::PassSystemConfig;
pub use dependency::{DependencyKind, PassDependency};
pub use descriptor::PassDescriptor;
pub use mock_backend::{MockBackend, MockBackendLog};
pub use pass::{Pass, PassFlags, PassKey, PassKind, PassQueueState, PassState};
pub use pass_system::{PassSystem, PassSystemState};
pub use request_queue::{PassChangeRequest, PassRequestSender};
pub use template::{PassFactory, PassRequest, PassTemplate, PassTemplateLibrary};
pub use validation::{ValidationEntry, ValidationReport, ValidationSeverity};
