/// Attachment slots, connections and resolved bindings of a pass.
///
/// A pass declares *slots* (named inputs/outputs) and *connections* telling
/// each slot where its resource comes from. During build every slot becomes
/// an `AttachmentBinding`, and connection resolution fills the binding with a
/// shared `PassAttachment` owned by this pass, its parent or a sibling.

use std::ops::Range;
use std::sync::Arc;
use super::pass::PassKey;

/// Connection target naming the pass itself
pub const PASS_NAME_THIS: &str = "This";

/// Connection target naming the parent pass
pub const PASS_NAME_PARENT: &str = "Parent";

/// Direction of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotType {
    Input,
    Output,
    InputOutput,
}

/// How the pass accesses the resource bound to a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentUsage {
    Read,
    Write,
    ReadWrite,
}

impl AttachmentUsage {
    /// Usage implied by a slot direction
    pub fn for_slot(slot_type: SlotType) -> Self {
        match slot_type {
            SlotType::Input => AttachmentUsage::Read,
            SlotType::Output => AttachmentUsage::Write,
            SlotType::InputOutput => AttachmentUsage::ReadWrite,
        }
    }

    pub fn reads(self) -> bool {
        matches!(self, AttachmentUsage::Read | AttachmentUsage::ReadWrite)
    }

    pub fn writes(self) -> bool {
        matches!(self, AttachmentUsage::Write | AttachmentUsage::ReadWrite)
    }
}

/// Named slot declared by a template or descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct PassSlot {
    pub name: String,
    pub slot_type: SlotType,
    pub usage: AttachmentUsage,
    /// Subresource range accessed through this slot (whole resource if None)
    pub range: Option<Range<u64>>,
}

impl PassSlot {
    pub fn new(name: &str, slot_type: SlotType) -> Self {
        Self {
            name: name.to_string(),
            slot_type,
            usage: AttachmentUsage::for_slot(slot_type),
            range: None,
        }
    }

    pub fn input(name: &str) -> Self {
        Self::new(name, SlotType::Input)
    }

    pub fn output(name: &str) -> Self {
        Self::new(name, SlotType::Output)
    }

    pub fn input_output(name: &str) -> Self {
        Self::new(name, SlotType::InputOutput)
    }

    /// Override the usage implied by the slot type
    pub fn with_usage(mut self, usage: AttachmentUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Restrict the slot to a subresource range
    pub fn with_range(mut self, range: Range<u64>) -> Self {
        self.range = Some(range);
        self
    }
}

/// Reference to an attachment of another pass: (`This` | `Parent` | sibling name, slot or attachment name)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    pub pass: String,
    pub attachment: String,
}

/// Links a local slot to an attachment reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassConnection {
    pub local_slot: String,
    pub attachment_ref: AttachmentRef,
}

impl PassConnection {
    pub fn new(local_slot: &str, pass: &str, attachment: &str) -> Self {
        Self {
            local_slot: local_slot.to_string(),
            attachment_ref: AttachmentRef {
                pass: pass.to_string(),
                attachment: attachment.to_string(),
            },
        }
    }
}

/// Resource shape of an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    /// Linear buffer of `size` bytes
    Buffer { size: u64 },
    /// Image with a mip chain and array layers
    Image {
        width: u32,
        height: u32,
        mip_levels: u32,
        array_layers: u32,
    },
}

impl AttachmentKind {
    /// Length of the linear range tracked for this resource.
    ///
    /// Bytes for buffers; one unit per (layer, mip) subresource for images.
    pub fn subresource_count(&self) -> u64 {
        match *self {
            AttachmentKind::Buffer { size } => size,
            AttachmentKind::Image { mip_levels, array_layers, .. } => {
                u64::from(mip_levels.max(1)) * u64::from(array_layers.max(1))
            }
        }
    }
}

/// Description of an attachment a pass owns (created at build time)
#[derive(Debug, Clone, PartialEq)]
pub struct PassAttachmentDesc {
    pub name: String,
    pub kind: AttachmentKind,
}

impl PassAttachmentDesc {
    pub fn buffer(name: &str, size: u64) -> Self {
        Self {
            name: name.to_string(),
            kind: AttachmentKind::Buffer { size },
        }
    }

    pub fn image(name: &str, width: u32, height: u32) -> Self {
        Self::image_with_mips(name, width, height, 1, 1)
    }

    pub fn image_with_mips(name: &str, width: u32, height: u32, mip_levels: u32, array_layers: u32) -> Self {
        Self {
            name: name.to_string(),
            kind: AttachmentKind::Image { width, height, mip_levels, array_layers },
        }
    }
}

/// Identifier of an attachment instance, unique within a pass system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttachmentId(pub(crate) u64);

impl AttachmentId {
    pub fn index(&self) -> u64 {
        self.0
    }
}

/// Attachment instance owned by a pass.
///
/// Recreated each time the owning pass is built, shared with every binding
/// that resolves to it.
#[derive(Debug)]
pub struct PassAttachment {
    id: AttachmentId,
    name: String,
    kind: AttachmentKind,
    owner: PassKey,
}

impl PassAttachment {
    pub(crate) fn new(id: AttachmentId, desc: &PassAttachmentDesc, owner: PassKey) -> Self {
        Self {
            id,
            name: desc.name.clone(),
            kind: desc.kind,
            owner,
        }
    }

    pub fn id(&self) -> AttachmentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AttachmentKind {
        self.kind
    }

    /// Pass that created this attachment
    pub fn owner(&self) -> PassKey {
        self.owner
    }
}

/// A slot of a built pass, possibly resolved to an attachment
#[derive(Debug, Clone)]
pub struct AttachmentBinding {
    name: String,
    slot_type: SlotType,
    usage: AttachmentUsage,
    range: Option<Range<u64>>,
    attachment: Option<Arc<PassAttachment>>,
    source: Option<PassKey>,
}

impl AttachmentBinding {
    pub(crate) fn from_slot(slot: &PassSlot) -> Self {
        Self {
            name: slot.name.clone(),
            slot_type: slot.slot_type,
            usage: slot.usage,
            range: slot.range.clone(),
            attachment: None,
            source: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slot_type(&self) -> SlotType {
        self.slot_type
    }

    pub fn usage(&self) -> AttachmentUsage {
        self.usage
    }

    pub fn attachment(&self) -> Option<&Arc<PassAttachment>> {
        self.attachment.as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.attachment.is_some()
    }

    /// Pass the attachment was resolved through (self, parent or sibling)
    pub fn source_pass(&self) -> Option<PassKey> {
        self.source
    }

    /// Accessed subresource range, clamped to the attachment.
    ///
    /// Returns None while the binding is unresolved.
    pub fn subresource_range(&self) -> Option<Range<u64>> {
        let attachment = self.attachment.as_ref()?;
        let size = attachment.kind().subresource_count();
        Some(match &self.range {
            Some(range) => range.start.min(size)..range.end.min(size),
            None => 0..size,
        })
    }

    pub(crate) fn bind(&mut self, attachment: Arc<PassAttachment>, source: PassKey) {
        self.attachment = Some(attachment);
        self.source = Some(source);
    }
}
