use super::*;
use crate::pass_system::{
    AttachmentUsage, NullBackend, PassAttachmentDesc, PassConnection, PassDescriptor, PassKind,
    PassSlot, PassSystemConfig, PASS_NAME_THIS,
};

fn new_system() -> PassSystem {
    PassSystem::new(PassSystemConfig::default().with_validation(true), NullBackend)
}

fn attach(system: &mut PassSystem, descriptor: PassDescriptor) -> PassKey {
    let key = system.create_pass(descriptor);
    system.add_child(system.root(), key).unwrap();
    key
}

/// Writer owning a 100-byte buffer "buf"
fn writer(name: &str) -> PassDescriptor {
    PassDescriptor::new(name, PassKind::Compute)
        .with_attachment(PassAttachmentDesc::buffer("buf", 100))
        .with_slot(PassSlot::output("buf"))
        .with_connection(PassConnection::new("buf", PASS_NAME_THIS, "buf"))
}

fn reader(name: &str, source: &str, range: Option<Range<u64>>) -> PassDescriptor {
    let mut slot = PassSlot::input("buf");
    if let Some(range) = range {
        slot = slot.with_range(range);
    }
    PassDescriptor::new(name, PassKind::Compute)
        .with_slot(slot)
        .with_connection(PassConnection::new("buf", source, "buf"))
}

// ============================================================================
// Edges
// ============================================================================

#[test]
fn test_read_after_write() {
    let mut system = new_system();
    let w = attach(&mut system, writer("W"));
    let r = attach(&mut system, reader("R", "W", None));
    system.process_queued_changes();

    let deps = system.dependencies();
    assert_eq!(deps.len(), 1);
    assert_eq!(deps[0].producer, w);
    assert_eq!(deps[0].consumer, r);
    assert_eq!(deps[0].range, 0..100);
    assert_eq!(deps[0].kind, DependencyKind::ReadAfterWrite);
}

#[test]
fn test_partial_ranges_split_dependencies() {
    let mut system = new_system();
    let w = attach(&mut system, writer("W"));
    let r1 = attach(&mut system, reader("R1", "W", Some(0..50)));
    let w2 = attach(
        &mut system,
        PassDescriptor::new("W2", PassKind::Compute)
            .with_slot(PassSlot::input_output("buf").with_usage(AttachmentUsage::Write).with_range(50..100))
            .with_connection(PassConnection::new("buf", "W", "buf")),
    );
    let r2 = attach(&mut system, reader("R2", "W2", None));
    system.process_queued_changes();

    assert_eq!(system.execution_order(), vec![w, r1, w2, r2]);

    let summary: Vec<_> = system
        .dependencies()
        .iter()
        .map(|d| (d.producer, d.consumer, d.range.clone(), d.kind))
        .collect();
    assert_eq!(summary, vec![
        (w, r1, 0..50, DependencyKind::ReadAfterWrite),
        (w, w2, 50..100, DependencyKind::WriteAfterWrite),
        (w, r2, 0..50, DependencyKind::ReadAfterWrite),
        (w2, r2, 50..100, DependencyKind::ReadAfterWrite),
    ]);
}

#[test]
fn test_read_write_pass_has_no_self_edge() {
    let mut system = new_system();
    let rw = attach(
        &mut system,
        PassDescriptor::new("RW", PassKind::Compute)
            .with_attachment(PassAttachmentDesc::buffer("buf", 16))
            .with_slot(PassSlot::input_output("buf"))
            .with_connection(PassConnection::new("buf", PASS_NAME_THIS, "buf")),
    );
    let r = attach(&mut system, reader("R", "RW", None));
    system.process_queued_changes();

    let deps = system.dependencies();
    assert_eq!(deps.len(), 1);
    assert_eq!((deps[0].producer, deps[0].consumer), (rw, r));
}

#[test]
fn test_disabled_passes_are_ignored() {
    let mut system = new_system();
    let w = attach(&mut system, writer("W"));
    let r = attach(&mut system, reader("R", "W", None));
    system.process_queued_changes();
    assert_eq!(system.dependencies().len(), 1);

    system.set_enabled(w, false).unwrap();
    system.process_queued_changes();
    assert!(system.dependencies().is_empty());
    assert_eq!(system.execution_order(), vec![r]);
}

#[test]
fn test_image_subresources_are_tracked_per_mip() {
    let mut system = new_system();
    let w = attach(
        &mut system,
        PassDescriptor::new("Downsample", PassKind::Compute)
            .with_attachment(PassAttachmentDesc::image_with_mips("chain", 512, 512, 4, 1))
            .with_slot(PassSlot::output("chain").with_range(1..4))
            .with_connection(PassConnection::new("chain", PASS_NAME_THIS, "chain")),
    );
    let r = attach(
        &mut system,
        PassDescriptor::new("Sample", PassKind::Raster)
            .with_slot(PassSlot::input("chain"))
            .with_connection(PassConnection::new("chain", "Downsample", "chain")),
    );
    system.process_queued_changes();

    let deps = system.dependencies();
    assert_eq!(deps.len(), 1);
    assert_eq!((deps[0].producer, deps[0].consumer), (w, r));
    assert_eq!(deps[0].range, 1..4);
}
