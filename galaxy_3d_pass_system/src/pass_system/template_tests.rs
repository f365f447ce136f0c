use super::*;
use crate::pass_system::{NoOpBehavior, PassAttachmentDesc, PassConnection, PassSlot, PASS_NAME_PARENT, PASS_NAME_THIS};

fn blur_template() -> PassTemplate {
    PassTemplate::new("Blur", PassKind::Compute)
        .with_slot(PassSlot::input("source"))
        .with_slot(PassSlot::output("result"))
        .with_attachment(PassAttachmentDesc::image("result", 256, 256))
        .with_connection(PassConnection::new("source", PASS_NAME_PARENT, "color"))
        .with_connection(PassConnection::new("result", PASS_NAME_THIS, "result"))
}

// ============================================================================
// Library
// ============================================================================

#[test]
fn test_add_and_lookup_template() {
    let mut library = PassTemplateLibrary::new();
    assert!(library.is_empty());

    let template = library.add_template(blur_template()).unwrap();
    assert_eq!(template.name, "Blur");
    assert!(library.contains("Blur"));
    assert_eq!(library.len(), 1);
    assert!(Arc::ptr_eq(library.template("Blur").unwrap(), &template));
}

#[test]
fn test_duplicate_template_is_rejected() {
    let mut library = PassTemplateLibrary::new();
    library.add_template(blur_template()).unwrap();

    let result = library.add_template(PassTemplate::new("Blur", PassKind::Raster));
    assert!(matches!(result, Err(Error::InvalidPass(_))));
    assert_eq!(library.template("Blur").unwrap().kind, PassKind::Compute);
}

#[test]
fn test_remove_template() {
    let mut library = PassTemplateLibrary::new();
    library.add_template(blur_template()).unwrap();

    assert!(library.remove_template("Blur"));
    assert!(!library.remove_template("Blur"));
    assert!(library.template("Blur").is_none());
}

#[test]
fn test_template_names_are_sorted() {
    let mut library = PassTemplateLibrary::new();
    library.add_template(PassTemplate::new("Tonemap", PassKind::Raster)).unwrap();
    library.add_template(PassTemplate::new("Bloom", PassKind::Parent)).unwrap();
    library.add_template(PassTemplate::new("Copy", PassKind::Copy)).unwrap();

    assert_eq!(library.template_names(), vec!["Bloom", "Copy", "Tonemap"]);
}

// ============================================================================
// Factory
// ============================================================================

#[test]
fn test_create_copies_template_data() {
    let mut library = PassTemplateLibrary::new();
    library.add_template(blur_template()).unwrap();

    let descriptor = library.create(&PassRequest::new("BlurH", "Blur")).unwrap();
    assert_eq!(descriptor.name, "BlurH");
    assert_eq!(descriptor.kind, PassKind::Compute);
    assert_eq!(descriptor.slots.len(), 2);
    assert_eq!(descriptor.attachments.len(), 1);
    assert_eq!(descriptor.connections.len(), 2);
    assert!(descriptor.enabled);
    assert!(descriptor.request.is_some());
    assert!(descriptor.behavior.is_none());
}

#[test]
fn test_request_connection_overrides_template() {
    let mut library = PassTemplateLibrary::new();
    library.add_template(blur_template()).unwrap();

    let request = PassRequest::new("BlurV", "Blur")
        .with_connection(PassConnection::new("source", "BlurH", "result"));
    let descriptor = library.create(&request).unwrap();

    assert_eq!(descriptor.connections.len(), 2);
    let source = descriptor.connections.iter().find(|c| c.local_slot == "source").unwrap();
    assert_eq!(source.attachment_ref.pass, "BlurH");
    assert_eq!(source.attachment_ref.attachment, "result");
}

#[test]
fn test_disabled_request() {
    let mut library = PassTemplateLibrary::new();
    library.add_template(blur_template()).unwrap();

    let descriptor = library.create(&PassRequest::new("Off", "Blur").disabled()).unwrap();
    assert!(!descriptor.enabled);
}

#[test]
fn test_unknown_template_yields_none() {
    let library = PassTemplateLibrary::new();
    assert!(library.create(&PassRequest::new("X", "Missing")).is_none());
}

#[test]
fn test_behavior_factory_called_per_pass() {
    let created = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = Arc::clone(&created);

    let mut library = PassTemplateLibrary::new();
    library
        .add_template_with_behavior(blur_template(), move || {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Box::new(NoOpBehavior) as Box<dyn PassBehavior>
        })
        .unwrap();

    let first = library.create(&PassRequest::new("A", "Blur")).unwrap();
    let second = library.create(&PassRequest::new("B", "Blur")).unwrap();

    assert!(first.behavior.is_some());
    assert!(second.behavior.is_some());
    assert_eq!(created.load(std::sync::atomic::Ordering::SeqCst), 2);
}

// ============================================================================
// Descriptor
// ============================================================================

#[test]
fn test_descriptor_with_connection_replaces_same_slot() {
    let descriptor = PassDescriptor::new("Manual", PassKind::Raster)
        .with_connection(PassConnection::new("color", PASS_NAME_PARENT, "color"))
        .with_connection(PassConnection::new("depth", PASS_NAME_PARENT, "depth"))
        .with_connection(PassConnection::new("color", "GBuffer", "albedo"));

    assert_eq!(descriptor.connections.len(), 2);
    assert_eq!(descriptor.connections[0].attachment_ref.pass, "GBuffer");
    assert!(descriptor.template.is_none());
}
