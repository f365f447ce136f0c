//! Drives a small deferred pipeline through a few frames of the pass system.
//!
//! Frame 1 builds everything, frame 2 toggles the bloom subtree off,
//! frame 3 removes it and frame 4 frees it.

use galaxy_3d_pass_system::galaxy3d::{Engine, PassSystem, Result};
use galaxy_3d_pass_system::galaxy3d::log::{DefaultLogger, LogSeverity};
use galaxy_3d_pass_system::galaxy3d::pass::{
    CustomBehavior, MockBackend, PassAttachmentDesc, PassConnection, PassDescriptor, PassKind,
    PassRequest, PassSlot, PassSystemConfig, PassTemplate, PASS_NAME_PARENT, PASS_NAME_THIS,
};
use galaxy_3d_pass_system::{engine_info, engine_warn};

const SOURCE: &str = "galaxy3d::demo";

fn register_templates(system: &mut PassSystem) -> Result<()> {
    let templates = system.templates_mut();

    templates.add_template(
        PassTemplate::new("GBuffer", PassKind::Raster)
            .with_attachment(PassAttachmentDesc::image("albedo", 1280, 720))
            .with_attachment(PassAttachmentDesc::image("depth", 1280, 720))
            .with_slot(PassSlot::output("albedo"))
            .with_slot(PassSlot::output("depth"))
            .with_connection(PassConnection::new("albedo", PASS_NAME_THIS, "albedo"))
            .with_connection(PassConnection::new("depth", PASS_NAME_THIS, "depth")),
    )?;

    templates.add_template(
        PassTemplate::new("Lighting", PassKind::Compute)
            .with_attachment(PassAttachmentDesc::image("hdr", 1280, 720))
            .with_slot(PassSlot::input("albedo"))
            .with_slot(PassSlot::input("depth"))
            .with_slot(PassSlot::output("hdr"))
            .with_connection(PassConnection::new("albedo", "GBuffer", "albedo"))
            .with_connection(PassConnection::new("depth", "GBuffer", "depth"))
            .with_connection(PassConnection::new("hdr", PASS_NAME_THIS, "hdr")),
    )?;

    templates.add_template(
        PassTemplate::new("BloomBlur", PassKind::Compute)
            .with_slot(PassSlot::input_output("hdr"))
            .with_connection(PassConnection::new("hdr", PASS_NAME_PARENT, "hdr")),
    )?;

    templates.add_template(
        PassTemplate::new("Bloom", PassKind::Parent)
            .with_slot(PassSlot::input_output("hdr"))
            .with_connection(PassConnection::new("hdr", "Lighting", "hdr"))
            .with_child_request(PassRequest::new("BlurH", "BloomBlur"))
            .with_child_request(PassRequest::new("BlurV", "BloomBlur")),
    )?;

    Ok(())
}

fn report_frame(system: &PassSystem, label: &str) {
    engine_info!(SOURCE, "{} (frame {}, {} passes)", label, system.frame_index(), system.pass_count());
    print!("{}", system.hierarchy_string());

    let order: Vec<&str> = system
        .execution_order()
        .into_iter()
        .filter_map(|key| system.pass(key).map(|pass| pass.path()))
        .collect();
    println!("execution order: {}", order.join(" -> "));
    println!("dependencies: {}", system.dependencies().len());

    for entry in system.validation_report().entries() {
        engine_warn!(SOURCE, "{:?} on '{}': {}", entry.severity, entry.path, entry.message);
    }
}

fn main() -> Result<()> {
    Engine::initialize()?;
    Engine::set_logger(DefaultLogger::with_min_severity(LogSeverity::Debug));

    let backend = MockBackend::new();
    let backend_log = backend.log();
    Engine::create_pass_system(
        PassSystemConfig::default().with_validation(true).with_debug_print_hierarchy(true),
        backend,
    )?;

    let system = Engine::pass_system()?;
    {
        let mut guard = system.lock()
            .map_err(|_| galaxy_3d_pass_system::engine_err!(SOURCE, "Pass system lock poisoned"))?;
        let passes = &mut *guard;
        register_templates(passes)?;

        let root = passes.root();
        for (name, template) in [("GBuffer", "GBuffer"), ("Lighting", "Lighting"), ("Bloom", "Bloom")] {
            let key = passes.create_pass_from_request(&PassRequest::new(name, template))?;
            passes.add_child(root, key)?;
        }

        let tonemap = passes.create_pass(
            PassDescriptor::new("Tonemap", PassKind::Raster)
                .with_slot(PassSlot::input("hdr"))
                .with_connection(PassConnection::new("hdr", "Lighting", "hdr"))
                .with_behavior(CustomBehavior::new(|ctx| {
                    ctx.add_attachment(PassAttachmentDesc::image("ldr", 1280, 720));
                    ctx.add_slot(PassSlot::output("ldr"));
                    ctx.add_connection(PassConnection::new("ldr", PASS_NAME_THIS, "ldr"));
                    Ok(())
                })),
        );
        passes.add_child(root, tonemap)?;

        passes.process_queued_changes();
        report_frame(passes, "Initial build");

        let bloom = passes.find_pass("Root.Bloom")
            .ok_or_else(|| galaxy_3d_pass_system::engine_err!(SOURCE, "Bloom pass missing"))?;

        passes.set_enabled(bloom, false)?;
        passes.process_queued_changes();
        report_frame(passes, "Bloom disabled");

        passes.request_removal(bloom)?;
        passes.process_queued_changes();
        report_frame(passes, "Bloom removed");

        passes.process_queued_changes();
        report_frame(passes, "Detached passes freed");
    }

    if let Ok(log) = backend_log.lock() {
        engine_info!(SOURCE, "Backend committed {} pass(es), released {}",
            log.committed.len(), log.released.len());
    }

    Engine::destroy_pass_system()?;
    Engine::shutdown();
    Ok(())
}
