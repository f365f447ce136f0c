//! Unit tests for Engine singleton manager
//!
//! Tests initialization, pass system management, and logging APIs.
//!
//! IMPORTANT: ENGINE_STATE is a global OnceLock shared across all tests.
//! All tests are marked with #[serial] to run sequentially and avoid RwLock poisoning.

use crate::galaxy3d::{Engine, Error};
use crate::galaxy3d::log::{Logger, LogEntry, LogSeverity};
use crate::pass_system::{MockBackend, NullBackend, PassDescriptor, PassKind, PassSystemConfig, PassState};
use std::sync::{Arc, Mutex};
use serial_test::serial;

// ============================================================================
// TEST HELPERS
// ============================================================================

const TEST_SOURCE: &str = "galaxy3d::engine_test";

/// Test logger that captures log entries for verification
struct TestLogger {
    entries: Arc<Mutex<Vec<(LogSeverity, String, String)>>>,
}

impl TestLogger {
    fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        let mut entries = self.entries.lock().unwrap();
        entries.push((entry.severity, entry.source.clone(), entry.message.clone()));
    }
}

/// Entries logged under `source` (other modules may log concurrently)
fn entries_from(
    entries: &Arc<Mutex<Vec<(LogSeverity, String, String)>>>,
    source: &str,
) -> Vec<(LogSeverity, String)> {
    entries.lock().unwrap()
        .iter()
        .filter(|(_, s, _)| s == source)
        .map(|(severity, _, message)| (*severity, message.clone()))
        .collect()
}

fn config() -> PassSystemConfig {
    PassSystemConfig::default().with_validation(true)
}

/// Setup function to reset engine state before each test
///
/// ENGINE_STATE is a OnceLock, so once initialized it stays initialized.
fn setup() {
    Engine::reset_for_testing();
    let _ = Engine::initialize();
    Engine::reset_logger();
}

// ============================================================================
// INITIALIZATION AND SHUTDOWN TESTS
// ============================================================================

#[test]
#[serial]
fn test_engine_initialize_is_idempotent() {
    setup();
    assert!(Engine::initialize().is_ok());
    assert!(Engine::initialize().is_ok());

    Engine::create_pass_system(config(), NullBackend).unwrap();
    assert!(Engine::pass_system().is_ok());
}

#[test]
#[serial]
fn test_shutdown_clears_pass_system() {
    setup();

    Engine::create_pass_system(config(), NullBackend).unwrap();
    assert!(Engine::pass_system().is_ok());

    Engine::shutdown();

    assert!(matches!(Engine::pass_system(), Err(Error::InitializationFailed(_))));
}

// ============================================================================
// PASS SYSTEM SINGLETON TESTS
// ============================================================================

#[test]
#[serial]
fn test_pass_system_not_created() {
    setup();

    let result = Engine::pass_system();
    match result {
        Err(Error::InitializationFailed(msg)) => assert!(msg.contains("not created")),
        other => panic!("Expected InitializationFailed, got {:?}", other.map(|_| ())),
    }
}

#[test]
#[serial]
fn test_create_pass_system_twice_fails() {
    setup();

    Engine::create_pass_system(config(), NullBackend).unwrap();
    let result = Engine::create_pass_system(config(), NullBackend);

    match result {
        Err(Error::InitializationFailed(msg)) => assert!(msg.contains("already exists")),
        other => panic!("Expected InitializationFailed, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_destroy_and_recreate_pass_system() {
    setup();

    Engine::create_pass_system(config().with_root_name("First"), NullBackend).unwrap();
    Engine::destroy_pass_system().unwrap();
    assert!(Engine::pass_system().is_err());

    Engine::create_pass_system(config().with_root_name("Second"), NullBackend).unwrap();
    let system = Engine::pass_system().unwrap();
    let guard = system.lock().unwrap();
    assert_eq!(guard.pass(guard.root()).unwrap().name(), "Second");
}

#[test]
#[serial]
fn test_handle_outlives_destroy() {
    setup();

    Engine::create_pass_system(config(), NullBackend).unwrap();
    let system = Engine::pass_system().unwrap();
    Engine::destroy_pass_system().unwrap();

    let mut guard = system.lock().unwrap();
    assert!(guard.process_queued_changes());
    assert_eq!(guard.pass(guard.root()).unwrap().state(), PassState::Initialized);
}

#[test]
#[serial]
fn test_singleton_drives_frames() {
    setup();

    let backend = MockBackend::new();
    let backend_log = backend.log();
    Engine::create_pass_system(config(), backend).unwrap();

    {
        let system = Engine::pass_system().unwrap();
        let mut guard = system.lock().unwrap();
        let child = guard.create_pass(PassDescriptor::new("Forward", PassKind::Raster));
        let root = guard.root();
        guard.add_child(root, child).unwrap();
        guard.process_queued_changes();
        assert_eq!(guard.pass(child).unwrap().state(), PassState::Initialized);
    }

    assert_eq!(backend_log.lock().unwrap().committed, vec!["Root", "Root.Forward"]);
}

#[test]
#[serial]
fn test_concurrent_pass_system_access() {
    setup();

    Engine::create_pass_system(config(), NullBackend).unwrap();
    let system = Engine::pass_system().unwrap();
    let sender = system.lock().unwrap().request_sender();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let system = Arc::clone(&system);
            let sender = sender.clone();
            std::thread::spawn(move || {
                for _ in 0..5 {
                    let mut guard = system.lock().unwrap();
                    let root = guard.root();
                    sender.request_build(root);
                    guard.process_queued_changes();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(system.lock().unwrap().frame_index(), 20);
}

// ============================================================================
// LOGGING TESTS
// ============================================================================

#[test]
#[serial]
fn test_log_detailed_with_file_line() {
    setup();

    let test_logger = TestLogger::new();
    let entries_ref = test_logger.entries.clone();
    Engine::set_logger(test_logger);

    Engine::log_detailed(
        LogSeverity::Error,
        TEST_SOURCE,
        "Detailed error".to_string(),
        "test.rs",
        42,
    );

    let entries = entries_from(&entries_ref, TEST_SOURCE);
    assert_eq!(entries, vec![(LogSeverity::Error, "Detailed error".to_string())]);

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_custom_logger_receives_all_severities() {
    setup();

    let test_logger = TestLogger::new();
    let entries_ref = test_logger.entries.clone();
    Engine::set_logger(test_logger);

    Engine::log(LogSeverity::Trace, TEST_SOURCE, "Trace".to_string());
    Engine::log(LogSeverity::Debug, TEST_SOURCE, "Debug".to_string());
    Engine::log(LogSeverity::Info, TEST_SOURCE, "Info".to_string());
    Engine::log(LogSeverity::Warn, TEST_SOURCE, "Warn".to_string());
    Engine::log(LogSeverity::Error, TEST_SOURCE, "Error".to_string());

    assert_eq!(entries_from(&entries_ref, TEST_SOURCE).len(), 5);

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_reset_logger_detaches_custom_logger() {
    setup();

    let test_logger = TestLogger::new();
    let entries_ref = test_logger.entries.clone();
    Engine::set_logger(test_logger);
    Engine::reset_logger();

    Engine::log(LogSeverity::Info, TEST_SOURCE, "After reset".to_string());

    assert!(entries_from(&entries_ref, TEST_SOURCE).is_empty());
}

#[test]
#[serial]
fn test_singleton_errors_are_logged() {
    setup();

    let test_logger = TestLogger::new();
    let entries_ref = test_logger.entries.clone();
    Engine::set_logger(test_logger);

    let _ = Engine::pass_system();

    let entries = entries_from(&entries_ref, "galaxy3d::Engine");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, LogSeverity::Error);
    assert!(entries[0].1.contains("PassSystem not created"));

    Engine::reset_logger();
}
