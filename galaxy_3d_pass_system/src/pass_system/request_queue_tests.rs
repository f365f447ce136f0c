use super::*;
use crate::galaxy3d::Engine;
use crate::galaxy3d::log::{Logger, LogEntry, LogSeverity};
use serial_test::serial;

const SOURCE: &str = "galaxy3d::PassRequestSender";

struct CaptureLogger {
    entries: Arc<Mutex<Vec<(LogSeverity, String, String)>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push((entry.severity, entry.source.clone(), entry.message.clone()));
    }
}

fn poison(sender: &PassRequestSender) {
    let pending = Arc::clone(&sender.pending);
    let result = std::thread::spawn(move || {
        let _guard = pending.lock().unwrap();
        panic!("poison the request queue");
    })
    .join();
    assert!(result.is_err());
    assert!(sender.pending.is_poisoned());
}

// ============================================================================
// Queueing
// ============================================================================

#[test]
fn test_requests_drain_in_submission_order() {
    let sender = PassRequestSender::new();
    let key = PassKey::default();

    sender.request_build(key);
    sender.clone().request_removal(key);
    assert_eq!(sender.pending_count(), 2);

    assert_eq!(sender.drain(), vec![PassChangeRequest::Build(key), PassChangeRequest::Removal(key)]);
    assert_eq!(sender.pending_count(), 0);
    assert!(sender.drain().is_empty());
}

// ============================================================================
// Poisoned lock
// ============================================================================

#[test]
#[serial]
fn test_poisoned_queue_logs_dropped_requests() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(CaptureLogger { entries: Arc::clone(&entries) });

    let sender = PassRequestSender::new();
    poison(&sender);

    sender.request_build(PassKey::default());
    assert!(sender.drain().is_empty());

    let warnings: Vec<String> = entries.lock().unwrap()
        .iter()
        .filter(|(severity, source, _)| *severity == LogSeverity::Warn && source == SOURCE)
        .map(|(_, _, message)| message.clone())
        .collect();
    assert_eq!(warnings.len(), 2);
    assert!(warnings[0].contains("Build"));
    assert!(warnings[0].contains("dropped"));
    assert!(warnings[1].contains("pending requests dropped"));

    Engine::reset_logger();
}
