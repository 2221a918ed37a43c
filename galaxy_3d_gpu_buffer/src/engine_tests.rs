//! Unit tests for engine.rs (global logger and severity threshold)

use super::*;
use serial_test::serial;
use std::sync::{Arc, Mutex};

struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

fn install_capture() -> Arc<Mutex<Vec<LogEntry>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(CaptureLogger { entries: entries.clone() });
    entries
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        // Other unit tests log concurrently; keep only this module's entries
        if entry.source == "galaxy3d::test" {
            self.entries.lock().unwrap().push(entry.clone());
        }
    }
}

#[test]
#[serial]
fn test_log_reaches_custom_logger() {
    let entries = install_capture();

    Engine::log(LogSeverity::Info, "galaxy3d::test", "hello".to_string());

    let entries_guard = entries.lock().unwrap();
    assert_eq!(entries_guard.len(), 1);
    assert_eq!(entries_guard[0].source, "galaxy3d::test");
    assert_eq!(entries_guard[0].message, "hello");
    assert!(entries_guard[0].file.is_none());
    drop(entries_guard);

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_log_detailed_carries_location() {
    let entries = install_capture();

    Engine::log_detailed(LogSeverity::Error, "galaxy3d::test", "boom".to_string(), "x.rs", 9);

    let entries_guard = entries.lock().unwrap();
    assert_eq!(entries_guard[0].file, Some("x.rs"));
    assert_eq!(entries_guard[0].line, Some(9));
    drop(entries_guard);

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_min_severity_filters_entries() {
    let entries = install_capture();
    Engine::set_min_severity(LogSeverity::Warn);
    assert_eq!(Engine::min_severity(), LogSeverity::Warn);

    Engine::log(LogSeverity::Debug, "galaxy3d::test", "dropped".to_string());
    Engine::log(LogSeverity::Warn, "galaxy3d::test", "kept".to_string());
    crate::engine_error!("galaxy3d::test", "also kept");

    let messages: Vec<String> = entries.lock().unwrap().iter().map(|e| e.message.clone()).collect();
    assert_eq!(messages, vec!["kept".to_string(), "also kept".to_string()]);

    Engine::reset_logger();
    assert_eq!(Engine::min_severity(), LogSeverity::Info);
}

#[test]
#[serial]
fn test_is_enabled_follows_threshold() {
    Engine::set_min_severity(LogSeverity::Info);
    assert!(!Engine::is_enabled(LogSeverity::Trace));
    assert!(!Engine::is_enabled(LogSeverity::Debug));
    assert!(Engine::is_enabled(LogSeverity::Info));
    assert!(Engine::is_enabled(LogSeverity::Error));
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_default_threshold_hides_traces() {
    Engine::reset_logger();
    let entries = install_capture();

    crate::engine_trace!("galaxy3d::test", "per-call trace");
    crate::engine_debug!("galaxy3d::test", "debug detail");
    crate::engine_info!("galaxy3d::test", "info");

    assert_eq!(Engine::min_severity(), LogSeverity::Info);
    let messages: Vec<String> = entries.lock().unwrap().iter().map(|e| e.message.clone()).collect();
    assert_eq!(messages, vec!["info".to_string()]);

    Engine::set_min_severity(LogSeverity::Trace);
    crate::engine_trace!("galaxy3d::test", "now visible");
    assert_eq!(entries.lock().unwrap().len(), 2);

    Engine::reset_logger();
}
