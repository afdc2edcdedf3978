//! Process-wide handle lifecycle.
//!
//! Runs as a single test: the handle is shared by every test in a binary.

use std::fs;
use std::path::Path;

use mixin_log::config::{ConfigError, LoggerConfig};
use mixin_log::global;
use mixin_log::sink::ConsoleSink;
use mixin_log::testing::CaptureWriter;
use mixin_log::{fields, init_logger, init_with_config, LogError, Logger, RotationPolicy, Severity};

fn only_file(dir: &Path) -> String {
    let entries: Vec<_> = fs::read_dir(dir).unwrap().map(|e| e.unwrap().path()).collect();
    assert_eq!(entries.len(), 1, "expected one log file in {}", dir.display());
    fs::read_to_string(&entries[0]).unwrap()
}

#[test]
fn test_global_handle_lifecycle() {
    // Before initialization every entry point reports misuse.
    assert!(!global::is_initialized());
    assert!(matches!(global::info("too early", vec![]), Err(LogError::NotInitialized)));
    assert!(matches!(global::global(), Err(LogError::NotInitialized)));

    // Invalid verbosity never installs a handle.
    assert!(matches!(init_logger("svc", 9), Err(LogError::InvalidVerbosity(9))));
    assert!(!global::is_initialized());

    // Default initialization writes to stdout and `.logs/<prefix>.<date>`
    // under the working directory.
    let original_dir = std::env::current_dir().unwrap();
    let work_dir = tempfile::tempdir().unwrap();
    std::env::set_current_dir(work_dir.path()).unwrap();
    let initialized = init_logger("svc", 4);
    let logged = global::error("db failed", Some(&"timeout"), vec![]);
    std::env::set_current_dir(&original_dir).unwrap();
    initialized.unwrap();
    logged.unwrap();

    let logs_dir = work_dir.path().join(".logs");
    let names: Vec<String> = fs::read_dir(&logs_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("svc."), "unexpected file {}", names[0]);
    let record = only_file(&logs_dir);
    assert!(record.contains("\terror\tdb failed\t{\"args\":{\"error\":\"timeout\"}}"));

    // Configured initialization writes to the file sink.
    let first_dir = tempfile::tempdir().unwrap();
    let mut config = LoggerConfig::new("svc", 4);
    config.console.enabled = false;
    config.file.location = first_dir.path().to_string_lossy().into_owned();
    init_with_config(&config).unwrap();
    assert!(global::is_initialized());

    global::error("db failed", Some(&"timeout"), fields!["table" => "users"]).unwrap();
    global::debug("shown as info", vec![]).unwrap();
    let content = only_file(first_dir.path());
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("\terror\tdb failed\t"));
    assert!(lines[0].ends_with("{\"args\":{\"table\":\"users\",\"error\":\"timeout\"}}"));
    assert!(lines[1].contains("\tinfo\tshown as info"));

    // A failed re-initialization keeps the current handle.
    let mut invalid = config.clone();
    invalid.file.rotation_count = 0;
    assert!(matches!(
        init_with_config(&invalid),
        Err(LogError::Config(ConfigError::Validation(_)))
    ));
    global::warn("still here", None, vec![]).unwrap();
    assert_eq!(only_file(first_dir.path()).lines().count(), 3);

    // Re-initialization replaces the handle; the last writer wins.
    let second_dir = tempfile::tempdir().unwrap();
    let capture = CaptureWriter::new();
    let logger = Logger::builder()
        .sink(ConsoleSink::with_writer(Severity::Debug, capture.clone()))
        .file(Severity::Warn, second_dir.path(), "svc", RotationPolicy::default())
        .build()
        .unwrap();
    global::install(logger);

    global::error("db failed", Some(&"timeout"), vec![]).unwrap();
    global::info("console only", vec![]).unwrap();
    global::fatal("going down", None, vec![]).unwrap();

    let console = capture.lines();
    assert_eq!(console.len(), 3);
    assert!(console[0].ends_with("\terror\tdb failed\t{\"args\":{\"error\":\"timeout\"}}"));
    assert!(console[2].contains("\tfatal\tgoing down"));

    let file = only_file(second_dir.path());
    let file_lines: Vec<&str> = file.lines().collect();
    assert_eq!(file_lines.len(), 2);
    assert!(file_lines[0].ends_with("\terror\tdb failed\t{\"args\":{\"error\":\"timeout\"}}"));
    assert!(file_lines[1].contains("\tfatal\tgoing down"));

    // The first logger no longer receives records.
    assert_eq!(only_file(first_dir.path()).lines().count(), 3);
}
