use lockbench::config::HarnessConfig;
use lockbench::error;
use lockbench::LockBenchError;

#[test]
fn test_config_errors_suggest_checking_settings() {
    let err = HarnessConfig::default()
        .with_cpu(100, 0, 2)
        .validate()
        .unwrap_err();
    assert!(matches!(err, LockBenchError::Config(_)));
    assert!(error::user_friendly_message(&err).ends_with("Check your settings."));
}

#[test]
fn test_missing_config_file_is_config_error() {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let err = HarnessConfig::load_from(&temp_dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, LockBenchError::Config(_)));
}

#[test]
fn test_io_errors_convert() {
    let err: LockBenchError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(err.to_string().starts_with("I/O error"));
}
