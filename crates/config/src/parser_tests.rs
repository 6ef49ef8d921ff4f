use super::*;
use std::io::Write;

const VALID_DOCUMENT: &str = r#"
services:
  - name: restart-watcher
    condition:
      type: process
      config:
        executable: dropbox
        state: open
    execute:
      type: shell
      config:
        command: "notify-send dropbox started"
  - name: nightly-backup
    condition:
      type: cron
      config:
        schedule: "0 0 3 * * *"
    execute:
      type: http
      config:
        url: "https://example.com/webhook"
        method: POST
"#;

#[test]
fn parses_multiple_services_of_different_kinds() {
    let document = parse(VALID_DOCUMENT).expect("valid document parses");
    assert_eq!(document.services.len(), 2);
    assert_eq!(document.services[0].name, "restart-watcher");
    assert_eq!(document.services[1].name, "nightly-backup");
}

#[test]
fn rejects_duplicate_service_names() {
    let yaml = r#"
services:
  - name: dup
    condition:
      type: cron
      config:
        schedule: "* * * * * *"
    execute:
      type: shell
      config:
        command: "true"
  - name: dup
    condition:
      type: cron
      config:
        schedule: "* * * * * *"
    execute:
      type: shell
      config:
        command: "true"
"#;
    let err = parse(yaml).unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateServiceName(name) if name == "dup"));
}

#[test]
fn rejects_unknown_condition_type() {
    let yaml = r#"
services:
  - name: bad
    condition:
      type: smoke-signal
      config: {}
    execute:
      type: shell
      config:
        command: "true"
"#;
    assert!(matches!(parse(yaml), Err(ConfigError::Yaml(_))));
}

#[test]
fn load_reads_and_parses_a_file_on_disk() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    file.write_all(VALID_DOCUMENT.as_bytes())
        .expect("write config");
    let document = load(file.path()).expect("loads");
    assert_eq!(document.services.len(), 2);
}

#[test]
fn load_surfaces_missing_file_as_read_error() {
    let err = load(Path::new("/nonexistent/path/to/warden.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}
