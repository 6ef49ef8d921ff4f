//! Black-box end-to-end specs for the warden daemon.
//!
//! These exercise the wiring across crate boundaries (config document →
//! watcher registration → pool → executor) the way the supervisor does it,
//! without going through `Supervisor::run`'s signal-driven loop — that
//! would require delivering real OS signals to the test process. Each test
//! drives real components (a real temp-dir filesystem, a real shell, a fake
//! process source) rather than mocking across the boundary.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tempfile::tempdir;

use warden_config::{parse, ConditionSpec, ExecutorSpec};
use warden_core::Job;
use warden_executors::ShellExecutor;
use warden_pool::ExecutionPool;
use warden_watchers::{
    CronWatcher, FileCondition, FileOperation, FileWatcher, Handler, ProcessCondition,
    ProcessEdge, ProcessRecord, ProcessSource, ProcessWatcher,
};

/// Waits until `poll` returns `true` or `timeout` elapses, polling every
/// 20ms. Keeps the eventual-consistency tests below from racing a fixed
/// sleep against a polling watcher.
async fn wait_until<F: Fn() -> bool>(timeout: Duration, poll: F) {
    let deadline = tokio::time::Instant::now() + timeout;
    while !poll() && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

fn enqueue_handler(pool: Arc<ExecutionPool>, service: &str, command: &str) -> Handler {
    let service = service.to_string();
    let command = command.to_string();
    Arc::new(move || {
        let pool = Arc::clone(&pool);
        let service = service.clone();
        let executor = Arc::new(ShellExecutor::new(command.clone()));
        Box::pin(async move {
            let _ = pool.enqueue(Job::new(service, executor)).await;
        })
    })
}

// The full config → supervisor-shaped wiring: a YAML document naming a
// file/create service drives a real shell command when a file is written
// into the watched directory.
#[tokio::test]
async fn e1_config_driven_file_create_runs_shell_executor() {
    let watched = tempdir().unwrap();
    let marker = tempdir().unwrap().path().join("marker.txt");

    let document_yaml = format!(
        r#"
services:
  - name: on-new-file
    condition:
      type: file
      config:
        path: {path}
        operation: create
        recursive: false
    execute:
      type: shell
      config:
        command: "touch {marker}"
"#,
        path = watched.path().display(),
        marker = marker.display(),
    );
    let document = parse(&document_yaml).expect("document parses");
    assert_eq!(document.services.len(), 1);
    let service = &document.services[0];

    let command = match &service.execute {
        ExecutorSpec::Shell(cfg) => cfg.command.clone(),
        other => panic!("expected a shell executor, got {other:?}"),
    };
    let path = match &service.condition {
        ConditionSpec::File(cfg) => cfg.path.clone(),
        other => panic!("expected a file condition, got {other:?}"),
    };

    let pool = Arc::new(ExecutionPool::new(2));
    pool.start();

    let file_watcher = Arc::new(FileWatcher::with_poll_interval(Duration::from_millis(50)));
    file_watcher
        .handle_func(
            &FileCondition {
                path: path.into(),
                operation: FileOperation::Create,
                recursive: false,
            },
            enqueue_handler(Arc::clone(&pool), &service.name, &command),
        )
        .unwrap();

    let run_handle = {
        let watcher = Arc::clone(&file_watcher);
        tokio::spawn(async move { watcher.run().await })
    };

    // Let the watcher establish its baseline snapshot before the write.
    tokio::time::sleep(Duration::from_millis(100)).await;
    std::fs::write(watched.path().join("incoming.txt"), b"payload").unwrap();

    wait_until(Duration::from_secs(5), || marker.exists()).await;
    assert!(marker.exists(), "shell executor should have created the marker file");

    file_watcher.stop(Duration::from_secs(1)).await.unwrap();
    let _ = run_handle.await;
    pool.stop(Duration::from_secs(1)).await.unwrap();
}

// Registering a file/create condition against a path that already exists
// as a regular file is rejected before anything runs.
#[test]
fn e3_watch_create_existing_file_is_rejected_at_registration() {
    let dir = tempdir().unwrap();
    let existing = dir.path().join("exists.txt");
    std::fs::write(&existing, b"already here").unwrap();

    let document_yaml = format!(
        r#"
services:
  - name: bogus
    condition:
      type: file
      config:
        path: {path}
        operation: create
    execute:
      type: shell
      config:
        command: "true"
"#,
        path = existing.display(),
    );
    let document = parse(&document_yaml).expect("document parses");
    let service = &document.services[0];
    let path = match &service.condition {
        ConditionSpec::File(cfg) => cfg.path.clone(),
        other => panic!("expected a file condition, got {other:?}"),
    };

    let watcher = FileWatcher::with_poll_interval(Duration::from_millis(50));
    let err = watcher
        .handle_func(
            &FileCondition {
                path: path.into(),
                operation: FileOperation::Create,
                recursive: false,
            },
            Arc::new(|| Box::pin(async {})),
        )
        .unwrap_err();
    assert!(matches!(err, warden_watchers::FileError::WatchCreateExistingFile));
}

// Open and close handlers registered for the same executable fire
// independently as the fake process source transitions.
//
// The toggle lives behind its own `Arc<Mutex<_>>` (rather than wrapping the
// whole source in an `Arc`) so the source can still be moved by value into
// `ProcessWatcher::with_source` while this test keeps an external handle to
// flip it after `run` has started.
#[derive(Clone, Default)]
struct SwitchableSource {
    running: Arc<parking_lot::Mutex<bool>>,
}

impl ProcessSource for SwitchableSource {
    fn snapshot(&self) -> Result<Vec<ProcessRecord>, String> {
        if *self.running.lock() {
            Ok(vec![ProcessRecord {
                executable: "agentd".to_string(),
            }])
        } else {
            Ok(vec![])
        }
    }
}

#[tokio::test]
async fn e4_process_open_then_close_fire_independent_handlers() {
    let source = SwitchableSource::default();
    let toggle = source.running.clone();
    let watcher = Arc::new(ProcessWatcher::with_source(source));

    let opens = Arc::new(AtomicUsize::new(0));
    let closes = Arc::new(AtomicUsize::new(0));

    watcher.handle_func(
        &ProcessCondition {
            executable: "agentd".to_string(),
            edge: ProcessEdge::Open,
        },
        {
            let opens = Arc::clone(&opens);
            Arc::new(move || {
                let opens = Arc::clone(&opens);
                Box::pin(async move {
                    opens.fetch_add(1, Ordering::SeqCst);
                })
            })
        },
    );
    watcher.handle_func(
        &ProcessCondition {
            executable: "agentd".to_string(),
            edge: ProcessEdge::Close,
        },
        {
            let closes = Arc::clone(&closes);
            Arc::new(move || {
                let closes = Arc::clone(&closes);
                Box::pin(async move {
                    closes.fetch_add(1, Ordering::SeqCst);
                })
            })
        },
    );

    let run_handle = {
        let watcher = Arc::clone(&watcher);
        tokio::spawn(async move { watcher.run().await })
    };

    tokio::time::sleep(Duration::from_millis(150)).await;
    *toggle.lock() = true;
    wait_until(Duration::from_secs(2), || opens.load(Ordering::SeqCst) == 1).await;
    assert_eq!(opens.load(Ordering::SeqCst), 1);
    assert_eq!(closes.load(Ordering::SeqCst), 0);

    *toggle.lock() = false;
    wait_until(Duration::from_secs(2), || closes.load(Ordering::SeqCst) == 1).await;
    assert_eq!(closes.load(Ordering::SeqCst), 1);
    assert_eq!(opens.load(Ordering::SeqCst), 1);

    watcher.stop(Duration::from_secs(1)).await;
    let _ = run_handle.await;
}

// Registering the same cron expression twice produces two independent
// firings per tick.
#[tokio::test]
async fn invariant7_duplicate_cron_schedules_fire_independently() {
    let watcher = Arc::new(CronWatcher::new());
    let fires = Arc::new(AtomicUsize::new(0));

    for _ in 0..2 {
        let fires = Arc::clone(&fires);
        watcher
            .handle_func(
                "* * * * * *",
                Arc::new(move || {
                    let fires = Arc::clone(&fires);
                    Box::pin(async move {
                        fires.fetch_add(1, Ordering::SeqCst);
                    })
                }),
            )
            .unwrap();
    }

    let run_handle = {
        let watcher = Arc::clone(&watcher);
        tokio::spawn(async move { watcher.run().await })
    };

    wait_until(Duration::from_secs(3), || fires.load(Ordering::SeqCst) >= 2).await;
    assert!(fires.load(Ordering::SeqCst) >= 2);

    watcher.stop(Duration::from_secs(1)).await;
    let _ = run_handle.await;
}

// An invalid cron expression is a registration-time error, never a silent
// no-op.
#[test]
fn invalid_cron_expression_is_a_registration_error() {
    let watcher = CronWatcher::new();
    let err = watcher
        .handle_func("not a schedule", Arc::new(|| Box::pin(async {})))
        .unwrap_err();
    assert!(matches!(err, warden_watchers::CronError::InvalidSchedule(_)));
}

// Unknown condition/executor tags in the document are configuration errors
// surfaced at parse time, not swallowed.
#[test]
fn unknown_executor_type_is_a_parse_error() {
    let yaml = r#"
services:
  - name: bad
    condition:
      type: cron
      config:
        schedule: "* * * * * *"
    execute:
      type: carrier-pigeon
      config: {}
"#;
    assert!(parse(yaml).is_err());
}
