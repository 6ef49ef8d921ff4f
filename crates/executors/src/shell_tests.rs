use super::*;
use serial_test::serial;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn runs_command_via_configured_shell() {
    let mut executor = ShellExecutor::new("echo hello");
    executor.shell = Some("sh".to_string());
    executor
        .execute(CancellationToken::new())
        .await
        .expect("echo should succeed");
}

#[tokio::test]
async fn nonzero_exit_is_an_execute_error() {
    let mut executor = ShellExecutor::new("exit 1");
    executor.shell = Some("sh".to_string());
    let err = executor
        .execute(CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ExecuteError::Other(_)));
}

#[tokio::test]
async fn exceeding_timeout_is_reported() {
    let mut executor = ShellExecutor::new("sleep 10");
    executor.shell = Some("sh".to_string());
    executor.timeout = Duration::from_millis(50);
    let err = executor
        .execute(CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ExecuteError::Timeout));
}

#[tokio::test]
async fn cancellation_aborts_in_flight_command() {
    let mut executor = ShellExecutor::new("sleep 10");
    executor.shell = Some("sh".to_string());
    executor.timeout = Duration::from_secs(30);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = executor.execute(cancel).await.unwrap_err();
    assert!(matches!(err, ExecuteError::Other(_)));
}

// Guards the process-wide `SHELL` env var against other tests in this
// binary that might read it concurrently.
#[test]
#[serial]
fn falls_back_to_shell_env_var_then_bash() {
    let executor = ShellExecutor::new("true");
    // SAFETY: test runs single-threaded with respect to this env var and
    // restores it before returning.
    let previous = std::env::var("SHELL").ok();
    std::env::remove_var("SHELL");
    assert_eq!(executor.resolve_shell(), "bash");
    std::env::set_var("SHELL", "/bin/zsh");
    assert_eq!(executor.resolve_shell(), "/bin/zsh");
    match previous {
        Some(value) => std::env::set_var("SHELL", value),
        None => std::env::remove_var("SHELL"),
    }
}
