//! Terminal provider flows against real subprocesses.

#![cfg(unix)]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use bytesmith::acp::types::TerminalCreateParams;
use bytesmith::providers::terminal::{TerminalObserver, TerminalProvider};
use bytesmith::AppError;

struct ChannelObserver {
    tx: mpsc::UnboundedSender<(String, String)>,
}

impl TerminalObserver for ChannelObserver {
    fn output(&self, terminal_id: &str, chunk: &str) {
        let _ = self.tx.send((terminal_id.to_owned(), chunk.to_owned()));
    }
}

fn provider() -> (TerminalProvider, mpsc::UnboundedReceiver<(String, String)>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        TerminalProvider::new(Arc::new(ChannelObserver { tx })),
        rx,
    )
}

fn shell(script: &str, byte_limit: u64) -> TerminalCreateParams {
    TerminalCreateParams {
        session_id: "s".to_owned(),
        command: "/bin/sh".to_owned(),
        args: vec!["-c".to_owned(), script.to_owned()],
        output_byte_limit: byte_limit,
        ..TerminalCreateParams::default()
    }
}

/// Poll the terminal's output until `predicate` holds or 5 s elapse.
/// Output readers drain concurrently with process exit, so output may
/// trail `wait` by a moment.
async fn poll_output<F>(provider: &TerminalProvider, id: &str, predicate: F) -> String
where
    F: Fn(&str) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let result = provider.output(id).await.expect("terminal must exist");
        if predicate(&result.output) {
            return result.output;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for terminal output, last: {:?}",
            result.output
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// Scenario: tail-biased truncation. byteLimit=8 and output
/// "ABCDEFGHIJ" leaves "CDEFGHIJ" with `truncated` latched.
#[tokio::test]
async fn output_ring_truncates_from_head() {
    let (provider, _events) = provider();
    let created = provider
        .create(shell("printf ABCDEFGHIJ", 8))
        .await
        .expect("create");

    provider.wait(&created.terminal_id).await.expect("wait");
    let output = poll_output(&provider, &created.terminal_id, |o| o == "CDEFGHIJ").await;
    assert_eq!(output, "CDEFGHIJ");

    let result = provider.output(&created.terminal_id).await.expect("output");
    assert!(result.truncated, "truncation must latch");
    assert!(result.output.len() <= 8, "output may never exceed the limit");
}

/// Output below the limit is never marked truncated, and the exit status
/// appears once the process finishes.
#[tokio::test]
async fn output_below_limit_is_not_truncated() {
    let (provider, _events) = provider();
    let created = provider
        .create(shell("printf hello", 0))
        .await
        .expect("create");

    let wait = provider.wait(&created.terminal_id).await.expect("wait");
    assert_eq!(wait.exit_code, Some(0));
    assert!(wait.signal.is_none());

    poll_output(&provider, &created.terminal_id, |o| o == "hello").await;
    let result = provider.output(&created.terminal_id).await.expect("output");
    assert!(!result.truncated);
    assert_eq!(
        result.exit_status.expect("exit status after exit").exit_code,
        Some(0)
    );
}

/// Stderr is merged into the same output buffer as stdout.
#[tokio::test]
async fn stderr_merges_into_output() {
    let (provider, _events) = provider();
    let created = provider
        .create(shell("printf out; printf err 1>&2", 0))
        .await
        .expect("create");

    provider.wait(&created.terminal_id).await.expect("wait");
    let output = poll_output(&provider, &created.terminal_id, |o| {
        o.contains("out") && o.contains("err")
    })
    .await;
    assert_eq!(output.len(), 6, "both streams land in one buffer");
}

/// Nonzero exit codes are recorded.
#[tokio::test]
async fn exit_code_is_recorded() {
    let (provider, _events) = provider();
    let created = provider.create(shell("exit 3", 0)).await.expect("create");

    let wait = provider.wait(&created.terminal_id).await.expect("wait");
    assert_eq!(wait.exit_code, Some(3));
}

/// Kill on a running process escalates from SIGTERM; the wait result
/// carries the signal name instead of an exit code.
#[tokio::test]
async fn kill_terminates_running_process() {
    let (provider, _events) = provider();
    let created = provider.create(shell("sleep 30", 0)).await.expect("create");

    provider.kill(&created.terminal_id).await.expect("kill");
    let wait = provider.wait(&created.terminal_id).await.expect("wait");

    assert!(wait.exit_code.is_none(), "signaled exit has no code");
    assert_eq!(wait.signal.as_deref(), Some("SIGTERM"));
}

/// Kill is idempotent after exit.
#[tokio::test]
async fn kill_after_exit_is_noop() {
    let (provider, _events) = provider();
    let created = provider.create(shell("true", 0)).await.expect("create");

    provider.wait(&created.terminal_id).await.expect("wait");
    provider.kill(&created.terminal_id).await.expect("first kill");
    provider.kill(&created.terminal_id).await.expect("second kill");
}

/// Release removes the terminal; further operations see "not found".
#[tokio::test]
async fn release_removes_terminal() {
    let (provider, _events) = provider();
    let created = provider.create(shell("true", 0)).await.expect("create");
    provider.wait(&created.terminal_id).await.expect("wait");

    provider.release(&created.terminal_id).await.expect("release");

    let output = provider.output(&created.terminal_id).await;
    assert!(matches!(output, Err(AppError::NotFound(_))));

    let again = provider.release(&created.terminal_id).await;
    assert!(
        matches!(again, Err(AppError::NotFound(_))),
        "second release reports not found"
    );
}

/// Unknown terminal ids are domain failures.
#[tokio::test]
async fn unknown_terminal_is_not_found() {
    let (provider, _events) = provider();
    assert!(matches!(
        provider.output("no-such-terminal").await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        provider.kill("no-such-terminal").await,
        Err(AppError::NotFound(_))
    ));
}

/// The observer receives output chunks tagged with the terminal id.
#[tokio::test]
async fn observer_receives_chunks() {
    let (provider, mut events) = provider();
    let created = provider
        .create(shell("printf chunkdata", 0))
        .await
        .expect("create");

    let (terminal_id, chunk) =
        tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("observer must receive a chunk")
            .expect("channel open");
    assert_eq!(terminal_id, created.terminal_id);
    assert!(chunk.contains("chunk"));
}

/// close_all releases every terminal in the pool.
#[tokio::test]
async fn close_all_releases_everything() {
    let (provider, _events) = provider();
    let a = provider.create(shell("true", 0)).await.expect("create a");
    let b = provider.create(shell("true", 0)).await.expect("create b");

    provider.close_all().await;

    assert!(matches!(
        provider.output(&a.terminal_id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        provider.output(&b.terminal_id).await,
        Err(AppError::NotFound(_))
    ));
}
