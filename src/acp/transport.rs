//! Stdio transport for ACP agent subprocesses.
//!
//! [`StdioTransport`] spawns an agent process and exchanges newline-delimited
//! JSON-RPC messages over its stdin/stdout. Incoming messages are decoded on
//! a dedicated reader task (driven by [`FramedRead`] with [`AcpCodec`]) and
//! dispatched to the installed [`MessageHandler`]. Stderr lines are drained
//! into a bounded queue and dropped tail-first when the consumer lags, so
//! stderr backpressure can never block the protocol reader.
//!
//! Construction and start are separate so the handler can be wired before
//! the first byte is read.
//!
//! # Shutdown
//!
//! `close` follows a fixed order: close the child's stdin (EOF), wait for
//! the reader to observe EOF on the child's stdout, reap the child, and let
//! the stderr stream end with the process. An agent that ignores the EOF is
//! killed after a 5 s grace window. `close` is idempotent; `send` after
//! close fails fast with [`AppError::Closed`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{mpsc, Mutex};
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::acp::codec::{AcpCodec, MAX_STDERR_LINE_BYTES};
use crate::acp::types::JsonRpcMessage;
use crate::{AppError, Result};

/// Capacity of the stderr line queue. Lines beyond this are dropped.
pub const STDERR_QUEUE_CAPACITY: usize = 256;

/// Grace window between closing the child's stdin and killing the process.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Receives every decoded JSON-RPC message read from the agent's stdout.
///
/// Installed once before [`Transport::start`]; messages arriving with no
/// handler installed are dropped.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle_message(&self, message: JsonRpcMessage);
}

/// A bidirectional NDJSON message pipe to an agent process.
///
/// [`StdioTransport`] is the production implementation; tests substitute
/// in-memory doubles.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Install the handler for incoming messages. Must be called before
    /// `start` or early messages may be missed.
    fn set_handler(&self, handler: Arc<dyn MessageHandler>);

    /// Spawn the subprocess and begin reading stdout and stderr.
    async fn start(&self) -> Result<()>;

    /// Serialize `message` and write it as a single `\n`-terminated line.
    /// Writers are mutually excluded; concurrent sends never interleave.
    async fn send(&self, message: JsonRpcMessage) -> Result<()>;

    /// Whether the subprocess is running and the transport accepts sends.
    fn is_running(&self) -> bool;

    /// Token cancelled when the reader observes EOF (process exit or close).
    fn done(&self) -> CancellationToken;

    /// Take the stderr line stream. Yields `None` after the first call.
    fn take_stderr(&self) -> Option<mpsc::Receiver<String>>;

    /// Clean shutdown: close stdin, drain the reader, reap the child.
    /// Idempotent.
    async fn close(&self) -> Result<()>;
}

/// Stdio transport over a spawned agent subprocess.
pub struct StdioTransport {
    command: String,
    args: Vec<String>,
    env: HashMap<String, String>,
    cwd: Option<PathBuf>,

    handler: Arc<RwLock<Option<Arc<dyn MessageHandler>>>>,
    stdin: Mutex<Option<ChildStdin>>,
    child: Mutex<Option<Child>>,
    stderr_rx: std::sync::Mutex<Option<mpsc::Receiver<String>>>,
    done_token: CancellationToken,
    running: Arc<AtomicBool>,
    started: AtomicBool,
    closed: Mutex<bool>,
}

impl StdioTransport {
    /// Prepare a transport for the given command without spawning it.
    /// `env` entries override the inherited environment.
    #[must_use]
    pub fn new(
        command: impl Into<String>,
        args: Vec<String>,
        env: HashMap<String, String>,
        cwd: Option<PathBuf>,
    ) -> Self {
        Self {
            command: command.into(),
            args,
            env,
            cwd,
            handler: Arc::new(RwLock::new(None)),
            stdin: Mutex::new(None),
            child: Mutex::new(None),
            stderr_rx: std::sync::Mutex::new(None),
            done_token: CancellationToken::new(),
            running: Arc::new(AtomicBool::new(false)),
            started: AtomicBool::new(false),
            closed: Mutex::new(false),
        }
    }

    /// The command this transport spawns.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }
}

#[async_trait]
impl Transport for StdioTransport {
    fn set_handler(&self, handler: Arc<dyn MessageHandler>) {
        if let Ok(mut slot) = self.handler.write() {
            *slot = Some(handler);
        }
    }

    async fn start(&self) -> Result<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(AppError::Acp("transport already started".to_owned()));
        }

        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                self.done_token.cancel();
                return Err(AppError::Acp(format!(
                    "failed to spawn agent '{}': {err}",
                    self.command
                )));
            }
        };

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AppError::Acp("failed to capture agent stdin".to_owned()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AppError::Acp("failed to capture agent stdout".to_owned()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| AppError::Acp("failed to capture agent stderr".to_owned()))?;

        *self.stdin.lock().await = Some(stdin);
        *self.child.lock().await = Some(child);
        self.running.store(true, Ordering::SeqCst);

        let (stderr_tx, stderr_rx) = mpsc::channel(STDERR_QUEUE_CAPACITY);
        if let Ok(mut slot) = self.stderr_rx.lock() {
            *slot = Some(stderr_rx);
        }

        tokio::spawn(run_read_loop(
            stdout,
            Arc::clone(&self.handler),
            Arc::clone(&self.running),
            self.done_token.clone(),
        ));
        tokio::spawn(run_stderr_loop(stderr, stderr_tx));

        Ok(())
    }

    async fn send(&self, message: JsonRpcMessage) -> Result<()> {
        let mut payload = serde_json::to_vec(&message)
            .map_err(|e| AppError::Acp(format!("failed to serialize message: {e}")))?;
        payload.push(b'\n');

        let mut guard = self.stdin.lock().await;
        if !self.running.load(Ordering::SeqCst) {
            return Err(AppError::Closed);
        }
        let Some(stdin) = guard.as_mut() else {
            return Err(AppError::Closed);
        };

        stdin
            .write_all(&payload)
            .await
            .map_err(|e| AppError::Io(format!("write to agent stdin failed: {e}")))?;
        stdin
            .flush()
            .await
            .map_err(|e| AppError::Io(format!("flush to agent stdin failed: {e}")))?;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn done(&self) -> CancellationToken {
        self.done_token.clone()
    }

    fn take_stderr(&self) -> Option<mpsc::Receiver<String>> {
        self.stderr_rx.lock().ok().and_then(|mut slot| slot.take())
    }

    async fn close(&self) -> Result<()> {
        let mut closed = self.closed.lock().await;
        if *closed {
            return Ok(());
        }
        *closed = true;

        self.running.store(false, Ordering::SeqCst);

        // EOF to the agent: dropping stdin closes the pipe.
        self.stdin.lock().await.take();

        if self.started.load(Ordering::SeqCst) && self.child.lock().await.is_some() {
            if tokio::time::timeout(SHUTDOWN_GRACE, self.done_token.cancelled())
                .await
                .is_err()
            {
                warn!(
                    command = %self.command,
                    "agent did not close its output within the grace window, killing"
                );
                if let Some(child) = self.child.lock().await.as_mut() {
                    child.start_kill().ok();
                }
                self.done_token.cancelled().await;
            }

            if let Some(mut child) = self.child.lock().await.take() {
                child
                    .wait()
                    .await
                    .map_err(|e| AppError::Io(format!("wait for agent exit failed: {e}")))?;
            }
        } else {
            self.done_token.cancel();
        }

        Ok(())
    }
}

// ── Reader / stderr tasks ─────────────────────────────────────────────────────

/// Reader task: decodes NDJSON frames from the agent's stdout and dispatches
/// each JSON-RPC message to the installed handler.
///
/// Empty lines are skipped. Invalid JSON and over-long lines are logged and
/// dropped without terminating the stream. On EOF or an unrecoverable I/O
/// error the task clears the running flag and cancels `done`.
async fn run_read_loop<R>(
    stdout: R,
    handler: Arc<RwLock<Option<Arc<dyn MessageHandler>>>>,
    running: Arc<AtomicBool>,
    done: CancellationToken,
) where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut framed = FramedRead::new(stdout, AcpCodec::new());

    while let Some(item) = framed.next().await {
        match item {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match serde_json::from_str::<JsonRpcMessage>(trimmed) {
                    Ok(message) => {
                        let installed = handler.read().ok().and_then(|h| h.clone());
                        if let Some(installed) = installed {
                            installed.handle_message(message).await;
                        } else {
                            debug!("no message handler installed, dropping frame");
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, "invalid JSON from agent, dropping frame");
                    }
                }
            }
            Err(AppError::Acp(msg)) => {
                // Codec-level error (line too long) — the codec realigns on
                // the next newline, so the stream continues.
                warn!(error = msg.as_str(), "codec framing error, frame dropped");
            }
            Err(err) => {
                warn!(error = %err, "agent stdout read error, stopping reader");
                break;
            }
        }
    }

    debug!("agent stdout reached EOF");
    running.store(false, Ordering::SeqCst);
    done.cancel();
}

/// Stderr drainer: pushes each line into the bounded queue, dropping lines
/// when the queue is full so a lagging consumer can never block the agent.
async fn run_stderr_loop<R>(stderr: R, tx: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut framed = FramedRead::new(
        stderr,
        AcpCodec::with_max_length(MAX_STDERR_LINE_BYTES),
    );

    while let Some(item) = framed.next().await {
        match item {
            Ok(line) => {
                // Keep draining even when the consumer is gone, so the
                // child's stderr pipe never fills up.
                let _ = tx.try_send(line);
            }
            Err(AppError::Acp(_)) => {
                // Over-long stderr line dropped; stream realigns.
            }
            Err(_) => break,
        }
    }
}
