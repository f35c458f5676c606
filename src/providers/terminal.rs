//! Terminal capability provider.
//!
//! Manages subprocesses spawned on behalf of agents via `terminal/create`.
//! Each terminal owns an output ring bounded by its byte limit: appends
//! beyond the limit evict bytes from the head so the tail is preserved, and
//! the `truncated` flag latches true. Stderr is merged into the same
//! buffer as stdout. A wait task records the exit status and fires the
//! terminal's done signal.
//!
//! Kill escalates: SIGTERM, a 5 s grace wait on the done signal, then
//! SIGKILL. Killing an already-exited terminal is a no-op.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::acp::types::{
    TerminalCreateParams, TerminalCreateResult, TerminalExitStatus, TerminalOutputResult,
    TerminalWaitResult,
};
use crate::{AppError, Result};

/// Default output ring capacity: 1 MiB.
pub const DEFAULT_OUTPUT_BYTE_LIMIT: usize = 1024 * 1024;

/// Grace window between SIGTERM and SIGKILL.
const KILL_GRACE: Duration = Duration::from_secs(5);

/// Receives every chunk read from any terminal's output.
pub trait TerminalObserver: Send + Sync {
    fn output(&self, terminal_id: &str, chunk: &str);
}

/// Mutable state of one terminal, guarded by its mutex.
struct TerminalState {
    output: Vec<u8>,
    truncated: bool,
    exit_status: Option<TerminalExitStatus>,
}

/// One subprocess spawned on behalf of an agent.
pub struct Terminal {
    pub id: String,
    pub command: String,
    pub args: Vec<String>,
    pub cwd: String,
    byte_limit: usize,
    pid: Option<u32>,
    state: Mutex<TerminalState>,
    done: CancellationToken,
}

impl Terminal {
    /// Append a chunk to the output ring, evicting from the head when the
    /// buffer would exceed the byte limit.
    async fn append(&self, chunk: &[u8]) {
        let mut state = self.state.lock().await;
        state.output.extend_from_slice(chunk);
        if state.output.len() > self.byte_limit {
            let excess = state.output.len() - self.byte_limit;
            state.output.drain(..excess);
            state.truncated = true;
        }
    }
}

/// Pool of terminals created by agents.
pub struct TerminalProvider {
    terminals: Mutex<HashMap<String, Arc<Terminal>>>,
    observer: Arc<dyn TerminalObserver>,
}

impl TerminalProvider {
    #[must_use]
    pub fn new(observer: Arc<dyn TerminalObserver>) -> Self {
        Self {
            terminals: Mutex::new(HashMap::new()),
            observer,
        }
    }

    /// Spawn a subprocess and register it in the pool. The process starts
    /// immediately with stdout and stderr draining into the output ring.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` when the command cannot be started.
    pub async fn create(&self, params: TerminalCreateParams) -> Result<TerminalCreateResult> {
        let id = uuid::Uuid::new_v4().to_string();

        let mut cmd = Command::new(&params.command);
        cmd.args(&params.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if !params.cwd.is_empty() {
            cmd.current_dir(&params.cwd);
        }
        for var in &params.env {
            cmd.env(&var.name, &var.value);
        }

        let mut child = cmd.spawn().map_err(|e| {
            AppError::Io(format!("failed to start command '{}': {e}", params.command))
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AppError::Io("failed to capture terminal stdout".to_owned()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| AppError::Io("failed to capture terminal stderr".to_owned()))?;

        let byte_limit = match usize::try_from(params.output_byte_limit) {
            Ok(0) | Err(_) => DEFAULT_OUTPUT_BYTE_LIMIT,
            Ok(limit) => limit,
        };

        let terminal = Arc::new(Terminal {
            id: id.clone(),
            command: params.command,
            args: params.args,
            cwd: params.cwd,
            byte_limit,
            pid: child.id(),
            state: Mutex::new(TerminalState {
                output: Vec::new(),
                truncated: false,
                exit_status: None,
            }),
            done: CancellationToken::new(),
        });

        self.terminals
            .lock()
            .await
            .insert(id.clone(), Arc::clone(&terminal));

        // Both pipes feed the same ring; stderr is merged into the output.
        tokio::spawn(read_output(
            Arc::clone(&terminal),
            stdout,
            Arc::clone(&self.observer),
        ));
        tokio::spawn(read_output(
            Arc::clone(&terminal),
            stderr,
            Arc::clone(&self.observer),
        ));
        tokio::spawn(wait_for_exit(Arc::clone(&terminal), child));

        debug!(terminal_id = %id, "terminal created");
        Ok(TerminalCreateResult { terminal_id: id })
    }

    /// Current buffered output, the truncation flag, and — once the process
    /// has exited — its exit status.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown terminal id.
    pub async fn output(&self, terminal_id: &str) -> Result<TerminalOutputResult> {
        let terminal = self.get(terminal_id).await?;
        let state = terminal.state.lock().await;
        Ok(TerminalOutputResult {
            output: String::from_utf8_lossy(&state.output).into_owned(),
            truncated: state.truncated,
            exit_status: state.exit_status.clone(),
        })
    }

    /// Block until the terminal's subprocess exits; returns the exit
    /// status.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown terminal id.
    pub async fn wait(&self, terminal_id: &str) -> Result<TerminalWaitResult> {
        let terminal = self.get(terminal_id).await?;
        terminal.done.cancelled().await;

        let state = terminal.state.lock().await;
        let exit = state.exit_status.clone().unwrap_or_default();
        Ok(TerminalWaitResult {
            exit_code: exit.exit_code,
            signal: exit.signal,
        })
    }

    /// Terminate the subprocess: SIGTERM, up to 5 s grace, then SIGKILL.
    /// No-op if the process has already exited or its handle is gone.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown terminal id.
    pub async fn kill(&self, terminal_id: &str) -> Result<()> {
        let terminal = self.get(terminal_id).await?;
        kill_terminal(&terminal).await;
        Ok(())
    }

    /// Kill the subprocess if still running and drop the terminal from the
    /// pool, releasing its resources.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown terminal id.
    pub async fn release(&self, terminal_id: &str) -> Result<()> {
        let terminal = self.get(terminal_id).await?;
        kill_terminal(&terminal).await;
        self.terminals.lock().await.remove(terminal_id);
        debug!(terminal_id, "terminal released");
        Ok(())
    }

    /// Kill and release every active terminal.
    pub async fn close_all(&self) {
        let ids: Vec<String> = self.terminals.lock().await.keys().cloned().collect();
        for id in ids {
            if let Err(err) = self.release(&id).await {
                debug!(terminal_id = %id, %err, "release during close_all");
            }
        }
    }

    async fn get(&self, terminal_id: &str) -> Result<Arc<Terminal>> {
        self.terminals
            .lock()
            .await
            .get(terminal_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("terminal '{terminal_id}' not found")))
    }
}

// ── Background tasks ──────────────────────────────────────────────────────────

/// Drain one output pipe into the terminal's ring, reporting each chunk to
/// the observer.
async fn read_output<R>(terminal: Arc<Terminal>, mut stream: R, observer: Arc<dyn TerminalObserver>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut buf = [0u8; 4096];
    loop {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let chunk = &buf[..n];
                terminal.append(chunk).await;
                observer.output(&terminal.id, &String::from_utf8_lossy(chunk));
            }
        }
    }
}

/// Await process exit, record the exit status, and fire the done signal.
async fn wait_for_exit(terminal: Arc<Terminal>, mut child: Child) {
    let exit = match child.wait().await {
        Ok(status) => exit_status_of(&status),
        Err(err) => {
            warn!(terminal_id = %terminal.id, %err, "error waiting for terminal process");
            TerminalExitStatus {
                exit_code: Some(-1),
                signal: None,
            }
        }
    };

    terminal.state.lock().await.exit_status = Some(exit);
    terminal.done.cancel();
}

/// SIGTERM → grace wait → SIGKILL. No-op when already exited or when no
/// process handle is available.
async fn kill_terminal(terminal: &Terminal) {
    if terminal.state.lock().await.exit_status.is_some() {
        return;
    }
    let Some(pid) = terminal.pid else {
        return;
    };

    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let Ok(raw) = i32::try_from(pid) else {
            return;
        };
        let pid = Pid::from_raw(raw);

        // A failed SIGTERM means the process is already gone.
        if kill(pid, Signal::SIGTERM).is_err() {
            return;
        }

        tokio::select! {
            () = terminal.done.cancelled() => {}
            () = tokio::time::sleep(KILL_GRACE) => {
                warn!(terminal_id = %terminal.id, "terminal ignored SIGTERM, sending SIGKILL");
                let _ = kill(pid, Signal::SIGKILL);
                terminal.done.cancelled().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        // No graceful signal on this platform; the process is reaped via
        // kill_on_drop when the terminal is released.
        let _ = pid;
    }
}

/// Translate a process exit status into the wire shape. A signaled exit
/// carries the signal name and no exit code.
fn exit_status_of(status: &std::process::ExitStatus) -> TerminalExitStatus {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt as _;
        if let Some(sig) = status.signal() {
            return TerminalExitStatus {
                exit_code: None,
                signal: Some(signal_name(sig)),
            };
        }
    }

    TerminalExitStatus {
        exit_code: status.code().or(Some(-1)),
        signal: None,
    }
}

#[cfg(unix)]
fn signal_name(sig: i32) -> String {
    nix::sys::signal::Signal::try_from(sig)
        .map(|s| s.as_str().to_owned())
        .unwrap_or_else(|_| format!("signal {sig}"))
}
