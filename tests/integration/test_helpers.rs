//! Shared doubles for integration tests.
//!
//! [`FakeTransport`] stands in for the stdio transport: tests inspect what
//! the client sent and inject agent messages by invoking the installed
//! handler, exactly as the real reader task would. [`RecordingHandler`] is
//! a configurable [`AgentHandler`] delegate that records session updates
//! and can forward capability requests to real providers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio_util::sync::CancellationToken;

use bytesmith::acp::client::AgentHandler;
use bytesmith::acp::transport::{MessageHandler, Transport};
use bytesmith::acp::types::{
    JsonRpcMessage, ReadTextFileParams, ReadTextFileResult, RequestPermissionParams,
    RequestPermissionResult, SessionUpdateParams, TerminalCreateParams, TerminalCreateResult,
    TerminalKillParams, TerminalOutputParams, TerminalOutputResult, TerminalReleaseParams,
    TerminalWaitParams, TerminalWaitResult, WriteTextFileParams,
};
use bytesmith::providers::fs::{FileChange, FileChangeObserver, FsProvider};
use bytesmith::providers::permission::PermissionBridge;
use bytesmith::{AppError, Result};

/// In-memory transport double.
pub struct FakeTransport {
    sent: Mutex<Vec<JsonRpcMessage>>,
    handler: std::sync::Mutex<Option<Arc<dyn MessageHandler>>>,
    running: AtomicBool,
    done_token: CancellationToken,
    notify: Notify,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            handler: std::sync::Mutex::new(None),
            running: AtomicBool::new(true),
            done_token: CancellationToken::new(),
            notify: Notify::new(),
        })
    }

    /// Deliver an agent message to the client, as the reader task would.
    pub async fn inject(&self, message: JsonRpcMessage) {
        let handler = self
            .handler
            .lock()
            .unwrap()
            .clone()
            .expect("client must have installed a handler");
        handler.handle_message(message).await;
    }

    /// Snapshot of everything the client has sent so far.
    pub async fn sent(&self) -> Vec<JsonRpcMessage> {
        self.sent.lock().await.clone()
    }

    /// Block until at least `count` messages have been sent.
    pub async fn wait_for_sent(&self, count: usize) -> Vec<JsonRpcMessage> {
        loop {
            {
                let sent = self.sent.lock().await;
                if sent.len() >= count {
                    return sent.clone();
                }
            }
            tokio::time::timeout(Duration::from_secs(5), self.notify.notified())
                .await
                .expect("timed out waiting for the client to send");
        }
    }

    /// Simulate the reader observing EOF (agent process exit).
    pub fn fire_done(&self) {
        self.done_token.cancel();
    }
}

#[async_trait]
impl Transport for FakeTransport {
    fn set_handler(&self, handler: Arc<dyn MessageHandler>) {
        *self.handler.lock().unwrap() = Some(handler);
    }

    async fn start(&self) -> Result<()> {
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn send(&self, message: JsonRpcMessage) -> Result<()> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(AppError::Closed);
        }
        self.sent.lock().await.push(message);
        self.notify.notify_one();
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn done(&self) -> CancellationToken {
        self.done_token.clone()
    }

    fn take_stderr(&self) -> Option<mpsc::Receiver<String>> {
        None
    }

    async fn close(&self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        self.done_token.cancel();
        Ok(())
    }
}

/// Observer that drops every file-change notification.
pub struct NullFileObserver;

impl FileChangeObserver for NullFileObserver {
    fn file_changed(&self, _change: &FileChange) {}
}

/// Configurable capability delegate for client tests.
#[derive(Default)]
pub struct RecordingHandler {
    pub updates: Mutex<Vec<SessionUpdateParams>>,
    pub fs: Option<Arc<FsProvider>>,
    /// When set, permission requests route through the bridge under this
    /// connection id.
    pub permissions: Option<(Arc<PermissionBridge>, String)>,
}

#[async_trait]
impl AgentHandler for RecordingHandler {
    async fn session_update(&self, params: SessionUpdateParams) {
        self.updates.lock().await.push(params);
    }

    async fn request_permission(
        &self,
        params: RequestPermissionParams,
    ) -> RequestPermissionResult {
        match &self.permissions {
            Some((bridge, connection_id)) => bridge.request(connection_id, params).await,
            None => RequestPermissionResult::cancelled(),
        }
    }

    async fn read_text_file(&self, params: ReadTextFileParams) -> Result<ReadTextFileResult> {
        match &self.fs {
            Some(fs) => fs.read_text_file(params).await,
            None => Err(AppError::NotFound("no fs provider wired".to_owned())),
        }
    }

    async fn write_text_file(&self, params: WriteTextFileParams) -> Result<()> {
        match &self.fs {
            Some(fs) => fs.write_text_file(params, "test-agent").await,
            None => Err(AppError::NotFound("no fs provider wired".to_owned())),
        }
    }

    async fn create_terminal(
        &self,
        _params: TerminalCreateParams,
    ) -> Result<TerminalCreateResult> {
        Err(AppError::NotFound("no terminal provider wired".to_owned()))
    }

    async fn terminal_output(
        &self,
        _params: TerminalOutputParams,
    ) -> Result<TerminalOutputResult> {
        Err(AppError::NotFound("no terminal provider wired".to_owned()))
    }

    async fn wait_terminal(&self, _params: TerminalWaitParams) -> Result<TerminalWaitResult> {
        Err(AppError::NotFound("no terminal provider wired".to_owned()))
    }

    async fn kill_terminal(&self, _params: TerminalKillParams) -> Result<()> {
        Err(AppError::NotFound("no terminal provider wired".to_owned()))
    }

    async fn release_terminal(&self, _params: TerminalReleaseParams) -> Result<()> {
        Err(AppError::NotFound("no terminal provider wired".to_owned()))
    }
}
