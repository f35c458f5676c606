//! ACP protocol client.
//!
//! [`AcpClient`] orchestrates communication with an AI coding agent over a
//! [`Transport`]:
//!
//! 1. Dispatches outgoing JSON-RPC requests and correlates responses by
//!    numeric id through a pending table of one-shot slots.
//! 2. Delivers `session/update` notifications to the [`AgentHandler`]
//!    delegate in wire order, inline on the reader task.
//! 3. Services agent-originated requests (`requestPermission`, `fs/*`,
//!    `terminal/*`) on a spawned task per request, so a blocking permission
//!    dialog never stalls the reader, and replies with the matching
//!    result or JSON-RPC error.
//!
//! The delegate is supplied at construction; there is no post-hoc handler
//! registration. Closing the client unblocks every pending waiter with a
//! cancelled error before closing the transport. A transport that reaches
//! EOF (agent exit) drains the pending table the same way.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{oneshot, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::acp::transport::{MessageHandler, Transport};
use crate::acp::types::{
    ClientCapabilities, ContentBlock, FsCapabilities, ImplementationInfo, InitializeParams,
    InitializeResult, JsonRpcMessage, McpServer, ReadTextFileParams, ReadTextFileResult,
    RequestPermissionParams, RequestPermissionResult, SessionCancelParams, SessionLoadParams,
    SessionNewParams, SessionNewResult, SessionPromptParams, SessionPromptResult,
    SessionSetModeParams, SessionUpdateParams, TerminalCreateParams, TerminalCreateResult,
    TerminalKillParams, TerminalOutputParams, TerminalOutputResult, TerminalReleaseParams,
    TerminalWaitParams, TerminalWaitResult, WriteTextFileParams, ERR_INTERNAL,
    ERR_INVALID_PARAMS, ERR_METHOD_NOT_FOUND, METHOD_FS_READ_TEXT_FILE,
    METHOD_FS_WRITE_TEXT_FILE, METHOD_INITIALIZE, METHOD_REQUEST_PERMISSION,
    METHOD_SESSION_CANCEL, METHOD_SESSION_LOAD, METHOD_SESSION_NEW, METHOD_SESSION_PROMPT,
    METHOD_SESSION_SET_MODE, METHOD_SESSION_UPDATE, METHOD_TERMINAL_CREATE,
    METHOD_TERMINAL_KILL, METHOD_TERMINAL_OUTPUT, METHOD_TERMINAL_RELEASE,
    METHOD_TERMINAL_WAIT,
};
use crate::{AppError, Result};

/// Default timeout for outgoing calls that carry no explicit deadline.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// ACP protocol version this client advertises.
pub const PROTOCOL_VERSION: u32 = 1;

// ── Delegate ──────────────────────────────────────────────────────────────────

/// Capability delegate servicing everything the agent initiates.
///
/// One implementation is supplied per connection at client construction and
/// receives session updates plus every inbound capability request.
#[async_trait]
pub trait AgentHandler: Send + Sync {
    /// A `session/update` notification. Invoked in wire order; the
    /// implementation must not block on user input.
    async fn session_update(&self, params: SessionUpdateParams);

    /// `requestPermission` — may block until the user decides.
    async fn request_permission(&self, params: RequestPermissionParams)
        -> RequestPermissionResult;

    /// `fs/readTextFile`.
    async fn read_text_file(&self, params: ReadTextFileParams) -> Result<ReadTextFileResult>;

    /// `fs/writeTextFile`.
    async fn write_text_file(&self, params: WriteTextFileParams) -> Result<()>;

    /// `terminal/create`.
    async fn create_terminal(&self, params: TerminalCreateParams)
        -> Result<TerminalCreateResult>;

    /// `terminal/output`.
    async fn terminal_output(&self, params: TerminalOutputParams)
        -> Result<TerminalOutputResult>;

    /// `terminal/wait` — blocks until the terminal's process exits.
    async fn wait_terminal(&self, params: TerminalWaitParams) -> Result<TerminalWaitResult>;

    /// `terminal/kill`.
    async fn kill_terminal(&self, params: TerminalKillParams) -> Result<()>;

    /// `terminal/release`.
    async fn release_terminal(&self, params: TerminalReleaseParams) -> Result<()>;
}

// ── Client ────────────────────────────────────────────────────────────────────

/// In-flight request slots keyed by id, plus the closing latch.
struct PendingTable {
    slots: HashMap<i64, oneshot::Sender<JsonRpcMessage>>,
    closed: bool,
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    handler: Arc<dyn AgentHandler>,
    next_id: AtomicI64,
    pending: Mutex<PendingTable>,
    request_timeout: Duration,
}

/// The ACP protocol client bound to one agent connection.
pub struct AcpClient {
    inner: Arc<ClientInner>,
}

impl AcpClient {
    /// Create a client around `transport` with `handler` as the capability
    /// delegate. Registers itself as the transport's message handler; the
    /// transport must not be started yet. [`AcpClient::initialize`] starts
    /// it and performs the handshake.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, handler: Arc<dyn AgentHandler>) -> Self {
        let inner = Arc::new(ClientInner {
            transport: Arc::clone(&transport),
            handler,
            next_id: AtomicI64::new(0),
            pending: Mutex::new(PendingTable {
                slots: HashMap::new(),
                closed: false,
            }),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        });

        transport.set_handler(Arc::new(Dispatcher {
            inner: Arc::clone(&inner),
        }));

        // Agent exit fails every in-flight call promptly instead of letting
        // each waiter run out its own deadline.
        let watcher = Arc::clone(&inner);
        let done = transport.done();
        tokio::spawn(async move {
            done.cancelled().await;
            watcher.drain_pending("connection closed").await;
        });

        Self { inner }
    }

    /// Start the transport (if not running) and perform the ACP initialize
    /// handshake, advertising the client's capabilities.
    ///
    /// # Errors
    ///
    /// Propagates spawn failures and handshake call failures; the caller is
    /// responsible for closing the transport on error.
    pub async fn initialize(&self) -> Result<InitializeResult> {
        if !self.inner.transport.is_running() {
            self.inner.transport.start().await?;
        }

        let params = InitializeParams {
            protocol_version: PROTOCOL_VERSION,
            client_capabilities: ClientCapabilities {
                fs: Some(FsCapabilities {
                    read_text_file: true,
                    write_text_file: true,
                }),
                terminal: true,
            },
            client_info: ImplementationInfo {
                name: "bytesmith".to_owned(),
                title: "ByteSmith".to_owned(),
                version: env!("CARGO_PKG_VERSION").to_owned(),
            },
        };

        self.call_typed(METHOD_INITIALIZE, &params, None, None).await
    }

    /// Ask the agent to create a new session; returns the session id.
    ///
    /// # Errors
    ///
    /// Returns the agent's error object as [`AppError::Rpc`], or a
    /// timeout/cancellation error.
    pub async fn new_session(&self, cwd: &str, mcp_servers: Vec<McpServer>) -> Result<String> {
        let params = SessionNewParams {
            cwd: cwd.to_owned(),
            mcp_servers,
        };
        let result: SessionNewResult = self
            .call_typed(METHOD_SESSION_NEW, &params, None, None)
            .await?;
        Ok(result.session_id)
    }

    /// Ask the agent to reload an existing session.
    ///
    /// # Errors
    ///
    /// See [`AcpClient::new_session`].
    pub async fn load_session(
        &self,
        session_id: &str,
        cwd: &str,
        mcp_servers: Vec<McpServer>,
    ) -> Result<()> {
        let params = SessionLoadParams {
            session_id: session_id.to_owned(),
            cwd: cwd.to_owned(),
            mcp_servers,
        };
        let _: Value = self
            .call_typed(METHOD_SESSION_LOAD, &params, None, None)
            .await?;
        Ok(())
    }

    /// Send a user prompt and block until the agent signals a stop reason.
    /// Session updates stream to the delegate while this call is pending.
    ///
    /// `timeout` is the caller's deadline (prompts are long-running; an hour
    /// is typical). `cancel` unblocks the waiter early; pair it with
    /// [`AcpClient::cancel`] so the agent also stops.
    ///
    /// # Errors
    ///
    /// [`AppError::Timeout`] on deadline, [`AppError::Cancelled`] on token
    /// fire or client close, [`AppError::Rpc`] for agent-reported errors.
    pub async fn prompt(
        &self,
        session_id: &str,
        prompt: Vec<ContentBlock>,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<SessionPromptResult> {
        let params = SessionPromptParams {
            session_id: session_id.to_owned(),
            prompt,
        };
        self.call_typed(METHOD_SESSION_PROMPT, &params, Some(timeout), Some(cancel))
            .await
    }

    /// Fire-and-forget cancellation of an in-flight prompt.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Closed`] when the transport is gone.
    pub async fn cancel(&self, session_id: &str) -> Result<()> {
        let params = SessionCancelParams {
            session_id: session_id.to_owned(),
        };
        self.notify(METHOD_SESSION_CANCEL, &params).await
    }

    /// Ask the agent to switch operating modes.
    ///
    /// # Errors
    ///
    /// See [`AcpClient::new_session`].
    pub async fn set_mode(&self, session_id: &str, mode: &str) -> Result<()> {
        let params = SessionSetModeParams {
            session_id: session_id.to_owned(),
            mode: mode.to_owned(),
        };
        let _: Value = self
            .call_typed(METHOD_SESSION_SET_MODE, &params, None, None)
            .await?;
        Ok(())
    }

    /// Clean shutdown: unblock every pending waiter with a cancelled error,
    /// then close the transport (which reaps the subprocess).
    ///
    /// # Errors
    ///
    /// Propagates transport close failures.
    pub async fn close(&self) -> Result<()> {
        self.inner.drain_pending("client closing").await;
        self.inner.transport.close().await
    }

    /// Take the agent's stderr line stream. Yields `None` after the first
    /// call or before the transport has started.
    #[must_use]
    pub fn take_stderr(&self) -> Option<tokio::sync::mpsc::Receiver<String>> {
        self.inner.transport.take_stderr()
    }

    /// Token cancelled when the connection's reader has stopped.
    #[must_use]
    pub fn done(&self) -> CancellationToken {
        self.inner.transport.done()
    }

    /// Serialize params, issue the call, deserialize the result.
    async fn call_typed<P: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        params: &P,
        timeout: Option<Duration>,
        cancel: Option<&CancellationToken>,
    ) -> Result<T> {
        let params = serde_json::to_value(params)
            .map_err(|e| AppError::Acp(format!("{method}: marshal params: {e}")))?;
        let raw = self.inner.call(method, params, timeout, cancel).await?;
        serde_json::from_value(raw)
            .map_err(|e| AppError::Acp(format!("{method}: unmarshal result: {e}")))
    }

    /// Send a notification (no id, no response expected).
    async fn notify<P: Serialize>(&self, method: &str, params: &P) -> Result<()> {
        let params = serde_json::to_value(params)
            .map_err(|e| AppError::Acp(format!("{method}: marshal params: {e}")))?;
        self.inner
            .transport
            .send(JsonRpcMessage::notification(method, params))
            .await
    }
}

impl ClientInner {
    /// Issue a JSON-RPC request and wait for its response.
    ///
    /// Steps: assign an id, insert a one-shot slot, send the frame, then
    /// wait on the slot, the deadline, or the caller's cancellation token.
    /// Every exit other than slot delivery removes the table entry, so a
    /// late response is logged as an orphan and dropped.
    ///
    /// The caller's `timeout` overrides the client default; the 30 s default
    /// applies only when no deadline is supplied.
    async fn call(
        &self,
        method: &str,
        params: Value,
        timeout: Option<Duration>,
        cancel: Option<&CancellationToken>,
    ) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let message = JsonRpcMessage::request(id, method, params);

        let (tx, rx) = oneshot::channel();
        {
            let mut table = self.pending.lock().await;
            if table.closed {
                return Err(AppError::Cancelled(format!(
                    "request {id} cancelled (client closing)"
                )));
            }
            table.slots.insert(id, tx);
        }

        if let Err(err) = self.transport.send(message).await {
            self.remove_pending(id).await;
            return Err(err);
        }

        let effective = timeout.unwrap_or(self.request_timeout);
        let caller_cancelled = async {
            match cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            delivered = rx => match delivered {
                Ok(response) => {
                    if let Some(err) = response.error {
                        Err(AppError::Rpc(err))
                    } else {
                        Ok(response.result.unwrap_or(Value::Null))
                    }
                }
                Err(_) => Err(AppError::Cancelled(format!(
                    "request {id} cancelled (client closing)"
                ))),
            },
            () = tokio::time::sleep(effective) => {
                self.remove_pending(id).await;
                Err(AppError::Timeout(format!(
                    "request {method} (id={id}) timed out after {effective:?}"
                )))
            }
            () = caller_cancelled => {
                self.remove_pending(id).await;
                Err(AppError::Cancelled(format!(
                    "request {method} (id={id}) cancelled by caller"
                )))
            }
        }
    }

    async fn remove_pending(&self, id: i64) {
        self.pending.lock().await.slots.remove(&id);
    }

    /// Unblock every pending waiter and latch the table closed.
    async fn drain_pending(&self, reason: &str) {
        let mut table = self.pending.lock().await;
        if table.closed && table.slots.is_empty() {
            return;
        }
        table.closed = true;
        let drained = table.slots.len();
        // Dropping the senders resolves each waiter with a cancelled error.
        table.slots.clear();
        if drained > 0 {
            debug!(drained, reason, "pending requests drained");
        }
    }

    /// Match a response to its pending slot by id and deliver it exactly
    /// once. Orphans (unknown or reused ids) are logged and dropped.
    async fn handle_response(&self, message: JsonRpcMessage) {
        let id = message.id_as_i64();
        if id == 0 {
            warn!("response with non-numeric or zero id, dropping");
            return;
        }

        let slot = self.pending.lock().await.slots.remove(&id);
        match slot {
            Some(tx) => {
                // A dead receiver means the waiter already gave up
                // (timeout/cancel); nothing left to do.
                let _ = tx.send(message);
            }
            None => {
                warn!(id, "response for unknown request id, dropping orphan");
            }
        }
    }

    /// Route an incoming notification. Only `session/update` is known.
    async fn handle_notification(&self, message: JsonRpcMessage) {
        let method = message.method.as_deref().unwrap_or_default();
        if method != METHOD_SESSION_UPDATE {
            debug!(method, "unhandled notification");
            return;
        }

        let params = message.params.unwrap_or(Value::Null);
        match serde_json::from_value::<SessionUpdateParams>(params) {
            Ok(update) => self.handler.session_update(update).await,
            Err(err) => warn!(error = %err, "failed to parse session/update params"),
        }
    }

    /// Service an agent-originated request and reply.
    async fn handle_request(self: Arc<Self>, message: JsonRpcMessage) {
        let id = message.id.clone();
        let method = message.method.clone().unwrap_or_default();
        let params = message.params.unwrap_or(Value::Null);

        let outcome = match method.as_str() {
            METHOD_REQUEST_PERMISSION => {
                match serde_json::from_value::<RequestPermissionParams>(params) {
                    Ok(p) => {
                        let result = self.handler.request_permission(p).await;
                        serde_json::to_value(result).map_err(AppError::from)
                    }
                    Err(e) => return self.reply_invalid_params(id, &e).await,
                }
            }
            METHOD_FS_READ_TEXT_FILE => {
                match serde_json::from_value::<ReadTextFileParams>(params) {
                    Ok(p) => result_value(self.handler.read_text_file(p).await),
                    Err(e) => return self.reply_invalid_params(id, &e).await,
                }
            }
            METHOD_FS_WRITE_TEXT_FILE => {
                match serde_json::from_value::<WriteTextFileParams>(params) {
                    Ok(p) => void_value(self.handler.write_text_file(p).await),
                    Err(e) => return self.reply_invalid_params(id, &e).await,
                }
            }
            METHOD_TERMINAL_CREATE => {
                match serde_json::from_value::<TerminalCreateParams>(params) {
                    Ok(p) => result_value(self.handler.create_terminal(p).await),
                    Err(e) => return self.reply_invalid_params(id, &e).await,
                }
            }
            METHOD_TERMINAL_OUTPUT => {
                match serde_json::from_value::<TerminalOutputParams>(params) {
                    Ok(p) => result_value(self.handler.terminal_output(p).await),
                    Err(e) => return self.reply_invalid_params(id, &e).await,
                }
            }
            METHOD_TERMINAL_WAIT => {
                match serde_json::from_value::<TerminalWaitParams>(params) {
                    Ok(p) => result_value(self.handler.wait_terminal(p).await),
                    Err(e) => return self.reply_invalid_params(id, &e).await,
                }
            }
            METHOD_TERMINAL_KILL => {
                match serde_json::from_value::<TerminalKillParams>(params) {
                    Ok(p) => void_value(self.handler.kill_terminal(p).await),
                    Err(e) => return self.reply_invalid_params(id, &e).await,
                }
            }
            METHOD_TERMINAL_RELEASE => {
                match serde_json::from_value::<TerminalReleaseParams>(params) {
                    Ok(p) => void_value(self.handler.release_terminal(p).await),
                    Err(e) => return self.reply_invalid_params(id, &e).await,
                }
            }
            unknown => {
                self.send_error(id, ERR_METHOD_NOT_FOUND, format!("unknown method: {unknown}"))
                    .await;
                return;
            }
        };

        match outcome {
            Ok(result) => self.send_result(id, result).await,
            Err(err) => self.send_error(id, ERR_INTERNAL, err.to_string()).await,
        }
    }

    async fn reply_invalid_params(&self, id: Option<Value>, err: &serde_json::Error) {
        self.send_error(id, ERR_INVALID_PARAMS, format!("invalid params: {err}"))
            .await;
    }

    async fn send_result(&self, id: Option<Value>, result: Value) {
        let message = JsonRpcMessage::response(id, result);
        if let Err(err) = self.transport.send(message).await {
            warn!(error = %err, "failed to send response");
        }
    }

    async fn send_error(&self, id: Option<Value>, code: i32, text: String) {
        let message = JsonRpcMessage::error_response(id, code, text);
        if let Err(err) = self.transport.send(message).await {
            warn!(error = %err, "failed to send error response");
        }
    }
}

/// Serialize a successful handler result.
fn result_value<T: Serialize>(res: Result<T>) -> Result<Value> {
    res.and_then(|v| serde_json::to_value(v).map_err(AppError::from))
}

/// Void handlers reply with an empty object.
fn void_value(res: Result<()>) -> Result<Value> {
    res.map(|()| Value::Object(serde_json::Map::new()))
}

// ── Transport handler ─────────────────────────────────────────────────────────

/// Adapter installed on the transport; routes each decoded message.
struct Dispatcher {
    inner: Arc<ClientInner>,
}

#[async_trait]
impl MessageHandler for Dispatcher {
    async fn handle_message(&self, message: JsonRpcMessage) {
        if message.is_response() {
            self.inner.handle_response(message).await;
        } else if message.is_notification() {
            // Inline on the reader task: session updates keep wire order.
            self.inner.handle_notification(message).await;
        } else if message.is_request() {
            // Capability requests may block (permission dialogs, terminal
            // waits); each runs on its own task so the reader keeps going.
            let inner = Arc::clone(&self.inner);
            tokio::spawn(inner.handle_request(message));
        } else {
            warn!("unrecognized message shape, dropping");
        }
    }
}
