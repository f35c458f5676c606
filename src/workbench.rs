//! Consumer facade.
//!
//! [`Workbench`] is the surface the surrounding shell talks to: it owns the
//! connection manager, capability providers, permission bridge, and session
//! store, and pushes every observable change to the shell as an
//! [`AppEvent`] over a single mpsc channel.
//!
//! Each connection gets a [`ConnectionDelegate`] wired in at client
//! construction. The delegate translates every `session/update` variant
//! into a store mutation **and** an event emission in one step, so the
//! shell always sees the same ordering the store records. Prompts run on
//! spawned tasks holding a cancellation token; `cancel_prompt` fires the
//! token (unblocking the local waiter) and sends the `session/cancel`
//! notification to the agent.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::acp::client::AgentHandler;
use crate::acp::types::{
    ContentBlock, EnvVariable, McpServer, ReadTextFileParams, ReadTextFileResult,
    RequestPermissionParams, RequestPermissionResult, SessionUpdate, SessionUpdateParams,
    TerminalCreateParams, TerminalCreateResult, TerminalKillParams, TerminalOutputParams,
    TerminalOutputResult, TerminalReleaseParams, TerminalWaitParams, TerminalWaitResult,
    ToolCallContent, ToolCallUpdate, WriteTextFileParams,
};
use crate::agent::{discovery, Manager};
use crate::config::{self, AppSettings, Config};
use crate::events::{
    AppEvent, CommandEvent, CommandsEvent, ErrorEvent, FileChangedEvent, MessageEvent,
    PlanEntryEvent, PlanEvent, PromptDoneEvent, StderrEvent, TerminalOutputEvent, ToolCallEvent,
};
use crate::providers::fs::{FileChange, FileChangeObserver, FsProvider};
use crate::providers::permission::{PermissionBridge, PermissionObserver, PermissionRequest};
use crate::providers::terminal::{TerminalObserver, TerminalProvider};
use crate::session::{Message, Role, SessionStore, ToolCallRecord};
use crate::{AppError, Result};

/// Deadline for a single prompt round-trip. Prompts stream updates for a
/// long time before the final response arrives.
const PROMPT_TIMEOUT: Duration = Duration::from_secs(3600);

// ── DTOs ──────────────────────────────────────────────────────────────────────
// JSON-serializable snapshots handed to the shell. Field names are part of
// the consumer contract.

/// An agent and whether its binary is installed locally.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentInfo {
    pub name: String,
    pub display_name: String,
    pub command: String,
    pub description: String,
    pub installed: bool,
}

/// Snapshot of a live agent connection.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub id: String,
    pub agent_name: String,
    pub display_name: String,
    pub sessions: Vec<String>,
}

/// A single message in a session's conversation.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageInfo {
    pub role: String,
    pub content: String,
    pub timestamp: String,
}

/// A single tool invocation record.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallInfo {
    pub id: String,
    pub title: String,
    pub kind: String,
    pub status: String,
    pub content: String,
    pub timestamp: String,
}

/// Full conversation history for one session.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionHistoryInfo {
    pub id: String,
    pub agent_name: String,
    pub connection_id: String,
    pub cwd: String,
    pub messages: Vec<MessageInfo>,
    pub tool_calls: Vec<ToolCallInfo>,
    pub created_at: String,
    pub updated_at: String,
}

/// Lightweight summary for the session list view.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionListItem {
    pub id: String,
    pub agent_name: String,
    pub connection_id: String,
    pub cwd: String,
    pub message_count: usize,
    pub created_at: String,
    pub updated_at: String,
}

/// A file or directory entry for the file explorer.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    pub path: String,
    pub is_dir: bool,
    pub size: u64,
}

// ── Workbench ─────────────────────────────────────────────────────────────────

struct WorkbenchInner {
    config: Mutex<Config>,
    config_path: PathBuf,
    manager: Manager,
    fs: Arc<FsProvider>,
    terminal: Arc<TerminalProvider>,
    permissions: Arc<PermissionBridge>,
    sessions: Arc<SessionStore>,
    /// Cancellation tokens for in-flight prompts, keyed by session id.
    active_prompts: Mutex<HashMap<String, CancellationToken>>,
    events: mpsc::UnboundedSender<AppEvent>,
}

impl WorkbenchInner {
    fn emit(&self, event: AppEvent) {
        // A gone receiver just means the shell detached; nothing to do.
        let _ = self.events.send(event);
    }
}

/// The runtime facade the shell drives.
pub struct Workbench {
    inner: Arc<WorkbenchInner>,
}

impl Workbench {
    /// Build a workbench with configuration from the default path
    /// (`<config dir>/bytesmith/config.json`), creating the default config
    /// on first run. Returns the workbench and the shell's event stream.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when the config exists but is invalid.
    pub fn new() -> Result<(Self, mpsc::UnboundedReceiver<AppEvent>)> {
        Self::with_config_path(config::config_path())
    }

    /// Build a workbench with configuration at an explicit path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when the config exists but is invalid.
    pub fn with_config_path(
        config_path: PathBuf,
    ) -> Result<(Self, mpsc::UnboundedReceiver<AppEvent>)> {
        let cfg = config::load_config(&config_path)?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let forwarder = Arc::new(EventForwarder {
            events: events_tx.clone(),
        });

        let fs_observer: Arc<dyn FileChangeObserver> = forwarder.clone();
        let terminal_observer: Arc<dyn TerminalObserver> = forwarder.clone();
        let permission_observer: Arc<dyn PermissionObserver> = forwarder;

        let inner = Arc::new(WorkbenchInner {
            config: Mutex::new(cfg),
            config_path,
            manager: Manager::new(),
            fs: Arc::new(FsProvider::new(fs_observer)),
            terminal: Arc::new(TerminalProvider::new(terminal_observer)),
            permissions: Arc::new(PermissionBridge::new(permission_observer)),
            sessions: Arc::new(SessionStore::new()),
            active_prompts: Mutex::new(HashMap::new()),
            events: events_tx,
        });

        Ok((Self { inner }, events_rx))
    }

    // ── Agent management ─────────────────────────────────────────────────────

    /// Configured agents merged with the well-known catalog, annotated with
    /// whether each binary is installed. Configured agents come first.
    pub async fn list_available_agents(&self) -> Vec<AgentInfo> {
        let cfg = self.inner.config.lock().await;
        let mut seen: Vec<&str> = Vec::new();
        let mut result = Vec::new();

        for agent in &cfg.agents {
            seen.push(agent.name.as_str());
            result.push(AgentInfo {
                name: agent.name.clone(),
                display_name: agent.display_name.clone(),
                command: agent.command.clone(),
                description: agent.description.clone(),
                installed: discovery::is_installed(&agent.command),
            });
        }

        for agent in discovery::well_known_agents() {
            if !seen.contains(&agent.name.as_str()) {
                result.push(AgentInfo {
                    installed: discovery::is_installed(&agent.command),
                    name: agent.name,
                    display_name: agent.display_name,
                    command: agent.command,
                    description: agent.description,
                });
            }
        }

        result
    }

    /// Only agents whose binary is present in `PATH`.
    #[must_use]
    pub fn list_installed_agents(&self) -> Vec<AgentInfo> {
        discovery::detect_installed()
            .into_iter()
            .map(|agent| AgentInfo {
                name: agent.name,
                display_name: agent.display_name,
                command: agent.command,
                description: agent.description,
                installed: true,
            })
            .collect()
    }

    /// Start an agent subprocess, perform the ACP handshake, wire up the
    /// connection's delegate and stderr forwarding, and return the
    /// connection id.
    ///
    /// # Errors
    ///
    /// `AppError::NotFound` for an unconfigured agent name; `AppError::Acp`
    /// when spawn or handshake fails.
    pub async fn connect_agent(&self, agent_name: &str, cwd: &str) -> Result<String> {
        let agent = self
            .inner
            .config
            .lock()
            .await
            .find_agent(agent_name)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("unknown agent '{agent_name}'")))?;

        let connection_id = Manager::next_connection_id();

        let delegate = Arc::new(ConnectionDelegate {
            connection_id: connection_id.clone(),
            agent_name: agent.name.clone(),
            fs: Arc::clone(&self.inner.fs),
            terminal: Arc::clone(&self.inner.terminal),
            permissions: Arc::clone(&self.inner.permissions),
            sessions: Arc::clone(&self.inner.sessions),
            events: self.inner.events.clone(),
        });

        let client = self
            .inner
            .manager
            .connect(&connection_id, agent, cwd, delegate)
            .await?;

        // Forward agent stderr lines to the shell.
        if let Some(mut stderr) = client.take_stderr() {
            let events = self.inner.events.clone();
            let conn = connection_id.clone();
            tokio::spawn(async move {
                while let Some(line) = stderr.recv().await {
                    let _ = events.send(AppEvent::Stderr(StderrEvent {
                        connection_id: conn.clone(),
                        line,
                    }));
                }
            });
        }

        Ok(connection_id)
    }

    /// Gracefully shut down a connection.
    ///
    /// # Errors
    ///
    /// `AppError::NotFound` for an unknown id; propagates close failures.
    pub async fn disconnect_agent(&self, connection_id: &str) -> Result<()> {
        self.inner.manager.disconnect(connection_id).await
    }

    /// Snapshot of all active connections.
    pub async fn list_connections(&self) -> Vec<ConnectionInfo> {
        self.inner
            .manager
            .list()
            .await
            .into_iter()
            .map(|(id, agent, sessions)| ConnectionInfo {
                id,
                agent_name: agent.name,
                display_name: agent.display_name,
                sessions,
            })
            .collect()
    }

    // ── Session management ───────────────────────────────────────────────────

    /// Create a new session on an existing connection.
    ///
    /// # Errors
    ///
    /// `AppError::NotFound` for an unknown connection; agent errors as
    /// `AppError::Rpc`.
    pub async fn new_session(&self, connection_id: &str, cwd: &str) -> Result<String> {
        let client = self
            .inner
            .manager
            .client(connection_id)
            .await
            .ok_or_else(|| {
                AppError::NotFound(format!("connection '{connection_id}' not found"))
            })?;

        let mcp_servers = self.mcp_servers().await;
        let session_id = client.new_session(cwd, mcp_servers).await?;

        let agent_name = self
            .inner
            .manager
            .agent_of(connection_id)
            .await
            .map(|a| a.name)
            .unwrap_or_default();

        self.inner
            .sessions
            .create(&session_id, &agent_name, connection_id, cwd)
            .await;
        self.inner
            .manager
            .add_session(connection_id, &session_id)
            .await;

        Ok(session_id)
    }

    /// Ask the agent to reload an existing session and track it locally.
    ///
    /// # Errors
    ///
    /// See [`Workbench::new_session`].
    pub async fn load_session(
        &self,
        connection_id: &str,
        session_id: &str,
        cwd: &str,
    ) -> Result<()> {
        let client = self
            .inner
            .manager
            .client(connection_id)
            .await
            .ok_or_else(|| {
                AppError::NotFound(format!("connection '{connection_id}' not found"))
            })?;

        let mcp_servers = self.mcp_servers().await;
        client.load_session(session_id, cwd, mcp_servers).await?;

        if self.inner.sessions.get(session_id).await.is_none() {
            let agent_name = self
                .inner
                .manager
                .agent_of(connection_id)
                .await
                .map(|a| a.name)
                .unwrap_or_default();
            self.inner
                .sessions
                .create(session_id, &agent_name, connection_id, cwd)
                .await;
        }
        self.inner
            .manager
            .add_session(connection_id, session_id)
            .await;

        Ok(())
    }

    /// Send a user prompt asynchronously. The call returns once the prompt
    /// task is dispatched; streamed updates arrive as events, and the final
    /// stop reason arrives as `agent:prompt-done` (or `agent:error` on a
    /// prompt-scoped failure).
    ///
    /// # Errors
    ///
    /// `AppError::NotFound` for an unknown connection.
    pub async fn send_prompt(
        &self,
        connection_id: &str,
        session_id: &str,
        text: &str,
    ) -> Result<()> {
        let client = self
            .inner
            .manager
            .client(connection_id)
            .await
            .ok_or_else(|| {
                AppError::NotFound(format!("connection '{connection_id}' not found"))
            })?;

        self.inner
            .sessions
            .add_message(session_id, Message::new(Role::User, text))
            .await;

        let token = CancellationToken::new();
        self.inner
            .active_prompts
            .lock()
            .await
            .insert(session_id.to_owned(), token.clone());

        let inner = Arc::clone(&self.inner);
        let connection_id = connection_id.to_owned();
        let session_id = session_id.to_owned();
        let prompt = vec![ContentBlock::text(text)];

        tokio::spawn(async move {
            let result = client
                .prompt(&session_id, prompt, PROMPT_TIMEOUT, &token)
                .await;

            inner.active_prompts.lock().await.remove(&session_id);

            match result {
                Ok(res) => {
                    inner.emit(AppEvent::PromptDone(PromptDoneEvent {
                        connection_id,
                        session_id,
                        stop_reason: res.stop_reason,
                    }));
                }
                Err(err) => {
                    inner.emit(AppEvent::Error(ErrorEvent {
                        connection_id,
                        session_id,
                        error: err.to_string(),
                    }));
                }
            }
        });

        Ok(())
    }

    /// Cancel an in-flight prompt: fire the local cancellation token so the
    /// waiter unblocks, and send the `session/cancel` notification so the
    /// agent stops. The agent's eventual response for the cancelled id is
    /// dropped as an orphan.
    ///
    /// # Errors
    ///
    /// `AppError::NotFound` for an unknown connection.
    pub async fn cancel_prompt(&self, connection_id: &str, session_id: &str) -> Result<()> {
        if let Some(token) = self.inner.active_prompts.lock().await.get(session_id) {
            token.cancel();
        }

        let client = self
            .inner
            .manager
            .client(connection_id)
            .await
            .ok_or_else(|| {
                AppError::NotFound(format!("connection '{connection_id}' not found"))
            })?;
        client.cancel(session_id).await
    }

    /// Full conversation history for a session.
    pub async fn get_session_history(&self, session_id: &str) -> Option<SessionHistoryInfo> {
        let record = self.inner.sessions.get(session_id).await?;

        let messages = record
            .messages
            .iter()
            .map(|m| MessageInfo {
                role: m.role.as_str().to_owned(),
                content: m.content.clone(),
                timestamp: m.timestamp.to_rfc3339(),
            })
            .collect();

        let tool_calls = record
            .tool_calls
            .iter()
            .map(|tc| ToolCallInfo {
                id: tc.id.clone(),
                title: tc.title.clone(),
                kind: tc.kind.clone(),
                status: tc.status.clone(),
                content: tc.content.clone(),
                timestamp: tc.timestamp.to_rfc3339(),
            })
            .collect();

        Some(SessionHistoryInfo {
            id: record.id,
            agent_name: record.agent_name,
            connection_id: record.connection_id,
            cwd: record.cwd,
            messages,
            tool_calls,
            created_at: record.created_at.to_rfc3339(),
            updated_at: record.updated_at.to_rfc3339(),
        })
    }

    /// Lightweight summaries for all sessions, oldest first.
    pub async fn list_sessions(&self) -> Vec<SessionListItem> {
        self.inner
            .sessions
            .list()
            .await
            .into_iter()
            .map(|r| SessionListItem {
                id: r.id,
                agent_name: r.agent_name,
                connection_id: r.connection_id,
                cwd: r.cwd,
                message_count: r.messages.len(),
                created_at: r.created_at.to_rfc3339(),
                updated_at: r.updated_at.to_rfc3339(),
            })
            .collect()
    }

    /// Drop a session's local record.
    pub async fn delete_session(&self, session_id: &str) {
        self.inner.sessions.delete(session_id).await;
    }

    // ── Permission ───────────────────────────────────────────────────────────

    /// Deliver the user's decision for a pending permission dialog.
    /// Responses for connections with no pending dialog are ignored.
    pub async fn respond_permission(&self, connection_id: &str, option_id: &str) {
        self.inner.permissions.respond(connection_id, option_id).await;
    }

    // ── Settings ─────────────────────────────────────────────────────────────

    /// Current application settings.
    pub async fn get_settings(&self) -> AppSettings {
        self.inner.config.lock().await.settings.clone()
    }

    /// Persist new application settings to the config file.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when the write fails.
    pub async fn save_settings(&self, settings: AppSettings) -> Result<()> {
        let mut cfg = self.inner.config.lock().await;
        cfg.settings = settings;
        config::save_config(&self.inner.config_path, &cfg)
    }

    // ── Files ────────────────────────────────────────────────────────────────

    /// Directory entries for the file explorer, directories first, then by
    /// name.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` when the directory cannot be read.
    pub async fn list_files(&self, dir: &str) -> Result<Vec<FileEntry>> {
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| AppError::Io(format!("failed to read directory {dir}: {e}")))?;

        let mut result = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AppError::Io(format!("failed to read directory {dir}: {e}")))?
        {
            let meta = entry.metadata().await.ok();
            result.push(FileEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry.path().to_string_lossy().into_owned(),
                is_dir: meta.as_ref().is_some_and(std::fs::Metadata::is_dir),
                size: meta.map_or(0, |m| m.len()),
            });
        }

        result.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
        Ok(result)
    }

    /// Snapshot of every file change agents have written this run.
    pub async fn file_changes(&self) -> Vec<FileChange> {
        self.inner.fs.changes().await
    }

    // ── Shutdown ─────────────────────────────────────────────────────────────

    /// Tear down all terminals and agent connections.
    pub async fn shutdown(&self) {
        self.inner.terminal.close_all().await;
        self.inner.manager.disconnect_all().await;
        info!("workbench shut down");
    }

    async fn mcp_servers(&self) -> Vec<McpServer> {
        self.inner
            .config
            .lock()
            .await
            .mcp_servers
            .iter()
            .map(|s| McpServer {
                name: s.name.clone(),
                command: s.command.clone(),
                args: s.args.clone(),
                env: s
                    .env
                    .iter()
                    .map(|(name, value)| EnvVariable {
                        name: name.clone(),
                        value: value.clone(),
                    })
                    .collect(),
                ..McpServer::default()
            })
            .collect()
    }
}

// ── Provider observer ─────────────────────────────────────────────────────────

/// Translates provider callbacks into shell events.
struct EventForwarder {
    events: mpsc::UnboundedSender<AppEvent>,
}

impl FileChangeObserver for EventForwarder {
    fn file_changed(&self, change: &FileChange) {
        let _ = self.events.send(AppEvent::FileChanged(FileChangedEvent {
            path: change.path.clone(),
            session_id: change.session_id.clone(),
            agent_name: change.agent_name.clone(),
        }));
    }
}

impl TerminalObserver for EventForwarder {
    fn output(&self, terminal_id: &str, chunk: &str) {
        let _ = self.events.send(AppEvent::TerminalOutput(TerminalOutputEvent {
            terminal_id: terminal_id.to_owned(),
            data: chunk.to_owned(),
        }));
    }
}

impl PermissionObserver for EventForwarder {
    fn permission_requested(&self, request: &PermissionRequest) {
        let _ = self.events.send(AppEvent::Permission(request.clone()));
    }
}

// ── Connection delegate ───────────────────────────────────────────────────────

/// Per-connection capability delegate: routes session updates into the
/// store and event stream, and inbound capability requests to the
/// providers.
struct ConnectionDelegate {
    connection_id: String,
    agent_name: String,
    fs: Arc<FsProvider>,
    terminal: Arc<TerminalProvider>,
    permissions: Arc<PermissionBridge>,
    sessions: Arc<SessionStore>,
    events: mpsc::UnboundedSender<AppEvent>,
}

impl ConnectionDelegate {
    fn emit(&self, event: AppEvent) {
        let _ = self.events.send(event);
    }

    async fn on_message_chunk(&self, session_id: &str, role: Role, content: &ContentBlock) {
        self.sessions
            .add_message(session_id, Message::new(role, content.text.clone()))
            .await;
        self.emit(AppEvent::Message(MessageEvent {
            connection_id: self.connection_id.clone(),
            session_id: session_id.to_owned(),
            text: content.text.clone(),
            kind: content.kind.clone(),
        }));
    }

    async fn on_tool_call(&self, session_id: &str, tc: &ToolCallUpdate, is_update: bool) {
        if is_update {
            let content = if tc.content.is_empty() {
                None
            } else {
                Some(render_tool_content(&tc.content))
            };
            self.sessions
                .update_tool_call(session_id, &tc.tool_call_id, &tc.status, content)
                .await;
        } else {
            let mut record =
                ToolCallRecord::new(&tc.tool_call_id, &tc.title, &tc.kind, &tc.status);
            record.content = render_tool_content(&tc.content);
            self.sessions.add_tool_call(session_id, record).await;
        }

        self.emit(AppEvent::ToolCall(ToolCallEvent {
            connection_id: self.connection_id.clone(),
            session_id: session_id.to_owned(),
            tool_call_id: tc.tool_call_id.clone(),
            title: tc.title.clone(),
            kind: tc.kind.clone(),
            status: tc.status.clone(),
            is_update,
        }));
    }
}

#[async_trait]
impl AgentHandler for ConnectionDelegate {
    async fn session_update(&self, params: SessionUpdateParams) {
        let session_id = params.session_id;

        match params.update {
            SessionUpdate::AgentMessageChunk { content } => {
                self.on_message_chunk(&session_id, Role::Agent, &content).await;
            }
            SessionUpdate::UserMessageChunk { content } => {
                self.on_message_chunk(&session_id, Role::User, &content).await;
            }
            SessionUpdate::ToolCall(tc) => {
                self.on_tool_call(&session_id, &tc, false).await;
            }
            SessionUpdate::ToolCallUpdate(tc) => {
                self.on_tool_call(&session_id, &tc, true).await;
            }
            SessionUpdate::Plan { entries } => {
                self.emit(AppEvent::Plan(PlanEvent {
                    connection_id: self.connection_id.clone(),
                    session_id,
                    entries: entries
                        .into_iter()
                        .map(|e| PlanEntryEvent {
                            content: e.content,
                            priority: e.priority,
                            status: e.status,
                        })
                        .collect(),
                }));
            }
            SessionUpdate::AvailableCommandsUpdate { commands } => {
                self.emit(AppEvent::Commands(CommandsEvent {
                    connection_id: self.connection_id.clone(),
                    session_id,
                    commands: commands
                        .into_iter()
                        .map(|c| CommandEvent {
                            name: c.name,
                            description: c.description,
                            input_hint: c.input.map(|i| i.hint),
                        })
                        .collect(),
                }));
            }
            SessionUpdate::Other { kind, .. } => {
                debug!(%session_id, %kind, "unknown session update variant, ignoring");
            }
        }
    }

    async fn request_permission(
        &self,
        params: RequestPermissionParams,
    ) -> RequestPermissionResult {
        self.permissions.request(&self.connection_id, params).await
    }

    async fn read_text_file(&self, params: ReadTextFileParams) -> Result<ReadTextFileResult> {
        self.fs.read_text_file(params).await
    }

    async fn write_text_file(&self, params: WriteTextFileParams) -> Result<()> {
        self.fs.write_text_file(params, &self.agent_name).await
    }

    async fn create_terminal(
        &self,
        params: TerminalCreateParams,
    ) -> Result<TerminalCreateResult> {
        self.terminal.create(params).await
    }

    async fn terminal_output(
        &self,
        params: TerminalOutputParams,
    ) -> Result<TerminalOutputResult> {
        self.terminal.output(&params.terminal_id).await
    }

    async fn wait_terminal(&self, params: TerminalWaitParams) -> Result<TerminalWaitResult> {
        self.terminal.wait(&params.terminal_id).await
    }

    async fn kill_terminal(&self, params: TerminalKillParams) -> Result<()> {
        self.terminal.kill(&params.terminal_id).await
    }

    async fn release_terminal(&self, params: TerminalReleaseParams) -> Result<()> {
        if let Err(err) = self.terminal.release(&params.terminal_id).await {
            warn!(terminal_id = %params.terminal_id, %err, "terminal release");
            return Err(err);
        }
        Ok(())
    }
}

/// Render a tool call's content items to a compact text summary: text
/// blocks verbatim, diffs as their target path, terminal references by id.
fn render_tool_content(items: &[ToolCallContent]) -> String {
    let mut parts = Vec::new();
    for item in items {
        match item.kind.as_str() {
            "content" => {
                if let Some(block) = &item.content {
                    if !block.text.is_empty() {
                        parts.push(block.text.clone());
                    }
                }
            }
            "diff" => {
                if !item.path.is_empty() {
                    parts.push(format!("diff: {}", item.path));
                }
            }
            "terminal" => {
                if !item.terminal_id.is_empty() {
                    parts.push(format!("terminal: {}", item.terminal_id));
                }
            }
            _ => {}
        }
    }
    parts.join("\n")
}
