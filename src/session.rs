//! In-memory session store.
//!
//! A session is a bounded conversation with an agent, identified by the
//! agent-minted id and scoped to a working directory. Records hold the
//! ordered message history and tool-call timeline; mutations never reorder
//! entries relative to the updates that produced them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Who authored a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Agent,
    System,
}

impl Role {
    /// Lower-case wire/display name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Agent => "agent",
            Self::System => "system",
        }
    }
}

/// A single message in a session's conversation history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Construct a message stamped with the current time.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A tool invocation made during a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCallRecord {
    pub id: String,
    pub title: String,
    pub kind: String,
    pub status: String,
    /// Rendered summary of the tool call's content, when one was carried.
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ToolCallRecord {
    /// Construct a record stamped with the current time.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        kind: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind: kind.into(),
            status: status.into(),
            content: String::new(),
            timestamp: Utc::now(),
        }
    }
}

/// Full state of one agent session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    pub id: String,
    pub agent_name: String,
    pub connection_id: String,
    pub cwd: String,
    pub messages: Vec<Message>,
    pub tool_calls: Vec<ToolCallRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Thread-safe in-memory session store. Sessions live for the process
/// lifetime only; persistence across restarts is out of scope.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionRecord>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize and store a new record. An existing session with the same
    /// id is silently overwritten.
    pub async fn create(
        &self,
        id: &str,
        agent_name: &str,
        connection_id: &str,
        cwd: &str,
    ) -> SessionRecord {
        let now = Utc::now();
        let record = SessionRecord {
            id: id.to_owned(),
            agent_name: agent_name.to_owned(),
            connection_id: connection_id.to_owned(),
            cwd: cwd.to_owned(),
            messages: Vec::new(),
            tool_calls: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.sessions
            .lock()
            .await
            .insert(id.to_owned(), record.clone());
        record
    }

    /// Snapshot of one session, or `None`.
    pub async fn get(&self, id: &str) -> Option<SessionRecord> {
        self.sessions.lock().await.get(id).cloned()
    }

    /// Append a message to the session's history. No-op for an unknown
    /// session.
    pub async fn add_message(&self, session_id: &str, message: Message) {
        let mut sessions = self.sessions.lock().await;
        if let Some(record) = sessions.get_mut(session_id) {
            record.messages.push(message);
            record.updated_at = Utc::now();
        }
    }

    /// Append a tool-call record. No-op for an unknown session.
    pub async fn add_tool_call(&self, session_id: &str, tool_call: ToolCallRecord) {
        let mut sessions = self.sessions.lock().await;
        if let Some(record) = sessions.get_mut(session_id) {
            record.tool_calls.push(tool_call);
            record.updated_at = Utc::now();
        }
    }

    /// Update an existing tool call by id, stamping its status and, when
    /// provided, its content. No-op for an unknown session or tool call.
    pub async fn update_tool_call(
        &self,
        session_id: &str,
        tool_call_id: &str,
        status: &str,
        content: Option<String>,
    ) {
        let mut sessions = self.sessions.lock().await;
        let Some(record) = sessions.get_mut(session_id) else {
            return;
        };
        if let Some(tc) = record.tool_calls.iter_mut().find(|tc| tc.id == tool_call_id) {
            tc.status = status.to_owned();
            if let Some(content) = content {
                tc.content = content;
            }
            record.updated_at = Utc::now();
        }
    }

    /// Snapshot of all sessions, oldest first by creation time.
    pub async fn list(&self) -> Vec<SessionRecord> {
        let mut records: Vec<SessionRecord> =
            self.sessions.lock().await.values().cloned().collect();
        records.sort_by_key(|r| r.created_at);
        records
    }

    /// Remove a session. No-op for an unknown id.
    pub async fn delete(&self, id: &str) {
        self.sessions.lock().await.remove(id);
    }
}
