//! Events pushed to the consuming shell.
//!
//! Each [`AppEvent`] variant maps to one string topic; payloads are
//! JSON-serializable records whose field names are part of the consumer
//! contract and must stay stable across versions. The workbench delivers
//! events over an unbounded mpsc channel to a single shell observer.

use serde::Serialize;
use serde_json::Value;

use crate::providers::permission::PermissionRequest;

/// Payload for `agent:message`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageEvent {
    pub connection_id: String,
    pub session_id: String,
    pub text: String,
    /// Content block type (`text`, `image`, …).
    #[serde(rename = "type")]
    pub kind: String,
}

/// Payload for `agent:toolcall`. `is_update` distinguishes a status change
/// on an existing tool call from a newly created one.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallEvent {
    pub connection_id: String,
    pub session_id: String,
    pub tool_call_id: String,
    pub title: String,
    pub kind: String,
    pub status: String,
    pub is_update: bool,
}

/// One entry of an `agent:plan` payload.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanEntryEvent {
    pub content: String,
    pub priority: String,
    pub status: String,
}

/// Payload for `agent:plan`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanEvent {
    pub connection_id: String,
    pub session_id: String,
    pub entries: Vec<PlanEntryEvent>,
}

/// One entry of an `agent:commands` payload.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommandEvent {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_hint: Option<String>,
}

/// Payload for `agent:commands`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommandsEvent {
    pub connection_id: String,
    pub session_id: String,
    pub commands: Vec<CommandEvent>,
}

/// Payload for `agent:prompt-done`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PromptDoneEvent {
    pub connection_id: String,
    pub session_id: String,
    pub stop_reason: String,
}

/// Payload for `agent:error`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEvent {
    pub connection_id: String,
    pub session_id: String,
    pub error: String,
}

/// Payload for `agent:stderr` — one raw line from the agent process.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StderrEvent {
    pub connection_id: String,
    pub line: String,
}

/// Payload for `file:changed`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileChangedEvent {
    pub path: String,
    pub session_id: String,
    pub agent_name: String,
}

/// Payload for `terminal:output`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TerminalOutputEvent {
    pub terminal_id: String,
    pub data: String,
}

/// An event destined for the shell, one variant per topic.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum AppEvent {
    Message(MessageEvent),
    ToolCall(ToolCallEvent),
    Plan(PlanEvent),
    Commands(CommandsEvent),
    Permission(PermissionRequest),
    PromptDone(PromptDoneEvent),
    Error(ErrorEvent),
    Stderr(StderrEvent),
    FileChanged(FileChangedEvent),
    TerminalOutput(TerminalOutputEvent),
}

impl AppEvent {
    /// The string topic the shell subscribes to.
    #[must_use]
    pub fn topic(&self) -> &'static str {
        match self {
            Self::Message(_) => "agent:message",
            Self::ToolCall(_) => "agent:toolcall",
            Self::Plan(_) => "agent:plan",
            Self::Commands(_) => "agent:commands",
            Self::Permission(_) => "agent:permission",
            Self::PromptDone(_) => "agent:prompt-done",
            Self::Error(_) => "agent:error",
            Self::Stderr(_) => "agent:stderr",
            Self::FileChanged(_) => "file:changed",
            Self::TerminalOutput(_) => "terminal:output",
        }
    }

    /// The payload as a JSON value. Serialization of these records cannot
    /// fail; a null payload would indicate a programming error upstream.
    #[must_use]
    pub fn payload(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
