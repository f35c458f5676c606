//! ACP wire types: the JSON-RPC 2.0 envelope and every protocol
//! parameter/result shape.
//!
//! ACP speaks JSON-RPC 2.0 over newline-delimited stdio. Both peers may
//! initiate requests; classification of an incoming message is structural
//! (see [`JsonRpcMessage`]).
//!
//! The `session/update` notification overloads its `content` key: message
//! chunks carry a single [`ContentBlock`] object while tool calls carry an
//! array of [`ToolCallContent`] items. [`SessionUpdate`] resolves this with
//! a tagged in-memory union and a custom (de)serializer over a raw wire
//! mirror, so round-tripping preserves every field.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

// ── JSON-RPC 2.0 envelope ─────────────────────────────────────────────────────

/// Protocol version literal carried by every message.
pub const JSONRPC_VERSION: &str = "2.0";

/// A JSON-RPC 2.0 message: request, response, or notification depending on
/// which fields are populated.
///
/// - request: `method` present and `id` present,
/// - notification: `method` present and `id` absent,
/// - response: `method` absent and `id` present, plus one of `result`/`error`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct JsonRpcMessage {
    /// Always the literal `"2.0"`.
    pub jsonrpc: String,
    /// Correlation id. Present on requests and responses, absent on
    /// notifications. Kept as a raw value so non-numeric ids from the agent
    /// can be echoed back verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcMessage {
    /// Build an outgoing request with a numeric id.
    #[must_use]
    pub fn request(id: i64, method: &str, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id: Some(Value::from(id)),
            method: Some(method.to_owned()),
            params: Some(params),
            ..Self::default()
        }
    }

    /// Build an outgoing notification (no id, no response expected).
    #[must_use]
    pub fn notification(method: &str, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            method: Some(method.to_owned()),
            params: Some(params),
            ..Self::default()
        }
    }

    /// Build a successful response echoing the request's raw id.
    #[must_use]
    pub fn response(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id,
            result: Some(result),
            ..Self::default()
        }
    }

    /// Build an error response echoing the request's raw id.
    #[must_use]
    pub fn error_response(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
            ..Self::default()
        }
    }

    /// True if the message is a request (method and id both present).
    #[must_use]
    pub fn is_request(&self) -> bool {
        self.method.is_some() && self.id.is_some()
    }

    /// True if the message is a notification (method present, id absent).
    #[must_use]
    pub fn is_notification(&self) -> bool {
        self.method.is_some() && self.id.is_none()
    }

    /// True if the message is a response (id present, method absent).
    #[must_use]
    pub fn is_response(&self) -> bool {
        self.method.is_none() && self.id.is_some()
    }

    /// Parse the id as an `i64`. Returns 0 when the id is absent or not a
    /// number — 0 is reserved as the "unparseable" sentinel and is never
    /// assigned to an outgoing request.
    #[must_use]
    pub fn id_as_i64(&self) -> i64 {
        self.id
            .as_ref()
            .and_then(Value::as_i64)
            .unwrap_or(0)
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "jsonrpc error {}: {}", self.code, self.message)
    }
}

/// Standard JSON-RPC 2.0 error codes.
pub const ERR_PARSE: i32 = -32700;
pub const ERR_INVALID_REQUEST: i32 = -32600;
pub const ERR_METHOD_NOT_FOUND: i32 = -32601;
pub const ERR_INVALID_PARAMS: i32 = -32602;
pub const ERR_INTERNAL: i32 = -32603;

// ── Method names ──────────────────────────────────────────────────────────────

pub const METHOD_INITIALIZE: &str = "initialize";
pub const METHOD_SESSION_NEW: &str = "session/new";
pub const METHOD_SESSION_LOAD: &str = "session/load";
pub const METHOD_SESSION_PROMPT: &str = "session/prompt";
pub const METHOD_SESSION_CANCEL: &str = "session/cancel";
pub const METHOD_SESSION_SET_MODE: &str = "session/setMode";
pub const METHOD_SESSION_UPDATE: &str = "session/update";
pub const METHOD_REQUEST_PERMISSION: &str = "requestPermission";
pub const METHOD_FS_READ_TEXT_FILE: &str = "fs/readTextFile";
pub const METHOD_FS_WRITE_TEXT_FILE: &str = "fs/writeTextFile";
pub const METHOD_TERMINAL_CREATE: &str = "terminal/create";
pub const METHOD_TERMINAL_OUTPUT: &str = "terminal/output";
pub const METHOD_TERMINAL_WAIT: &str = "terminal/wait";
pub const METHOD_TERMINAL_KILL: &str = "terminal/kill";
pub const METHOD_TERMINAL_RELEASE: &str = "terminal/release";

// ── Initialize ────────────────────────────────────────────────────────────────

/// First message sent by the client: advertises capabilities and identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: u32,
    pub client_capabilities: ClientCapabilities,
    pub client_info: ImplementationInfo,
}

/// The agent's response to `initialize`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct InitializeResult {
    pub protocol_version: u32,
    pub agent_capabilities: AgentCapabilities,
    pub agent_info: ImplementationInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub auth_methods: Vec<AuthMethod>,
}

/// What the client can do on behalf of the agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fs: Option<FsCapabilities>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub terminal: bool,
}

/// Which file-system operations the client supports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct FsCapabilities {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub read_text_file: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub write_text_file: bool,
}

/// What the agent supports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentCapabilities {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub load_session: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_capabilities: Option<PromptCapabilities>,
}

/// Content types the agent accepts in prompts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PromptCapabilities {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub image: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub audio: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub embedded_context: bool,
}

/// Identifies an ACP implementation (client or agent).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ImplementationInfo {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    pub version: String,
}

/// An authentication method the agent declares.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AuthMethod {
    #[serde(rename = "type")]
    pub kind: String,
}

// ── Session management ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionNewParams {
    pub cwd: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mcp_servers: Vec<McpServer>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionNewResult {
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionLoadParams {
    pub session_id: String,
    pub cwd: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mcp_servers: Vec<McpServer>,
}

/// An MCP server to attach to a session. Stdio servers use `command`/`args`;
/// HTTP servers use `type`/`url`/`headers`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct McpServer {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub command: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVariable>,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<HttpHeader>,
}

/// A name/value environment variable pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct EnvVariable {
    pub name: String,
    pub value: String,
}

/// A name/value HTTP header pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct HttpHeader {
    pub name: String,
    pub value: String,
}

// ── Prompt ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionPromptParams {
    pub session_id: String,
    pub prompt: Vec<ContentBlock>,
}

/// Returned when the agent finishes a prompt. `stop_reason` is one of
/// `end_turn`, `max_tokens`, `max_turn_requests`, `refusal`, `cancelled`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionPromptResult {
    pub stop_reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionCancelParams {
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSetModeParams {
    pub session_id: String,
    pub mode: String,
}

// ── Content blocks ────────────────────────────────────────────────────────────

/// A piece of content in a prompt or agent response. `kind` (wire key
/// `type`) is one of `text`, `image`, `audio`, `resource`, `resource_link`
/// and determines which other fields are relevant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Resource>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub data: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub mime_type: String,
}

impl ContentBlock {
    /// Build a plain text block.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_owned(),
            text: text.into(),
            ..Self::default()
        }
    }
}

/// An embedded or linked resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Resource {
    pub uri: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub mime_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
}

// ── Session updates ───────────────────────────────────────────────────────────

/// Wraps a `session/update` notification from the agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionUpdateParams {
    pub session_id: String,
    pub update: SessionUpdate,
}

/// A single update streamed by the agent during a session, keyed on the
/// wire by the `sessionUpdate` discriminator.
///
/// The wire overloads `content`: message chunks carry one [`ContentBlock`]
/// object, tool calls carry a `Vec<ToolCallContent>`. The custom codec
/// below dispatches on the discriminator; unknown discriminators are kept
/// as [`SessionUpdate::Other`] (array shape tried first, then the single
/// object) so an unrecognized update never fails the frame.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    /// A chunk of the agent's streamed reply.
    AgentMessageChunk { content: ContentBlock },
    /// A chunk of replayed user input (e.g. during `session/load`).
    UserMessageChunk { content: ContentBlock },
    /// A new tool invocation.
    ToolCall(ToolCallUpdate),
    /// A status or content change on an existing tool invocation.
    ToolCallUpdate(ToolCallUpdate),
    /// The agent's current plan.
    Plan { entries: Vec<PlanEntry> },
    /// The catalog of commands available in the session.
    AvailableCommandsUpdate { commands: Vec<AvailableCommand> },
    /// An update kind this client does not know about.
    Other {
        kind: String,
        message_content: Option<ContentBlock>,
        tool_content: Vec<ToolCallContent>,
    },
}

impl SessionUpdate {
    /// The wire discriminator for this update.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::AgentMessageChunk { .. } => "agent_message_chunk",
            Self::UserMessageChunk { .. } => "user_message_chunk",
            Self::ToolCall(_) => "tool_call",
            Self::ToolCallUpdate(_) => "tool_call_update",
            Self::Plan { .. } => "plan",
            Self::AvailableCommandsUpdate { .. } => "available_commands_update",
            Self::Other { kind, .. } => kind,
        }
    }
}

/// Raw wire shape for `SessionUpdate`, mirroring the overloaded `content`
/// key as an opaque value.
#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct SessionUpdateWire {
    session_update: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<Value>,
    #[serde(skip_serializing_if = "String::is_empty")]
    tool_call_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    status: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    locations: Vec<ToolCallLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_input: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_output: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    entries: Vec<PlanEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    available_commands: Vec<AvailableCommand>,
}

impl<'de> Deserialize<'de> for SessionUpdate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = SessionUpdateWire::deserialize(deserializer)?;

        let update = match wire.session_update.as_str() {
            "agent_message_chunk" | "user_message_chunk" => {
                let raw = wire
                    .content
                    .ok_or_else(|| D::Error::custom("message chunk without content"))?;
                let content: ContentBlock =
                    serde_json::from_value(raw).map_err(D::Error::custom)?;
                if wire.session_update == "agent_message_chunk" {
                    Self::AgentMessageChunk { content }
                } else {
                    Self::UserMessageChunk { content }
                }
            }
            "tool_call" | "tool_call_update" => {
                let content: Vec<ToolCallContent> = match wire.content {
                    Some(raw) => serde_json::from_value(raw).map_err(D::Error::custom)?,
                    None => Vec::new(),
                };
                let tool_call = ToolCallUpdate {
                    tool_call_id: wire.tool_call_id,
                    title: wire.title,
                    kind: wire.kind,
                    status: wire.status,
                    content,
                    locations: wire.locations,
                    raw_input: wire.raw_input,
                    raw_output: wire.raw_output,
                };
                if wire.session_update == "tool_call" {
                    Self::ToolCall(tool_call)
                } else {
                    Self::ToolCallUpdate(tool_call)
                }
            }
            "plan" => Self::Plan {
                entries: wire.entries,
            },
            "available_commands_update" => Self::AvailableCommandsUpdate {
                commands: wire.available_commands,
            },
            other => {
                // Unknown discriminator: best-effort content decode, array
                // shape first, then a single object. Never fails the frame.
                let mut message_content = None;
                let mut tool_content = Vec::new();
                if let Some(raw) = wire.content {
                    if let Ok(items) =
                        serde_json::from_value::<Vec<ToolCallContent>>(raw.clone())
                    {
                        tool_content = items;
                    } else if let Ok(block) = serde_json::from_value::<ContentBlock>(raw) {
                        message_content = Some(block);
                    }
                }
                Self::Other {
                    kind: other.to_owned(),
                    message_content,
                    tool_content,
                }
            }
        };

        Ok(update)
    }
}

impl Serialize for SessionUpdate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut wire = SessionUpdateWire {
            session_update: self.kind().to_owned(),
            ..SessionUpdateWire::default()
        };

        match self {
            Self::AgentMessageChunk { content } | Self::UserMessageChunk { content } => {
                wire.content =
                    Some(serde_json::to_value(content).map_err(serde::ser::Error::custom)?);
            }
            Self::ToolCall(tc) | Self::ToolCallUpdate(tc) => {
                if !tc.content.is_empty() {
                    wire.content = Some(
                        serde_json::to_value(&tc.content).map_err(serde::ser::Error::custom)?,
                    );
                }
                wire.tool_call_id.clone_from(&tc.tool_call_id);
                wire.title.clone_from(&tc.title);
                wire.kind.clone_from(&tc.kind);
                wire.status.clone_from(&tc.status);
                wire.locations.clone_from(&tc.locations);
                wire.raw_input.clone_from(&tc.raw_input);
                wire.raw_output.clone_from(&tc.raw_output);
            }
            Self::Plan { entries } => wire.entries.clone_from(entries),
            Self::AvailableCommandsUpdate { commands } => {
                wire.available_commands.clone_from(commands);
            }
            Self::Other {
                message_content,
                tool_content,
                ..
            } => {
                if !tool_content.is_empty() {
                    wire.content = Some(
                        serde_json::to_value(tool_content).map_err(serde::ser::Error::custom)?,
                    );
                } else if let Some(block) = message_content {
                    wire.content =
                        Some(serde_json::to_value(block).map_err(serde::ser::Error::custom)?);
                }
            }
        }

        wire.serialize(serializer)
    }
}

/// Tool-call fields shared by `tool_call` / `tool_call_update` updates and
/// the tool-call summary inside a permission request.
///
/// `kind` is one of `read`, `edit`, `delete`, `move`, `search`, `execute`,
/// `think`, `fetch`, `other`; `status` is one of `pending`, `in_progress`,
/// `completed`, `failed`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolCallUpdate {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tool_call_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<ToolCallContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<ToolCallLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_input: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<Value>,
}

/// One content element within a tool call: plain content, a unified diff,
/// or a terminal reference, selected by `kind` (wire key `type`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolCallContent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<ContentBlock>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub old_text: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub new_text: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub terminal_id: String,
}

/// A file path and optional line associated with a tool call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolCallLocation {
    pub path: String,
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub line: u32,
}

fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}

/// A single item in a plan update. `priority` is one of `high`, `medium`,
/// `low`, `normal`; `status` is one of `pending`, `in_progress`, `completed`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanEntry {
    pub content: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub priority: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub status: String,
}

/// A slash command or action available in the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AvailableCommand {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<AvailableCommandInput>,
}

/// Expected input for an available command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AvailableCommandInput {
    pub hint: String,
}

// ── Permission ────────────────────────────────────────────────────────────────

/// Sent by the agent to ask the user for permission before a sensitive
/// action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestPermissionParams {
    pub session_id: String,
    pub tool_call: ToolCallUpdate,
    pub options: Vec<PermissionOption>,
}

/// One choice presented to the user. `kind` is one of `allow_once`,
/// `allow_always`, `reject_once`, `reject_always`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PermissionOption {
    pub option_id: String,
    pub name: String,
    pub kind: String,
}

/// The client's answer to a permission request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct RequestPermissionResult {
    pub outcome: PermissionOutcome,
}

impl RequestPermissionResult {
    /// The user selected one of the offered options.
    #[must_use]
    pub fn selected(option_id: impl Into<String>) -> Self {
        Self {
            outcome: PermissionOutcome {
                outcome: "selected".to_owned(),
                option_id: option_id.into(),
            },
        }
    }

    /// The dialog was dismissed without a selection.
    #[must_use]
    pub fn cancelled() -> Self {
        Self {
            outcome: PermissionOutcome {
                outcome: "cancelled".to_owned(),
                option_id: String::new(),
            },
        }
    }
}

/// The user's decision. `outcome` is `selected` or `cancelled`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PermissionOutcome {
    pub outcome: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub option_id: String,
}

// ── File system ───────────────────────────────────────────────────────────────

/// Agent request: read a text file. `line` is 1-based (0 defaults to 1);
/// `limit` 0 means to end of file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ReadTextFileParams {
    pub session_id: String,
    pub path: String,
    #[serde(skip_serializing_if = "is_zero_i64")]
    pub line: i64,
    #[serde(skip_serializing_if = "is_zero_i64")]
    pub limit: i64,
}

fn is_zero_i64(v: &i64) -> bool {
    *v == 0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ReadTextFileResult {
    pub content: String,
}

/// Agent request: write content to a text file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct WriteTextFileParams {
    pub session_id: String,
    pub path: String,
    pub content: String,
}

// ── Terminal ──────────────────────────────────────────────────────────────────

/// Agent request: spawn a terminal subprocess.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TerminalCreateParams {
    pub session_id: String,
    pub command: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVariable>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cwd: String,
    #[serde(skip_serializing_if = "is_zero_u64")]
    pub output_byte_limit: u64,
}

fn is_zero_u64(v: &u64) -> bool {
    *v == 0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TerminalCreateResult {
    pub terminal_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TerminalOutputParams {
    pub session_id: String,
    pub terminal_id: String,
}

/// Current accumulated output of a terminal. `exit_status` is present only
/// once the process has exited.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TerminalOutputResult {
    pub output: String,
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_status: Option<TerminalExitStatus>,
}

/// How a terminal process exited. `exit_code` is absent when the process
/// was terminated by a signal; `signal` carries the signal name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TerminalExitStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TerminalWaitParams {
    pub session_id: String,
    pub terminal_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TerminalWaitResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TerminalKillParams {
    pub session_id: String,
    pub terminal_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TerminalReleaseParams {
    pub session_id: String,
    pub terminal_id: String,
}
