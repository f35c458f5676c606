//! Unit tests for the polymorphic `session/update` payload.
//!
//! The wire overloads `content`: a single block for message chunks, an
//! array of tool-call content items for tool calls. Decode must
//! disambiguate on the `sessionUpdate` discriminator and encode∘decode must
//! be identity over every variant.

use serde_json::json;

use bytesmith::acp::types::{
    AvailableCommand, AvailableCommandInput, ContentBlock, PlanEntry, SessionUpdate,
    SessionUpdateParams, ToolCallContent, ToolCallLocation, ToolCallUpdate,
};

fn roundtrip(update: &SessionUpdate) -> SessionUpdate {
    let encoded = serde_json::to_string(update).expect("encode");
    serde_json::from_str(&encoded).expect("decode")
}

/// agent_message_chunk decodes `content` as a single block.
#[test]
fn agent_message_chunk_decodes_single_block() {
    let raw = json!({
        "sessionUpdate": "agent_message_chunk",
        "content": {"type": "text", "text": "hi"}
    });

    let update: SessionUpdate = serde_json::from_value(raw).expect("decode");
    match &update {
        SessionUpdate::AgentMessageChunk { content } => {
            assert_eq!(content.kind, "text");
            assert_eq!(content.text, "hi");
        }
        other => panic!("expected AgentMessageChunk, got: {other:?}"),
    }

    assert_eq!(roundtrip(&update), update);
}

/// user_message_chunk round-trips with its block intact.
#[test]
fn user_message_chunk_roundtrips() {
    let update = SessionUpdate::UserMessageChunk {
        content: ContentBlock::text("replayed input"),
    };
    assert_eq!(roundtrip(&update), update);
}

/// tool_call decodes `content` as an array of tool-call content items and
/// preserves every field through a round-trip.
#[test]
fn tool_call_roundtrips_with_all_fields() {
    let update = SessionUpdate::ToolCall(ToolCallUpdate {
        tool_call_id: "tc-1".to_owned(),
        title: "Edit main.rs".to_owned(),
        kind: "edit".to_owned(),
        status: "in_progress".to_owned(),
        content: vec![
            ToolCallContent {
                kind: "content".to_owned(),
                content: Some(ContentBlock::text("applying change")),
                ..ToolCallContent::default()
            },
            ToolCallContent {
                kind: "diff".to_owned(),
                path: "src/main.rs".to_owned(),
                old_text: "fn main() {}".to_owned(),
                new_text: "fn main() { run(); }".to_owned(),
                ..ToolCallContent::default()
            },
            ToolCallContent {
                kind: "terminal".to_owned(),
                terminal_id: "term-9".to_owned(),
                ..ToolCallContent::default()
            },
        ],
        locations: vec![ToolCallLocation {
            path: "src/main.rs".to_owned(),
            line: 1,
        }],
        raw_input: Some(json!({"file": "src/main.rs"})),
        raw_output: Some(json!({"ok": true})),
    });

    assert_eq!(roundtrip(&update), update);

    // The wire shape must use the array form of `content`.
    let encoded = serde_json::to_value(&update).expect("encode");
    assert!(
        encoded["content"].is_array(),
        "tool_call content must encode as an array"
    );
    assert_eq!(encoded["sessionUpdate"], "tool_call");
    assert_eq!(encoded["toolCallId"], "tc-1");
}

/// tool_call_update with no content decodes to an empty item list.
#[test]
fn tool_call_update_without_content() {
    let raw = json!({
        "sessionUpdate": "tool_call_update",
        "toolCallId": "tc-2",
        "status": "completed"
    });

    let update: SessionUpdate = serde_json::from_value(raw).expect("decode");
    match &update {
        SessionUpdate::ToolCallUpdate(tc) => {
            assert_eq!(tc.tool_call_id, "tc-2");
            assert_eq!(tc.status, "completed");
            assert!(tc.content.is_empty());
        }
        other => panic!("expected ToolCallUpdate, got: {other:?}"),
    }

    assert_eq!(roundtrip(&update), update);
}

/// plan entries round-trip in order.
#[test]
fn plan_roundtrips() {
    let update = SessionUpdate::Plan {
        entries: vec![
            PlanEntry {
                content: "read the code".to_owned(),
                priority: "high".to_owned(),
                status: "completed".to_owned(),
            },
            PlanEntry {
                content: "write the fix".to_owned(),
                priority: "normal".to_owned(),
                status: "in_progress".to_owned(),
            },
        ],
    };
    assert_eq!(roundtrip(&update), update);
}

/// available_commands_update round-trips, including the optional input
/// hint.
#[test]
fn available_commands_roundtrips() {
    let update = SessionUpdate::AvailableCommandsUpdate {
        commands: vec![
            AvailableCommand {
                name: "test".to_owned(),
                description: "run the tests".to_owned(),
                input: None,
            },
            AvailableCommand {
                name: "review".to_owned(),
                description: "review a file".to_owned(),
                input: Some(AvailableCommandInput {
                    hint: "path".to_owned(),
                }),
            },
        ],
    };
    assert_eq!(roundtrip(&update), update);
}

/// An unknown discriminator must not fail the frame: the array content
/// shape is tried first.
#[test]
fn unknown_variant_with_array_content_is_kept() {
    let raw = json!({
        "sessionUpdate": "future_thing",
        "content": [{"type": "terminal", "terminalId": "t-1"}]
    });

    let update: SessionUpdate = serde_json::from_value(raw).expect("decode must not fail");
    match update {
        SessionUpdate::Other {
            kind,
            tool_content,
            message_content,
        } => {
            assert_eq!(kind, "future_thing");
            assert_eq!(tool_content.len(), 1);
            assert_eq!(tool_content[0].terminal_id, "t-1");
            assert!(message_content.is_none());
        }
        other => panic!("expected Other, got: {other:?}"),
    }
}

/// Unknown discriminator with a single-object content falls back to the
/// message-chunk shape.
#[test]
fn unknown_variant_with_object_content_is_kept() {
    let raw = json!({
        "sessionUpdate": "future_chunk",
        "content": {"type": "text", "text": "later"}
    });

    let update: SessionUpdate = serde_json::from_value(raw).expect("decode must not fail");
    match update {
        SessionUpdate::Other {
            kind,
            message_content,
            tool_content,
        } => {
            assert_eq!(kind, "future_chunk");
            assert_eq!(message_content.expect("block").text, "later");
            assert!(tool_content.is_empty());
        }
        other => panic!("expected Other, got: {other:?}"),
    }
}

/// A message chunk missing its content block is a malformed frame.
#[test]
fn message_chunk_without_content_is_an_error() {
    let raw = json!({"sessionUpdate": "agent_message_chunk"});
    let result: Result<SessionUpdate, _> = serde_json::from_value(raw);
    assert!(result.is_err(), "chunk without content must fail to decode");
}

/// The full notification params wrapper decodes session id + update.
#[test]
fn session_update_params_decode() {
    let raw = json!({
        "sessionId": "s",
        "update": {
            "sessionUpdate": "agent_message_chunk",
            "content": {"type": "text", "text": "hi"}
        }
    });

    let params: SessionUpdateParams = serde_json::from_value(raw).expect("decode");
    assert_eq!(params.session_id, "s");
    match params.update {
        SessionUpdate::AgentMessageChunk { content } => assert_eq!(content.text, "hi"),
        other => panic!("expected AgentMessageChunk, got: {other:?}"),
    }
}
