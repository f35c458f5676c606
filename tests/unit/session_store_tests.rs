//! Unit tests for the in-memory session store.

use bytesmith::session::{Message, Role, SessionStore, ToolCallRecord};

#[tokio::test]
async fn create_then_get_returns_snapshot() {
    let store = SessionStore::new();
    store.create("s1", "opencode", "conn-1", "/work").await;

    let record = store.get("s1").await.expect("session must exist");
    assert_eq!(record.agent_name, "opencode");
    assert_eq!(record.connection_id, "conn-1");
    assert_eq!(record.cwd, "/work");
    assert!(record.messages.is_empty());
    assert!(record.tool_calls.is_empty());
    assert_eq!(record.created_at, record.updated_at);
}

#[tokio::test]
async fn get_unknown_session_is_none() {
    let store = SessionStore::new();
    assert!(store.get("nope").await.is_none());
}

/// Messages keep their append order.
#[tokio::test]
async fn messages_preserve_order() {
    let store = SessionStore::new();
    store.create("s1", "a", "c", "/").await;

    store.add_message("s1", Message::new(Role::User, "one")).await;
    store.add_message("s1", Message::new(Role::Agent, "two")).await;
    store.add_message("s1", Message::new(Role::Agent, "three")).await;

    let record = store.get("s1").await.expect("session");
    let contents: Vec<&str> = record.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["one", "two", "three"]);
    assert_eq!(record.messages[0].role, Role::User);
    assert!(record.updated_at >= record.created_at);
}

/// Mutations against an unknown session are no-ops.
#[tokio::test]
async fn mutations_on_unknown_session_are_noops() {
    let store = SessionStore::new();
    store.add_message("ghost", Message::new(Role::User, "x")).await;
    store
        .add_tool_call("ghost", ToolCallRecord::new("t", "", "", ""))
        .await;
    store.update_tool_call("ghost", "t", "completed", None).await;
    assert!(store.get("ghost").await.is_none());
}

#[tokio::test]
async fn update_tool_call_stamps_status_and_content() {
    let store = SessionStore::new();
    store.create("s1", "a", "c", "/").await;
    store
        .add_tool_call(
            "s1",
            ToolCallRecord::new("tc-1", "Run tests", "execute", "pending"),
        )
        .await;

    store
        .update_tool_call("s1", "tc-1", "completed", Some("all green".to_owned()))
        .await;

    let record = store.get("s1").await.expect("session");
    assert_eq!(record.tool_calls[0].status, "completed");
    assert_eq!(record.tool_calls[0].content, "all green");
}

/// `None` content keeps the previously recorded content.
#[tokio::test]
async fn update_tool_call_without_content_keeps_existing() {
    let store = SessionStore::new();
    store.create("s1", "a", "c", "/").await;

    let mut record = ToolCallRecord::new("tc-1", "Edit", "edit", "pending");
    record.content = "diff: src/main.rs".to_owned();
    store.add_tool_call("s1", record).await;

    store.update_tool_call("s1", "tc-1", "in_progress", None).await;

    let session = store.get("s1").await.expect("session");
    assert_eq!(session.tool_calls[0].status, "in_progress");
    assert_eq!(
        session.tool_calls[0].content, "diff: src/main.rs",
        "content must survive a status-only update"
    );
}

/// Updating an unknown tool call id changes nothing.
#[tokio::test]
async fn update_unknown_tool_call_is_noop() {
    let store = SessionStore::new();
    store.create("s1", "a", "c", "/").await;
    store
        .add_tool_call("s1", ToolCallRecord::new("tc-1", "", "", "pending"))
        .await;

    store.update_tool_call("s1", "tc-9", "failed", None).await;

    let record = store.get("s1").await.expect("session");
    assert_eq!(record.tool_calls[0].status, "pending");
}

/// `list` returns every session, oldest first.
#[tokio::test]
async fn list_orders_by_creation() {
    let store = SessionStore::new();
    store.create("first", "a", "c", "/").await;
    store.create("second", "a", "c", "/").await;
    store.create("third", "a", "c", "/").await;

    let ids: Vec<String> = store.list().await.into_iter().map(|r| r.id).collect();
    assert_eq!(ids, ["first", "second", "third"]);
}

#[tokio::test]
async fn delete_removes_session() {
    let store = SessionStore::new();
    store.create("s1", "a", "c", "/").await;
    store.delete("s1").await;
    assert!(store.get("s1").await.is_none());

    // Deleting again is a no-op.
    store.delete("s1").await;
}
