//! Permission bridge.
//!
//! When an agent sends `requestPermission`, the bridge parks the request in
//! a one-shot slot keyed by connection id, reports it to the UI observer,
//! and blocks until [`PermissionBridge::respond`] delivers the user's
//! choice (or the slot is torn down, which resolves as `cancelled`).
//!
//! At most one permission dialog may be pending per connection. A second
//! concurrent request is a protocol violation: it is logged and displaces
//! the first slot, whose waiter resolves as cancelled.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, warn};

use crate::acp::types::{PermissionOption, RequestPermissionParams, RequestPermissionResult};

/// Receives each permission request destined for the user.
pub trait PermissionObserver: Send + Sync {
    fn permission_requested(&self, request: &PermissionRequest);
}

/// A permission dialog to present to the user.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRequest {
    pub connection_id: String,
    pub session_id: String,
    pub tool_call_id: String,
    pub title: String,
    pub kind: String,
    pub options: Vec<PermissionOption>,
}

/// Pending slot: the sequence number tells a displaced waiter not to tear
/// down its successor's entry.
struct PendingSlot {
    seq: u64,
    tx: oneshot::Sender<String>,
}

/// Routes agent permission requests to the user and answers back.
pub struct PermissionBridge {
    pending: Mutex<HashMap<String, PendingSlot>>,
    seq: AtomicU64,
    observer: Arc<dyn PermissionObserver>,
}

impl PermissionBridge {
    #[must_use]
    pub fn new(observer: Arc<dyn PermissionObserver>) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            seq: AtomicU64::new(0),
            observer,
        }
    }

    /// Park the request, notify the observer, and block until the user
    /// decides. Returns `selected` with the chosen option id, or
    /// `cancelled` when the slot resolves empty or is displaced.
    pub async fn request(
        &self,
        connection_id: &str,
        params: RequestPermissionParams,
    ) -> RequestPermissionResult {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();

        {
            let mut pending = self.pending.lock().await;
            if pending
                .insert(connection_id.to_owned(), PendingSlot { seq, tx })
                .is_some()
            {
                warn!(
                    connection_id,
                    "protocol violation: permission requested while another is pending; \
                     displacing the earlier dialog"
                );
            }
        }

        let request = PermissionRequest {
            connection_id: connection_id.to_owned(),
            session_id: params.session_id,
            tool_call_id: params.tool_call.tool_call_id,
            title: params.tool_call.title,
            kind: params.tool_call.kind,
            options: params.options,
        };
        self.observer.permission_requested(&request);

        let outcome = rx.await;

        // Remove our slot unless a later request has displaced it.
        {
            let mut pending = self.pending.lock().await;
            if pending
                .get(connection_id)
                .is_some_and(|slot| slot.seq == seq)
            {
                pending.remove(connection_id);
            }
        }

        match outcome {
            Ok(option_id) if !option_id.is_empty() => {
                RequestPermissionResult::selected(option_id)
            }
            _ => RequestPermissionResult::cancelled(),
        }
    }

    /// Deliver the user's choice for a connection's pending dialog.
    /// Responses targeting a connection with no pending dialog are
    /// silently ignored.
    pub async fn respond(&self, connection_id: &str, option_id: &str) {
        let slot = self.pending.lock().await.remove(connection_id);
        match slot {
            Some(slot) => {
                let _ = slot.tx.send(option_id.to_owned());
            }
            None => {
                debug!(
                    connection_id,
                    "permission response with no pending dialog, ignoring"
                );
            }
        }
    }

    /// Whether a dialog is pending for `connection_id`.
    pub async fn has_pending(&self, connection_id: &str) -> bool {
        self.pending.lock().await.contains_key(connection_id)
    }
}
