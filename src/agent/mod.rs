//! Agent connection lifecycle.
//!
//! A [`Connection`] is a live link to one agent subprocess: it exclusively
//! owns the protocol client (and through it the transport), and indexes the
//! session ids opened on it. The [`Manager`] resolves agents by name from
//! configuration, performs the connect/initialize sequence, and keeps the
//! connection registry.

pub mod discovery;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::acp::client::{AcpClient, AgentHandler};
use crate::acp::transport::{StdioTransport, Transport};
use crate::config::AgentConfig;
use crate::{AppError, Result};

/// A live connection to an agent subprocess.
pub struct Connection {
    /// Connection id (UUID), minted at connect time.
    pub id: String,
    /// The agent configuration this connection was spawned from.
    pub agent: AgentConfig,
    /// Protocol client; owns the transport and the subprocess.
    pub client: Arc<AcpClient>,
    /// Ids of sessions opened on this connection. A lookup index only —
    /// session records live in the session store.
    pub sessions: Vec<String>,
}

/// Registry and lifecycle manager for agent connections.
#[derive(Default)]
pub struct Manager {
    connections: RwLock<HashMap<String, Connection>>,
}

impl Manager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `agent`, perform the initialize handshake with `handler` as
    /// the connection's capability delegate, and register the connection
    /// under `connection_id`.
    ///
    /// The caller mints `connection_id` up front so the delegate can carry
    /// it before the first inbound message arrives.
    ///
    /// # Errors
    ///
    /// Propagates spawn and handshake failures; on handshake failure the
    /// transport is closed before returning so no child is leaked.
    pub async fn connect(
        &self,
        connection_id: &str,
        agent: AgentConfig,
        cwd: &str,
        handler: Arc<dyn AgentHandler>,
    ) -> Result<Arc<AcpClient>> {
        let cwd_path = if cwd.is_empty() {
            None
        } else {
            Some(PathBuf::from(cwd))
        };

        let transport: Arc<dyn Transport> = Arc::new(StdioTransport::new(
            agent.command.clone(),
            agent.args.clone(),
            agent.env.clone(),
            cwd_path,
        ));

        let client = Arc::new(AcpClient::new(Arc::clone(&transport), handler));

        if let Err(err) = client.initialize().await {
            warn!(agent = %agent.name, %err, "initialize failed, closing transport");
            if let Err(close_err) = transport.close().await {
                warn!(agent = %agent.name, %close_err, "transport close after failed init");
            }
            return Err(AppError::Acp(format!("initialize {}: {err}", agent.name)));
        }

        info!(agent = %agent.name, connection_id, "agent connected");

        let connection = Connection {
            id: connection_id.to_owned(),
            agent,
            client: Arc::clone(&client),
            sessions: Vec::new(),
        };
        self.connections
            .write()
            .await
            .insert(connection_id.to_owned(), connection);

        Ok(client)
    }

    /// Mint a fresh connection id.
    #[must_use]
    pub fn next_connection_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Gracefully shut down a single connection: remove it from the
    /// registry, then close its client (which drains pending calls, closes
    /// the transport, and reaps the subprocess).
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown id; propagates close
    /// failures.
    pub async fn disconnect(&self, connection_id: &str) -> Result<()> {
        let connection = self
            .connections
            .write()
            .await
            .remove(connection_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("connection '{connection_id}' not found"))
            })?;

        connection.client.close().await?;
        info!(connection_id, "agent disconnected");
        Ok(())
    }

    /// Shut down every connection, ignoring individual errors so the
    /// method is safe in cleanup paths.
    pub async fn disconnect_all(&self) {
        let ids: Vec<String> = self.connections.read().await.keys().cloned().collect();
        for id in ids {
            if let Err(err) = self.disconnect(&id).await {
                debug!(connection_id = %id, %err, "disconnect during shutdown");
            }
        }
    }

    /// The client for a connection, if it exists.
    pub async fn client(&self, connection_id: &str) -> Option<Arc<AcpClient>> {
        self.connections
            .read()
            .await
            .get(connection_id)
            .map(|c| Arc::clone(&c.client))
    }

    /// The agent configuration a connection was spawned from.
    pub async fn agent_of(&self, connection_id: &str) -> Option<AgentConfig> {
        self.connections
            .read()
            .await
            .get(connection_id)
            .map(|c| c.agent.clone())
    }

    /// Record a session id on its connection's index.
    pub async fn add_session(&self, connection_id: &str, session_id: &str) {
        if let Some(conn) = self.connections.write().await.get_mut(connection_id) {
            conn.sessions.push(session_id.to_owned());
        }
    }

    /// Snapshot of all connections as `(id, agent, session ids)` tuples.
    pub async fn list(&self) -> Vec<(String, AgentConfig, Vec<String>)> {
        self.connections
            .read()
            .await
            .values()
            .map(|c| (c.id.clone(), c.agent.clone(), c.sessions.clone()))
            .collect()
    }
}
