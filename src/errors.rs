//! Error types shared across the crate.

use std::fmt::{Display, Formatter};

use crate::acp::types::JsonRpcError;

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing, validation, or persistence failure.
    Config(String),
    /// ACP protocol failure (framing, serialization, handshake).
    Acp(String),
    /// Error object returned by the agent for an outbound call.
    Rpc(JsonRpcError),
    /// File-system or I/O operation failure.
    Io(String),
    /// Requested entity does not exist.
    NotFound(String),
    /// Outbound call did not complete within its deadline.
    Timeout(String),
    /// Call was cancelled by the caller or by client shutdown.
    Cancelled(String),
    /// Transport is closed; sends fail fast.
    Closed,
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Acp(msg) => write!(f, "acp: {msg}"),
            Self::Rpc(err) => write!(f, "agent error {}: {}", err.code, err.message),
            Self::Io(msg) => write!(f, "io: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::Timeout(msg) => write!(f, "timeout: {msg}"),
            Self::Cancelled(msg) => write!(f, "cancelled: {msg}"),
            Self::Closed => write!(f, "transport is closed"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Acp(format!("json: {err}"))
    }
}
