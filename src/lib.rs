#![forbid(unsafe_code)]

//! ByteSmith — client runtime of the Agent Client Protocol (ACP).
//!
//! Drives AI coding agent subprocesses over bidirectional JSON-RPC 2.0 on
//! newline-delimited stdio: multiplexes concurrent requests, routes
//! agent-originated capability calls to local providers (filesystem,
//! terminal, permission), and maintains per-session conversation state for
//! a consuming shell. The [`workbench::Workbench`] facade is the main entry
//! point.

pub mod acp;
pub mod agent;
pub mod config;
pub mod errors;
pub mod events;
pub mod providers;
pub mod session;
pub mod workbench;

pub use errors::{AppError, Result};
