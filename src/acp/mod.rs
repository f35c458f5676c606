//! Agent Client Protocol (ACP) core.
//!
//! ACP is JSON-RPC 2.0 over newline-delimited stdio spoken between this
//! client and an AI coding agent subprocess. Both peers may initiate
//! requests: the client drives sessions and prompts, while the agent calls
//! back into the client's capability providers for file-system access,
//! terminals, and user permission.
//!
//! # Submodules
//!
//! - [`types`]: the JSON-RPC envelope and every protocol parameter/result
//!   shape, including the polymorphic `session/update` payload.
//! - [`codec`]: [`tokio_util::codec::LinesCodec`]-based NDJSON framing with
//!   a 10 MiB per-frame limit.
//! - [`transport`]: subprocess stdio transport with a dedicated reader task,
//!   serialized writer, and bounded stderr queue.
//! - [`client`]: request correlation, timeouts, and inbound dispatch to the
//!   per-connection capability delegate.

pub mod client;
pub mod codec;
pub mod transport;
pub mod types;
