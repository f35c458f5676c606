//! NDJSON codec for ACP agent streams.
//!
//! Wraps [`tokio_util::codec::LinesCodec`] with a configurable maximum line
//! length to prevent memory exhaustion caused by unterminated or maliciously
//! large messages from a misbehaving agent process.
//!
//! Use [`AcpCodec`] as the codec parameter for
//! [`tokio_util::codec::FramedRead`]. An over-long line surfaces as a
//! recoverable [`AppError::Acp`]; `LinesCodec` then discards bytes up to the
//! next `\n`, so the stream stays aligned and subsequent frames decode
//! normally.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

use crate::{AppError, Result};

/// Maximum length of one inbound protocol frame: 10 MiB. Large tool outputs
/// embedded in session updates fit comfortably under this.
pub const MAX_LINE_BYTES: usize = 10 * 1024 * 1024;

/// Maximum length of one stderr line drained from the agent process: 1 MiB.
pub const MAX_STDERR_LINE_BYTES: usize = 1024 * 1024;

/// NDJSON codec for bidirectional ACP agent streams.
///
/// Delegates line-framing to [`LinesCodec`] with a fixed byte limit. Each
/// newline-terminated (`\n`) UTF-8 string is one complete JSON-RPC message.
#[derive(Debug)]
pub struct AcpCodec(LinesCodec);

impl AcpCodec {
    /// Create a codec with the default [`MAX_LINE_BYTES`] limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_length(MAX_LINE_BYTES)
    }

    /// Create a codec with an explicit byte limit.
    #[must_use]
    pub fn with_max_length(limit: usize) -> Self {
        Self(LinesCodec::new_with_max_length(limit))
    }
}

impl Default for AcpCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for AcpCodec {
    type Item = String;
    type Error = AppError;

    /// Decode the next newline-terminated line from `src`.
    ///
    /// Returns `Ok(None)` when `src` contains no complete line yet
    /// (buffering). Returns `Err(AppError::Acp("line too long: …"))` when
    /// the line exceeds the configured limit.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.0.decode(src).map_err(map_codec_error)
    }

    /// Decode the final line when the stream reaches EOF.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.0.decode_eof(src).map_err(map_codec_error)
    }
}

impl Encoder<String> for AcpCodec {
    type Error = AppError;

    /// Encode `item` as a `\n`-terminated NDJSON line into `dst`.
    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<()> {
        // LinesCodec::encode does not enforce a max line length;
        // the limit applies only to decoding.
        self.0.encode(item, dst).map_err(map_codec_error)
    }
}

// ── Private helper ────────────────────────────────────────────────────────────

/// Map a [`LinesCodecError`] to an [`AppError`].
fn map_codec_error(e: LinesCodecError) -> AppError {
    match e {
        LinesCodecError::MaxLineLengthExceeded => {
            AppError::Acp("line too long: exceeded frame size limit".to_owned())
        }
        LinesCodecError::Io(io_err) => AppError::Io(io_err.to_string()),
    }
}
