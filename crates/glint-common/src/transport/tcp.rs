//! Async frame I/O over TCP streams.
//!
//! Both the server and the client move whole frames at a time: bytes up to
//! the [`MESSAGE_SEPARATOR`], with a configurable upper bound on frame size.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::protocol::{GlintError, Result};
use crate::transport::codec::MESSAGE_SEPARATOR;

/// Reads one frame, excluding the separator.
///
/// # Errors
///
/// Returns [`GlintError::MaxMessageSize`] when the frame exceeds
/// `max_message_size` bytes, and an `UnexpectedEof` I/O error when the peer
/// closes the stream mid-frame (or between frames).
pub async fn read_frame<R>(reader: &mut R, max_message_size: usize) -> Result<Vec<u8>>
where
    R: AsyncBufRead + Unpin,
{
    let mut frame = Vec::new();

    loop {
        let (consumed, done) = {
            let chunk = reader.fill_buf().await?;
            if chunk.is_empty() {
                return Err(GlintError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed before a full frame was read",
                )));
            }

            match chunk.iter().position(|&byte| byte == MESSAGE_SEPARATOR) {
                Some(position) => {
                    frame.extend_from_slice(&chunk[..position]);
                    (position + 1, true)
                }
                None => {
                    frame.extend_from_slice(chunk);
                    (chunk.len(), false)
                }
            }
        };
        reader.consume(consumed);

        if frame.len() > max_message_size {
            return Err(GlintError::MaxMessageSize { max_message_size });
        }
        if done {
            return Ok(frame);
        }
    }
}

/// Writes one encoded frame followed by the separator, then flushes.
pub async fn write_frame<W>(writer: &mut W, encoded: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(encoded).await?;
    writer.write_all(&[MESSAGE_SEPARATOR]).await?;
    writer.flush().await?;
    Ok(())
}
