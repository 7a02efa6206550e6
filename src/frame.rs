//! Sentinel framing for OpenOCD's Tcl RPC server
//!
//! Protocol: send command as UTF-8, terminated by 0x1a (SUB character).
//! Response: UTF-8 text terminated by 0x1a. No length prefix, no escaping.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Result, RpcError};

/// Frame terminator byte (ASCII SUB / Ctrl-Z)
pub const SENTINEL: u8 = 0x1a;

/// Write `payload` followed by one sentinel byte, then flush.
///
/// The payload is sent as-is. A payload containing [`SENTINEL`] ends the
/// command early from the server's point of view.
pub async fn write_frame<W>(writer: &mut W, payload: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(payload.as_bytes()).await?;
    writer.write_all(&[SENTINEL]).await?;
    writer.flush().await?;
    Ok(())
}

/// Read the next sentinel-terminated token, sentinel stripped.
///
/// End of stream before a sentinel arrives is [`RpcError::ConnectionClosed`];
/// a truncated token is never returned.
pub async fn read_frame<R>(reader: &mut R) -> Result<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::with_capacity(256);
    reader.read_until(SENTINEL, &mut buf).await?;

    if buf.pop() != Some(SENTINEL) {
        return Err(RpcError::ConnectionClosed);
    }

    Ok(String::from_utf8(buf)?)
}
