//! Reading and writing whole packets on an async byte stream.

use std::io;
use std::time::Duration;

use jdwp_core::{decode_packet, encode_command, frame_length, CommandPacket, Packet};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use crate::error::SessionError;

/// Upper bound on the buffer reserved before a packet body arrives.
const INITIAL_BODY_CAPACITY: usize = 64 * 1024;

/// Reads exactly one packet.
///
/// Waiting for the first byte is unbounded.  From then on the rest of the
/// packet must arrive within `read_timeout`.  The length prefix is
/// validated before anything else is read.
pub(crate) async fn read_packet<R>(reader: &mut R, read_timeout: Duration) -> Result<Packet, SessionError>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; 4];
    reader.read_exact(&mut prefix[..1]).await?;
    bounded(read_timeout, "reading packet length", reader.read_exact(&mut prefix[1..])).await?;

    let length = frame_length(prefix)?;
    // The buffer grows with the bytes that actually arrive, whatever the
    // prefix claims.
    let mut buf = Vec::with_capacity(length.min(INITIAL_BODY_CAPACITY));
    buf.extend_from_slice(&prefix);
    let remaining = (length - prefix.len()) as u64;
    bounded(
        read_timeout,
        "reading packet body",
        (&mut *reader).take(remaining).read_to_end(&mut buf),
    )
    .await?;
    if buf.len() < length {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("connection closed after {} of {length} packet bytes", buf.len()),
        )
        .into());
    }

    let (packet, _) = decode_packet(&buf)?;
    Ok(packet)
}

/// Frames `packet` as a command with id `id` and writes it.
pub(crate) async fn write_command<W>(
    writer: &mut W,
    id: u32,
    packet: &CommandPacket,
    write_timeout: Duration,
) -> Result<(), SessionError>
where
    W: AsyncWrite + Unpin,
{
    let bytes = encode_command(id, packet)?;
    let write = async {
        writer.write_all(&bytes).await?;
        writer.flush().await
    };
    bounded(write_timeout, "writing packet", write).await?;
    Ok(())
}

async fn bounded<F, T>(limit: Duration, what: &str, fut: F) -> io::Result<T>
where
    F: std::future::Future<Output = io::Result<T>>,
{
    timeout(limit, fut).await.map_err(|_| {
        io::Error::new(
            io::ErrorKind::TimedOut,
            format!("timed out after {limit:?} {what}"),
        )
    })?
}
