//! The outbound loop: the only writer of the connection.

use std::sync::Arc;
use std::time::Duration;

use jdwp_core::CommandPacket;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, warn};

use crate::error::SessionError;
use crate::session::framing::write_command;
use crate::session::state::Shared;

/// A request waiting in the submission queue.
#[derive(Debug)]
pub(crate) struct Envelope {
    pub(crate) id: u32,
    pub(crate) packet: CommandPacket,
}

/// Writes queued requests one at a time, in queue order.
///
/// Ends when the queue is closed, the stop signal is raised, or a write
/// fails.  A write failure fails the session.  On the way out the write
/// half is shut down so the peer sees end-of-stream.
pub(crate) async fn run<W>(
    mut writer: W,
    shared: Arc<Shared>,
    mut queue: mpsc::Receiver<Envelope>,
    mut stop: watch::Receiver<bool>,
    write_timeout: Duration,
) where
    W: AsyncWrite + Unpin,
{
    debug!("outbound loop started");
    loop {
        let envelope = tokio::select! {
            biased;
            _ = Shared::stopped(&mut stop) => break,
            next = queue.recv() => match next {
                Some(envelope) => envelope,
                None => break,
            },
        };

        let Envelope { id, packet } = envelope;
        match write_command(&mut writer, id, &packet, write_timeout).await {
            Ok(()) => debug!(
                "command {id} ({}, {}) sent, {} payload bytes",
                packet.command_set,
                packet.command,
                packet.data.len()
            ),
            Err(SessionError::Framing(e)) => {
                // Nothing reached the wire; only this request is lost.
                warn!("cannot frame command {id}: {e}");
                shared.cancel(id);
            }
            Err(e) => {
                if shared.fail_if_open() {
                    error!("outbound loop failed writing command {id}: {e}");
                }
                break;
            }
        }
    }

    queue.close();
    if let Err(e) = tokio::time::timeout(write_timeout, writer.shutdown()).await {
        debug!("write half shutdown timed out: {e}");
    }
    debug!("outbound loop stopped");
}
